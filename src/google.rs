//! HTTP adapter for the Google routing, reverse-geocoding and road speed-limit services.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::OracleError;
use crate::geo::GeoPoint;
use crate::route::{Route, RouteDetail, RouteLeg, RouteRequest, RouteStep};
use crate::traits::{ReverseGeocoder, RouteOracle, SpeedLimitProvider};

/// Maximum points per speed-limit request.
pub const SPEED_LIMIT_CHUNK: usize = 90;

const FULL_FIELD_MASK: &str = "routes.duration,routes.distanceMeters,\
routes.polyline.encodedPolyline,routes.legs.duration,routes.legs.distanceMeters,\
routes.legs.startLocation,routes.legs.endLocation,routes.legs.steps.distanceMeters,\
routes.legs.steps.staticDuration,routes.legs.steps.polyline.encodedPolyline";

const LEG_DURATION_FIELD_MASK: &str = "routes.legs.duration";

#[derive(Debug, Clone)]
pub struct RoutesConfig {
    pub routes_base_url: String,
    pub geocode_base_url: String,
    pub roads_base_url: String,
    /// Opaque credential forwarded to every service.
    pub api_key: String,
    pub routing_preference: String,
    pub timeout_secs: u64,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            routes_base_url: "https://routes.googleapis.com".to_string(),
            geocode_base_url: "https://maps.googleapis.com".to_string(),
            roads_base_url: "https://roads.googleapis.com".to_string(),
            api_key: String::new(),
            routing_preference: "TRAFFIC_AWARE".to_string(),
            timeout_secs: 10,
        }
    }
}

impl RoutesConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Points all three services at one base URL (a local mock server, for example).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.routes_base_url = base_url.clone();
        self.geocode_base_url = base_url.clone();
        self.roads_base_url = base_url;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RoutesClient {
    config: RoutesConfig,
    client: reqwest::blocking::Client,
}

impl RoutesClient {
    pub fn new(config: RoutesConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn speed_limit_chunk(&self, chunk: &[GeoPoint]) -> Result<Vec<Option<f64>>, OracleError> {
        let path = chunk
            .iter()
            .map(|point| format!("{:.6},{:.6}", point.lat, point.lng))
            .collect::<Vec<_>>()
            .join("|");
        let url = format!("{}/v1/speedLimits", self.config.roads_base_url);

        let body = self
            .client
            .get(url)
            .query(&[("path", path.as_str()), ("key", self.config.api_key.as_str())])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<SpeedLimitsResponse>())?;

        Ok(body.per_point(chunk.len()))
    }
}

impl RouteOracle for RoutesClient {
    fn compute_route(&self, request: &RouteRequest) -> Result<Route, OracleError> {
        let url = format!("{}/directions/v2:computeRoutes", self.config.routes_base_url);
        let body = ComputeRoutesBody {
            origin: Waypoint::from(request.origin),
            destination: Waypoint::from(request.destination),
            intermediates: request.intermediates.iter().copied().map(Waypoint::from).collect(),
            travel_mode: "DRIVE",
            routing_preference: &self.config.routing_preference,
        };
        let field_mask = match request.detail {
            RouteDetail::Full => FULL_FIELD_MASK,
            RouteDetail::LegDurations => LEG_DURATION_FIELD_MASK,
        };

        debug!(
            intermediates = request.intermediates.len(),
            detail = ?request.detail,
            "computing route"
        );

        let response = self
            .client
            .post(url)
            .header("X-Goog-Api-Key", &self.config.api_key)
            .header("X-Goog-FieldMask", field_mask)
            .json(&body)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<ComputeRoutesResponse>())?;

        response.into_first_route()
    }
}

impl ReverseGeocoder for RoutesClient {
    fn reverse_geocode(&self, point: GeoPoint) -> Result<String, OracleError> {
        let url = format!("{}/maps/api/geocode/json", self.config.geocode_base_url);
        let latlng = format!("{},{}", point.lat, point.lng);

        let body = self
            .client
            .get(url)
            .query(&[("latlng", latlng.as_str()), ("key", self.config.api_key.as_str())])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<GeocodeResponse>())?;

        body.results
            .into_iter()
            .next()
            .map(|result| result.formatted_address)
            .filter(|address| !address.is_empty())
            .ok_or_else(|| {
                OracleError::DataShape(format!(
                    "no geocoding result (status {})",
                    body.status.as_deref().unwrap_or("missing")
                ))
            })
    }
}

impl SpeedLimitProvider for RoutesClient {
    fn speed_limits(&self, path: &[GeoPoint]) -> Result<Vec<Option<f64>>, OracleError> {
        let mut limits = Vec::with_capacity(path.len());
        for chunk in path.chunks(SPEED_LIMIT_CHUNK) {
            limits.extend(self.speed_limit_chunk(chunk)?);
        }
        Ok(limits)
    }
}

/// Parses a `"<seconds>s"` duration, rounding to whole seconds.
///
/// Missing or malformed values parse to 0.
pub fn parse_duration(value: Option<&str>) -> f64 {
    value
        .and_then(|raw| raw.trim().strip_suffix('s'))
        .and_then(|seconds| seconds.parse::<f64>().ok())
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
        .map(f64::round)
        .unwrap_or(0.0)
}

/// Converts a posted limit to meters/second. Anything but `MPH` is read as km/h.
pub fn limit_to_meters_per_second(value: f64, units: Option<&str>) -> f64 {
    match units {
        Some(units) if units.eq_ignore_ascii_case("MPH") => value * 1609.34 / 3600.0,
        _ => value * 1000.0 / 3600.0,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComputeRoutesBody<'a> {
    origin: Waypoint,
    destination: Waypoint,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    intermediates: Vec<Waypoint>,
    travel_mode: &'static str,
    routing_preference: &'a str,
}

#[derive(Debug, Serialize)]
struct Waypoint {
    location: Location,
}

impl From<GeoPoint> for Waypoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            location: Location {
                lat_lng: LatLng {
                    latitude: point.lat,
                    longitude: point.lng,
                },
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Location {
    lat_lng: LatLng,
}

#[derive(Debug, Serialize, Deserialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

impl From<Location> for GeoPoint {
    fn from(location: Location) -> Self {
        GeoPoint::new(location.lat_lng.latitude, location.lat_lng.longitude)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EncodedPolyline {
    #[serde(default)]
    encoded_polyline: String,
}

#[derive(Debug, Deserialize)]
struct ComputeRoutesResponse {
    routes: Option<Vec<RawRoute>>,
}

impl ComputeRoutesResponse {
    fn into_first_route(self) -> Result<Route, OracleError> {
        self.routes
            .and_then(|routes| routes.into_iter().next())
            .map(Route::from)
            .ok_or_else(|| OracleError::DataShape("response has no routes".to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRoute {
    duration: Option<String>,
    distance_meters: Option<f64>,
    polyline: Option<EncodedPolyline>,
    #[serde(default)]
    legs: Vec<RawLeg>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLeg {
    duration: Option<String>,
    distance_meters: Option<f64>,
    start_location: Option<Location>,
    end_location: Option<Location>,
    #[serde(default)]
    steps: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStep {
    distance_meters: Option<f64>,
    static_duration: Option<String>,
    polyline: Option<EncodedPolyline>,
}

impl From<RawRoute> for Route {
    fn from(raw: RawRoute) -> Self {
        Route {
            duration: parse_duration(raw.duration.as_deref()),
            distance_meters: raw.distance_meters.unwrap_or(0.0),
            polyline: raw.polyline.map(|p| p.encoded_polyline).unwrap_or_default(),
            legs: raw.legs.into_iter().map(RouteLeg::from).collect(),
        }
    }
}

impl From<RawLeg> for RouteLeg {
    fn from(raw: RawLeg) -> Self {
        RouteLeg {
            duration: parse_duration(raw.duration.as_deref()),
            distance_meters: raw.distance_meters.unwrap_or(0.0),
            start_location: raw.start_location.map(GeoPoint::from),
            end_location: raw.end_location.map(GeoPoint::from),
            steps: raw.steps.into_iter().map(RouteStep::from).collect(),
        }
    }
}

impl From<RawStep> for RouteStep {
    fn from(raw: RawStep) -> Self {
        RouteStep {
            distance_meters: raw.distance_meters.unwrap_or(0.0),
            duration: parse_duration(raw.static_duration.as_deref()),
            polyline: raw.polyline.map(|p| p.encoded_polyline).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    formatted_address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpeedLimitsResponse {
    #[serde(default)]
    speed_limits: Vec<RawSpeedLimit>,
    #[serde(default)]
    snapped_points: Vec<SnappedPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSpeedLimit {
    place_id: String,
    speed_limit: f64,
    units: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnappedPoint {
    original_index: Option<usize>,
    place_id: String,
}

impl SpeedLimitsResponse {
    /// Maps limits back onto the requested points through the snapped place ids.
    fn per_point(&self, len: usize) -> Vec<Option<f64>> {
        let mut limits = vec![None; len];
        for snapped in &self.snapped_points {
            let Some(index) = snapped.original_index.filter(|index| *index < len) else {
                continue;
            };
            if let Some(limit) = self
                .speed_limits
                .iter()
                .find(|limit| limit.place_id == snapped.place_id)
            {
                limits[index] = Some(limit_to_meters_per_second(
                    limit.speed_limit,
                    limit.units.as_deref(),
                ));
            }
        }
        limits
    }
}
