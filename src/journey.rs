//! Route computation for an active journey.
//!
//! A [`RouteSession`] owns the current [`RouteData`] snapshot. Every
//! recomputation either replaces it with a fresh snapshot or clears it, so the
//! animator never runs on tables derived from a stale or failed route.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::OracleError;
use crate::geo::{GeoPoint, cumulative_distances};
use crate::polyline::{self, Polyline};
use crate::route::{MAX_WAYPOINTS, Route, RouteLeg, RouteRequest};
use crate::speed::{self, SpeedSegment};
use crate::timeline::{TimePoint, build_time_points};
use crate::traits::{RouteOracle, SpeedLimitProvider};

/// Default rest at each stopover, in minutes.
pub const DEFAULT_REST_MINUTES: u32 = 5;

/// A rest stop between two focus segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stopover {
    pub location: GeoPoint,
    /// Display address, when one could be resolved.
    pub address: Option<String>,
    /// Share of the total journey time at which the stop is reached (0..=100).
    pub time_percentage: f64,
    pub rest_duration_minutes: u32,
}

impl Stopover {
    pub fn new(location: GeoPoint) -> Self {
        Self {
            location,
            address: None,
            time_percentage: 0.0,
            rest_duration_minutes: DEFAULT_REST_MINUTES,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// Everything derived from one route computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteData {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    /// Seconds.
    pub duration: f64,
    /// Meters, as reported by the oracle.
    pub distance: f64,
    pub polyline: Polyline,
    /// Cumulative distance table aligned with `polyline`.
    pub distances: Vec<f64>,
    pub time_points: Vec<TimePoint>,
    pub speed_segments: Option<Vec<SpeedSegment>>,
    pub stopovers: Vec<Stopover>,
    pub legs: Vec<RouteLeg>,
}

impl RouteData {
    /// Derives all tables from an oracle route.
    ///
    /// Speed segments come from `speed_limits` when given and usable, and from
    /// the route's steps otherwise.
    pub fn from_route(
        origin: GeoPoint,
        destination: GeoPoint,
        route: Route,
        mut stopovers: Vec<Stopover>,
        speed_limits: Option<&dyn SpeedLimitProvider>,
    ) -> Result<Self, OracleError> {
        let polyline = polyline::decode(&route.polyline)?;
        if polyline.is_empty() {
            return Err(OracleError::DataShape("route has no geometry".to_string()));
        }
        let distances = cumulative_distances(polyline.points());
        let total_distance = distances.last().copied().unwrap_or(0.0);
        let time_points = build_time_points(&route.legs)?;

        let leg_total: f64 = route.legs.iter().map(|leg| leg.duration).sum();
        let duration = if route.duration > 0.0 {
            route.duration
        } else {
            leg_total
        };

        let mut segments = match speed_limits {
            Some(provider) => match provider.speed_limits(polyline.points()) {
                Ok(limits) => {
                    speed::from_speed_limits(polyline.points(), &distances, &limits, duration)
                }
                Err(err) => {
                    warn!(%err, "speed limits unavailable, using step timing");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        if segments.is_empty() {
            segments = speed::from_steps(&route.legs, total_distance, duration)?;
        }

        if route.legs.len() == stopovers.len() + 1 && leg_total > 0.0 {
            let mut elapsed = 0.0;
            for (stopover, leg) in stopovers.iter_mut().zip(&route.legs) {
                elapsed += leg.duration;
                stopover.time_percentage = 100.0 * elapsed / leg_total;
            }
        }

        Ok(RouteData {
            origin,
            destination,
            duration,
            distance: route.distance_meters,
            polyline,
            distances,
            time_points,
            speed_segments: (!segments.is_empty()).then_some(segments),
            stopovers,
            legs: route.legs,
        })
    }

    /// Length of the decoded geometry in meters.
    pub fn total_distance(&self) -> f64 {
        self.distances.last().copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Query posted speed limits to shape the animation speed profile.
    pub use_speed_limits: bool,
}

/// Holds the route of the active journey.
#[derive(Debug, Default)]
pub struct RouteSession {
    options: SessionOptions,
    route: Option<Arc<RouteData>>,
}

impl RouteSession {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            route: None,
        }
    }

    /// The current snapshot, if the last computation succeeded.
    pub fn route(&self) -> Option<Arc<RouteData>> {
        self.route.clone()
    }

    /// Recomputes the route through `stopovers`.
    ///
    /// On any failure the session is cleared and `None` is returned.
    pub fn compute<O>(
        &mut self,
        oracle: &O,
        speed_limits: Option<&dyn SpeedLimitProvider>,
        origin: GeoPoint,
        destination: GeoPoint,
        mut stopovers: Vec<Stopover>,
    ) -> Option<Arc<RouteData>>
    where
        O: RouteOracle + ?Sized,
    {
        if stopovers.len() > MAX_WAYPOINTS {
            warn!(
                requested = stopovers.len(),
                max = MAX_WAYPOINTS,
                "too many stopovers, dropping the excess"
            );
            stopovers.truncate(MAX_WAYPOINTS);
        }

        let request = RouteRequest::full(origin, destination)
            .with_intermediates(stopovers.iter().map(|stop| stop.location).collect());
        let speed_limits = speed_limits.filter(|_| self.options.use_speed_limits);

        let result = oracle.compute_route(&request).and_then(|route| {
            RouteData::from_route(origin, destination, route, stopovers, speed_limits)
        });

        self.route = match result {
            Ok(data) => {
                debug!(
                    duration = data.duration,
                    vertices = data.polyline.len(),
                    "route computed"
                );
                Some(Arc::new(data))
            }
            Err(err) => {
                warn!(%err, "route computation failed, clearing route");
                None
            }
        };
        self.route.clone()
    }

    pub fn reset(&mut self) {
        self.route = None;
    }
}
