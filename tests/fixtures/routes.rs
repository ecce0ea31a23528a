//! Synthetic routes and in-memory service fakes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use focus_route::error::OracleError;
use focus_route::geo::{GeoPoint, haversine_distance};
use focus_route::polyline::encode;
use focus_route::route::{Route, RouteDetail, RouteLeg, RouteRequest, RouteStep};
use focus_route::traits::{ReverseGeocoder, RouteOracle, SpeedLimitProvider};

/// Vertices per step, including both ends.
const VERTICES_PER_STEP: usize = 4;

/// Builds a route of straight legs through `waypoints`.
///
/// Leg `i` takes `leg_durations[i]` seconds, split evenly over
/// `steps_per_leg` steps whose geometry shares boundary vertices.
pub fn build_route(waypoints: &[GeoPoint], leg_durations: &[f64], steps_per_leg: usize) -> Route {
    assert_eq!(waypoints.len(), leg_durations.len() + 1);

    let mut overview: Vec<GeoPoint> = vec![waypoints[0]];
    let mut legs = Vec::new();

    for (i, duration) in leg_durations.iter().enumerate() {
        let (start, end) = (waypoints[i], waypoints[i + 1]);
        let mut steps = Vec::new();

        for s in 0..steps_per_leg {
            let points: Vec<GeoPoint> = (0..VERTICES_PER_STEP)
                .map(|v| {
                    let t = (s as f64 + v as f64 / (VERTICES_PER_STEP - 1) as f64)
                        / steps_per_leg as f64;
                    start.lerp(end, t)
                })
                .collect();
            let distance: f64 = points
                .windows(2)
                .map(|pair| haversine_distance(pair[0], pair[1]))
                .sum();

            overview.extend_from_slice(&points[1..]);
            steps.push(RouteStep {
                distance_meters: distance.round(),
                duration: duration / steps_per_leg as f64,
                polyline: encode(&points),
            });
        }

        legs.push(RouteLeg {
            duration: *duration,
            distance_meters: haversine_distance(start, end).round(),
            start_location: Some(start),
            end_location: Some(end),
            steps,
        });
    }

    Route {
        duration: leg_durations.iter().sum(),
        distance_meters: legs.iter().map(|leg| leg.distance_meters).sum(),
        polyline: encode(&overview),
        legs,
    }
}

/// A direct drive that takes `duration` seconds.
pub fn direct_route(origin: GeoPoint, destination: GeoPoint, duration: f64) -> Route {
    build_route(&[origin, destination], &[duration], 9)
}

fn even_split(total: f64, legs: usize) -> Vec<f64> {
    vec![total / legs as f64; legs]
}

/// Routing oracle over a straight line with a fixed total duration.
///
/// Full requests return straight legs through the requested waypoints with
/// the total split evenly. Leg-duration requests pop the next scripted answer
/// (`None` simulates a failed call) and fall back to an even split.
pub struct ScriptedOracle {
    pub total_duration: f64,
    script: RefCell<VecDeque<Option<Vec<f64>>>>,
    pub requests: RefCell<Vec<RouteRequest>>,
}

impl ScriptedOracle {
    pub fn new(total_duration: f64) -> Self {
        Self {
            total_duration,
            script: RefCell::new(VecDeque::new()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn then_legs(self, legs: &[f64]) -> Self {
        self.script.borrow_mut().push_back(Some(legs.to_vec()));
        self
    }

    pub fn then_fail(self) -> Self {
        self.script.borrow_mut().push_back(None);
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl RouteOracle for ScriptedOracle {
    fn compute_route(&self, request: &RouteRequest) -> Result<Route, OracleError> {
        self.requests.borrow_mut().push(request.clone());
        let leg_count = request.intermediates.len() + 1;

        match request.detail {
            RouteDetail::Full => {
                let mut waypoints = vec![request.origin];
                waypoints.extend_from_slice(&request.intermediates);
                waypoints.push(request.destination);
                Ok(build_route(
                    &waypoints,
                    &even_split(self.total_duration, leg_count),
                    9,
                ))
            }
            RouteDetail::LegDurations => {
                let scripted = self.script.borrow_mut().pop_front();
                let durations = match scripted {
                    Some(Some(durations)) => durations,
                    Some(None) => {
                        return Err(OracleError::DataShape("scripted failure".to_string()));
                    }
                    None => even_split(self.total_duration, leg_count),
                };
                Ok(Route {
                    legs: durations
                        .into_iter()
                        .map(|duration| RouteLeg {
                            duration,
                            ..Default::default()
                        })
                        .collect(),
                    ..Default::default()
                })
            }
        }
    }
}

/// Always returns the same route, whatever is asked.
pub struct FixedOracle(pub Route);

impl RouteOracle for FixedOracle {
    fn compute_route(&self, _request: &RouteRequest) -> Result<Route, OracleError> {
        Ok(self.0.clone())
    }
}

/// Fails every call.
pub struct FailingOracle;

impl RouteOracle for FailingOracle {
    fn compute_route(&self, _request: &RouteRequest) -> Result<Route, OracleError> {
        Err(OracleError::DataShape("no routes".to_string()))
    }
}

/// Synthesizes a street address from the coordinate.
pub struct StreetGeocoder;

impl ReverseGeocoder for StreetGeocoder {
    fn reverse_geocode(&self, point: GeoPoint) -> Result<String, OracleError> {
        Ok(format!("{:.3} {:.3} Highway 101, CA", point.lat, point.lng))
    }
}

pub struct FailingGeocoder;

impl ReverseGeocoder for FailingGeocoder {
    fn reverse_geocode(&self, _point: GeoPoint) -> Result<String, OracleError> {
        Err(OracleError::DataShape("ZERO_RESULTS".to_string()))
    }
}

/// Posted limit chosen by latitude: slow north of `boundary_lat`, fast south of it.
pub struct SplitSpeedLimits {
    pub boundary_lat: f64,
    pub calls: AtomicUsize,
}

impl SplitSpeedLimits {
    pub fn new(boundary_lat: f64) -> Self {
        Self {
            boundary_lat,
            calls: AtomicUsize::new(0),
        }
    }
}

impl SpeedLimitProvider for SplitSpeedLimits {
    fn speed_limits(&self, path: &[GeoPoint]) -> Result<Vec<Option<f64>>, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(path
            .iter()
            .map(|point| {
                if point.lat > self.boundary_lat {
                    Some(10.0)
                } else {
                    Some(30.0)
                }
            })
            .collect())
    }
}

/// Speed-limit service that is always down.
pub struct FailingSpeedLimits;

impl SpeedLimitProvider for FailingSpeedLimits {
    fn speed_limits(&self, _path: &[GeoPoint]) -> Result<Vec<Option<f64>>, OracleError> {
        Err(OracleError::DataShape("speed limits unavailable".to_string()))
    }
}
