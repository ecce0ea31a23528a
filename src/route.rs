//! Route shapes exchanged with the routing oracle.
//!
//! Geometry stays encoded here; callers decode what they need.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Maximum intermediate waypoints per route query (25 including origin and destination).
pub const MAX_WAYPOINTS: usize = 23;

/// How much of the route the caller needs back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDetail {
    /// Duration, distance, overview polyline, legs and steps.
    Full,
    /// Per-leg durations only.
    LegDurations,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub intermediates: Vec<GeoPoint>,
    pub detail: RouteDetail,
}

impl RouteRequest {
    pub fn full(origin: GeoPoint, destination: GeoPoint) -> Self {
        Self {
            origin,
            destination,
            intermediates: Vec::new(),
            detail: RouteDetail::Full,
        }
    }

    pub fn with_intermediates(mut self, intermediates: Vec<GeoPoint>) -> Self {
        self.intermediates = intermediates;
        self
    }

    pub fn with_detail(mut self, detail: RouteDetail) -> Self {
        self.detail = detail;
        self
    }
}

/// One step of a leg: a short stretch with its own geometry and timing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub distance_meters: f64,
    /// Traffic-free duration in seconds.
    pub duration: f64,
    pub polyline: String,
}

/// One hop between consecutive waypoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub duration: f64,
    pub distance_meters: f64,
    pub start_location: Option<GeoPoint>,
    pub end_location: Option<GeoPoint>,
    pub steps: Vec<RouteStep>,
}

/// The first route of an oracle response.
///
/// Fields outside the requested [`RouteDetail`] are left at their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub duration: f64,
    pub distance_meters: f64,
    pub polyline: String,
    pub legs: Vec<RouteLeg>,
}

impl Route {
    pub fn leg_durations(&self) -> Vec<f64> {
        self.legs.iter().map(|leg| leg.duration).collect()
    }
}
