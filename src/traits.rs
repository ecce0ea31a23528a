//! Seams to the external services.
//!
//! The planning code only talks to these traits; [`crate::google::RoutesClient`]
//! implements all of them over HTTP and tests substitute in-memory fakes.

use crate::error::OracleError;
use crate::geo::GeoPoint;
use crate::route::{Route, RouteRequest};

/// Computes driving routes.
pub trait RouteOracle {
    /// Returns the first route for the request.
    ///
    /// A response without any route is [`OracleError::DataShape`].
    fn compute_route(&self, request: &RouteRequest) -> Result<Route, OracleError>;
}

/// Turns a coordinate into a display address.
pub trait ReverseGeocoder {
    fn reverse_geocode(&self, point: GeoPoint) -> Result<String, OracleError>;
}

/// Looks up posted speed limits along a path.
pub trait SpeedLimitProvider {
    /// Speed limit in meters/second for each input point, `None` where unknown.
    ///
    /// The returned vector has the same length as `path`.
    fn speed_limits(&self, path: &[GeoPoint]) -> Result<Vec<Option<f64>>, OracleError>;
}
