//! Real Northern California locations for trip fixtures.
//!
//! Coordinates sourced from OpenStreetMap. Pairs are chosen so the straight
//! drives between them span a range of durations.

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn point(&self) -> focus_route::geo::GeoPoint {
        focus_route::geo::GeoPoint::new(self.lat, self.lng)
    }
}

pub const SAN_FRANCISCO_FERRY_BUILDING: Location =
    Location::new("Ferry Building", 37.7955, -122.3937);
pub const SAN_JOSE_DIRIDON: Location = Location::new("San Jose Diridon Station", 37.3297, -121.9024);
pub const SACRAMENTO_CAPITOL: Location = Location::new("California State Capitol", 38.5766, -121.4934);
pub const MONTEREY_WHARF: Location = Location::new("Old Fisherman's Wharf", 36.6040, -121.8931);
pub const OAKLAND_JACK_LONDON: Location = Location::new("Jack London Square", 37.7948, -122.2770);
