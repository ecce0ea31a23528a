//! Encoded polyline codec.
//!
//! Routing responses carry geometry in the compact "encoded polyline" format:
//! each coordinate is stored as a delta from the previous one, scaled by 1e5,
//! zig-zag signed and split into 5-bit chunks offset by 63 with 0x20 as the
//! continuation bit. Geometry is decoded once at the boundary and handled as
//! [`Polyline`] everywhere else.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::geo::GeoPoint;

const PRECISION: f64 = 1e5;
const CHUNK_OFFSET: u8 = 63;
const CONTINUATION: i64 = 0x20;
const CHUNK_MASK: i64 = 0x1f;

/// A decoded route geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<GeoPoint>,
}

impl Polyline {
    /// Creates a new Polyline from decoded coordinate points.
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<GeoPoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Decodes an encoded polyline string.
///
/// An empty string decodes to an empty polyline. Truncated input is an error;
/// no partial point is ever produced.
pub fn decode(encoded: &str) -> Result<Polyline, DecodeError> {
    let bytes = encoded.as_bytes();
    let mut position = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut points = Vec::new();

    while position < bytes.len() {
        let d_lat = next_value(bytes, &mut position)?;
        if position >= bytes.len() {
            return Err(DecodeError::MissingLongitude { position });
        }
        let d_lng = next_value(bytes, &mut position)?;

        lat += d_lat;
        lng += d_lng;
        points.push(GeoPoint::new(lat as f64 / PRECISION, lng as f64 / PRECISION));
    }

    Ok(Polyline::new(points))
}

/// Encodes points with the same scheme [`decode`] reads.
pub fn encode(points: &[GeoPoint]) -> String {
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in points {
        let lat = (point.lat * PRECISION).round() as i64;
        let lng = (point.lng * PRECISION).round() as i64;
        push_value(&mut out, lat - prev_lat);
        push_value(&mut out, lng - prev_lng);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

fn next_value(bytes: &[u8], position: &mut usize) -> Result<i64, DecodeError> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let Some(&byte) = bytes.get(*position) else {
            return Err(DecodeError::Truncated { position: *position });
        };
        if !(CHUNK_OFFSET..=126).contains(&byte) {
            return Err(DecodeError::InvalidByte {
                position: *position,
                byte,
            });
        }
        if shift > 30 {
            return Err(DecodeError::Overflow { position: *position });
        }

        let chunk = (byte - CHUNK_OFFSET) as i64;
        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;
        *position += 1;

        if chunk & CONTINUATION == 0 {
            break;
        }
    }

    Ok(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
}

fn push_value(out: &mut String, value: i64) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };
    while v >= CONTINUATION {
        out.push((((v & CHUNK_MASK) | CONTINUATION) as u8 + CHUNK_OFFSET) as char);
        v >>= 5;
    }
    out.push((v as u8 + CHUNK_OFFSET) as char);
}
