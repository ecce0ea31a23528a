//! Time-parameterized route geometry.
//!
//! A route's legs and steps are flattened into a monotone series of
//! [`TimePoint`]s so a position can be looked up by elapsed travel time, or by
//! travelled distance through the route's cumulative distance table.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::geo::{GeoPoint, haversine_distance};
use crate::polyline;
use crate::route::RouteLeg;

/// Assumed average surface-road driving speed (about 30 mph), in meters/second.
///
/// Only used when the routing oracle reports no timing for a stretch of road.
pub const FALLBACK_SPEED_MPS: f64 = 13.4;

/// A route vertex with the travel time from the origin to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub point: GeoPoint,
    /// Seconds since the origin.
    pub elapsed: f64,
}

/// Duration to use for a step: the reported one, or an estimate from its length.
pub fn effective_step_duration(reported: f64, distance_meters: f64) -> f64 {
    if reported > 0.0 {
        reported
    } else if distance_meters > 0.0 {
        distance_meters / FALLBACK_SPEED_MPS
    } else {
        0.0
    }
}

/// Flattens route legs into a non-decreasing time series.
///
/// Each step's duration is spread over its vertices in proportion to the
/// length of each sub-segment. Steps whose geometry has fewer than two points
/// only advance the clock. Consecutive identical coordinates collapse into one
/// sample that keeps the later time, and the first sample is pinned to 0.
pub fn build_time_points(legs: &[RouteLeg]) -> Result<Vec<TimePoint>, DecodeError> {
    let mut series: Vec<TimePoint> = Vec::new();
    let mut cumulative = 0.0;

    for step in legs.iter().flat_map(|leg| leg.steps.iter()) {
        let points = polyline::decode(&step.polyline)?.into_points();
        if points.len() < 2 {
            cumulative += step.duration.max(0.0);
            continue;
        }

        let segments: Vec<f64> = points
            .windows(2)
            .map(|pair| haversine_distance(pair[0], pair[1]))
            .collect();
        let vertex_total: f64 = segments.iter().sum();
        let step_distance = if step.distance_meters > 0.0 {
            step.distance_meters
        } else {
            vertex_total
        };
        let duration = effective_step_duration(step.duration, step_distance);

        push_sample(&mut series, points[0], cumulative);
        for (i, length) in segments.iter().enumerate() {
            let share = if vertex_total > 0.0 {
                length / vertex_total
            } else {
                1.0 / segments.len() as f64
            };
            cumulative += duration * share;
            push_sample(&mut series, points[i + 1], cumulative);
        }
    }

    if let Some(first) = series.first_mut() {
        first.elapsed = 0.0;
    }

    Ok(series)
}

fn push_sample(series: &mut Vec<TimePoint>, point: GeoPoint, elapsed: f64) {
    match series.last_mut() {
        Some(last) if last.point == point => last.elapsed = last.elapsed.max(elapsed),
        _ => series.push(TimePoint { point, elapsed }),
    }
}

/// True when the series carries real timing rather than all-zero times.
pub fn has_timing(series: &[TimePoint]) -> bool {
    series.len() >= 2 && series.last().is_some_and(|last| last.elapsed > 0.0)
}

/// Position reached after `target` seconds of travel.
///
/// Clamps to the first/last sample outside the series' time range. Returns
/// `None` only for an empty series.
pub fn point_at_time(series: &[TimePoint], target: f64) -> Option<GeoPoint> {
    interpolate(series.len(), |i| series[i].elapsed, |i| series[i].point, target)
}

/// Position reached after travelling `target` meters along `points`.
///
/// `distances` is the cumulative distance table of `points`. Returns `None`
/// when the inputs are empty or not aligned.
pub fn point_at_distance(points: &[GeoPoint], distances: &[f64], target: f64) -> Option<GeoPoint> {
    if points.len() != distances.len() {
        return None;
    }
    interpolate(points.len(), |i| distances[i], |i| points[i], target)
}

fn interpolate(
    len: usize,
    key: impl Fn(usize) -> f64,
    point: impl Fn(usize) -> GeoPoint,
    target: f64,
) -> Option<GeoPoint> {
    if len == 0 {
        return None;
    }
    if target <= key(0) {
        return Some(point(0));
    }

    for i in 1..len {
        let current = key(i);
        if current >= target {
            let previous = key(i - 1);
            let span = current - previous;
            if span <= 0.0 {
                return Some(point(i));
            }
            let t = ((target - previous) / span).clamp(0.0, 1.0);
            return Some(point(i - 1).lerp(point(i), t));
        }
    }

    Some(point(len - 1))
}
