//! Piecewise speed model used to animate progress at realistic, varying speed.
//!
//! A series of [`SpeedSegment`]s partitions `[0, total_distance]` of a route
//! and its durations add up to the route's total duration. Segments come from
//! the oracle's per-step timing, or optionally from posted speed limits.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::geo::{GeoPoint, cumulative_distances};
use crate::polyline;
use crate::route::RouteLeg;
use crate::timeline::{FALLBACK_SPEED_MPS, effective_step_duration};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedSegment {
    pub start_distance: f64,
    pub end_distance: f64,
    /// Seconds spent travelling this segment.
    pub duration: f64,
    /// Meters/second.
    pub speed: f64,
}

impl SpeedSegment {
    fn new(start_distance: f64, end_distance: f64, duration: f64) -> Self {
        let speed = if duration > 0.0 {
            (end_distance - start_distance) / duration
        } else {
            FALLBACK_SPEED_MPS
        };
        Self {
            start_distance,
            end_distance,
            duration,
            speed,
        }
    }
}

pub fn total_duration(segments: &[SpeedSegment]) -> f64 {
    segments.iter().map(|segment| segment.duration).sum()
}

/// Builds segments from the route's steps.
///
/// Step distances are rescaled onto `total_distance` (the length of the decoded
/// overview polyline) and durations onto `total_duration`, so the series lines
/// up with the distance table used for positioning. Returns an empty series
/// when the steps carry no usable distance or timing.
pub fn from_steps(
    legs: &[RouteLeg],
    total_distance: f64,
    total_duration: f64,
) -> Result<Vec<SpeedSegment>, DecodeError> {
    let mut raw = Vec::new();

    for step in legs.iter().flat_map(|leg| leg.steps.iter()) {
        let distance = if step.distance_meters > 0.0 {
            step.distance_meters
        } else {
            let points = polyline::decode(&step.polyline)?.into_points();
            cumulative_distances(&points).last().copied().unwrap_or(0.0)
        };
        let duration = effective_step_duration(step.duration, distance);
        if distance > 0.0 || duration > 0.0 {
            raw.push((distance, duration));
        }
    }

    Ok(normalize(&raw, total_distance, total_duration))
}

/// Builds segments from per-vertex speed limits (meters/second).
///
/// Each polyline sub-segment is timed at the limit of its start vertex (or its
/// end vertex, or the fallback speed), consecutive sub-segments at the same
/// speed are merged, and the durations are then scaled to `total_duration` so
/// only the relative speed profile comes from the limits. Returns an empty
/// series when no limit is known.
pub fn from_speed_limits(
    points: &[GeoPoint],
    distances: &[f64],
    limits: &[Option<f64>],
    total_duration: f64,
) -> Vec<SpeedSegment> {
    let usable = |i: usize| limits.get(i).copied().flatten().filter(|speed| *speed > 0.0);
    if points.len() != distances.len() || !(0..points.len()).any(|i| usable(i).is_some()) {
        return Vec::new();
    }

    let mut raw: Vec<(f64, f64)> = Vec::new();
    let mut last_speed: Option<f64> = None;
    for i in 1..points.len() {
        let length = distances[i] - distances[i - 1];
        if length <= 0.0 {
            continue;
        }
        let speed = usable(i - 1).or_else(|| usable(i)).unwrap_or(FALLBACK_SPEED_MPS);
        match raw.last_mut() {
            Some(last) if last_speed == Some(speed) => {
                last.0 += length;
                last.1 += length / speed;
            }
            _ => raw.push((length, length / speed)),
        }
        last_speed = Some(speed);
    }

    let total_distance = distances.last().copied().unwrap_or(0.0);
    normalize(&raw, total_distance, total_duration)
}

fn normalize(raw: &[(f64, f64)], total_distance: f64, total_duration: f64) -> Vec<SpeedSegment> {
    let raw_distance: f64 = raw.iter().map(|(distance, _)| distance).sum();
    let raw_duration: f64 = raw.iter().map(|(_, duration)| duration).sum();
    if raw_distance <= 0.0 || raw_duration <= 0.0 {
        return Vec::new();
    }

    let (distance_scale, end) = if total_distance > 0.0 {
        (total_distance / raw_distance, total_distance)
    } else {
        (1.0, raw_distance)
    };
    let duration_scale = if total_duration > 0.0 {
        total_duration / raw_duration
    } else {
        1.0
    };
    let mut segments = Vec::with_capacity(raw.len());
    let mut cursor = 0.0;
    for (i, (distance, duration)) in raw.iter().enumerate() {
        let next = if i + 1 == raw.len() {
            end
        } else {
            cursor + distance * distance_scale
        };
        segments.push(SpeedSegment::new(cursor, next, duration * duration_scale));
        cursor = next;
    }

    segments
}

/// Distance travelled after `progress` (0..1) of the journey's duration.
///
/// Walks the speed segments when present; otherwise assumes constant speed
/// over `total_distance`.
pub fn progress_to_distance(segments: &[SpeedSegment], progress: f64, total_distance: f64) -> f64 {
    let progress = progress.clamp(0.0, 1.0);
    let total = total_duration(segments);
    if segments.is_empty() || total <= 0.0 {
        return progress * total_distance;
    }

    let elapsed = progress * total;
    let mut accumulated = 0.0;
    for segment in segments {
        if elapsed <= accumulated + segment.duration {
            let within = (elapsed - accumulated).max(0.0);
            return (segment.start_distance + within * segment.speed).min(segment.end_distance);
        }
        accumulated += segment.duration;
    }

    segments.last().map(|segment| segment.end_distance).unwrap_or(0.0)
}
