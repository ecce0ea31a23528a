//! Stopover suggestion.
//!
//! Splits a drive into legs of roughly [`IDEAL_SEGMENT_SECONDS`] by placing
//! candidate stopovers at even time intervals along the unmodified route, then
//! asking the routing oracle what the legs actually take with those stops in
//! place and nudging the segment count up or down a bounded number of times.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::geo::{GeoPoint, cumulative_distances};
use crate::journey::{DEFAULT_REST_MINUTES, Stopover};
use crate::polyline;
use crate::route::{MAX_WAYPOINTS, Route, RouteDetail, RouteRequest};
use crate::timeline::{TimePoint, build_time_points, has_timing, point_at_distance, point_at_time};
use crate::traits::{ReverseGeocoder, RouteOracle};

/// Target leg duration (25 minutes).
pub const IDEAL_SEGMENT_SECONDS: f64 = 1500.0;
/// Shortest acceptable leg (20 minutes).
pub const MIN_IDEAL_SEGMENT_SECONDS: f64 = 1200.0;
/// Longest acceptable leg (30 minutes).
pub const MAX_IDEAL_SEGMENT_SECONDS: f64 = 1800.0;
pub const MAX_AUTO_STOPOVERS: usize = MAX_WAYPOINTS;
pub const MAX_REFINEMENT_ATTEMPTS: usize = 4;

#[derive(Debug, Clone)]
pub struct SuggestOptions {
    /// Upper bound on suggested stopovers; never above [`MAX_AUTO_STOPOVERS`].
    pub max_stopovers: usize,
    pub rest_duration_minutes: u32,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        Self {
            max_stopovers: MAX_AUTO_STOPOVERS,
            rest_duration_minutes: DEFAULT_REST_MINUTES,
        }
    }
}

/// Number of segments a drive of `total_duration` seconds should be split into.
pub fn ideal_segments(total_duration: f64) -> usize {
    if total_duration <= 0.0 {
        return 1;
    }
    ((total_duration / IDEAL_SEGMENT_SECONDS).round() as usize).max(1)
}

/// Bounds for the segment-count search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Largest segment count that may be tried.
    pub ceiling: usize,
    /// Shrinking is only allowed above this count, since fewer segments
    /// would force some leg past [`MAX_IDEAL_SEGMENT_SECONDS`].
    pub shrink_floor: usize,
    pub max_attempts: usize,
}

impl SearchLimits {
    pub fn new(total_duration: f64, max_stopovers: usize) -> Self {
        let max_stopovers = max_stopovers.min(MAX_AUTO_STOPOVERS);
        let shrink_floor = (total_duration.max(0.0) / MAX_IDEAL_SEGMENT_SECONDS).ceil() as usize;
        Self {
            ceiling: max_stopovers + 1,
            shrink_floor: shrink_floor.max(1),
            max_attempts: MAX_REFINEMENT_ATTEMPTS,
        }
    }
}

/// What to do after measuring the legs of one candidate arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    /// Every leg is inside the ideal window.
    Accept,
    /// Some leg is too long and another segment fits under the ceiling.
    Grow,
    /// Some leg is too short and one segment fewer keeps legs under the max.
    Shrink,
    /// Out of room to move; keep what we have.
    Settle,
}

/// Grow is checked before shrink: long legs are worse for focus than short ones.
pub fn assess_legs(leg_durations: &[f64], segments: usize, limits: &SearchLimits) -> Adjustment {
    let too_long = leg_durations
        .iter()
        .any(|duration| *duration > MAX_IDEAL_SEGMENT_SECONDS);
    let too_short = leg_durations
        .iter()
        .any(|duration| *duration < MIN_IDEAL_SEGMENT_SECONDS);

    if !too_long && !too_short {
        Adjustment::Accept
    } else if too_long && segments < limits.ceiling {
        Adjustment::Grow
    } else if too_short && segments > limits.shrink_floor {
        Adjustment::Shrink
    } else {
        Adjustment::Settle
    }
}

/// State of the bounded segment-count search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Searching {
        /// Zero-based attempt about to run.
        attempt: usize,
        segments: usize,
        /// Last candidate set the oracle measured successfully.
        best: Option<Vec<GeoPoint>>,
    },
    Accepted(Vec<GeoPoint>),
    /// Stopped without an accepted arrangement; holds the best effort.
    Exhausted(Vec<GeoPoint>),
    Failed,
}

impl SearchState {
    pub fn start(segments: usize) -> Self {
        SearchState::Searching {
            attempt: 0,
            segments,
            best: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SearchState::Searching { .. })
    }

    /// Transition after measuring `candidates`.
    ///
    /// `leg_durations` is `None` when the oracle call failed or returned no legs.
    pub fn advance(
        self,
        candidates: Vec<GeoPoint>,
        leg_durations: Option<&[f64]>,
        limits: &SearchLimits,
    ) -> SearchState {
        let (attempt, segments, best) = match self {
            SearchState::Searching {
                attempt,
                segments,
                best,
            } => (attempt, segments, best),
            terminal => return terminal,
        };

        let Some(legs) = leg_durations.filter(|legs| !legs.is_empty()) else {
            return best.map_or(SearchState::Failed, SearchState::Exhausted);
        };

        let adjustment = assess_legs(legs, segments, limits);
        debug!(attempt, segments, ?adjustment, "assessed candidate legs");

        let segments = match adjustment {
            Adjustment::Accept | Adjustment::Settle => return SearchState::Accepted(candidates),
            Adjustment::Grow => segments + 1,
            Adjustment::Shrink => segments.saturating_sub(1).max(1),
        };
        if attempt + 1 >= limits.max_attempts {
            return SearchState::Exhausted(candidates);
        }

        SearchState::Searching {
            attempt: attempt + 1,
            segments,
            best: Some(candidates),
        }
    }

    /// The chosen stops, empty unless the search produced any.
    pub fn into_stops(self) -> Vec<GeoPoint> {
        match self {
            SearchState::Accepted(stops) | SearchState::Exhausted(stops) => stops,
            SearchState::Searching { .. } | SearchState::Failed => Vec::new(),
        }
    }
}

/// Geometry of the unmodified route used to place candidates.
struct RouteTrack {
    points: Vec<GeoPoint>,
    distances: Vec<f64>,
    time_points: Vec<TimePoint>,
}

impl RouteTrack {
    fn from_route(route: &Route) -> Option<Self> {
        let points = match polyline::decode(&route.polyline) {
            Ok(polyline) => polyline.into_points(),
            Err(err) => {
                warn!(%err, "route polyline could not be decoded");
                return None;
            }
        };
        let time_points = match build_time_points(&route.legs) {
            Ok(series) => series,
            Err(err) => {
                warn!(%err, "route step polyline could not be decoded");
                return None;
            }
        };
        let distances = cumulative_distances(&points);

        Some(Self {
            points,
            distances,
            time_points,
        })
    }

    /// Stops splitting a drive of `total_duration` seconds into `segments` parts.
    ///
    /// Stop `i` sits where the step timing reaches `i * total_duration / segments`.
    /// Without step timing the stops are spread evenly by distance instead.
    fn candidates(&self, segments: usize, total_duration: f64) -> Vec<GeoPoint> {
        let timed = has_timing(&self.time_points);
        let total_distance = self.distances.last().copied().unwrap_or(0.0);

        (1..segments)
            .filter_map(|i| {
                let fraction = i as f64 / segments as f64;
                if timed {
                    point_at_time(&self.time_points, total_duration * fraction)
                } else {
                    point_at_distance(&self.points, &self.distances, total_distance * fraction)
                }
            })
            .collect()
    }
}

/// Suggests stopovers that split the drive into focus-sized legs.
///
/// Never fails: any oracle or data problem yields an empty list.
pub fn suggest_stopovers<O, G>(
    oracle: &O,
    geocoder: &G,
    origin: GeoPoint,
    destination: GeoPoint,
    options: &SuggestOptions,
) -> Vec<Stopover>
where
    O: RouteOracle + ?Sized,
    G: ReverseGeocoder + Sync + ?Sized,
{
    if options.max_stopovers == 0 {
        return Vec::new();
    }

    let route = match oracle.compute_route(&RouteRequest::full(origin, destination)) {
        Ok(route) => route,
        Err(err) => {
            warn!(%err, "could not compute base route for stopover suggestion");
            return Vec::new();
        }
    };

    let stops = plan_stops(oracle, origin, destination, &route, options.max_stopovers);
    label_stops(geocoder, stops, options.rest_duration_minutes)
}

/// Runs the segment-count search against an already computed base route.
pub fn plan_stops<O>(
    oracle: &O,
    origin: GeoPoint,
    destination: GeoPoint,
    route: &Route,
    max_stopovers: usize,
) -> Vec<GeoPoint>
where
    O: RouteOracle + ?Sized,
{
    let total_duration = route.duration;
    let ideal = ideal_segments(total_duration);
    let stop_budget = ideal.saturating_sub(1).min(max_stopovers.min(MAX_AUTO_STOPOVERS));
    if stop_budget == 0 {
        debug!(total_duration, "route fits in one segment");
        return Vec::new();
    }

    let Some(track) = RouteTrack::from_route(route) else {
        return Vec::new();
    };

    let limits = SearchLimits::new(total_duration, max_stopovers);
    let mut state = SearchState::start(ideal.clamp(1, limits.ceiling));

    while let SearchState::Searching { segments, .. } = state {
        let requested = segments - 1;
        let candidates = track.candidates(segments, total_duration);
        if candidates.len() < requested {
            warn!(
                requested,
                produced = candidates.len(),
                "route data too sparse to place stopovers"
            );
            state = SearchState::Failed;
            break;
        }

        let request = RouteRequest::full(origin, destination)
            .with_intermediates(candidates.clone())
            .with_detail(RouteDetail::LegDurations);
        let legs = match oracle.compute_route(&request) {
            Ok(measured) => Some(measured.leg_durations()),
            Err(err) => {
                warn!(%err, segments, "leg measurement failed");
                None
            }
        };

        state = state.advance(candidates, legs.as_deref(), &limits);
    }

    state.into_stops()
}

fn label_stops<G>(geocoder: &G, stops: Vec<GeoPoint>, rest_duration_minutes: u32) -> Vec<Stopover>
where
    G: ReverseGeocoder + Sync + ?Sized,
{
    let segments = stops.len() + 1;
    stops
        .par_iter()
        .enumerate()
        .map(|(i, &location)| {
            let address = geocoder.reverse_geocode(location).unwrap_or_else(|err| {
                debug!(%err, stop = i + 1, "reverse geocoding failed");
                fallback_label(i + 1, location)
            });
            Stopover {
                location,
                address: Some(address),
                time_percentage: 100.0 * (i + 1) as f64 / segments as f64,
                rest_duration_minutes,
            }
        })
        .collect()
}

/// Label used when no address is available, e.g. `Stop 2 (37.7749, -122.4194)`.
pub fn fallback_label(number: usize, location: GeoPoint) -> String {
    format!("Stop {} ({:.4}, {:.4})", number, location.lat, location.lng)
}
