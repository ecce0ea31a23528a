//! Marker animation along the active route.
//!
//! Journey progress arrives about once per second. [`ProgressAnimator`] turns
//! those steps into a smooth eased motion that the display loop samples on
//! every frame, and [`pose_at_progress`] maps a progress value to a position
//! and heading using the route's speed profile.

use std::time::Duration;

use crate::geo::{GeoPoint, bearing};
use crate::journey::RouteData;
use crate::speed::progress_to_distance;
use crate::timeline::point_at_distance;

/// Forward offset in progress used to derive the heading.
pub const HEADING_EPSILON: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerPose {
    pub position: GeoPoint,
    /// Degrees clockwise from north.
    pub heading: f64,
}

/// Position after `progress` (0..1) of the journey's duration.
pub fn position_at_progress(route: &RouteData, progress: f64) -> Option<GeoPoint> {
    let segments = route.speed_segments.as_deref().unwrap_or(&[]);
    let distance = progress_to_distance(segments, progress, route.total_distance());
    point_at_distance(route.polyline.points(), &route.distances, distance)
}

/// Position and heading after `progress` of the journey.
///
/// The heading points from the position toward the position slightly ahead;
/// at the very end it is taken from slightly behind instead.
pub fn pose_at_progress(route: &RouteData, progress: f64) -> Option<MarkerPose> {
    let progress = progress.clamp(0.0, 1.0);
    let position = position_at_progress(route, progress)?;

    let ahead = position_at_progress(route, (progress + HEADING_EPSILON).min(1.0))?;
    let heading = if ahead != position {
        bearing(position, ahead)
    } else {
        let behind = position_at_progress(route, (progress - HEADING_EPSILON).max(0.0))?;
        if behind != position {
            bearing(behind, position)
        } else {
            0.0
        }
    };

    Some(MarkerPose { position, heading })
}

/// Cubic ease-in-out over `t` in 0..=1.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[derive(Debug, Clone)]
pub struct AnimationConfig {
    /// Length of the eased move between two progress updates.
    pub transition: Duration,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            transition: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationPhase {
    /// Progress is 0 and the marker is hidden.
    Idle,
    Animating,
}

/// Identifies one transition; a display loop holding a stale token should stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionToken(u64);

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: f64,
    to: f64,
    started_at: Duration,
}

/// Eases the displayed progress toward the latest target.
///
/// Times are offsets from any fixed origin chosen by the caller (for example
/// the start of the session), which keeps the animator free of clocks.
#[derive(Debug, Clone)]
pub struct ProgressAnimator {
    config: AnimationConfig,
    displayed: f64,
    target: f64,
    transition: Option<Transition>,
    generation: u64,
}

impl Default for ProgressAnimator {
    fn default() -> Self {
        Self::new(AnimationConfig::default())
    }
}

impl ProgressAnimator {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            displayed: 0.0,
            target: 0.0,
            transition: None,
            generation: 0,
        }
    }

    pub fn phase(&self) -> AnimationPhase {
        if self.target > 0.0 {
            AnimationPhase::Animating
        } else {
            AnimationPhase::Idle
        }
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Starts a transition from the currently displayed progress to `progress`.
    ///
    /// Any transition still in flight is cancelled. A target of 0 resets.
    pub fn set_target(&mut self, progress: f64, now: Duration) -> TransitionToken {
        let progress = progress.clamp(0.0, 1.0);
        if progress <= 0.0 {
            return self.reset();
        }

        let from = self.sample(now);
        self.generation += 1;
        self.target = progress;
        self.transition = Some(Transition {
            from,
            to: progress,
            started_at: now,
        });
        TransitionToken(self.generation)
    }

    /// Back to idle: progress 0, marker hidden, transition cancelled.
    pub fn reset(&mut self) -> TransitionToken {
        self.generation += 1;
        self.displayed = 0.0;
        self.target = 0.0;
        self.transition = None;
        TransitionToken(self.generation)
    }

    pub fn is_current(&self, token: TransitionToken) -> bool {
        token.0 == self.generation
    }

    /// Whether a transition is still easing at `now`.
    pub fn is_transitioning(&self, now: Duration) -> bool {
        self.transition
            .is_some_and(|transition| now.saturating_sub(transition.started_at) < self.config.transition)
    }

    /// Progress to display at `now`.
    pub fn sample(&mut self, now: Duration) -> f64 {
        if let Some(transition) = self.transition {
            let total = self.config.transition.as_secs_f64();
            let elapsed = now.saturating_sub(transition.started_at).as_secs_f64();
            let fraction = if total > 0.0 { elapsed / total } else { 1.0 };

            if fraction >= 1.0 {
                self.displayed = transition.to;
                self.transition = None;
            } else {
                let eased = ease_in_out_cubic(fraction);
                self.displayed = transition.from + (transition.to - transition.from) * eased;
            }
        }
        self.displayed
    }

    /// Marker pose to draw at `now`, or `None` while idle.
    pub fn marker(&mut self, route: &RouteData, now: Duration) -> Option<MarkerPose> {
        if self.phase() == AnimationPhase::Idle {
            return None;
        }
        let progress = self.sample(now);
        pose_at_progress(route, progress)
    }
}
