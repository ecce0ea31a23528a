//! Camera state for the journey map.
//!
//! The view is a plain value updated only through [`MapViewState::reduce`], so
//! user gestures and live marker updates are applied in one place and in the
//! order they arrive.

use serde::{Deserialize, Serialize};

use crate::animator::MarkerPose;
use crate::geo::GeoPoint;

pub const MAX_TILT: f64 = 67.5;
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 22.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapViewState {
    pub center: GeoPoint,
    pub zoom: f64,
    /// Degrees clockwise from north.
    pub heading: f64,
    pub tilt: f64,
    /// When set, marker updates move the camera.
    pub follow: bool,
}

impl Default for MapViewState {
    fn default() -> Self {
        Self {
            center: GeoPoint::new(0.0, 0.0),
            zoom: 12.0,
            heading: 0.0,
            tilt: 0.0,
            follow: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapIntent {
    /// Explicit recentering; releases follow mode.
    CenterOn(GeoPoint),
    SetZoom(f64),
    SetHeading(f64),
    SetTilt(f64),
    Follow,
    ReleaseFollow,
    /// The animated marker moved.
    MarkerMoved(MarkerPose),
}

impl MapViewState {
    pub fn reduce(self, intent: MapIntent) -> Self {
        match intent {
            MapIntent::CenterOn(center) => Self {
                center,
                follow: false,
                ..self
            },
            MapIntent::SetZoom(zoom) => Self {
                zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
                ..self
            },
            MapIntent::SetHeading(heading) => Self {
                heading: heading.rem_euclid(360.0),
                ..self
            },
            MapIntent::SetTilt(tilt) => Self {
                tilt: tilt.clamp(0.0, MAX_TILT),
                ..self
            },
            MapIntent::Follow => Self {
                follow: true,
                ..self
            },
            MapIntent::ReleaseFollow => Self {
                follow: false,
                ..self
            },
            MapIntent::MarkerMoved(pose) if self.follow => Self {
                center: pose.position,
                heading: pose.heading.rem_euclid(360.0),
                ..self
            },
            MapIntent::MarkerMoved(_) => self,
        }
    }
}
