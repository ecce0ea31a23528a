//! focus-route core
//!
//! Splits a drive into focus-sized segments separated by rest stopovers, and
//! animates a marker along the route at realistic, varying speed.

pub mod error;
pub mod geo;
pub mod polyline;
pub mod route;
pub mod traits;
pub mod google;
pub mod timeline;
pub mod speed;
pub mod journey;
pub mod optimizer;
pub mod animator;
pub mod map_view;
