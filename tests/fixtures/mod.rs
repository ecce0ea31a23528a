//! Test fixtures for focus-route.
//!
//! Provides:
//! - Real Northern California locations
//! - Synthetic routes with controllable timing
//! - In-memory oracles and geocoders

#![allow(dead_code)]

pub mod locations;
pub mod routes;

pub use locations::*;
pub use routes::*;
