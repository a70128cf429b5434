//! proximity-cache
//!
//! Nearest-first, distance-annotated views of a set of places, with a
//! two-tier accuracy model (great-circle estimates, routed refinement of
//! the nearest few) and a persisted cache invalidated by age or movement.

pub mod config;
pub mod error;
pub mod geo;
pub mod haversine;
pub mod model;
pub mod nearest;
pub mod orchestrator;
pub mod ors;
pub mod osrm;
pub mod policy;
pub mod refine;
pub mod scheduler;
pub mod store;
pub mod traits;
