//! Test fixtures for proximity-cache.
//!
//! Provides:
//! - Real Maltese church locations around a fixed user position
//! - Stub routing provider and manual clock
//! - A base URL with nothing listening, for connection failures

#![allow(dead_code)]

pub mod churches;
pub mod mocks;

pub use churches::*;
pub use mocks::*;
