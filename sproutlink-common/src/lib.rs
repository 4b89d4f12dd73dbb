//! Shared library for the sproutlink backend
//!
//! Holds the pieces that are not specific to any one HTTP surface:
//! common error types, configuration loading, and human-readable
//! timestamp formatting for donor-facing views.

pub mod config;
pub mod error;
pub mod human_time;

pub use error::{Error, Result};
