//! # Unit Components
//!
//! Tests grouped by the module they exercise, plus property tests over the
//! translation and access contracts.

/// Plusarg, JSON and number parsing.
pub mod config;
