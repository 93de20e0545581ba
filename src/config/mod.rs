//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (batch sizes, thresholds, defaults)
//! - Library configuration and logging option types

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, LogFormat, LogLevel};
