//! Core utilities and types shared across all Cartwatch crates

pub mod clock;
pub mod error_builder;
pub mod plugin;
pub mod problemdetails;
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, SystemClock};
pub use error_builder::*;

// Re-export external dependencies
pub use chrono;
pub use serde;
pub use serde_json;
pub use thiserror;
pub use tracing;

// Re-export standard datetime types for use across all crates
pub use types::{DBDateTime, DateTime, UtcDateTime};
