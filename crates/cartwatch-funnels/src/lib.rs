//! Cart-abandonment funnel analytics
//!
//! Takes the raw interaction stream for a time window and derives, per
//! shopper journey, whether a cart was abandoned, what it was worth and
//! where in the funnel it was lost, then reduces everything into summary
//! metrics.

pub mod engine;
pub mod handlers;
pub mod plugin;
pub mod services;
pub mod types;

// Re-export plugin
pub use plugin::FunnelsPlugin;
