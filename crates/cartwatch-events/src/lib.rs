//! Event Store collaborator for the Cartwatch analytics engine
//!
//! Exposes raw interaction records for an arbitrary time window. The engine
//! treats this as a read-only source; it does not own the schema or the
//! storage engine behind it.

pub mod plugin;
pub mod store;

// Re-export main types
pub use plugin::EventStorePlugin;
pub use store::{EventStore, EventStoreError, SqlEventStore};
