//! Database entities for the Cartwatch platform

pub mod interaction_events;
