//! The analysis pipeline, leaves first: classifier, grouping, detector,
//! aggregator. Data flows strictly forward; every stage is a pure function
//! over data owned by the current request and nothing in here touches the
//! database or the wall clock.

pub mod aggregator;
pub mod classifier;
pub mod detector;
pub mod grouping;

pub use aggregator::{
    aggregate, funnel_overview, AbandonmentAnalysis, AbandonmentSummary, BreakdownEntry,
    FunnelOverview, StepConversion,
};
pub use classifier::{classify, CartProduct, FunnelEvent, FunnelStep};
pub use detector::{detect, AbandonedCart};
pub use grouping::{group_events, EventGroup, GroupBy};
