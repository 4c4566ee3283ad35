pub mod service;

pub use service::{AbandonmentService, AnalysisRequest, AnalysisWindow, FunnelsError};
