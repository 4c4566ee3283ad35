use std::sync::Arc;
use std::time::Duration;

use cartwatch_core::{Clock, UtcDateTime};
use cartwatch_events::{EventStore, EventStoreError};
use chrono::Duration as ChronoDuration;
use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::engine::{
    aggregate, classify, detect, funnel_overview, group_events, AbandonmentAnalysis,
    FunnelOverview, GroupBy,
};

/// Hard ceiling for one analysis request. The pipeline is cancelled as a
/// unit when it trips; there is no partial result.
const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum FunnelsError {
    #[error("Event store unavailable: {0}")]
    StoreUnavailable(#[from] EventStoreError),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Analysis timed out after {0:?}")]
    Timeout(Duration),
    #[error("Analysis task failed: {0}")]
    Task(String),
}

/// Parameters of one analysis request, before defaults are applied.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub start_date: Option<UtcDateTime>,
    pub end_date: Option<UtcDateTime>,
    pub min_cart_value: Option<f64>,
    pub group_by: Option<GroupBy>,
}

/// The window an analysis actually ran over, defaults resolved.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisWindow {
    pub start_date: UtcDateTime,
    pub end_date: UtcDateTime,
    pub group_by: GroupBy,
}

/// Single-shot batch analysis over the event store.
///
/// Stateless across requests: nothing is cached and no aggregate survives
/// the request that computed it.
pub struct AbandonmentService {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
}

impl AbandonmentService {
    pub fn new(store: Arc<dyn EventStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Run the full abandonment pipeline for one request.
    ///
    /// The store fetch is the only suspension point. The CPU stages run on
    /// a blocking thread: per-group detection fans out over the independent
    /// group arena, aggregation is a single-threaded reduce.
    pub async fn analyze_abandonment(
        &self,
        store_id: i32,
        request: AnalysisRequest,
    ) -> Result<(AbandonmentAnalysis, AnalysisWindow), FunnelsError> {
        let (window, min_cart_value) = self.resolve(request)?;

        let analysis = tokio::time::timeout(ANALYSIS_TIMEOUT, async {
            let records = self
                .store
                .fetch_events(store_id, window.start_date, window.end_date)
                .await?;
            debug!(store_id, records = records.len(), "analyzing abandonment");

            let now = self.clock.now();
            let analysis = tokio::task::spawn_blocking(move || {
                let events: Vec<_> = records.iter().filter_map(classify).collect();
                let groups = group_events(events, window.group_by);
                let abandoned: Vec<_> = groups
                    .par_iter()
                    .filter_map(|group| detect(group, min_cart_value, now))
                    .collect();
                aggregate(&groups, abandoned)
            })
            .await
            .map_err(|e| FunnelsError::Task(e.to_string()))?;

            Ok::<_, FunnelsError>(analysis)
        })
        .await
        .map_err(|_| FunnelsError::Timeout(ANALYSIS_TIMEOUT))??;

        Ok((analysis, window))
    }

    /// Compute sequential step conversion over the same window.
    pub async fn analyze_funnel(
        &self,
        store_id: i32,
        request: AnalysisRequest,
    ) -> Result<(FunnelOverview, AnalysisWindow), FunnelsError> {
        let (window, _) = self.resolve(request)?;

        let overview = tokio::time::timeout(ANALYSIS_TIMEOUT, async {
            let records = self
                .store
                .fetch_events(store_id, window.start_date, window.end_date)
                .await?;
            debug!(store_id, records = records.len(), "analyzing funnel");

            let overview = tokio::task::spawn_blocking(move || {
                let events: Vec<_> = records.iter().filter_map(classify).collect();
                let groups = group_events(events, window.group_by);
                funnel_overview(&groups)
            })
            .await
            .map_err(|e| FunnelsError::Task(e.to_string()))?;

            Ok::<_, FunnelsError>(overview)
        })
        .await
        .map_err(|_| FunnelsError::Timeout(ANALYSIS_TIMEOUT))??;

        Ok((overview, window))
    }

    /// Apply request defaults and validate what cannot be expressed in the
    /// query types themselves.
    fn resolve(&self, request: AnalysisRequest) -> Result<(AnalysisWindow, f64), FunnelsError> {
        let min_cart_value = request.min_cart_value.unwrap_or(0.0);
        if min_cart_value < 0.0 {
            return Err(FunnelsError::InvalidRequest(
                "min_cart_value must be non-negative".to_string(),
            ));
        }

        let end_date = request.end_date.unwrap_or_else(|| self.clock.now());
        let start_date = request
            .start_date
            .unwrap_or_else(|| self.clock.now() - ChronoDuration::days(7));

        let window = AnalysisWindow {
            start_date,
            end_date,
            group_by: request.group_by.unwrap_or_default(),
        };
        Ok((window, min_cart_value))
    }
}
