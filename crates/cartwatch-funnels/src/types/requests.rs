use cartwatch_core::DateTime;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::engine::GroupBy;

/// Query parameters for the abandoned-carts analysis.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AbandonedCartsQuery {
    /// Start of the analysis window (default: 7 days before now)
    pub start_date: Option<DateTime>,
    /// End of the analysis window (default: now)
    pub end_date: Option<DateTime>,
    /// Only report carts worth at least this much (default: 0)
    pub min_cart_value: Option<f64>,
    /// Identifier used to attribute events to one shopper journey
    /// (default: session)
    pub group_by: Option<GroupBy>,
}

/// Query parameters for the funnel overview.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FunnelOverviewQuery {
    /// Start of the analysis window (default: 7 days before now)
    pub start_date: Option<DateTime>,
    /// End of the analysis window (default: now)
    pub end_date: Option<DateTime>,
    /// Identifier used to attribute events to one shopper journey
    /// (default: session)
    pub group_by: Option<GroupBy>,
}
