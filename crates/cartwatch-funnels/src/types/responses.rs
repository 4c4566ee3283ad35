use cartwatch_core::UtcDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Aggregate metrics over one analysis window
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AbandonmentSummaryResponse {
    pub total_carts: u64,
    pub total_purchases: u64,
    pub total_abandoned: u64,
    pub total_abandoned_value: f64,
    /// Percentage of carts lost, rounded to two decimals
    pub abandonment_rate: f64,
    pub average_cart_value: f64,
    /// Mean minutes between the last cart activity and now
    pub average_time_to_abandonment: f64,
}

/// One product entry of an abandoned cart
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartProductResponse {
    pub product_id: String,
    pub product_name: String,
    pub price: f64,
    pub quantity: f64,
}

/// One abandoned cart
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AbandonedCartResponse {
    pub identifier: String,
    /// Which identifier the journey was grouped by (session, visitor, user)
    pub identifier_type: String,
    #[schema(value_type = String, format = DateTime)]
    pub last_event_at: UtcDateTime,
    pub last_page: String,
    pub last_action: String,
    pub cart_value: f64,
    pub products: Vec<CartProductResponse>,
    pub seconds_since_abandonment: i64,
}

/// Abandonment frequency for one page
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PageBreakdownItem {
    pub page: String,
    pub count: u64,
    pub percentage: f64,
}

/// Abandonment frequency for one funnel step
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StepBreakdownItem {
    pub step: String,
    pub count: u64,
    pub percentage: f64,
}

/// Window and grouping an analysis actually ran over
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalysisPeriod {
    #[schema(value_type = String, format = DateTime)]
    pub start_date: UtcDateTime,
    #[schema(value_type = String, format = DateTime)]
    pub end_date: UtcDateTime,
    pub group_by: String,
}

/// Full abandoned-carts analysis response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AbandonedCartsResponse {
    pub summary: AbandonmentSummaryResponse,
    pub abandonment_by_page: Vec<PageBreakdownItem>,
    pub abandonment_by_step: Vec<StepBreakdownItem>,
    /// Sorted descending by cart value
    pub abandoned_carts: Vec<AbandonedCartResponse>,
    pub period: AnalysisPeriod,
}

/// Conversion numbers for one funnel stage
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StepConversionResponse {
    pub step: String,
    pub completions: u64,
    /// Percentage of the previous stage that reached this one
    pub conversion_rate: f64,
    pub drop_off_rate: f64,
    pub average_time_from_previous_seconds: f64,
}

/// Sequential funnel progression response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FunnelOverviewResponse {
    pub total_entries: u64,
    pub steps: Vec<StepConversionResponse>,
    pub overall_conversion_rate: f64,
    pub period: AnalysisPeriod,
}
