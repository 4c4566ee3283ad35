use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use tracing::error;

use cartwatch_core::error_builder::ErrorBuilder;
use cartwatch_core::problemdetails::Problem;

use super::types::AppState;
use crate::engine::{AbandonedCart, AbandonmentAnalysis, FunnelOverview};
use crate::services::{AnalysisRequest, AnalysisWindow, FunnelsError};
use crate::types::requests::{AbandonedCartsQuery, FunnelOverviewQuery};
use crate::types::responses::{
    AbandonedCartResponse, AbandonedCartsResponse, AbandonmentSummaryResponse, AnalysisPeriod,
    CartProductResponse, FunnelOverviewResponse, PageBreakdownItem, StepBreakdownItem,
    StepConversionResponse,
};

/// Analyze abandoned carts for a store
#[utoipa::path(
    get,
    path = "/stores/{store_id}/abandoned-carts",
    params(
        ("store_id" = i32, Path, description = "Store ID"),
        ("start_date" = Option<String>, Query, description = "Start of the analysis window (ISO 8601, default: 7 days ago)"),
        ("end_date" = Option<String>, Query, description = "End of the analysis window (ISO 8601, default: now)"),
        ("min_cart_value" = Option<f64>, Query, description = "Minimum cart value to report (default: 0)"),
        ("group_by" = Option<String>, Query, description = "Grouping identifier: session, visitor, or user (default: session)")
    ),
    responses(
        (status = 200, description = "Abandonment analysis computed successfully", body = AbandonedCartsResponse),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error"),
        (status = 503, description = "Event store unavailable"),
        (status = 504, description = "Analysis timed out")
    ),
    tag = "Abandonment"
)]
pub async fn get_abandoned_carts(
    State(state): State<Arc<AppState>>,
    Path(store_id): Path<i32>,
    Query(query): Query<AbandonedCartsQuery>,
) -> Result<Json<AbandonedCartsResponse>, Problem> {
    let request = AnalysisRequest {
        start_date: query.start_date.map(|d| d.into()),
        end_date: query.end_date.map(|d| d.into()),
        min_cart_value: query.min_cart_value,
        group_by: query.group_by,
    };

    match state
        .abandonment_service
        .analyze_abandonment(store_id, request)
        .await
    {
        Ok((analysis, window)) => Ok(Json(to_abandoned_carts_response(analysis, window))),
        Err(e) => Err(problem_from(e, "Failed to analyze abandoned carts")),
    }
}

/// Get funnel step conversion for a store
#[utoipa::path(
    get,
    path = "/stores/{store_id}/funnel/overview",
    params(
        ("store_id" = i32, Path, description = "Store ID"),
        ("start_date" = Option<String>, Query, description = "Start of the analysis window (ISO 8601, default: 7 days ago)"),
        ("end_date" = Option<String>, Query, description = "End of the analysis window (ISO 8601, default: now)"),
        ("group_by" = Option<String>, Query, description = "Grouping identifier: session, visitor, or user (default: session)")
    ),
    responses(
        (status = 200, description = "Funnel overview computed successfully", body = FunnelOverviewResponse),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error"),
        (status = 503, description = "Event store unavailable"),
        (status = 504, description = "Analysis timed out")
    ),
    tag = "Abandonment"
)]
pub async fn get_funnel_overview(
    State(state): State<Arc<AppState>>,
    Path(store_id): Path<i32>,
    Query(query): Query<FunnelOverviewQuery>,
) -> Result<Json<FunnelOverviewResponse>, Problem> {
    let request = AnalysisRequest {
        start_date: query.start_date.map(|d| d.into()),
        end_date: query.end_date.map(|d| d.into()),
        min_cart_value: None,
        group_by: query.group_by,
    };

    match state.abandonment_service.analyze_funnel(store_id, request).await {
        Ok((overview, window)) => Ok(Json(to_funnel_overview_response(overview, window))),
        Err(e) => Err(problem_from(e, "Failed to compute funnel overview")),
    }
}

fn problem_from(error: FunnelsError, title: &str) -> Problem {
    let status = match &error {
        FunnelsError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        FunnelsError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        FunnelsError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        FunnelsError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!("{}: {}", title, error);
    }

    ErrorBuilder::new(status)
        .title(title)
        .detail(format!("Error: {}", error))
        .build()
}

fn to_period(window: AnalysisWindow) -> AnalysisPeriod {
    AnalysisPeriod {
        start_date: window.start_date,
        end_date: window.end_date,
        group_by: window.group_by.as_str().to_string(),
    }
}

fn to_cart_response(cart: AbandonedCart) -> AbandonedCartResponse {
    AbandonedCartResponse {
        identifier: cart.identifier,
        identifier_type: cart.group_by.as_str().to_string(),
        last_event_at: cart.last_event_at,
        last_page: cart.last_page,
        last_action: cart.last_action.as_str().to_string(),
        cart_value: cart.cart_value,
        products: cart
            .products
            .into_iter()
            .map(|p| CartProductResponse {
                product_id: p.id,
                product_name: p.name,
                price: p.price,
                quantity: p.quantity,
            })
            .collect(),
        seconds_since_abandonment: cart.seconds_since_abandonment,
    }
}

fn to_abandoned_carts_response(
    analysis: AbandonmentAnalysis,
    window: AnalysisWindow,
) -> AbandonedCartsResponse {
    AbandonedCartsResponse {
        summary: AbandonmentSummaryResponse {
            total_carts: analysis.summary.total_carts,
            total_purchases: analysis.summary.total_purchases,
            total_abandoned: analysis.summary.total_abandoned,
            total_abandoned_value: analysis.summary.total_abandoned_value,
            abandonment_rate: analysis.summary.abandonment_rate,
            average_cart_value: analysis.summary.average_cart_value,
            average_time_to_abandonment: analysis.summary.average_time_to_abandonment_minutes,
        },
        abandonment_by_page: analysis
            .abandonment_by_page
            .into_iter()
            .map(|entry| PageBreakdownItem {
                page: entry.label,
                count: entry.count,
                percentage: entry.percentage,
            })
            .collect(),
        abandonment_by_step: analysis
            .abandonment_by_step
            .into_iter()
            .map(|entry| StepBreakdownItem {
                step: entry.label,
                count: entry.count,
                percentage: entry.percentage,
            })
            .collect(),
        abandoned_carts: analysis
            .abandoned_carts
            .into_iter()
            .map(to_cart_response)
            .collect(),
        period: to_period(window),
    }
}

fn to_funnel_overview_response(
    overview: FunnelOverview,
    window: AnalysisWindow,
) -> FunnelOverviewResponse {
    FunnelOverviewResponse {
        total_entries: overview.total_entries,
        steps: overview
            .steps
            .into_iter()
            .map(|step| StepConversionResponse {
                step: step.step.event_name().to_string(),
                completions: step.completions,
                conversion_rate: step.conversion_rate,
                drop_off_rate: step.drop_off_rate,
                average_time_from_previous_seconds: step.average_time_from_previous_seconds,
            })
            .collect(),
        overall_conversion_rate: overview.overall_conversion_rate,
        period: to_period(window),
    }
}

#[derive(utoipa::OpenApi)]
#[openapi(
    paths(get_abandoned_carts, get_funnel_overview),
    components(
        schemas(
            AbandonedCartsResponse,
            AbandonmentSummaryResponse,
            AbandonedCartResponse,
            CartProductResponse,
            PageBreakdownItem,
            StepBreakdownItem,
            AnalysisPeriod,
            FunnelOverviewResponse,
            StepConversionResponse
        )
    ),
    tags(
        (name = "Abandonment", description = "Cart abandonment analytics endpoints")
    )
)]
pub struct AbandonmentApiDoc;

pub fn configure_routes() -> axum::Router<Arc<AppState>> {
    use axum::routing::get;

    axum::Router::new()
        .route("/stores/{store_id}/abandoned-carts", get(get_abandoned_carts))
        .route("/stores/{store_id}/funnel/overview", get(get_funnel_overview))
}
