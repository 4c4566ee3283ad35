use cartwatch_core::UtcDateTime;
use cartwatch_entities::interaction_events;
use serde_json::Value;

/// Funnel stage an interaction maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunnelStep {
    AddToCart,
    BeginCheckout,
    Purchase,
}

impl FunnelStep {
    /// Action label as reported on abandoned carts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddToCart => "AddToCart",
            Self::BeginCheckout => "BeginCheckout",
            Self::Purchase => "Purchase",
        }
    }

    /// Raw event name the tracking snippet sends for this stage.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::AddToCart => "add_to_cart",
            Self::BeginCheckout => "begin_checkout",
            Self::Purchase => "purchase",
        }
    }
}

/// Product reference carried on an add-to-cart interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct CartProduct {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: f64,
}

/// A classified interaction, the unit every later pipeline stage works on.
///
/// Created once per raw record and never mutated; it lives only for the
/// duration of one analysis request.
#[derive(Debug, Clone, PartialEq)]
pub struct FunnelEvent {
    pub timestamp: UtcDateTime,
    pub session_id: Option<String>,
    pub visitor_id: Option<String>,
    pub user_id: Option<String>,
    pub step: FunnelStep,
    pub page: String,
    pub product: Option<CartProduct>,
}

/// Map a raw record onto the funnel, or discard it.
///
/// Matching is exact, not fuzzy: anything that is not one of the recognized
/// actions is irrelevant to the funnel. Identifier fields are copied through
/// as-is; the grouping stage decides which one matters.
pub fn classify(record: &interaction_events::Model) -> Option<FunnelEvent> {
    let step = match record.action.as_str() {
        "add_to_cart" | "add" => FunnelStep::AddToCart,
        "begin_checkout" => FunnelStep::BeginCheckout,
        "purchase" => FunnelStep::Purchase,
        _ => return None,
    };

    Some(FunnelEvent {
        timestamp: record.timestamp,
        session_id: record.session_id.clone(),
        visitor_id: record.visitor_id.clone(),
        user_id: record.user_id.clone(),
        step,
        page: record
            .page_path
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
        product: parse_product(record.event_data.as_ref()),
    })
}

/// Pull the commerce payload out of the loose event data, if any.
fn parse_product(data: Option<&Value>) -> Option<CartProduct> {
    let data = data?;
    let known = ["product_id", "product_name", "price", "quantity"];
    if !data.is_object() || !known.iter().any(|key| data.get(key).is_some()) {
        return None;
    }

    Some(CartProduct {
        id: string_field(data, "product_id").unwrap_or_default(),
        name: string_field(data, "product_name").unwrap_or_default(),
        price: numeric_field(data, "price"),
        quantity: numeric_field(data, "quantity"),
    })
}

fn string_field(data: &Value, key: &str) -> Option<String> {
    match data.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Tracking clients send prices and quantities as numbers or strings. A
/// value that cannot be read as a number counts as 0 so that one bad record
/// never aborts the whole window.
fn numeric_field(data: &Value, key: &str) -> f64 {
    match data.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}
