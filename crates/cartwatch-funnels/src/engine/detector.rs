use cartwatch_core::UtcDateTime;

use super::classifier::{CartProduct, FunnelStep};
use super::grouping::{EventGroup, GroupBy};

/// A shopper journey that shows cart engagement but no completed purchase.
#[derive(Debug, Clone)]
pub struct AbandonedCart {
    pub identifier: String,
    pub group_by: GroupBy,
    pub last_event_at: UtcDateTime,
    pub last_page: String,
    pub last_action: FunnelStep,
    pub cart_value: f64,
    pub products: Vec<CartProduct>,
    pub seconds_since_abandonment: i64,
}

/// Decide whether a single journey is an abandoned cart.
///
/// Groups carry no references to each other, so callers are free to fan
/// this out across worker threads and collect into independent slices.
pub fn detect(group: &EventGroup, min_cart_value: f64, now: UtcDateTime) -> Option<AbandonedCart> {
    // A journey that converted is never abandoned, whatever came before.
    if group
        .events
        .iter()
        .any(|e| e.step == FunnelStep::Purchase)
    {
        return None;
    }

    // Only add-to-cart events declare cart contents in this event model;
    // checkout and purchase events do not restate them.
    let cart_value: f64 = group
        .events
        .iter()
        .filter(|e| e.step == FunnelStep::AddToCart)
        .filter_map(|e| e.product.as_ref())
        .map(|p| p.price * p.quantity)
        .sum();

    if cart_value < min_cart_value {
        return None;
    }

    // Last point where the shopper was still demonstrably buying.
    let last_cart_event = group
        .events
        .iter()
        .rev()
        .find(|e| matches!(e.step, FunnelStep::AddToCart | FunnelStep::BeginCheckout))?;

    // A later add of the same product is a separate interaction, not a
    // quantity update; entries stay unmerged.
    let products: Vec<CartProduct> = group
        .events
        .iter()
        .filter(|e| e.step == FunnelStep::AddToCart)
        .filter_map(|e| e.product.clone())
        .collect();

    Some(AbandonedCart {
        identifier: group.key.clone(),
        group_by: group.group_by,
        last_event_at: last_cart_event.timestamp,
        last_page: last_cart_event.page.clone(),
        last_action: last_cart_event.step,
        cart_value,
        products,
        // A future-dated event yields a negative age; it passes through
        // unclamped so upstream data problems stay visible.
        seconds_since_abandonment: (now - last_cart_event.timestamp).num_seconds(),
    })
}
