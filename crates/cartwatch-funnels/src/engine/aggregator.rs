use std::collections::HashMap;

use cartwatch_core::UtcDateTime;

use super::classifier::FunnelStep;
use super::detector::AbandonedCart;
use super::grouping::EventGroup;

/// Aggregate counts and rates over one analysis window.
#[derive(Debug, Clone, PartialEq)]
pub struct AbandonmentSummary {
    pub total_carts: u64,
    pub total_purchases: u64,
    pub total_abandoned: u64,
    pub total_abandoned_value: f64,
    /// Percentage of carts lost, rounded to two decimals
    pub abandonment_rate: f64,
    pub average_cart_value: f64,
    pub average_time_to_abandonment_minutes: f64,
}

/// One bucket of a frequency breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownEntry {
    pub label: String,
    pub count: u64,
    pub percentage: f64,
}

/// Full result of an abandonment analysis.
#[derive(Debug, Clone)]
pub struct AbandonmentAnalysis {
    pub summary: AbandonmentSummary,
    pub abandonment_by_page: Vec<BreakdownEntry>,
    pub abandonment_by_step: Vec<BreakdownEntry>,
    /// Sorted descending by cart value
    pub abandoned_carts: Vec<AbandonedCart>,
}

/// Reduce the group population and the detected carts into summary metrics.
///
/// Runs single-threaded after detection; no counter in here is ever shared
/// between workers.
pub fn aggregate(groups: &[EventGroup], mut abandoned: Vec<AbandonedCart>) -> AbandonmentAnalysis {
    let total_carts = groups.len() as u64;
    let total_purchases = groups
        .iter()
        .filter(|g| g.events.iter().any(|e| e.step == FunnelStep::Purchase))
        .count() as u64;
    let total_abandoned = abandoned.len() as u64;
    let total_abandoned_value: f64 = abandoned.iter().map(|c| c.cart_value).sum();

    let abandonment_rate = if total_carts > 0 {
        round2(total_abandoned as f64 / total_carts as f64 * 100.0)
    } else {
        0.0
    };
    let average_cart_value = if total_abandoned > 0 {
        total_abandoned_value / total_abandoned as f64
    } else {
        0.0
    };
    let average_time_to_abandonment_minutes = if total_abandoned > 0 {
        abandoned
            .iter()
            .map(|c| c.seconds_since_abandonment as f64 / 60.0)
            .sum::<f64>()
            / total_abandoned as f64
    } else {
        0.0
    };

    let abandonment_by_page = breakdown(
        abandoned.iter().map(|c| c.last_page.clone()),
        total_abandoned,
    );
    let abandonment_by_step = breakdown(
        abandoned.iter().map(|c| step_label(c).to_string()),
        total_abandoned,
    );

    // Reporting order is part of the contract: biggest carts first.
    abandoned.sort_by(|a, b| b.cart_value.total_cmp(&a.cart_value));

    AbandonmentAnalysis {
        summary: AbandonmentSummary {
            total_carts,
            total_purchases,
            total_abandoned,
            total_abandoned_value,
            abandonment_rate,
            average_cart_value,
            average_time_to_abandonment_minutes,
        },
        abandonment_by_page,
        abandonment_by_step,
        abandoned_carts: abandoned,
    }
}

/// Which funnel stage the shopper was lost at.
fn step_label(cart: &AbandonedCart) -> &'static str {
    match cart.last_action {
        FunnelStep::BeginCheckout => "checkout",
        _ => "cart",
    }
}

/// Frequency map materialized as a stably ordered list (count descending,
/// then label ascending) so output never depends on map iteration order.
fn breakdown(labels: impl Iterator<Item = String>, total: u64) -> Vec<BreakdownEntry> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }

    let mut entries: Vec<BreakdownEntry> = counts
        .into_iter()
        .map(|(label, count)| BreakdownEntry {
            percentage: if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            label,
            count,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

    entries
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Conversion numbers for one funnel stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StepConversion {
    pub step: FunnelStep,
    pub completions: u64,
    /// Percentage of the previous stage that reached this one
    pub conversion_rate: f64,
    pub drop_off_rate: f64,
    pub average_time_from_previous_seconds: f64,
}

/// Sequential progression through the whole funnel.
#[derive(Debug, Clone)]
pub struct FunnelOverview {
    pub total_entries: u64,
    pub steps: Vec<StepConversion>,
    pub overall_conversion_rate: f64,
}

/// Walk every journey through add-to-cart, begin-checkout, purchase.
///
/// A stage counts only when its earliest occurrence is at or after the
/// earliest occurrence of the previous stage, so out-of-order noise does
/// not inflate conversion.
pub fn funnel_overview(groups: &[EventGroup]) -> FunnelOverview {
    let steps = [
        FunnelStep::AddToCart,
        FunnelStep::BeginCheckout,
        FunnelStep::Purchase,
    ];

    let mut per_step: Vec<HashMap<usize, UtcDateTime>> = Vec::with_capacity(steps.len());
    for (step_index, step) in steps.iter().enumerate() {
        let mut completed: HashMap<usize, UtcDateTime> = HashMap::new();
        for (group_index, group) in groups.iter().enumerate() {
            let earliest = group
                .events
                .iter()
                .filter(|e| e.step == *step)
                .map(|e| e.timestamp)
                .min();
            let timestamp = match earliest {
                Some(timestamp) => timestamp,
                None => continue,
            };

            if step_index == 0 {
                completed.insert(group_index, timestamp);
            } else if let Some(previous) = per_step[step_index - 1].get(&group_index) {
                if timestamp >= *previous {
                    completed.insert(group_index, timestamp);
                }
            }
        }
        per_step.push(completed);
    }

    let total_entries = per_step[0].len() as u64;
    let mut conversions = Vec::with_capacity(steps.len());
    let mut previous_completions = total_entries;

    for (step_index, step) in steps.iter().enumerate() {
        let completions = per_step[step_index].len() as u64;

        let (conversion_rate, drop_off_rate) = if previous_completions > 0 {
            let rate = round2(completions as f64 / previous_completions as f64 * 100.0);
            (rate, round2(100.0 - rate))
        } else {
            (0.0, 0.0)
        };

        let average_time_from_previous_seconds = if step_index > 0 && completions > 0 {
            let mut total_seconds = 0i64;
            let mut samples = 0u64;
            for (group_index, timestamp) in &per_step[step_index] {
                if let Some(previous) = per_step[step_index - 1].get(group_index) {
                    total_seconds += (*timestamp - *previous).num_seconds();
                    samples += 1;
                }
            }
            if samples > 0 {
                total_seconds as f64 / samples as f64
            } else {
                0.0
            }
        } else {
            0.0
        };

        conversions.push(StepConversion {
            step: *step,
            completions,
            conversion_rate,
            drop_off_rate,
            average_time_from_previous_seconds,
        });
        previous_completions = completions;
    }

    let completed_all = per_step.last().map(|m| m.len() as u64).unwrap_or(0);
    let overall_conversion_rate = if total_entries > 0 {
        round2(completed_all as f64 / total_entries as f64 * 100.0)
    } else {
        0.0
    };

    FunnelOverview {
        total_entries,
        steps: conversions,
        overall_conversion_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::classifier::{CartProduct, FunnelEvent};
    use crate::engine::grouping::GroupBy;
    use chrono::{TimeZone, Utc};

    fn at(minute: u32) -> UtcDateTime {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap()
    }

    fn event(minute: u32, step: FunnelStep) -> FunnelEvent {
        FunnelEvent {
            timestamp: at(minute),
            session_id: Some("s".to_string()),
            visitor_id: None,
            user_id: None,
            step,
            page: "/".to_string(),
            product: None,
        }
    }

    fn group(key: &str, events: Vec<FunnelEvent>) -> EventGroup {
        EventGroup {
            key: key.to_string(),
            group_by: GroupBy::Session,
            events,
        }
    }

    fn cart(identifier: &str, value: f64, last_page: &str, last_action: FunnelStep) -> AbandonedCart {
        AbandonedCart {
            identifier: identifier.to_string(),
            group_by: GroupBy::Session,
            last_event_at: at(0),
            last_page: last_page.to_string(),
            last_action,
            cart_value: value,
            products: Vec::<CartProduct>::new(),
            seconds_since_abandonment: 600,
        }
    }

    #[test]
    fn one_abandoned_one_purchased_yields_fifty_percent() {
        let groups = vec![
            group("s1", vec![event(0, FunnelStep::AddToCart)]),
            group(
                "s2",
                vec![event(0, FunnelStep::AddToCart), event(1, FunnelStep::Purchase)],
            ),
        ];
        let abandoned = vec![cart("s1", 100.0, "/a", FunnelStep::AddToCart)];

        let analysis = aggregate(&groups, abandoned);
        assert_eq!(analysis.summary.total_carts, 2);
        assert_eq!(analysis.summary.total_purchases, 1);
        assert_eq!(analysis.summary.total_abandoned, 1);
        assert_eq!(analysis.summary.abandonment_rate, 50.0);
    }

    #[test]
    fn zero_groups_yield_zero_rates_not_nan() {
        let analysis = aggregate(&[], Vec::new());
        assert_eq!(analysis.summary.total_carts, 0);
        assert_eq!(analysis.summary.abandonment_rate, 0.0);
        assert_eq!(analysis.summary.average_cart_value, 0.0);
        assert_eq!(analysis.summary.average_time_to_abandonment_minutes, 0.0);
        assert!(analysis.abandonment_by_page.is_empty());
        assert!(analysis.abandonment_by_step.is_empty());
    }

    #[test]
    fn abandonment_rate_rounds_to_two_decimals() {
        let groups = vec![
            group("s1", vec![event(0, FunnelStep::AddToCart)]),
            group("s2", vec![event(0, FunnelStep::AddToCart)]),
            group("s3", vec![event(0, FunnelStep::AddToCart)]),
        ];
        let abandoned = vec![cart("s1", 100.0, "/a", FunnelStep::AddToCart)];

        let analysis = aggregate(&groups, abandoned);
        // 1/3 = 33.333..., reported as 33.33
        assert_eq!(analysis.summary.abandonment_rate, 33.33);
    }

    #[test]
    fn carts_are_sorted_descending_by_value() {
        let groups = vec![
            group("s1", vec![event(0, FunnelStep::AddToCart)]),
            group("s2", vec![event(0, FunnelStep::AddToCart)]),
            group("s3", vec![event(0, FunnelStep::AddToCart)]),
        ];
        let abandoned = vec![
            cart("s1", 50.0, "/a", FunnelStep::AddToCart),
            cart("s2", 500.0, "/b", FunnelStep::AddToCart),
            cart("s3", 200.0, "/c", FunnelStep::AddToCart),
        ];

        let analysis = aggregate(&groups, abandoned);
        let values: Vec<f64> = analysis
            .abandoned_carts
            .iter()
            .map(|c| c.cart_value)
            .collect();
        assert_eq!(values, [500.0, 200.0, 50.0]);
    }

    #[test]
    fn averages_are_arithmetic_means_over_abandoned_carts() {
        let groups = vec![
            group("s1", vec![event(0, FunnelStep::AddToCart)]),
            group("s2", vec![event(0, FunnelStep::AddToCart)]),
        ];
        let mut first = cart("s1", 100.0, "/a", FunnelStep::AddToCart);
        first.seconds_since_abandonment = 600;
        let mut second = cart("s2", 300.0, "/b", FunnelStep::AddToCart);
        second.seconds_since_abandonment = 1800;

        let analysis = aggregate(&groups, vec![first, second]);
        assert_eq!(analysis.summary.total_abandoned_value, 400.0);
        assert_eq!(analysis.summary.average_cart_value, 200.0);
        assert_eq!(analysis.summary.average_time_to_abandonment_minutes, 20.0);
    }

    #[test]
    fn breakdowns_count_pages_and_steps_with_stable_order() {
        let groups = vec![
            group("s1", vec![event(0, FunnelStep::AddToCart)]),
            group("s2", vec![event(0, FunnelStep::AddToCart)]),
            group("s3", vec![event(0, FunnelStep::BeginCheckout)]),
            group("s4", vec![event(0, FunnelStep::AddToCart)]),
        ];
        let abandoned = vec![
            cart("s1", 10.0, "/products/a", FunnelStep::AddToCart),
            cart("s2", 10.0, "/products/a", FunnelStep::AddToCart),
            cart("s3", 10.0, "/checkout", FunnelStep::BeginCheckout),
            cart("s4", 10.0, "/products/b", FunnelStep::AddToCart),
        ];

        let analysis = aggregate(&groups, abandoned);

        let pages: Vec<(&str, u64)> = analysis
            .abandonment_by_page
            .iter()
            .map(|e| (e.label.as_str(), e.count))
            .collect();
        assert_eq!(
            pages,
            [("/products/a", 2), ("/checkout", 1), ("/products/b", 1)]
        );
        assert_eq!(analysis.abandonment_by_page[0].percentage, 50.0);

        let steps: Vec<(&str, u64)> = analysis
            .abandonment_by_step
            .iter()
            .map(|e| (e.label.as_str(), e.count))
            .collect();
        assert_eq!(steps, [("cart", 3), ("checkout", 1)]);
    }

    #[test]
    fn overview_tracks_sequential_progression() {
        let groups = vec![
            // Full journey
            group(
                "s1",
                vec![
                    event(0, FunnelStep::AddToCart),
                    event(5, FunnelStep::BeginCheckout),
                    event(10, FunnelStep::Purchase),
                ],
            ),
            // Stops after checkout
            group(
                "s2",
                vec![
                    event(0, FunnelStep::AddToCart),
                    event(3, FunnelStep::BeginCheckout),
                ],
            ),
            // Cart only
            group("s3", vec![event(0, FunnelStep::AddToCart)]),
            // Checkout without a preceding add never enters the funnel
            group("s4", vec![event(0, FunnelStep::BeginCheckout)]),
        ];

        let overview = funnel_overview(&groups);
        assert_eq!(overview.total_entries, 3);
        assert_eq!(overview.steps[0].completions, 3);
        assert_eq!(overview.steps[1].completions, 2);
        assert_eq!(overview.steps[2].completions, 1);
        assert_eq!(overview.steps[1].conversion_rate, 66.67);
        assert_eq!(overview.steps[1].drop_off_rate, 33.33);
        // s1 and s2 reached checkout 5 and 3 minutes after the add
        assert_eq!(overview.steps[1].average_time_from_previous_seconds, 240.0);
        assert_eq!(overview.overall_conversion_rate, 33.33);
    }

    #[test]
    fn overview_ignores_steps_that_precede_the_previous_stage() {
        // Checkout before the first add does not qualify
        let groups = vec![group(
            "s1",
            vec![
                event(0, FunnelStep::BeginCheckout),
                event(5, FunnelStep::AddToCart),
            ],
        )];

        let overview = funnel_overview(&groups);
        assert_eq!(overview.total_entries, 1);
        assert_eq!(overview.steps[1].completions, 0);
    }

    #[test]
    fn overview_on_empty_population_is_all_zero() {
        let overview = funnel_overview(&[]);
        assert_eq!(overview.total_entries, 0);
        assert_eq!(overview.overall_conversion_rate, 0.0);
        assert!(overview
            .steps
            .iter()
            .all(|s| s.completions == 0 && s.conversion_rate == 0.0));
    }
}
