//! Fraud risk scoring.
//!
//! A pure, deterministic additive point model. Scoring never fails: inputs
//! that cannot be interpreted degrade to extra risk points instead of
//! aborting the evaluation.

use common::{FraudRisk, Money};
use serde::Serialize;

const HIGH_VALUE_CENTS: i64 = 100_000;
const FIRST_TIME_LARGE_CENTS: i64 = 50_000;
const PRICEY_LINE_CENTS: i64 = 30_000;
const PRICEY_LINE_QUANTITY: u32 = 3;

const HIGH_VALUE_POINTS: u32 = 40;
const FIRST_TIME_POINTS: u32 = 50;
const PRICEY_LINE_POINTS: u32 = 30;
const UNKNOWN_TOTAL_POINTS: u32 = 10;

const HIGH_BAND: u32 = 70;
const MEDIUM_BAND: u32 = 40;

/// One order line as seen by the evaluator.
#[derive(Debug, Clone)]
pub struct LineProfile {
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

/// The order under evaluation.
///
/// `total` is `None` when the amount could not be determined; that is a
/// risk signal, not an error.
#[derive(Debug, Clone)]
pub struct OrderProfile {
    pub total: Option<Money>,
    pub lines: Vec<LineProfile>,
    pub shipping_address: String,
}

/// Snapshot of the placing user's order history at evaluation time.
#[derive(Debug, Clone, Copy)]
pub struct HistorySnapshot {
    pub total_orders: i64,
    pub total_spent: Money,
}

/// The evaluator's output: a band, the raw score, and one human-readable
/// reason per triggered rule, in rule order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FraudVerdict {
    pub risk: FraudRisk,
    pub score: u32,
    pub reasons: Vec<String>,
}

/// Scores an order against its own content and the user's history.
pub fn evaluate(order: &OrderProfile, history: &HistorySnapshot) -> FraudVerdict {
    let mut score = 0;
    let mut reasons = Vec::new();

    match order.total {
        Some(total) => {
            if total.cents() > HIGH_VALUE_CENTS {
                score += HIGH_VALUE_POINTS;
                reasons.push(format!("High order value ({total})"));
            }
            if history.total_orders == 0 && total.cents() > FIRST_TIME_LARGE_CENTS {
                score += FIRST_TIME_POINTS;
                reasons.push("Unusually large order for a first-time customer.".to_string());
            }
        }
        None => {
            score += UNKNOWN_TOTAL_POINTS;
            reasons.push("Order total could not be determined.".to_string());
        }
    }

    for line in &order.lines {
        if line.unit_price.cents() > PRICEY_LINE_CENTS && line.quantity > PRICEY_LINE_QUANTITY {
            score += PRICEY_LINE_POINTS;
            reasons.push(format!(
                "High-value item in quantity: {} (x{} at {})",
                line.product_name, line.quantity, line.unit_price
            ));
        }
    }

    let risk = if score >= HIGH_BAND {
        FraudRisk::High
    } else if score >= MEDIUM_BAND {
        FraudRisk::Medium
    } else {
        FraudRisk::Low
    };

    FraudVerdict {
        risk,
        score,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, quantity: u32, unit_price_cents: i64) -> LineProfile {
        LineProfile {
            product_name: name.to_string(),
            quantity,
            unit_price: Money::from_cents(unit_price_cents),
        }
    }

    fn order(total_cents: i64, lines: Vec<LineProfile>) -> OrderProfile {
        OrderProfile {
            total: Some(Money::from_cents(total_cents)),
            lines,
            shipping_address: "1 Main St".to_string(),
        }
    }

    fn history(total_orders: i64, total_spent_cents: i64) -> HistorySnapshot {
        HistorySnapshot {
            total_orders,
            total_spent: Money::from_cents(total_spent_cents),
        }
    }

    #[test]
    fn small_repeat_order_is_low_risk() {
        let verdict = evaluate(
            &order(4_999, vec![line("Widget", 2, 2_500)]),
            &history(12, 80_000),
        );
        assert_eq!(verdict.risk, FraudRisk::Low);
        assert_eq!(verdict.score, 0);
        assert!(verdict.reasons.is_empty());
    }

    #[test]
    fn first_time_high_value_order_is_high_risk() {
        // $1500 single-item order from a user with no prior orders:
        // 40 (high value) + 50 (first-time large) = 90
        let verdict = evaluate(
            &order(150_000, vec![line("Camera", 1, 150_000)]),
            &history(0, 0),
        );
        assert_eq!(verdict.risk, FraudRisk::High);
        assert_eq!(verdict.score, 90);
        assert_eq!(verdict.reasons.len(), 2);
        assert!(verdict.reasons[0].contains("High order value"));
        assert!(verdict.reasons[1].contains("first-time customer"));
    }

    #[test]
    fn high_value_alone_is_medium() {
        let verdict = evaluate(
            &order(120_000, vec![line("Camera", 1, 120_000)]),
            &history(5, 300_000),
        );
        assert_eq!(verdict.risk, FraudRisk::Medium);
        assert_eq!(verdict.score, 40);
    }

    #[test]
    fn pricey_line_in_quantity_adds_points_and_names_item() {
        // unit price > $300 and quantity > 3
        let verdict = evaluate(
            &order(140_000, vec![line("Lens", 4, 35_000)]),
            &history(3, 50_000),
        );
        assert_eq!(verdict.score, 40 + 30);
        assert_eq!(verdict.risk, FraudRisk::High);
        assert!(verdict.reasons.iter().any(|r| r.contains("Lens")));
    }

    #[test]
    fn pricey_line_rule_requires_both_conditions() {
        // quantity boundary: exactly 3 does not trigger
        let verdict = evaluate(
            &order(90_000, vec![line("Lens", 3, 35_000)]),
            &history(3, 50_000),
        );
        assert_eq!(verdict.score, 0);

        // price boundary: exactly $300 does not trigger
        let verdict = evaluate(
            &order(90_000, vec![line("Tripod", 4, 30_000)]),
            &history(3, 50_000),
        );
        assert_eq!(verdict.score, 0);
    }

    #[test]
    fn unknown_total_degrades_instead_of_failing() {
        let profile = OrderProfile {
            total: None,
            lines: vec![line("Widget", 1, 1_000)],
            shipping_address: "1 Main St".to_string(),
        };
        let verdict = evaluate(&profile, &history(0, 0));
        assert_eq!(verdict.score, 10);
        assert_eq!(verdict.risk, FraudRisk::Low);
        assert_eq!(verdict.reasons.len(), 1);
        assert!(verdict.reasons[0].contains("could not be determined"));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let profile = order(
            150_000,
            vec![line("Camera", 1, 150_000), line("Lens", 5, 40_000)],
        );
        let h = history(0, 0);
        let first = evaluate(&profile, &h);
        let second = evaluate(&profile, &h);
        assert_eq!(first, second);
    }

    #[test]
    fn thresholds_are_strict_inequalities() {
        // exactly $1000 is not "over $1000"
        let verdict = evaluate(
            &order(100_000, vec![line("Widget", 1, 100_000)]),
            &history(4, 10_000),
        );
        assert_eq!(verdict.score, 0);

        // exactly $500 for a first-timer is not "over $500"
        let verdict = evaluate(
            &order(50_000, vec![line("Widget", 1, 50_000)]),
            &history(0, 0),
        );
        assert_eq!(verdict.score, 0);
    }
}
