//! Discount rules and the engine that applies them at order creation.
//!
//! Rules are stateless predicates over their arguments. The engine walks them in
//! the order supplied and rejects any rule that pushes a total below zero or above
//! the amount it was computed from.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::domain::customer::{Customer, Segment};
use crate::domain::order::Order;

pub trait DiscountRule: Send + Sync {
    fn name(&self) -> &str;

    fn is_applicable(&self, customer: &Customer, order: &Order) -> bool;

    /// Returns the discounted total for `order`, or `None` if the arithmetic overflows.
    fn calculate_discount(&self, order: &Order) -> Option<Decimal>;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscountError {
    #[error("rule {rule} produced negative total {total}")]
    NegativeTotal { rule: String, total: Decimal },

    #[error("rule {rule} produced total {total} above {ceiling}")]
    AboveOriginal {
        rule: String,
        total: Decimal,
        ceiling: Decimal,
    },

    #[error("rule {rule} overflowed computing a total from {base}")]
    Overflow { rule: String, base: Decimal },
}

/// How several applicable rules combine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum StackingPolicy {
    #[default]
    FirstMatch,
    Cumulative,
}

/// `total` less `percent` percent, rounded to cents.
fn percent_off(total: Decimal, percent: Decimal) -> Option<Decimal> {
    let rate = percent.checked_div(Decimal::ONE_HUNDRED)?;
    let off = total.checked_mul(rate)?;
    Some(total.checked_sub(off)?.round_dp(2))
}

/// Percentage off for every customer in one segment.
#[derive(Debug, Clone)]
pub struct SegmentDiscount {
    name: String,
    segment: Segment,
    percent: Decimal,
}

impl SegmentDiscount {
    pub fn new(segment: Segment, percent: Decimal) -> Self {
        Self {
            name: format!("segment:{segment}"),
            segment,
            percent,
        }
    }
}

impl DiscountRule for SegmentDiscount {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_applicable(&self, customer: &Customer, _order: &Order) -> bool {
        customer.segment == self.segment
    }

    fn calculate_discount(&self, order: &Order) -> Option<Decimal> {
        percent_off(order.total_amount, self.percent)
    }
}

/// Percentage off once a customer has placed at least `min_prior_orders`.
#[derive(Debug, Clone)]
pub struct VolumeDiscount {
    min_prior_orders: u32,
    percent: Decimal,
}

impl VolumeDiscount {
    pub fn new(min_prior_orders: u32, percent: Decimal) -> Self {
        Self {
            min_prior_orders,
            percent,
        }
    }
}

impl DiscountRule for VolumeDiscount {
    fn name(&self) -> &str {
        "volume"
    }

    fn is_applicable(&self, _customer: &Customer, order: &Order) -> bool {
        order.order_count >= self.min_prior_orders
    }

    fn calculate_discount(&self, order: &Order) -> Option<Decimal> {
        percent_off(order.total_amount, self.percent)
    }
}

fn run_rules(
    customer: &Customer,
    mut order: Order,
    rules: &[Arc<dyn DiscountRule>],
    policy: StackingPolicy,
) -> Result<Order, DiscountError> {
    order.original_total_amount = order.total_amount;
    for rule in rules {
        if !rule.is_applicable(customer, &order) {
            continue;
        }
        let ceiling = order.total_amount;
        let total = rule
            .calculate_discount(&order)
            .ok_or_else(|| DiscountError::Overflow {
                rule: rule.name().to_string(),
                base: ceiling,
            })?;
        if total.is_sign_negative() && !total.is_zero() {
            return Err(DiscountError::NegativeTotal {
                rule: rule.name().to_string(),
                total,
            });
        }
        if total > ceiling {
            return Err(DiscountError::AboveOriginal {
                rule: rule.name().to_string(),
                total,
                ceiling,
            });
        }
        tracing::debug!(
            order_id = %order.id,
            rule = rule.name(),
            before = %ceiling,
            after = %total,
            "discount applied"
        );
        order.total_amount = total;
        if policy == StackingPolicy::FirstMatch {
            break;
        }
    }
    Ok(order)
}

/// First applicable rule wins. `order.total_amount` must hold the pre-discount value.
pub fn apply_discount(
    customer: &Customer,
    order: Order,
    rules: &[Arc<dyn DiscountRule>],
) -> Result<Order, DiscountError> {
    run_rules(customer, order, rules, StackingPolicy::FirstMatch)
}

#[derive(Clone, Default)]
pub struct DiscountEngine {
    rules: Vec<Arc<dyn DiscountRule>>,
    policy: StackingPolicy,
}

impl DiscountEngine {
    pub fn new(rules: Vec<Arc<dyn DiscountRule>>, policy: StackingPolicy) -> Self {
        Self { rules, policy }
    }

    pub fn rules(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name())
    }

    pub fn policy(&self) -> StackingPolicy {
        self.policy
    }

    pub fn apply(&self, customer: &Customer, order: Order) -> Result<Order, DiscountError> {
        run_rules(customer, order, &self.rules, self.policy)
    }
}

impl fmt::Debug for DiscountEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscountEngine")
            .field("rules", &self.rules().collect::<Vec<_>>())
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderItem;
    use rust_decimal_macros::dec;

    /// Rule with canned answers, for exercising the engine alone.
    struct FixedRule {
        applicable: bool,
        result: Decimal,
    }

    impl DiscountRule for FixedRule {
        fn name(&self) -> &str {
            "fixed"
        }

        fn is_applicable(&self, _customer: &Customer, _order: &Order) -> bool {
            self.applicable
        }

        fn calculate_discount(&self, _order: &Order) -> Option<Decimal> {
            Some(self.result)
        }
    }

    fn fixed(applicable: bool, result: Decimal) -> Arc<dyn DiscountRule> {
        Arc::new(FixedRule { applicable, result })
    }

    fn customer(segment: Segment, order_count: u32) -> Customer {
        let mut c = Customer::new("Test".into(), "test@example.com".into(), segment).unwrap();
        c.order_count = order_count;
        c
    }

    fn order_for(customer: &Customer, total: Decimal) -> Order {
        Order::new(
            customer,
            "123 Main St".into(),
            vec![OrderItem {
                name: "Widget".into(),
                qty: 1,
                unit_price: total,
            }],
        )
        .unwrap()
    }

    #[test]
    fn inapplicable_rule_leaves_total_unchanged() {
        let c = customer(Segment::Regular, 1);
        let out = apply_discount(&c, order_for(&c, dec!(100)), &[fixed(false, dec!(0))]).unwrap();
        assert_eq!(out.total_amount, dec!(100));
        assert_eq!(out.original_total_amount, dec!(100));
    }

    #[test]
    fn applicable_rule_sets_total_and_keeps_original() {
        let c = customer(Segment::Regular, 6);
        let out = apply_discount(&c, order_for(&c, dec!(100)), &[fixed(true, dec!(85))]).unwrap();
        assert_eq!(out.total_amount, dec!(85));
        assert_eq!(out.original_total_amount, dec!(100));
    }

    #[test]
    fn no_rules_is_a_no_op() {
        let c = customer(Segment::Gold, 0);
        let out = apply_discount(&c, order_for(&c, dec!(42.10)), &[]).unwrap();
        assert_eq!(out.total_amount, dec!(42.10));
    }

    #[test]
    fn first_applicable_rule_wins() {
        let c = customer(Segment::Regular, 0);
        let rules = vec![fixed(false, dec!(10)), fixed(true, dec!(90)), fixed(true, dec!(50))];
        let out = apply_discount(&c, order_for(&c, dec!(100)), &rules).unwrap();
        assert_eq!(out.total_amount, dec!(90));
    }

    #[test]
    fn negative_result_is_rejected() {
        let c = customer(Segment::Regular, 0);
        let err = apply_discount(&c, order_for(&c, dec!(100)), &[fixed(true, dec!(-1))]).unwrap_err();
        assert!(matches!(err, DiscountError::NegativeTotal { .. }));
    }

    #[test]
    fn result_above_original_is_rejected() {
        let c = customer(Segment::Regular, 0);
        let err =
            apply_discount(&c, order_for(&c, dec!(100)), &[fixed(true, dec!(100.01))]).unwrap_err();
        assert_eq!(
            err,
            DiscountError::AboveOriginal {
                rule: "fixed".into(),
                total: dec!(100.01),
                ceiling: dec!(100),
            }
        );
    }

    #[test]
    fn zero_total_is_allowed() {
        let c = customer(Segment::Regular, 0);
        let out = apply_discount(&c, order_for(&c, dec!(100)), &[fixed(true, dec!(0))]).unwrap();
        assert_eq!(out.total_amount, dec!(0));
    }

    #[test]
    fn segment_rule_matches_only_its_segment() {
        let rule = SegmentDiscount::new(Segment::Gold, dec!(15));
        let gold = customer(Segment::Gold, 0);
        let regular = customer(Segment::Regular, 0);
        let order = order_for(&gold, dec!(100));
        assert!(rule.is_applicable(&gold, &order));
        assert!(!rule.is_applicable(&regular, &order));
        assert_eq!(rule.calculate_discount(&order), Some(dec!(85)));
        assert_eq!(rule.name(), "segment:Gold");
    }

    #[test]
    fn volume_rule_uses_prior_order_count() {
        let rule = VolumeDiscount::new(5, dec!(10));
        let loyal = customer(Segment::Regular, 6);
        let fresh = customer(Segment::Regular, 1);
        assert!(rule.is_applicable(&loyal, &order_for(&loyal, dec!(100))));
        assert!(!rule.is_applicable(&fresh, &order_for(&fresh, dec!(100))));
        assert_eq!(
            rule.calculate_discount(&order_for(&loyal, dec!(100))),
            Some(dec!(90))
        );
    }

    #[test]
    fn percent_off_rounds_to_cents() {
        assert_eq!(percent_off(dec!(19.99), dec!(15)), Some(dec!(16.99)));
        assert_eq!(percent_off(dec!(100), dec!(0)), Some(dec!(100)));
        assert_eq!(percent_off(dec!(100), dec!(100)), Some(dec!(0)));
    }

    #[test]
    fn percent_off_reports_overflow() {
        assert_eq!(percent_off(Decimal::MAX, dec!(-1000)), None);
        assert_eq!(percent_off(Decimal::MAX, dec!(-100)), None);
    }

    #[test]
    fn overflowing_rule_is_named_in_the_error() {
        let engine = DiscountEngine::new(
            vec![Arc::new(SegmentDiscount::new(Segment::Gold, dec!(-100)))],
            StackingPolicy::FirstMatch,
        );
        let c = customer(Segment::Gold, 0);
        let mut order = order_for(&c, dec!(1));
        order.total_amount = Decimal::MAX;
        let err = engine.apply(&c, order).unwrap_err();
        assert_eq!(
            err,
            DiscountError::Overflow {
                rule: "segment:Gold".into(),
                base: Decimal::MAX,
            }
        );
    }

    #[test]
    fn price_raising_rule_is_above_original() {
        let engine = DiscountEngine::new(
            vec![Arc::new(SegmentDiscount::new(Segment::Gold, dec!(-10)))],
            StackingPolicy::FirstMatch,
        );
        let c = customer(Segment::Gold, 0);
        let err = engine.apply(&c, order_for(&c, dec!(100))).unwrap_err();
        assert!(matches!(err, DiscountError::AboveOriginal { .. }));
    }

    #[test]
    fn misconfigured_percentage_is_surfaced_not_clamped() {
        let engine = DiscountEngine::new(
            vec![Arc::new(SegmentDiscount::new(Segment::Gold, dec!(150)))],
            StackingPolicy::FirstMatch,
        );
        let c = customer(Segment::Gold, 0);
        let err = engine.apply(&c, order_for(&c, dec!(100))).unwrap_err();
        assert!(matches!(err, DiscountError::NegativeTotal { .. }));
    }

    #[test]
    fn cumulative_policy_stacks_in_order() {
        let engine = DiscountEngine::new(
            vec![
                Arc::new(SegmentDiscount::new(Segment::Gold, dec!(10))),
                Arc::new(VolumeDiscount::new(5, dec!(10))),
            ],
            StackingPolicy::Cumulative,
        );
        let c = customer(Segment::Gold, 7);
        let out = engine.apply(&c, order_for(&c, dec!(100))).unwrap();
        assert_eq!(out.total_amount, dec!(81));
        assert_eq!(out.original_total_amount, dec!(100));
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        let engine = Arc::new(DiscountEngine::new(
            vec![Arc::new(SegmentDiscount::new(Segment::Premium, dec!(10)))],
            StackingPolicy::FirstMatch,
        ));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                std::thread::spawn(move || {
                    let c = customer(Segment::Premium, 0);
                    engine.apply(&c, order_for(&c, dec!(200))).unwrap().total_amount
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), dec!(180));
        }
    }
}
