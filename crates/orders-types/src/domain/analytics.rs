use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order::Order;

/// Summary returned by the analytics endpoint. Never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct AnalyticsSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub average_order_value: Decimal,
    /// Hours, delivered orders only.
    pub average_fulfillment_time: f64,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("order value sum overflowed at order index {0}")]
    Overflow(usize),
}

pub fn summarize(orders: &[Order]) -> Result<AnalyticsSummary, AnalyticsError> {
    let mut sum = Decimal::ZERO;
    for (i, o) in orders.iter().enumerate() {
        sum = sum
            .checked_add(o.total_amount)
            .ok_or(AnalyticsError::Overflow(i))?;
    }
    let average_order_value = if orders.is_empty() {
        Decimal::ZERO
    } else {
        sum / Decimal::from(orders.len())
    };

    let (hours, delivered) = orders
        .iter()
        .filter_map(Order::fulfillment_hours)
        .fold((0.0_f64, 0_usize), |(h, n), x| (h + x, n + 1));
    let average_fulfillment_time = if delivered == 0 {
        0.0
    } else {
        hours / delivered as f64
    };

    Ok(AnalyticsSummary {
        average_order_value,
        average_fulfillment_time,
    })
}
