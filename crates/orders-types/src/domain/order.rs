use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::customer::Customer;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Shipped)
                | (Processing, Delivered)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub name: String,
    pub qty: u32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub email: String,
    pub shipping_address: String,
    pub items: Vec<OrderItem>,
    /// Amount charged, after any discount.
    pub total_amount: Decimal,
    /// Amount before discounting.
    pub original_total_amount: Decimal,
    /// Customer's prior order count when this order was placed.
    pub order_count: u32,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        customer: &Customer,
        shipping_address: String,
        items: Vec<OrderItem>,
    ) -> anyhow::Result<Self> {
        if shipping_address.trim().is_empty() {
            anyhow::bail!("shipping_address empty");
        }
        if items.is_empty() {
            anyhow::bail!("items empty");
        }
        let mut total = Decimal::ZERO;
        for it in &items {
            if it.qty == 0 {
                anyhow::bail!("item qty must be > 0");
            }
            if it.unit_price.is_sign_negative() {
                anyhow::bail!("item unit_price must be >= 0");
            }
            total = it
                .unit_price
                .checked_mul(Decimal::from(it.qty))
                .and_then(|line| total.checked_add(line))
                .ok_or_else(|| anyhow::anyhow!("order total overflow"))?;
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            customer_id: customer.id,
            customer_name: customer.name.clone(),
            email: customer.email.clone(),
            shipping_address,
            items,
            total_amount: total,
            original_total_amount: total,
            order_count: customer.order_count,
            status: OrderStatus::Pending,
            order_date: now,
            delivered_date: None,
            updated_at: now,
        })
    }

    pub fn update_status(&mut self, status: OrderStatus) -> anyhow::Result<()> {
        if !self.status.can_transition_to(status) {
            anyhow::bail!("cannot move order from {:?} to {:?}", self.status, status);
        }
        let now = Utc::now();
        if status == OrderStatus::Delivered {
            self.delivered_date = Some(now);
        }
        self.status = status;
        self.updated_at = now;
        Ok(())
    }

    /// Hours between placement and delivery; `None` unless delivered.
    pub fn fulfillment_hours(&self) -> Option<f64> {
        if self.status != OrderStatus::Delivered {
            return None;
        }
        let delivered = self.delivered_date?;
        let elapsed = delivered - self.order_date;
        Some(elapsed.num_milliseconds() as f64 / 3_600_000.0)
    }
}
