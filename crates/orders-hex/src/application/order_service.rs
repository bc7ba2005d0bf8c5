use crate::errors::AppError;
use orders_types::domain::analytics::{summarize, AnalyticsSummary};
use orders_types::domain::customer::{Customer, Segment};
use orders_types::domain::discount::DiscountEngine;
use orders_types::domain::order::{Order, OrderItem, OrderStatus};
use orders_types::ports::OrderStore;
use uuid::Uuid;

pub struct OrderService<R: OrderStore> {
    repo: R,
    engine: DiscountEngine,
}

impl<R: OrderStore> OrderService<R> {
    pub fn new(repo: R, engine: DiscountEngine) -> Self {
        Self { repo, engine }
    }

    pub async fn create_customer(
        &self,
        name: String,
        email: String,
        segment: Segment,
    ) -> Result<Customer, AppError> {
        let customer =
            Customer::new(name, email, segment).map_err(|e| AppError::BadRequest(e.to_string()))?;
        let customer = self.repo.create_customer(customer).await?;
        tracing::info!(customer_id = %customer.id, segment = %customer.segment, "customer created");
        Ok(customer)
    }

    pub async fn get_customer(&self, id: Uuid) -> Result<Customer, AppError> {
        match self.repo.get_customer(id).await? {
            Some(c) => Ok(c),
            None => Err(AppError::NotFound(format!("customer {}", id))),
        }
    }

    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        Ok(self.repo.list_customers().await?)
    }

    /// Prices the order, runs the discount rules, then stores it.
    ///
    /// The customer's order count is reserved before pricing so concurrent orders
    /// each see a distinct prior-order count. Any later failure gives it back.
    pub async fn create_order(
        &self,
        customer_id: Uuid,
        shipping_address: String,
        items: Vec<OrderItem>,
    ) -> Result<Order, AppError> {
        let mut customer = self.get_customer(customer_id).await?;
        let order = Order::new(&customer, shipping_address, items)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let prior = self
            .repo
            .increment_order_count(customer.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("customer {}", customer.id)))?;
        customer.order_count = prior;

        let order = match self.price_and_store(&customer, order, prior).await {
            Ok(order) => order,
            Err(e) => {
                if let Err(release) = self.repo.decrement_order_count(customer.id).await {
                    tracing::error!(
                        customer_id = %customer.id,
                        error = %release,
                        "failed to release reserved order count"
                    );
                }
                return Err(e);
            }
        };
        tracing::info!(
            order_id = %order.id,
            customer_id = %customer.id,
            original = %order.original_total_amount,
            total = %order.total_amount,
            "order created"
        );
        Ok(order)
    }

    async fn price_and_store(
        &self,
        customer: &Customer,
        mut order: Order,
        prior: u32,
    ) -> Result<Order, AppError> {
        order.order_count = prior;
        let order = self.engine.apply(customer, order)?;
        Ok(self.repo.create(order).await?)
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Order, AppError> {
        match self.repo.get(id).await? {
            Some(o) => Ok(o),
            None => Err(AppError::NotFound(format!("order {}", id))),
        }
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        Ok(self.repo.list().await?)
    }

    pub async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, AppError> {
        let mut order = self.get_order(id).await?;
        let from = order.status;
        order
            .update_status(status)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        match self.repo.update(order).await? {
            Some(o) => {
                tracing::info!(order_id = %id, ?from, to = ?o.status, "order status changed");
                Ok(o)
            }
            None => Err(AppError::NotFound(format!("order {}", id))),
        }
    }

    pub async fn delete_order(&self, id: Uuid) -> Result<(), AppError> {
        let deleted = self.repo.delete(id).await?;
        if deleted {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("order {}", id)))
        }
    }

    pub async fn analytics_summary(&self) -> Result<AnalyticsSummary, AppError> {
        let orders = self.repo.list().await?;
        let summary = summarize(&orders)?;
        tracing::debug!(
            orders = orders.len(),
            average_order_value = %summary.average_order_value,
            average_fulfillment_time = summary.average_fulfillment_time,
            "analytics computed"
        );
        Ok(summary)
    }
}
