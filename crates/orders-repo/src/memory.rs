use async_trait::async_trait;
use dashmap::DashMap;
use orders_types::domain::customer::Customer;
use orders_types::domain::order::Order;
use orders_types::ports::customer_repository::CustomerRepository;
use orders_types::ports::order_repository::{OrderRepository, RepoError};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct InMemoryRepo {
    pub orders: Arc<DashMap<Uuid, Order>>,
    pub customers: Arc<DashMap<Uuid, Customer>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(DashMap::new()),
            customers: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.get(&id).map(|r| r.clone()))
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        Ok(self.orders.iter().map(|kv| kv.value().clone()).collect())
    }

    async fn update(&self, order: Order) -> Result<Option<Order>, RepoError> {
        if let Some(mut v) = self.orders.get_mut(&order.id) {
            *v = order.clone();
            return Ok(Some(order));
        }
        Ok(None)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.orders.remove(&id).is_some())
    }
}

#[async_trait]
impl CustomerRepository for InMemoryRepo {
    async fn create_customer(&self, customer: Customer) -> Result<Customer, RepoError> {
        self.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, RepoError> {
        Ok(self.customers.get(&id).map(|r| r.clone()))
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, RepoError> {
        Ok(self.customers.iter().map(|kv| kv.value().clone()).collect())
    }

    async fn increment_order_count(&self, id: Uuid) -> Result<Option<u32>, RepoError> {
        // get_mut holds the shard lock across the read and the write.
        Ok(self.customers.get_mut(&id).map(|mut v| {
            let prior = v.order_count;
            v.order_count = prior.saturating_add(1);
            prior
        }))
    }

    async fn decrement_order_count(&self, id: Uuid) -> Result<(), RepoError> {
        if let Some(mut v) = self.customers.get_mut(&id) {
            v.order_count = v.order_count.saturating_sub(1);
        }
        Ok(())
    }
}
