use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::customer::Customer;
use crate::ports::order_repository::RepoError;

#[async_trait]
pub trait CustomerRepository: Send + Sync + 'static {
    async fn create_customer(&self, customer: Customer) -> Result<Customer, RepoError>;
    async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, RepoError>;
    async fn list_customers(&self) -> Result<Vec<Customer>, RepoError>;
    /// Atomically bumps the prior-order counter and returns the value it held
    /// before the bump. `None` when the customer is unknown.
    async fn increment_order_count(&self, id: Uuid) -> Result<Option<u32>, RepoError>;
    /// Gives back one count taken by `increment_order_count`. Never goes below zero.
    async fn decrement_order_count(&self, id: Uuid) -> Result<(), RepoError>;
}
