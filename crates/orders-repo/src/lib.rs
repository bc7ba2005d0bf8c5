#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use async_trait::async_trait;
use orders_types::domain::customer::Customer;
use orders_types::domain::order::Order;
use orders_types::ports::customer_repository::CustomerRepository;
use orders_types::ports::order_repository::{OrderRepository, RepoError};
use orders_types::ports::OrderStore;
use uuid::Uuid;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Storage picked by cargo features; sqlite wins when both are enabled.
pub struct Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    memory: memory::InMemoryRepo,
    #[cfg(feature = "sqlite")]
    sqlite: sqlite::SqliteRepo,
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(_: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self {
            memory: crate::memory::InMemoryRepo::new(),
        })
    }

    #[cfg(feature = "sqlite")]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or("sqlite://orders.db");
        let sqlite = sqlite::SqliteRepo::new(url).await?;
        Ok(Self { sqlite })
    }

    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    fn backend(&self) -> &dyn OrderStore {
        &self.memory
    }

    #[cfg(feature = "sqlite")]
    fn backend(&self) -> &dyn OrderStore {
        &self.sqlite
    }
}

#[async_trait]
impl OrderRepository for Repo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        self.backend().create(order).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        self.backend().get(id).await
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        self.backend().list().await
    }

    async fn update(&self, order: Order) -> Result<Option<Order>, RepoError> {
        self.backend().update(order).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        self.backend().delete(id).await
    }
}

#[async_trait]
impl CustomerRepository for Repo {
    async fn create_customer(&self, customer: Customer) -> Result<Customer, RepoError> {
        self.backend().create_customer(customer).await
    }

    async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, RepoError> {
        self.backend().get_customer(id).await
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, RepoError> {
        self.backend().list_customers().await
    }

    async fn increment_order_count(&self, id: Uuid) -> Result<Option<u32>, RepoError> {
        self.backend().increment_order_count(id).await
    }

    async fn decrement_order_count(&self, id: Uuid) -> Result<(), RepoError> {
        self.backend().decrement_order_count(id).await
    }
}
