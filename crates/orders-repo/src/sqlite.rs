use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orders_types::domain::customer::{Customer, Segment};
use orders_types::domain::order::{Order, OrderItem, OrderStatus};
use orders_types::ports::customer_repository::CustomerRepository;
use orders_types::ports::order_repository::{OrderRepository, RepoError};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, customer_id, customer_name, email, shipping_address, items_json, \
     total_amount, original_total_amount, order_count, status, order_date, delivered_date, updated_at";

pub struct SqliteRepo {
    pool: SqlitePool,
}

fn db_err(e: impl ToString) -> RepoError {
    RepoError::DbError(e.to_string())
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(db_err)?
        .with_timezone(&Utc))
}

fn parse_status(s: &str) -> Result<OrderStatus, RepoError> {
    match s {
        "Pending" => Ok(OrderStatus::Pending),
        "Processing" => Ok(OrderStatus::Processing),
        "Shipped" => Ok(OrderStatus::Shipped),
        "Delivered" => Ok(OrderStatus::Delivered),
        "Cancelled" => Ok(OrderStatus::Cancelled),
        other => Err(RepoError::DbError(format!("unknown order status {other}"))),
    }
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    customer_id: String,
    customer_name: String,
    email: String,
    shipping_address: String,
    items_json: String,
    total_amount: String,
    original_total_amount: String,
    order_count: i64,
    status: String,
    order_date: String,
    delivered_date: Option<String>,
    updated_at: String,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        let items: Vec<OrderItem> = serde_json::from_str(&self.items_json).map_err(db_err)?;
        let delivered_date = self.delivered_date.as_deref().map(parse_ts).transpose()?;
        Ok(Order {
            id: Uuid::parse_str(&self.id).map_err(db_err)?,
            customer_id: Uuid::parse_str(&self.customer_id).map_err(db_err)?,
            customer_name: self.customer_name,
            email: self.email,
            shipping_address: self.shipping_address,
            items,
            total_amount: Decimal::from_str(&self.total_amount).map_err(db_err)?,
            original_total_amount: Decimal::from_str(&self.original_total_amount)
                .map_err(db_err)?,
            order_count: u32::try_from(self.order_count).map_err(db_err)?,
            status: parse_status(&self.status)?,
            order_date: parse_ts(&self.order_date)?,
            delivered_date,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbCustomer {
    id: String,
    name: String,
    email: String,
    segment: String,
    order_count: i64,
    created_at: String,
}

impl DbCustomer {
    fn into_customer(self) -> Result<Customer, RepoError> {
        Ok(Customer {
            id: Uuid::parse_str(&self.id).map_err(db_err)?,
            name: self.name,
            email: self.email,
            segment: Segment::from_str(&self.segment).map_err(db_err)?,
            order_count: u32::try_from(self.order_count).map_err(db_err)?,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;

        for ddl in [
            include_str!("../migrations/0001_create_orders.sql"),
            include_str!("../migrations/0002_create_customers.sql"),
        ] {
            sqlx::query(ddl).execute(&pool).await?;
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        let items_json = serde_json::to_string(&order.items).map_err(db_err)?;
        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(order.id.to_string())
        .bind(order.customer_id.to_string())
        .bind(&order.customer_name)
        .bind(&order.email)
        .bind(&order.shipping_address)
        .bind(items_json)
        .bind(order.total_amount.to_string())
        .bind(order.original_total_amount.to_string())
        .bind(i64::from(order.order_count))
        .bind(format!("{:?}", order.status))
        .bind(order.order_date.to_rfc3339())
        .bind(order.delivered_date.map(|d| d.to_rfc3339()))
        .bind(order.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(order)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(|r| r.into_order()).transpose()
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY order_date"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|r| r.into_order())
            .collect::<Result<Vec<_>, _>>()
    }

    async fn update(&self, order: Order) -> Result<Option<Order>, RepoError> {
        let updated = sqlx::query(
            "UPDATE orders SET status = ?, delivered_date = ?, total_amount = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(format!("{:?}", order.status))
        .bind(order.delivered_date.map(|d| d.to_rfc3339()))
        .bind(order.total_amount.to_string())
        .bind(order.updated_at.to_rfc3339())
        .bind(order.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(order.id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl CustomerRepository for SqliteRepo {
    async fn create_customer(&self, customer: Customer) -> Result<Customer, RepoError> {
        sqlx::query(
            "INSERT INTO customers (id, name, email, segment, order_count, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(customer.id.to_string())
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(customer.segment.to_string())
        .bind(i64::from(customer.order_count))
        .bind(customer.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(customer)
    }

    async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, RepoError> {
        let row: Option<DbCustomer> = sqlx::query_as(
            "SELECT id, name, email, segment, order_count, created_at FROM customers WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(|r| r.into_customer()).transpose()
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, RepoError> {
        let rows: Vec<DbCustomer> = sqlx::query_as(
            "SELECT id, name, email, segment, order_count, created_at FROM customers ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(|r| r.into_customer()).collect()
    }

    async fn increment_order_count(&self, id: Uuid) -> Result<Option<u32>, RepoError> {
        let prior: Option<i64> = sqlx::query_scalar(
            "UPDATE customers SET order_count = order_count + 1 WHERE id = ?
             RETURNING order_count - 1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        prior
            .map(|n| u32::try_from(n).map_err(db_err))
            .transpose()
    }

    async fn decrement_order_count(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("UPDATE customers SET order_count = MAX(order_count - 1, 0) WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
