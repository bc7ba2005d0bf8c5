use async_trait::async_trait;
use orders_hex::application::order_service::OrderService;
use orders_hex::config::DiscountConfig;
use orders_hex::errors::AppError;
use orders_repo::memory::InMemoryRepo;
use orders_types::domain::customer::{Customer, Segment};
use orders_types::domain::discount::StackingPolicy;
use orders_types::domain::order::{Order, OrderItem, OrderStatus};
use orders_types::ports::customer_repository::CustomerRepository;
use orders_types::ports::order_repository::{OrderRepository, RepoError};
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

fn one_thing() -> Vec<OrderItem> {
    vec![OrderItem {
        name: "Thing".into(),
        qty: 1,
        unit_price: dec!(100),
    }]
}

/// In-memory store with switchable write failures.
#[derive(Clone, Default)]
struct FlakyRepo {
    inner: InMemoryRepo,
    fail_create: bool,
    fail_increment: bool,
}

#[async_trait]
impl OrderRepository for FlakyRepo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        if self.fail_create {
            return Err(RepoError::DbError("disk full".into()));
        }
        self.inner.create(order).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        self.inner.get(id).await
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        self.inner.list().await
    }

    async fn update(&self, order: Order) -> Result<Option<Order>, RepoError> {
        self.inner.update(order).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        self.inner.delete(id).await
    }
}

#[async_trait]
impl CustomerRepository for FlakyRepo {
    async fn create_customer(&self, customer: Customer) -> Result<Customer, RepoError> {
        self.inner.create_customer(customer).await
    }

    async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, RepoError> {
        self.inner.get_customer(id).await
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, RepoError> {
        self.inner.list_customers().await
    }

    async fn increment_order_count(&self, id: Uuid) -> Result<Option<u32>, RepoError> {
        if self.fail_increment {
            return Err(RepoError::DbError("locked".into()));
        }
        self.inner.increment_order_count(id).await
    }

    async fn decrement_order_count(&self, id: Uuid) -> Result<(), RepoError> {
        self.inner.decrement_order_count(id).await
    }
}

// End-to-end service flow against the in-memory adapter.
#[tokio::test]
async fn create_list_update_delete_flow() {
    let repo = InMemoryRepo::new();
    let svc = OrderService::new(repo.clone(), DiscountConfig::default().build_engine());

    let customer = svc
        .create_customer("Eve".into(), "eve@example.com".into(), Segment::Premium)
        .await
        .unwrap();
    let order = svc
        .create_order(
            customer.id,
            "9 Elm St".into(),
            vec![OrderItem {
                name: "Gadget".into(),
                qty: 3,
                unit_price: dec!(7.00),
            }],
        )
        .await
        .unwrap();
    assert_eq!(order.original_total_amount, dec!(21.00));
    assert_eq!(order.total_amount, dec!(18.90));

    let list = svc.list_orders().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, order.id);

    let updated = svc
        .update_status(order.id, OrderStatus::Processing)
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Processing);
    let delivered = svc
        .update_status(order.id, OrderStatus::Delivered)
        .await
        .unwrap();
    assert!(delivered.delivered_date.is_some());

    let summary = svc.analytics_summary().await.unwrap();
    assert_eq!(summary.average_order_value, dec!(18.90));
    assert!(summary.average_fulfillment_time >= 0.0);

    svc.delete_order(order.id).await.unwrap();
    let after_delete = svc.list_orders().await.unwrap();
    assert!(after_delete.is_empty());
}

#[tokio::test]
async fn volume_rule_kicks_in_after_enough_orders() {
    let config = DiscountConfig {
        volume_min_orders: 2,
        ..DiscountConfig::default()
    };
    let svc = OrderService::new(InMemoryRepo::new(), config.build_engine());
    let customer = svc
        .create_customer("Vic".into(), "vic@example.com".into(), Segment::Regular)
        .await
        .unwrap();

    let mut totals = Vec::new();
    for _ in 0..3 {
        let order = svc
            .create_order(
                customer.id,
                "1 Oak St".into(),
                vec![OrderItem {
                    name: "Thing".into(),
                    qty: 1,
                    unit_price: dec!(100),
                }],
            )
            .await
            .unwrap();
        totals.push(order.total_amount);
    }
    assert_eq!(totals, vec![dec!(100), dec!(100), dec!(95)]);
}

#[tokio::test]
async fn cumulative_stacking_combines_segment_and_volume() {
    let config = DiscountConfig {
        volume_min_orders: 0,
        stacking: StackingPolicy::Cumulative,
        ..DiscountConfig::default()
    };
    let svc = OrderService::new(InMemoryRepo::new(), config.build_engine());
    let gold = svc
        .create_customer("Gil".into(), "gil@example.com".into(), Segment::Gold)
        .await
        .unwrap();
    let order = svc
        .create_order(
            gold.id,
            "2 Oak St".into(),
            vec![OrderItem {
                name: "Thing".into(),
                qty: 1,
                unit_price: dec!(100),
            }],
        )
        .await
        .unwrap();
    // 15% off, then 5% off the result.
    assert_eq!(order.total_amount, dec!(80.75));
    assert_eq!(order.original_total_amount, dec!(100));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_orders_get_distinct_prior_counts() {
    let repo = InMemoryRepo::new();
    let svc = Arc::new(OrderService::new(
        repo.clone(),
        DiscountConfig::default().build_engine(),
    ));
    let customer = svc
        .create_customer("Con".into(), "con@example.com".into(), Segment::Regular)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..200 {
        let svc = svc.clone();
        let id = customer.id;
        handles.push(tokio::spawn(async move {
            svc.create_order(id, "3 Oak St".into(), one_thing())
                .await
                .unwrap()
        }));
    }
    let mut counts = HashSet::new();
    for h in handles {
        let order = h.await.unwrap();
        // default volume rule: 5% off from the fifth prior order
        let expected = if order.order_count >= 5 { dec!(95) } else { dec!(100) };
        assert_eq!(order.total_amount, expected);
        counts.insert(order.order_count);
    }

    assert_eq!(counts, (0..200).collect::<HashSet<u32>>());
    assert_eq!(svc.list_orders().await.unwrap().len(), 200);
    assert_eq!(svc.get_customer(customer.id).await.unwrap().order_count, 200);
}

#[tokio::test]
async fn failed_count_reservation_stores_nothing() {
    let repo = FlakyRepo {
        fail_increment: true,
        ..FlakyRepo::default()
    };
    let svc = OrderService::new(repo.clone(), DiscountConfig::default().build_engine());
    let customer = svc
        .create_customer("Fay".into(), "fay@example.com".into(), Segment::Gold)
        .await
        .unwrap();

    let res = svc.create_order(customer.id, "4 Oak St".into(), one_thing()).await;
    assert!(matches!(res, Err(AppError::Internal(_))));
    assert!(repo.inner.list().await.unwrap().is_empty());
    assert_eq!(svc.get_customer(customer.id).await.unwrap().order_count, 0);
}

#[tokio::test]
async fn failed_store_gives_the_count_back() {
    let repo = FlakyRepo {
        fail_create: true,
        ..FlakyRepo::default()
    };
    let svc = OrderService::new(repo.clone(), DiscountConfig::default().build_engine());
    let customer = svc
        .create_customer("Sol".into(), "sol@example.com".into(), Segment::Premium)
        .await
        .unwrap();

    let res = svc.create_order(customer.id, "5 Oak St".into(), one_thing()).await;
    assert!(matches!(res, Err(AppError::Internal(_))));
    assert!(repo.inner.list().await.unwrap().is_empty());
    assert_eq!(svc.get_customer(customer.id).await.unwrap().order_count, 0);
}
