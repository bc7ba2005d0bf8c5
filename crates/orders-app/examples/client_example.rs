///  To run :
///  cargo r --example client_example
use orders_client::{CreateCustomerRequest, CreateOrderRequest, OrdersClient};
use orders_hex::application::order_service::OrderService;
use orders_hex::config::DiscountConfig;
use orders_hex::inbound::http::{HttpServer, HttpServerConfig};
use orders_repo::build_repo;
use orders_types::domain::customer::Segment;
use orders_types::domain::order::{OrderItem, OrderStatus};
use reqwest::StatusCode;
use rust_decimal_macros::dec;
use tempfile::tempdir;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    // Use a temp file-backed SQLite DB so multiple connections see the same data.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("orders.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let repo = build_repo(Some(&db_url)).await?;
    let service = OrderService::new(repo, DiscountConfig::default().build_engine());
    let server = HttpServer::new(
        service,
        HttpServerConfig {
            port: port.to_string(),
        },
    )
    .await?;

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let client = OrdersClient::new(&addr)?;

    let mut customers = Vec::new();
    for (name, segment) in [
        ("Gold Example", Segment::Gold),
        ("Premium Example", Segment::Premium),
        ("Regular Example", Segment::Regular),
    ] {
        let c = client
            .create_customer(CreateCustomerRequest {
                name: name.into(),
                email: format!("{}@example.com", segment.to_string().to_lowercase()),
                segment,
            })
            .await?;
        println!("Created {} customer id={}", c.segment, c.id);
        customers.push(c);
    }

    let mut order_ids = Vec::new();
    for c in &customers {
        let created = client
            .create_order(CreateOrderRequest {
                customer_id: c.id,
                shipping_address: "123 Main St".into(),
                items: vec![OrderItem {
                    name: "Widget".into(),
                    qty: 1,
                    unit_price: dec!(100),
                }],
            })
            .await?;
        println!(
            "{} order id={} original={} charged={}",
            c.segment, created.id, created.original_total_amount, created.total_amount
        );
        assert_eq!(created.status, OrderStatus::Pending);
        order_ids.push(created.id);
    }

    for id in &order_ids[..1] {
        client.update_status(id, OrderStatus::Processing).await?;
        let delivered = client.update_status(id, OrderStatus::Delivered).await?;
        println!("Delivered order {} at {:?}", delivered.id, delivered.delivered_date);
    }

    let summary = client.analytics_summary().await?;
    println!(
        "Average order value={} average fulfillment hours={:.4}",
        summary.average_order_value, summary.average_fulfillment_time
    );

    // Delivered orders cannot go back to pending.
    match client.update_status(&order_ids[0], OrderStatus::Pending).await {
        Ok(_) => println!("unexpected: transition accepted"),
        Err(err) => {
            let status = err
                .downcast_ref::<reqwest::Error>()
                .and_then(|e| e.status());
            assert_eq!(status, Some(StatusCode::BAD_REQUEST));
            println!("Rejected illegal transition with {:?}", status);
        }
    }

    for id in &order_ids {
        client.delete_order(id).await?;
    }
    println!("Deleted {} orders", order_ids.len());

    handle.abort();
    Ok(())
}
