use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, patch, post},
    serve, Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::order_service::OrderService;
use crate::errors::AppError;
use orders_types::domain::analytics::AnalyticsSummary;
use orders_types::domain::customer::{Customer, Segment};
use orders_types::domain::order::{Order, OrderItem, OrderStatus};
use orders_types::ports::OrderStore;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
}

#[derive(Clone)]
pub struct HttpServer<R>
where
    R: OrderStore,
{
    pub service: Arc<OrderService<R>>,
    pub config: HttpServerConfig,
}

#[derive(Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub segment: Segment,
}

#[derive(Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    pub shipping_address: String,
    pub items: Vec<OrderItem>,
}

#[derive(Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateOrderResponse {
    pub id: String,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub original_total_amount: Decimal,
}

impl From<Order> for CreateOrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id.to_string(),
            status: o.status,
            total_amount: o.total_amount,
            original_total_amount: o.original_total_amount,
        }
    }
}

fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|e| AppError::BadRequest(e.to_string()))
}

impl<R> HttpServer<R>
where
    R: OrderStore,
{
    pub async fn new(service: OrderService<R>, config: HttpServerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            service: Arc::new(service),
            config,
        })
    }

    pub fn router(&self) -> Router {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        Router::new()
            .route("/health", get(health))
            .route("/customers", post(create_customer::<R>).get(list_customers::<R>))
            .route("/customers/{id}", get(get_customer::<R>))
            .route("/orders", post(create_order::<R>).get(list_orders::<R>))
            .route("/orders/{id}", get(get_order::<R>).delete(delete_order::<R>))
            .route("/orders/{id}/status", patch(update_status::<R>))
            .route("/api/analytics/summary", get(analytics_summary::<R>))
            .layer(trace_layer)
            .with_state(self.service.clone())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> (axum::http::StatusCode, Json<serde_json::Value>) {
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({ "status": "ok" })),
    )
}

async fn create_customer<R: OrderStore>(
    State(service): State<Arc<OrderService<R>>>,
    payload: Result<Json<CreateCustomerRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<Customer>), AppError> {
    let Json(payload) = payload?;
    let customer = service
        .create_customer(payload.name, payload.email, payload.segment)
        .await?;
    Ok((axum::http::StatusCode::CREATED, Json(customer)))
}

async fn list_customers<R: OrderStore>(
    State(service): State<Arc<OrderService<R>>>,
) -> Result<Json<Vec<Customer>>, AppError> {
    Ok(Json(service.list_customers().await?))
}

async fn get_customer<R: OrderStore>(
    State(service): State<Arc<OrderService<R>>>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, AppError> {
    let customer = service.get_customer(parse_id(&id)?).await?;
    Ok(Json(customer))
}

async fn create_order<R: OrderStore>(
    State(service): State<Arc<OrderService<R>>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<CreateOrderResponse>), AppError> {
    let Json(payload) = payload?;
    let order = service
        .create_order(payload.customer_id, payload.shipping_address, payload.items)
        .await?;
    let body: CreateOrderResponse = order.into();
    Ok((axum::http::StatusCode::CREATED, Json(body)))
}

async fn get_order<R: OrderStore>(
    State(service): State<Arc<OrderService<R>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    let order = service.get_order(parse_id(&id)?).await?;
    Ok(Json(order))
}

async fn list_orders<R: OrderStore>(
    State(service): State<Arc<OrderService<R>>>,
) -> Result<Json<Vec<Order>>, AppError> {
    let list = service.list_orders().await?;
    Ok(Json(list))
}

async fn update_status<R: OrderStore>(
    State(service): State<Arc<OrderService<R>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Order>, AppError> {
    let Json(payload) = payload?;
    let updated = service.update_status(parse_id(&id)?, payload.status).await?;
    Ok(Json(updated))
}

async fn delete_order<R: OrderStore>(
    State(service): State<Arc<OrderService<R>>>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, AppError> {
    service.delete_order(parse_id(&id)?).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn analytics_summary<R: OrderStore>(
    State(service): State<Arc<OrderService<R>>>,
) -> Result<Json<AnalyticsSummary>, AppError> {
    Ok(Json(service.analytics_summary().await?))
}
