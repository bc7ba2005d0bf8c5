mod server;

pub use server::{
    CreateCustomerRequest, CreateOrderRequest, CreateOrderResponse, HttpServer, HttpServerConfig,
    UpdateStatusRequest,
};
