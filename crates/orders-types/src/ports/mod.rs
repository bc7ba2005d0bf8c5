pub mod customer_repository;
pub mod order_repository;

use customer_repository::CustomerRepository;
use order_repository::OrderRepository;

/// Everything the order service needs from storage.
pub trait OrderStore: OrderRepository + CustomerRepository {}

impl<T> OrderStore for T where T: OrderRepository + CustomerRepository {}
