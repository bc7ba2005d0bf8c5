pub mod analytics;
pub mod customer;
pub mod discount;
pub mod order;
