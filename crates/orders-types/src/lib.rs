//! orders-types: domain model and ports shared by the adapters

pub mod domain;
pub mod ports;
