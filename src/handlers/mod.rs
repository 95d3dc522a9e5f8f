//! HTTP handlers. Thin layer over the services: extract, validate,
//! delegate, serialize.

pub mod clients;
pub mod common;
pub mod dashboard;
pub mod products;
pub mod sales;
pub mod suppliers;
pub mod users;
