//! SeaORM entity definitions for the shop datastore.

pub mod client;
pub mod inventory_transaction;
pub mod product;
pub mod sale;
pub mod sale_counter;
pub mod sale_item;
pub mod supplier;
pub mod user;
