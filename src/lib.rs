//! Tabacaria API: point-of-sale and inventory backend for a tobacco
//! and hookah shop.
//!
//! Products carry a stock ledger, sales settle stock, numbering and
//! client loyalty atomically, and a dashboard aggregates the numbers
//! the shop owner actually looks at.

use std::sync::Arc;

use axum::{Json, Router};
use sea_orm::DatabaseConnection;

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub auth: Arc<auth::AuthService>,
    pub products: services::products::ProductService,
    pub sales: services::sales::SaleService,
    pub clients: services::clients::ClientService,
    pub suppliers: services::suppliers::SupplierService,
    pub users: services::users::UserService,
    pub reports: services::reports::ReportService,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: Arc<config::AppConfig>,
        auth: Arc<auth::AuthService>,
        events: Arc<events::EventSender>,
    ) -> Self {
        Self {
            products: services::products::ProductService::new(db.clone(), events.clone()),
            sales: services::sales::SaleService::new(db.clone(), events.clone()),
            clients: services::clients::ClientService::new(db.clone(), events.clone()),
            suppliers: services::suppliers::SupplierService::new(db.clone(), events.clone()),
            users: services::users::UserService::new(db.clone(), auth.clone(), events),
            reports: services::reports::ReportService::new(db.clone(), config.stock.clone()),
            db,
            config,
            auth,
        }
    }
}

/// The `/api` route tree.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", handlers::products::product_routes())
        .nest("/sales", handlers::sales::sale_routes())
        .nest("/clients", handlers::clients::client_routes())
        .nest("/suppliers", handlers::suppliers::supplier_routes())
        .nest("/users", handlers::users::user_routes())
        .nest("/dashboard", handlers::dashboard::dashboard_routes())
}

/// Liveness endpoint with a database ping.
pub async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    let database = match db::check_connection(&state.db).await {
        Ok(()) => "up",
        Err(_) => "down",
    };
    Json(serde_json::json!({
        "status": if database == "up" { "ok" } else { "degraded" },
        "database": database,
    }))
}
