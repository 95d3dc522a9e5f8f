use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::{AuthRouterExt, CurrentUser};
use crate::errors::ServiceError;
use crate::handlers::common::success_response;
use crate::services::reports::GroupBy;
use crate::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SalesAnalysisParams {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub group_by: Option<GroupBy>,
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stats))
        .route("/stats", get(stats))
        .route("/sales-analysis", get(sales_analysis))
        .route("/inventory-analysis", get(inventory_analysis))
        .route("/client-analysis", get(client_analysis))
        .with_auth()
}

/// Landing page numbers: counts, today/month totals and charts
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses((status = 200, description = "Dashboard snapshot")),
    security(("Bearer" = [])),
    tag = "Dashboard"
)]
pub async fn stats(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let stats = state.reports.dashboard_stats().await?;
    Ok(success_response(stats))
}

/// Sales over a range bucketed by day, week, month or year
#[utoipa::path(
    get,
    path = "/api/dashboard/sales-analysis",
    params(SalesAnalysisParams),
    responses((status = 200, description = "Sales analysis")),
    security(("Bearer" = [])),
    tag = "Dashboard"
)]
pub async fn sales_analysis(
    State(state): State<AppState>,
    Query(params): Query<SalesAnalysisParams>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let analysis = state
        .reports
        .sales_analysis(
            params.start_date,
            params.end_date,
            params.group_by.unwrap_or(GroupBy::Day),
        )
        .await?;
    Ok(success_response(analysis))
}

/// Stock valuation per category plus low/out-of-stock overview
#[utoipa::path(
    get,
    path = "/api/dashboard/inventory-analysis",
    responses((status = 200, description = "Inventory analysis")),
    security(("Bearer" = [])),
    tag = "Dashboard"
)]
pub async fn inventory_analysis(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let analysis = state.reports.inventory_analysis().await?;
    Ok(success_response(analysis))
}

/// Client base snapshot and best clients
#[utoipa::path(
    get,
    path = "/api/dashboard/client-analysis",
    responses((status = 200, description = "Client analysis")),
    security(("Bearer" = [])),
    tag = "Dashboard"
)]
pub async fn client_analysis(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let analysis = state.reports.client_analysis().await?;
    Ok(success_response(analysis))
}
