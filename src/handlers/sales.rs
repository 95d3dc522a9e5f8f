use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthRouterExt, CurrentUser};
use crate::entities::sale::{PaymentMethod, PaymentStatus};
use crate::entities::{sale, sale_item};
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, first_page, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::services::sales::{NewSale, NewSaleItem, Period, SaleFilter};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct SaleItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub price: Option<Decimal>,
    pub discount: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSaleRequest {
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1))]
    pub items: Vec<SaleItemRequest>,
    pub discount: Option<Decimal>,
    pub tax: Option<Decimal>,
    /// Free-form label, normalized to a known method ("Dinheiro" when
    /// unrecognized).
    pub payment_method: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentRequest {
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SaleListParams {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub client_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: Option<PaymentStatus>,
    #[serde(default = "first_page")]
    pub page: u64,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PeriodParams {
    pub period: Option<Period>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TopProductsParams {
    pub limit: Option<usize>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// A sale with its line items.
#[derive(Debug, Serialize)]
pub struct SaleResponse {
    #[serde(flatten)]
    pub sale: sale::Model,
    pub items: Vec<sale_item::Model>,
}

pub fn sale_routes() -> Router<AppState> {
    let admin = Router::new()
        .route("/:id/cancel", post(cancel_sale))
        .with_admin();

    Router::new()
        .route("/", post(create_sale))
        .route("/", get(list_sales))
        .route("/by-period", get(sales_by_period))
        .route("/top-products", get(top_products))
        .route("/:id", get(get_sale))
        .route("/:id/payment", put(update_payment))
        .with_auth()
        .merge(admin)
}

/// Create a sale. Stock, ledger, numbering and client totals are all
/// settled atomically; on any failure nothing is recorded.
#[utoipa::path(
    post,
    path = "/api/sales",
    request_body = CreateSaleRequest,
    responses(
        (status = 201, description = "Sale created"),
        (status = 400, description = "Empty sale or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Sales"
)]
pub async fn create_sale(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateSaleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let items = payload
        .items
        .into_iter()
        .map(|item| NewSaleItem {
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
            discount: item.discount,
        })
        .collect();

    let (sale, items) = state
        .sales
        .create_sale(
            NewSale {
                client_id: payload.client_id,
                items,
                discount: payload.discount,
                tax: payload.tax,
                payment_method: payload.payment_method,
                payment_status: payload.payment_status,
                notes: payload.notes,
            },
            user.id,
        )
        .await?;
    Ok(created_response(SaleResponse { sale, items }))
}

/// List sales with filters and aggregate totals
#[utoipa::path(
    get,
    path = "/api/sales",
    params(SaleListParams),
    responses((status = 200, description = "Sale page with totals")),
    security(("Bearer" = [])),
    tag = "Sales"
)]
pub async fn list_sales(
    State(state): State<AppState>,
    Query(params): Query<SaleListParams>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let pagination = PaginationParams {
        page: params.page,
        limit: params.limit,
    };
    let page = pagination.page();
    let limit = pagination.limit(&state.config.pagination);

    let (result, totals) = state
        .sales
        .list_sales(SaleFilter {
            start_date: params.start_date,
            end_date: params.end_date,
            client_id: params.client_id,
            seller_id: params.seller_id,
            payment_method: params.payment_method,
            payment_status: params.payment_status,
            page,
            limit,
        })
        .await?;

    let response = PaginatedResponse::from_page(result, page, limit);
    Ok(success_response(serde_json::json!({
        "data": response.data,
        "pagination": response.pagination,
        "totals": totals,
    })))
}

/// Totals and daily buckets over a preset period
#[utoipa::path(
    get,
    path = "/api/sales/by-period",
    params(PeriodParams),
    responses((status = 200, description = "Period report")),
    security(("Bearer" = [])),
    tag = "Sales"
)]
pub async fn sales_by_period(
    State(state): State<AppState>,
    Query(params): Query<PeriodParams>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state.sales.sales_by_period(params.period).await?;
    Ok(success_response(report))
}

/// Best-selling products by quantity
#[utoipa::path(
    get,
    path = "/api/sales/top-products",
    params(TopProductsParams),
    responses((status = 200, description = "Product ranking")),
    security(("Bearer" = [])),
    tag = "Sales"
)]
pub async fn top_products(
    State(state): State<AppState>,
    Query(params): Query<TopProductsParams>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let ranking = state
        .sales
        .top_products(
            params.limit.unwrap_or(5),
            params.start_date,
            params.end_date,
        )
        .await?;
    Ok(success_response(ranking))
}

/// Get one sale with its items
#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    params(("id" = Uuid, Path, description = "Sale id")),
    responses(
        (status = 200, description = "Sale"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Sales"
)]
pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let (sale, items) = state.sales.get_sale(id).await?;
    Ok(success_response(SaleResponse { sale, items }))
}

/// Update payment status/method
#[utoipa::path(
    put,
    path = "/api/sales/{id}/payment",
    params(("id" = Uuid, Path, description = "Sale id")),
    request_body = UpdatePaymentRequest,
    responses(
        (status = 200, description = "Updated sale"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Sales"
)]
pub async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: CurrentUser,
    Json(payload): Json<UpdatePaymentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .sales
        .update_payment(id, payload.payment_status, payload.payment_method)
        .await?;
    Ok(success_response(updated))
}

/// Cancel a sale (admin): returns stock and rolls back client totals
#[utoipa::path(
    post,
    path = "/api/sales/{id}/cancel",
    params(("id" = Uuid, Path, description = "Sale id")),
    responses(
        (status = 200, description = "Cancelled sale"),
        (status = 400, description = "Already cancelled", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Sales"
)]
pub async fn cancel_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let cancelled = state.sales.cancel_sale(id, user.id).await?;
    Ok(success_response(cancelled))
}
