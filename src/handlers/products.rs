use std::collections::BTreeMap;

use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthRouterExt, CurrentUser};
use crate::entities::inventory_transaction::MovementKind;
use crate::entities::product::ProductCategory;
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, no_content_response, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::services::inventory;
use crate::services::products::{NewProduct, ProductFilter, ProductPatch};
use crate::services::DeleteOutcome;
use crate::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub category: ProductCategory,
    pub price: Decimal,
    pub cost_price: Decimal,
    #[serde(default)]
    pub stock: i32,
    pub min_stock: Option<i32>,
    pub barcode: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub flavors: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<ProductCategory>,
    pub price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub stock: Option<i32>,
    pub min_stock: Option<i32>,
    pub barcode: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub images: Option<Vec<String>>,
    pub flavors: Option<Vec<String>>,
    pub attributes: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductListParams {
    pub search: Option<String>,
    pub category: Option<ProductCategory>,
    pub active: Option<bool>,
    #[serde(default)]
    pub low_stock: bool,
    #[serde(default = "crate::handlers::common::first_page")]
    pub page: u64,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StockUpdateRequest {
    pub kind: MovementKind,
    pub quantity: i32,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddImageRequest {
    #[validate(length(min = 1))]
    pub url: String,
    pub index: Option<usize>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReorderImagesRequest {
    pub order: Vec<usize>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PriceTableParams {
    pub category: Option<ProductCategory>,
}

pub fn product_routes() -> Router<AppState> {
    let admin = Router::new()
        .route("/:id", delete(delete_product))
        .with_admin();

    Router::new()
        .route("/", post(create_product))
        .route("/", get(list_products))
        .route("/low-stock", get(low_stock))
        .route("/categories", get(categories))
        .route("/tabela", get(price_table))
        .route("/:id", get(get_product))
        .route("/:id", put(update_product))
        .route("/:id/stock", post(update_stock))
        .route("/:id/inventory", get(inventory_history))
        .route("/:id/image", post(add_image))
        .route("/:id/image/:index", delete(remove_image))
        .route("/:id/images/reorder", put(reorder_images))
        .with_auth()
        .merge(admin)
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let created = state
        .products
        .create_product(
            NewProduct {
                name: payload.name,
                description: payload.description,
                category: payload.category,
                price: payload.price,
                cost_price: payload.cost_price,
                stock: payload.stock,
                min_stock: payload.min_stock,
                barcode: payload.barcode,
                supplier_id: payload.supplier_id,
                expiry_date: payload.expiry_date,
                images: payload.images,
                flavors: payload.flavors,
                attributes: payload.attributes,
            },
            user.id,
        )
        .await?;
    Ok(created_response(created))
}

/// List products
#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductListParams),
    responses((status = 200, description = "Product page")),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let pagination = PaginationParams {
        page: params.page,
        limit: params.limit,
    };
    let page = pagination.page();
    let limit = pagination.limit(&state.config.pagination);

    let result = state
        .products
        .list_products(ProductFilter {
            keyword: params.search,
            category: params.category,
            is_active: params.active,
            low_stock: params.low_stock,
            page,
            limit,
        })
        .await?;
    Ok(success_response(PaginatedResponse::from_page(
        result, page, limit,
    )))
}

/// Products at or below their minimum stock
#[utoipa::path(
    get,
    path = "/api/products/low-stock",
    responses((status = 200, description = "Low stock products")),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn low_stock(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state.products.low_stock_products().await?;
    Ok(success_response(products))
}

/// Product counts per category
#[utoipa::path(
    get,
    path = "/api/products/categories",
    responses((status = 200, description = "Category counts")),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn categories(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let summary = state.products.categories_summary().await?;
    Ok(success_response(summary))
}

/// WhatsApp-ready price table of in-stock products
#[utoipa::path(
    get,
    path = "/api/products/tabela",
    params(PriceTableParams),
    responses((status = 200, description = "Formatted price table")),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn price_table(
    State(state): State<AppState>,
    Query(params): Query<PriceTableParams>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let tabela = state.products.price_table(params.category).await?;
    Ok(success_response(serde_json::json!({ "tabela": tabela })))
}

/// Get one product
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.products.get_product(id).await?;
    Ok(success_response(product))
}

/// Update a product
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let updated = state
        .products
        .update_product(
            id,
            ProductPatch {
                name: payload.name,
                description: payload.description,
                category: payload.category,
                price: payload.price,
                cost_price: payload.cost_price,
                stock: payload.stock,
                min_stock: payload.min_stock,
                barcode: payload.barcode,
                supplier_id: payload.supplier_id,
                expiry_date: payload.expiry_date,
                is_active: payload.is_active,
                images: payload.images,
                flavors: payload.flavors,
                attributes: payload.attributes,
            },
            user.id,
        )
        .await?;
    Ok(success_response(updated))
}

/// Delete a product (admin). Products referenced by sales are
/// deactivated instead.
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Deactivated instead of deleted"),
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    match state.products.delete_product(id).await? {
        DeleteOutcome::Removed => Ok(no_content_response()),
        DeleteOutcome::Deactivated => Ok(success_response(serde_json::json!({
            "message": "product has sales history and was deactivated"
        }))),
    }
}

/// Manual stock movement (entrada, saida or ajuste)
#[utoipa::path(
    post,
    path = "/api/products/{id}/stock",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = StockUpdateRequest,
    responses(
        (status = 200, description = "Product with updated stock"),
        (status = 400, description = "Invalid movement", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn update_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
    Json(payload): Json<StockUpdateRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .products
        .update_stock(id, payload.kind, payload.quantity, payload.reason, user.id)
        .await?;
    Ok(success_response(updated))
}

/// Stock movement history for a product, newest first
#[utoipa::path(
    get,
    path = "/api/products/{id}/inventory",
    params(("id" = Uuid, Path, description = "Product id"), PaginationParams),
    responses((status = 200, description = "Movement page")),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn inventory_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    // 404 for unknown products rather than an empty history.
    state.products.get_product(id).await?;

    let page = pagination.page();
    let limit = pagination.limit(&state.config.pagination);
    let (items, total) = inventory::product_history(&*state.db, id, page, limit).await?;
    Ok(success_response(PaginatedResponse::new(
        items, page, limit, total,
    )))
}

/// Add an image URL, or replace the one at `index`
#[utoipa::path(
    post,
    path = "/api/products/{id}/image",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = AddImageRequest,
    responses((status = 200, description = "Product with updated images")),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn add_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: CurrentUser,
    Json(payload): Json<AddImageRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let updated = state
        .products
        .add_image(id, payload.url, payload.index)
        .await?;
    Ok(success_response(updated))
}

/// Remove the image at `index`
#[utoipa::path(
    delete,
    path = "/api/products/{id}/image/{index}",
    params(
        ("id" = Uuid, Path, description = "Product id"),
        ("index" = usize, Path, description = "Image position")
    ),
    responses(
        (status = 200, description = "Product with updated images"),
        (status = 404, description = "No image at index", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn remove_image(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state.products.remove_image(id, index).await?;
    Ok(success_response(updated))
}

/// Reorder images by a full permutation of current indices
#[utoipa::path(
    put,
    path = "/api/products/{id}/images/reorder",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = ReorderImagesRequest,
    responses(
        (status = 200, description = "Product with reordered images"),
        (status = 400, description = "Not a permutation", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn reorder_images(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: CurrentUser,
    Json(payload): Json<ReorderImagesRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state.products.reorder_images(id, payload.order).await?;
    Ok(success_response(updated))
}
