use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthRouterExt, CurrentUser};
use crate::entities::product::ProductCategory;
use crate::entities::supplier::{Address, ContactPerson};
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, first_page, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::services::suppliers::{NewSupplier, SupplierFilter, SupplierPatch};
use crate::services::DeleteOutcome;
use crate::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub company_name: Option<String>,
    pub document: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(value_type = Object)]
    pub address: Option<Address>,
    #[schema(value_type = Object)]
    pub contact_person: Option<ContactPerson>,
    #[serde(default)]
    pub categories: Vec<ProductCategory>,
    pub payment_terms: Option<String>,
    pub min_order_value: Option<Decimal>,
    pub observations: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSupplierRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub company_name: Option<String>,
    pub document: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(value_type = Object)]
    pub address: Option<Address>,
    #[schema(value_type = Object)]
    pub contact_person: Option<ContactPerson>,
    pub categories: Option<Vec<ProductCategory>>,
    pub payment_terms: Option<String>,
    pub min_order_value: Option<Decimal>,
    pub observations: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SupplierListParams {
    pub search: Option<String>,
    pub category: Option<ProductCategory>,
    pub active: Option<bool>,
    #[serde(default = "first_page")]
    pub page: u64,
    pub limit: Option<u64>,
}

pub fn supplier_routes() -> Router<AppState> {
    let admin = Router::new()
        .route("/:id", delete(delete_supplier))
        .with_admin();

    Router::new()
        .route("/", post(create_supplier))
        .route("/", get(list_suppliers))
        .route("/by-category", get(suppliers_by_category))
        .route("/:id", get(get_supplier))
        .route("/:id", put(update_supplier))
        .route("/:id/products", get(supplier_products))
        .with_auth()
        .merge(admin)
}

/// Register a supplier
#[utoipa::path(
    post,
    path = "/api/suppliers",
    request_body = CreateSupplierRequest,
    responses(
        (status = 201, description = "Supplier created"),
        (status = 400, description = "Duplicate document", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Suppliers"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(payload): Json<CreateSupplierRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let created = state
        .suppliers
        .create_supplier(NewSupplier {
            name: payload.name,
            company_name: payload.company_name,
            document: payload.document,
            email: payload.email,
            phone: payload.phone,
            address: payload.address,
            contact_person: payload.contact_person,
            categories: payload.categories,
            payment_terms: payload.payment_terms,
            min_order_value: payload.min_order_value,
            observations: payload.observations,
        })
        .await?;
    Ok(created_response(created))
}

/// List suppliers
#[utoipa::path(
    get,
    path = "/api/suppliers",
    params(SupplierListParams),
    responses((status = 200, description = "Supplier page")),
    security(("Bearer" = [])),
    tag = "Suppliers"
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(params): Query<SupplierListParams>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let pagination = PaginationParams {
        page: params.page,
        limit: params.limit,
    };
    let page = pagination.page();
    let limit = pagination.limit(&state.config.pagination);

    let result = state
        .suppliers
        .list_suppliers(SupplierFilter {
            keyword: params.search,
            category: params.category,
            is_active: params.active,
            page,
            limit,
        })
        .await?;
    Ok(success_response(PaginatedResponse::from_page(
        result, page, limit,
    )))
}

/// Active-supplier count per product category
#[utoipa::path(
    get,
    path = "/api/suppliers/by-category",
    responses((status = 200, description = "Counts per category")),
    security(("Bearer" = [])),
    tag = "Suppliers"
)]
pub async fn suppliers_by_category(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let counts = state.suppliers.suppliers_by_category().await?;
    Ok(success_response(counts))
}

/// Get one supplier
#[utoipa::path(
    get,
    path = "/api/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses(
        (status = 200, description = "Supplier"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Suppliers"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let supplier = state.suppliers.get_supplier(id).await?;
    Ok(success_response(supplier))
}

/// Update a supplier
#[utoipa::path(
    put,
    path = "/api/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    request_body = UpdateSupplierRequest,
    responses(
        (status = 200, description = "Updated supplier"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Suppliers"
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: CurrentUser,
    Json(payload): Json<UpdateSupplierRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let updated = state
        .suppliers
        .update_supplier(
            id,
            SupplierPatch {
                name: payload.name,
                company_name: payload.company_name,
                document: payload.document,
                email: payload.email,
                phone: payload.phone,
                address: payload.address,
                contact_person: payload.contact_person,
                categories: payload.categories,
                payment_terms: payload.payment_terms,
                min_order_value: payload.min_order_value,
                observations: payload.observations,
                is_active: payload.is_active,
            },
        )
        .await?;
    Ok(success_response(updated))
}

/// Delete a supplier (admin). Suppliers with linked products are
/// deactivated instead.
#[utoipa::path(
    delete,
    path = "/api/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses(
        (status = 200, description = "Deactivated instead of deleted"),
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Suppliers"
)]
pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    match state.suppliers.delete_supplier(id).await? {
        DeleteOutcome::Removed => Ok(no_content_response()),
        DeleteOutcome::Deactivated => Ok(success_response(serde_json::json!({
            "message": "supplier has linked products and was deactivated"
        }))),
    }
}

/// Products sourced from one supplier
#[utoipa::path(
    get,
    path = "/api/suppliers/{id}/products",
    params(("id" = Uuid, Path, description = "Supplier id"), PaginationParams),
    responses((status = 200, description = "Product page")),
    security(("Bearer" = [])),
    tag = "Suppliers"
)]
pub async fn supplier_products(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let page = pagination.page();
    let limit = pagination.limit(&state.config.pagination);

    let result = state.suppliers.supplier_products(id, page, limit).await?;
    Ok(success_response(PaginatedResponse::from_page(
        result, page, limit,
    )))
}
