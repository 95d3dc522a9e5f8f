use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthRouterExt, CurrentUser};
use crate::entities::client::Address;
use crate::entities::product::ProductCategory;
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, first_page, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::services::clients::{ClientFilter, ClientPatch, LoyaltyOp, NewClient};
use crate::services::DeleteOutcome;
use crate::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateClientRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(value_type = Object)]
    pub address: Option<Address>,
    pub document: Option<String>,
    pub birthday: Option<DateTime<Utc>>,
    pub observations: Option<String>,
    pub favorite_category: Option<ProductCategory>,
}

/// Partial update; omitted fields keep their stored value.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateClientRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(value_type = Object)]
    pub address: Option<Address>,
    pub document: Option<String>,
    pub birthday: Option<DateTime<Utc>>,
    pub observations: Option<String>,
    pub favorite_category: Option<ProductCategory>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ClientListParams {
    pub search: Option<String>,
    pub active: Option<bool>,
    #[serde(default = "first_page")]
    pub page: u64,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoyaltyRequest {
    pub points: i32,
    pub operation: LoyaltyOp,
}

pub fn client_routes() -> Router<AppState> {
    let admin = Router::new()
        .route("/:id", delete(delete_client))
        .with_admin();

    Router::new()
        .route("/", post(create_client))
        .route("/", get(list_clients))
        .route("/top", get(top_clients))
        .route("/:id", get(get_client))
        .route("/:id", put(update_client))
        .route("/:id/sales", get(client_sales))
        .route("/:id/loyalty", post(update_loyalty))
        .with_auth()
        .merge(admin)
}

/// Register a client
#[utoipa::path(
    post,
    path = "/api/clients",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created"),
        (status = 400, description = "Duplicate document or email", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Clients"
)]
pub async fn create_client(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(payload): Json<CreateClientRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let created = state
        .clients
        .create_client(NewClient {
            name: payload.name,
            email: payload.email,
            phone: payload.phone,
            address: payload.address,
            document: payload.document,
            birthday: payload.birthday,
            observations: payload.observations,
            favorite_category: payload.favorite_category,
        })
        .await?;
    Ok(created_response(created))
}

/// List clients
#[utoipa::path(
    get,
    path = "/api/clients",
    params(ClientListParams),
    responses((status = 200, description = "Client page")),
    security(("Bearer" = [])),
    tag = "Clients"
)]
pub async fn list_clients(
    State(state): State<AppState>,
    Query(params): Query<ClientListParams>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let pagination = PaginationParams {
        page: params.page,
        limit: params.limit,
    };
    let page = pagination.page();
    let limit = pagination.limit(&state.config.pagination);

    let result = state
        .clients
        .list_clients(ClientFilter {
            keyword: params.search,
            is_active: params.active,
            page,
            limit,
        })
        .await?;
    Ok(success_response(PaginatedResponse::from_page(
        result, page, limit,
    )))
}

/// Best clients by total spent
#[utoipa::path(
    get,
    path = "/api/clients/top",
    responses((status = 200, description = "Client ranking")),
    security(("Bearer" = [])),
    tag = "Clients"
)]
pub async fn top_clients(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let ranking = state.clients.top_clients(5).await?;
    Ok(success_response(ranking))
}

/// Get one client
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    params(("id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Clients"
)]
pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let client = state.clients.get_client(id).await?;
    Ok(success_response(client))
}

/// Update a client
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    params(("id" = Uuid, Path, description = "Client id")),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Updated client"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Clients"
)]
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: CurrentUser,
    Json(payload): Json<UpdateClientRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let updated = state
        .clients
        .update_client(
            id,
            ClientPatch {
                name: payload.name,
                email: payload.email,
                phone: payload.phone,
                address: payload.address,
                document: payload.document,
                birthday: payload.birthday,
                observations: payload.observations,
                favorite_category: payload.favorite_category,
                is_active: payload.is_active,
            },
        )
        .await?;
    Ok(success_response(updated))
}

/// Delete a client (admin). Clients with purchase history are
/// deactivated instead.
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    params(("id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 200, description = "Deactivated instead of deleted"),
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Clients"
)]
pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    match state.clients.delete_client(id).await? {
        DeleteOutcome::Removed => Ok(no_content_response()),
        DeleteOutcome::Deactivated => Ok(success_response(serde_json::json!({
            "message": "client has purchase history and was deactivated"
        }))),
    }
}

/// Purchase history for a client
#[utoipa::path(
    get,
    path = "/api/clients/{id}/sales",
    params(("id" = Uuid, Path, description = "Client id"), PaginationParams),
    responses((status = 200, description = "Sale page with lifetime total")),
    security(("Bearer" = [])),
    tag = "Clients"
)]
pub async fn client_sales(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let page = pagination.page();
    let limit = pagination.limit(&state.config.pagination);

    let (result, total_purchased) = state.clients.client_sales(id, page, limit).await?;
    let response = PaginatedResponse::from_page(result, page, limit);
    Ok(success_response(serde_json::json!({
        "data": response.data,
        "pagination": response.pagination,
        "totalPurchased": total_purchased,
    })))
}

/// Add or remove loyalty points
#[utoipa::path(
    post,
    path = "/api/clients/{id}/loyalty",
    params(("id" = Uuid, Path, description = "Client id")),
    request_body = LoyaltyRequest,
    responses(
        (status = 200, description = "Updated client"),
        (status = 400, description = "Not enough points", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Clients"
)]
pub async fn update_loyalty(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: CurrentUser,
    Json(payload): Json<LoyaltyRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .clients
        .update_loyalty(id, payload.points, payload.operation)
        .await?;
    Ok(success_response(updated))
}
