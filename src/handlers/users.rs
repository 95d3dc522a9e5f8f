use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthRouterExt, CurrentUser};
use crate::entities::user;
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, no_content_response, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::services::users::{NewUser, UserPatch};
use crate::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6))]
    pub password: Option<String>,
    pub is_admin: Option<bool>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: user::Model,
}

pub fn user_routes() -> Router<AppState> {
    let admin = Router::new()
        .route("/register", post(register))
        .route("/", get(list_users))
        .route("/:id", get(get_user))
        .route("/:id", put(update_user))
        .route("/:id", delete(delete_user))
        .with_admin();

    let profile = Router::new()
        .route("/profile", get(get_profile))
        .route("/profile", put(update_profile))
        .with_auth();

    Router::new()
        .route("/login", post(login))
        .merge(profile)
        .merge(admin)
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token and user"),
        (status = 401, description = "Bad credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let authenticated = state.users.login(&payload.email, &payload.password).await?;
    Ok(success_response(LoginResponse {
        token: authenticated.token,
        user: authenticated.user,
    }))
}

/// Register a user (admin)
#[utoipa::path(
    post,
    path = "/api/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created"),
        (status = 400, description = "Email already registered", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn register(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let created = state
        .users
        .register(NewUser {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            is_admin: payload.is_admin,
            phone: payload.phone,
        })
        .await?;
    Ok(created_response(created))
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses((status = 200, description = "Profile")),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let profile = state.users.get_user(user.id).await?;
    Ok(success_response(profile))
}

/// Update the current user's profile. Returns a fresh token.
#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = UpdateUserRequest,
    responses((status = 200, description = "Updated profile and token")),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let authenticated = state
        .users
        .update_profile(
            user.id,
            UserPatch {
                name: payload.name,
                email: payload.email,
                password: payload.password,
                is_admin: None,
                phone: payload.phone,
            },
        )
        .await?;
    Ok(success_response(LoginResponse {
        token: authenticated.token,
        user: authenticated.user,
    }))
}

/// List users (admin)
#[utoipa::path(
    get,
    path = "/api/users",
    params(PaginationParams),
    responses((status = 200, description = "User page")),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let page = pagination.page();
    let limit = pagination.limit(&state.config.pagination);

    let result = state.users.list_users(page, limit).await?;
    Ok(success_response(PaginatedResponse::from_page(
        result, page, limit,
    )))
}

/// Get one user (admin)
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let found = state.users.get_user(id).await?;
    Ok(success_response(found))
}

/// Update any user (admin)
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: CurrentUser,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let updated = state
        .users
        .update_user(
            id,
            UserPatch {
                name: payload.name,
                email: payload.email,
                password: payload.password,
                is_admin: payload.is_admin,
                phone: payload.phone,
            },
        )
        .await?;
    Ok(success_response(updated))
}

/// Delete a user (admin)
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    state.users.delete_user(id).await?;
    Ok(no_content_response())
}
