//! Authentication and authorization.
//!
//! JWT bearer tokens (HS256) identify users; an `is_admin` flag on the
//! user gates destructive operations. Passwords are hashed with Argon2.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::entities::user;
use crate::errors::ServiceError;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
    pub iss: String,
    pub aud: String,
}

/// Authenticated user extracted from a validated token, inserted into
/// request extensions by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

#[async_trait::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ServiceError::AuthError("token not found".to_string()))
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_expiration_secs: usize,
}

impl AuthConfig {
    pub fn from_app_config(cfg: &AppConfig) -> Self {
        Self {
            jwt_secret: cfg.jwt_secret.clone(),
            jwt_issuer: cfg.auth_issuer.clone(),
            jwt_audience: cfg.auth_audience.clone(),
            token_expiration_secs: cfg.jwt_expiration,
        }
    }
}

/// Issues and validates tokens, hashes and verifies passwords.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Generate a signed JWT for a user.
    pub fn generate_token(&self, user: &user::Model) -> Result<String, ServiceError> {
        let now = Utc::now();
        let exp = now + ChronoDuration::seconds(self.config.token_expiration_secs as i64);

        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("Token creation failed: {}", e)))
    }

    /// Validate a JWT and extract the claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                ServiceError::AuthError("token expired".to_string())
            }
            _ => ServiceError::AuthError("invalid token".to_string()),
        })?;

        Ok(data.claims)
    }

    /// Hash a plaintext password with Argon2.
    pub fn hash_password(&self, password: &str) -> Result<String, ServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| ServiceError::HashError(e.to_string()))
    }

    /// Verify a plaintext password against a stored hash.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, ServiceError> {
        let parsed = PasswordHash::new(hash).map_err(|e| ServiceError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

/// The token only proves identity; authorization state (the account
/// still existing, `is_admin`) is read fresh from the database so a
/// deleted or demoted user loses access immediately, not at expiry.
async fn resolve_current_user(
    db: &DbPool,
    claims: &Claims,
) -> Result<CurrentUser, ServiceError> {
    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ServiceError::AuthError("invalid token".to_string()))?;
    let found = user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::AuthError("user not found".to_string()))?;
    Ok(CurrentUser {
        id: found.id,
        name: found.name,
        email: found.email,
        is_admin: found.is_admin,
    })
}

/// Extracts and validates the bearer token, resolves the user record and
/// inserts `CurrentUser` into request extensions for downstream handlers.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return ServiceError::InternalError("authentication service not available".to_string())
                .into_response();
        }
    };
    let db = match request.extensions().get::<Arc<DbPool>>() {
        Some(db) => db.clone(),
        None => {
            return ServiceError::InternalError("database not available".to_string())
                .into_response();
        }
    };

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with("Bearer "))
        .map(|v| v.trim_start_matches("Bearer ").trim().to_string());

    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => return ServiceError::AuthError("token not found".to_string()).into_response(),
    };

    let claims = match auth_service.validate_token(&token) {
        Ok(claims) => claims,
        Err(e) => return e.into_response(),
    };

    match resolve_current_user(&db, &claims).await {
        Ok(user) => {
            debug!(user_id = %user.id, "Authenticated request");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Rejects non-admin users. Must run after `auth_middleware`.
pub async fn admin_middleware(request: Request, next: Next) -> Response {
    match request.extensions().get::<CurrentUser>() {
        Some(user) if user.is_admin => next.run(request).await,
        Some(_) => {
            ServiceError::Forbidden("administrator access required".to_string()).into_response()
        }
        None => ServiceError::AuthError("token not found".to_string()).into_response(),
    }
}

/// Extension methods for Router to attach auth middleware.
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_admin(self) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_admin(self) -> Self {
        // Layers run outermost-last, so auth executes before the admin check.
        self.layer(axum::middleware::from_fn(admin_middleware))
            .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_service() -> AuthService {
        AuthService::new(AuthConfig {
            jwt_secret: "a".repeat(64),
            jwt_issuer: "tabacaria-api".to_string(),
            jwt_audience: "tabacaria-clients".to_string(),
            token_expiration_secs: 3600,
        })
    }

    fn test_user(is_admin: bool) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: String::new(),
            is_admin,
            phone: None,
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trip_preserves_identity() {
        let service = test_service();
        let user = test_user(true);
        let token = service.generate_token(&user).expect("token");
        let claims = service.validate_token(&token).expect("claims");
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, user.email);
        assert!(claims.is_admin);
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let service = test_service();
        let other = AuthService::new(AuthConfig {
            jwt_secret: "b".repeat(64),
            jwt_issuer: "tabacaria-api".to_string(),
            jwt_audience: "tabacaria-clients".to_string(),
            token_expiration_secs: 3600,
        });
        let token = other.generate_token(&test_user(false)).expect("token");
        assert!(service.validate_token(&token).is_err());
    }

    #[test]
    fn password_hash_verifies_and_rejects() {
        let service = test_service();
        let hash = service.hash_password("senha123").expect("hash");
        assert!(service.verify_password("senha123", &hash).expect("verify"));
        assert!(!service.verify_password("errada", &hash).expect("verify"));
    }
}
