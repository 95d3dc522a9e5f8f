use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use validator::Validate;

use crate::config::PaginationConfig;
use crate::errors::ServiceError;
use crate::services::Page;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input
        .validate()
        .map_err(|e| ServiceError::ValidationError(format!("validation failed: {}", e)))
}

/// Pagination parameters for list operations. The effective limit is
/// clamped against the configured maximum.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, IntoParams)]
pub struct PaginationParams {
    #[serde(default = "first_page")]
    pub page: u64,
    pub limit: Option<u64>,
}

/// Serde default for `page` fields on list parameter structs.
pub fn first_page() -> u64 {
    1
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: first_page(),
            limit: None,
        }
    }
}

impl PaginationParams {
    pub fn page(&self) -> u64 {
        self.page.max(1)
    }

    pub fn limit(&self, cfg: &PaginationConfig) -> u64 {
        self.limit
            .unwrap_or(cfg.default_limit)
            .clamp(1, cfg.max_limit)
    }
}

/// Standard pagination response metadata
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

/// Standard paginated response wrapper
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u64, limit: u64, total: u64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(page, limit, total),
        }
    }

    pub fn from_page(page_data: Page<T>, page: u64, limit: u64) -> Self {
        let total = page_data.total;
        Self::new(page_data.items, page, limit, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped_to_the_configured_maximum() {
        let cfg = PaginationConfig {
            default_limit: 10,
            max_limit: 100,
        };
        let params = PaginationParams {
            page: 1,
            limit: Some(500),
        };
        assert_eq!(params.limit(&cfg), 100);

        let params = PaginationParams::default();
        assert_eq!(params.limit(&cfg), 10);
        assert_eq!(params.page(), 1);
    }

    #[test]
    fn total_pages_round_up() {
        let meta = PaginationMeta::new(1, 10, 25);
        assert_eq!(meta.total_pages, 3);
        let meta = PaginationMeta::new(1, 10, 0);
        assert_eq!(meta.total_pages, 0);
    }
}
