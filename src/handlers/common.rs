use crate::{
    config::AppConfig,
    errors::{ApiError, ServiceError},
};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

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

/// CSV download with an attachment file name
pub fn csv_response(file_name: &str, body: String) -> Response {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(crate::reports::CSV_CONTENT_TYPE),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// Pagination parameters for list operations
#[derive(Debug, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    /// Falls back to the configured default page size
    pub per_page: Option<u64>,
}

pub fn default_page() -> u64 {
    1
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: None,
        }
    }
}

impl PaginationParams {
    /// Page (1-based) and page size clamped to the configured bounds
    pub fn resolve(&self, config: &AppConfig) -> (u64, u64) {
        let per_page = self
            .per_page
            .unwrap_or(config.api_default_page_size)
            .clamp(1, config.api_max_page_size);
        (self.page.max(1), per_page)
    }
}

/// Standard pagination response metadata
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            total.div_ceil(per_page.max(1))
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// Standard paginated response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u64, per_page: u64, total: u64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(page, per_page, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "a_test_secret_that_is_long_enough_for_hs256".into(),
            "test".into(),
        )
    }

    #[test]
    fn page_size_is_clamped() {
        let cfg = config();
        let params = PaginationParams {
            page: 0,
            per_page: Some(10_000),
        };
        assert_eq!(params.resolve(&cfg), (1, cfg.api_max_page_size));
        assert_eq!(
            PaginationParams::default().resolve(&cfg),
            (1, cfg.api_default_page_size)
        );
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(PaginationMeta::new(1, 20, 0).total_pages, 0);
        assert_eq!(PaginationMeta::new(1, 20, 20).total_pages, 1);
        assert_eq!(PaginationMeta::new(1, 20, 21).total_pages, 2);
    }
}
