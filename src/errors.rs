use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Bad Request",
    "message": "Invalid transition: purchase requisition cannot move from approved to approved",
    "details": null,
    "request_id": "req-abc123xyz",
    "timestamp": "2026-10-18T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g. "Not Found", "Forbidden")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Per-line details for validation failures such as over-receipt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    /// Request identifier for support and debugging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// RFC 3339 timestamp when the error was produced
    pub timestamp: String,
}

/// A goods-receipt line that would push a PO line past its ordered quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverReceiptLine {
    pub item_id: uuid::Uuid,
    pub ordered: i32,
    pub already_received: i32,
    pub attempted: i32,
}

impl OverReceiptLine {
    pub fn remaining(&self) -> i32 {
        self.ordered - self.already_received
    }
}

impl std::fmt::Display for OverReceiptLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "item {}: ordered {}, already received {}, attempted {} (remaining {})",
            self.item_id,
            self.ordered,
            self.already_received,
            self.attempted,
            self.remaining()
        )
    }
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid transition: {document} cannot move from {from} to {to}")]
    InvalidTransition {
        document: &'static str,
        from: String,
        to: String,
    },

    #[error("Over-receipt: {} line(s) exceed the quantity still outstanding", .0.len())]
    OverReceipt(Vec<OverReceiptLine>),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Convenience constructor for wrapping database errors.
    pub fn db_error(error: DbErr) -> Self {
        ServiceError::DatabaseError(error)
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_)
            | Self::InvalidStatus(_)
            | Self::InvalidTransition { .. }
            | Self::OverReceipt(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InsufficientStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DatabaseError(_) | Self::InternalError(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) | Self::Other(_) => "Internal server error".to_string(),
            // Auth messages are shown to end users verbatim
            Self::Unauthorized(msg) | Self::Forbidden(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }

    fn details(&self) -> Option<Vec<String>> {
        match self {
            Self::OverReceipt(lines) => Some(lines.iter().map(ToString::to_string).collect()),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: self.details(),
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

/// API Error type for HTTP responses
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Service error: {0}")]
    ServiceError(#[from] ServiceError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::ServiceError(service_error) => service_error.into_response(),
            ApiError::ValidationError(msg) => {
                ServiceError::ValidationError(msg).into_response()
            }
            ApiError::NotFound(msg) => ServiceError::NotFound(msg).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use uuid::Uuid;

    #[tokio::test]
    async fn service_error_response_includes_request_id() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("req-123"), async {
                ServiceError::NotFound("missing".into()).into_response()
            })
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.request_id.as_deref(), Some("req-123"));
    }

    #[tokio::test]
    async fn over_receipt_lists_every_offending_line() {
        let lines = vec![
            OverReceiptLine {
                item_id: Uuid::new_v4(),
                ordered: 10,
                already_received: 4,
                attempted: 7,
            },
            OverReceiptLine {
                item_id: Uuid::new_v4(),
                ordered: 5,
                already_received: 5,
                attempted: 1,
            },
        ];
        let response = ServiceError::OverReceipt(lines).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        let details = payload.details.expect("details expected");
        assert_eq!(details.len(), 2);
        assert!(details[0].contains("remaining 6"));
        assert!(details[1].contains("remaining 0"));
    }

    #[test]
    fn service_error_status_code_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::InvalidTransition {
                document: "purchase order",
                from: "completed".into(),
                to: "canceled".into(),
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::InsufficientStock("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::InternalError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn response_message_hides_internal_details() {
        assert_eq!(
            ServiceError::InternalError("connection string leaked".into()).response_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::db_error(DbErr::Custom("boom".into())).response_message(),
            "Database error"
        );
        assert_eq!(
            ServiceError::NotFound("PR not found".into()).response_message(),
            "Not found: PR not found"
        );
        assert_eq!(
            ServiceError::Forbidden("คุณไม่มีสิทธิ์".into()).response_message(),
            "คุณไม่มีสิทธิ์"
        );
    }
}
