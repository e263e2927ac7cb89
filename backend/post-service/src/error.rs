/// Error types for Post Service
///
/// Every failure a post operation can produce, and how each one is rendered
/// at the HTTP boundary.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type for post-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Per-field validation messages, keyed by request field name.
pub type FieldErrors = BTreeMap<String, String>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Request input failed validation
    #[error("Validation error: {}", describe_fields(.0))]
    Validation(FieldErrors),

    /// No post with the requested id
    #[error("Post not found: {0}")]
    NotFound(String),

    /// The post exists but has no comment with the requested id
    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    /// Caller does not own the resource it tried to modify
    #[error("Not authorized: {0}")]
    Forbidden(String),

    /// Caller already has a like on this post
    #[error("User already liked this post")]
    AlreadyLiked,

    /// Caller has no like on this post to remove
    #[error("User has not liked this post yet")]
    NotLiked,

    /// Document storage could not be reached
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Storage rejected a write that raced another one; safe to retry
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing, invalid or expired credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe_fields(fields: &FieldErrors) -> String {
    fields
        .iter()
        .map(|(field, msg)| format!("{field}: {msg}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl AppError {
    /// Single-field validation failure.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), message.into());
        AppError::Validation(fields)
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::CommentNotFound(_) => "comment_not_found",
            AppError::Forbidden(_) => "forbidden",
            AppError::AlreadyLiked => "already_liked",
            AppError::NotLiked => "not_liked",
            AppError::StorageUnavailable(_) => "storage_unavailable",
            AppError::Conflict(_) => "conflict",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::CommentNotFound(_) => StatusCode::NOT_FOUND,
            // Ownership violations answer 401, matching the established API contract.
            AppError::Forbidden(_) | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::AlreadyLiked | AppError::NotLiked | AppError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut body = serde_json::json!({
            "code": self.code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        if let AppError::Validation(fields) = self {
            body["errors"] = serde_json::json!(fields);
        }

        HttpResponse::build(status).json(body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => AppError::StorageUnavailable(err.to_string()),
            // serialization_failure / deadlock_detected
            sqlx::Error::Database(db)
                if matches!(db.code().as_deref(), Some("40001") | Some("40P01")) =>
            {
                AppError::Conflict(err.to_string())
            }
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            AppError::validation("text", "Text field is required").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::CommentNotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Forbidden("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::AlreadyLiked.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::NotLiked.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::StorageUnavailable("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn pool_timeouts_are_storage_unavailable() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.code(), "storage_unavailable");

        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.code(), "internal_error");
    }

    #[actix_web::test]
    async fn validation_body_lists_fields() {
        let resp = AppError::validation("text", "Text field is required").error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "validation_error");
        assert_eq!(body["errors"]["text"], "Text field is required");
        assert_eq!(body["status"], 400);
    }
}
