use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::SqlErr;
use thiserror::Error;

use crate::{
    config::ConfigError,
    models::TransitionError,
    payments::{ProviderError, ProviderErrorKind, metadata::MetadataError, signature::SignatureError},
    response::{ErrorBody, ErrorResponse, FieldError},
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Also returned when the record exists but belongs to someone else.
    #[error("Not found or unauthorized")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(#[from] TransitionError),

    #[error("Webhook signature verification failed: {0}")]
    InvalidSignature(#[from] SignatureError),

    #[error("Webhook metadata rejected: {0}")]
    InvalidMetadata(#[from] MetadataError),

    #[error("Payment provider error")]
    Upstream(#[from] ProviderError),

    #[error("Server misconfigured")]
    Configuration(#[from] ConfigError),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::InvalidSignature(_)
            | AppError::InvalidMetadata(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::Upstream(err) => match err.kind {
                ProviderErrorKind::CardDeclined => StatusCode::PAYMENT_REQUIRED,
                ProviderErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                ProviderErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
                ProviderErrorKind::Authentication => StatusCode::INTERNAL_SERVER_ERROR,
                ProviderErrorKind::Unreachable | ProviderErrorKind::Unavailable => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            },
            AppError::Configuration(_)
            | AppError::DbError(_)
            | AppError::OrmError(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "authentication_required",
            AppError::Validation(_) | AppError::BadRequest(_) => "validation_failed",
            AppError::NotFound => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::InvalidTransition(_) => "invalid_transition",
            AppError::InvalidSignature(_) => "invalid_signature",
            AppError::InvalidMetadata(_) => "invalid_metadata",
            AppError::Upstream(_) => "payment_provider_error",
            AppError::Configuration(_) => "server_misconfigured",
            AppError::DbError(_) | AppError::OrmError(_) => "storage_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Text shown to the client. Storage, configuration and provider
    /// details stay in the server log.
    fn public_message(&self) -> String {
        match self {
            AppError::Upstream(err) => err.kind.user_message().to_string(),
            AppError::Configuration(err) if cfg!(debug_assertions) => {
                format!("Server misconfigured: {err}")
            }
            AppError::Configuration(_) => "Server misconfigured".to_string(),
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                "Something went wrong. Please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }

    fn fields(&self) -> Vec<FieldError> {
        match self {
            AppError::Validation(fields) => fields.clone(),
            AppError::InvalidMetadata(err) => err.field_errors(),
            _ => Vec::new(),
        }
    }

    fn log(&self) {
        match self {
            AppError::Configuration(err) => tracing::error!(error = %err, "configuration error"),
            AppError::DbError(err) => tracing::error!(error = %err, "database error"),
            AppError::OrmError(err) => tracing::error!(error = %err, "orm error"),
            AppError::Internal(err) => tracing::error!(error = ?err, "internal error"),
            AppError::Upstream(err) => {
                tracing::error!(kind = ?err.kind, detail = %err.detail, "payment provider error")
            }
            AppError::InvalidSignature(err) => tracing::warn!(error = %err, "webhook rejected"),
            AppError::InvalidMetadata(err) => tracing::warn!(error = %err, "webhook rejected"),
            _ => {}
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status();
        let message = self.public_message();

        let body = ErrorResponse {
            success: false,
            message: message.clone(),
            error: ErrorBody {
                code: self.code().to_string(),
                error: message,
                fields: self.fields(),
            },
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

pub fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub fn is_foreign_key_violation(err: &sea_orm::DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_details_are_not_exposed() {
        let err = AppError::Internal(anyhow::anyhow!("password=hunter2 connection refused"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.public_message().contains("hunter2"));
    }

    #[test]
    fn provider_errors_use_safe_messages() {
        let err = AppError::Upstream(ProviderError::new(
            ProviderErrorKind::Authentication,
            "Invalid API Key provided: sk_test_****1234",
        ));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.public_message().contains("sk_test"));

        let err = AppError::Upstream(ProviderError::new(ProviderErrorKind::Unreachable, "timeout"));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn metadata_errors_carry_field_detail() {
        let err = AppError::from(MetadataError::Missing(vec!["userId", "price"]));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let fields: Vec<String> = err.fields().into_iter().map(|f| f.field).collect();
        assert_eq!(fields, vec!["userId", "price"]);
    }
}
