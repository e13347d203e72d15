//! Error handling for the listing layer.
//!
//! Maps the failure taxonomy — validation, not-found, configuration,
//! database, unexpected — onto HTTP statuses and the uniform envelope.
//!
//! **Never expose internal errors to users.** Database errors and
//! configuration details are logged server-side via `tracing` and replaced
//! with generic messages before they reach a client. Caller-hook vetoes do
//! not pass through here at all; a veto carries its own ready-made
//! [`Reply`](crate::envelope::Reply).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use std::fmt;

use crate::envelope::Reply;
use crate::validation::ValidationErrors;

/// Operation-boundary error. Every variant converts into an envelope with an
/// appropriate status code; internals are logged, not surfaced.
#[derive(Debug)]
pub enum ApiError {
    /// 404 — identifier does not resolve to a visible record.
    NotFound {
        resource: String,
        id: Option<String>,
    },

    /// 422 — request failed the assembled rule set.
    Validation(ValidationErrors),

    /// 400 — malformed input outside the rule set's reach.
    BadRequest { message: String },

    /// 500 — the entity is not configured for the requested operation
    /// (e.g. status toggle without a soft delete or status column).
    Config { internal: String },

    /// 500 — database error (details logged, not exposed).
    Database { internal: DbErr },

    /// 500 — anything else caught at the operation boundary.
    Internal { internal: Option<String> },
}

impl ApiError {
    pub fn not_found(resource: impl Into<String>, id: Option<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn config(internal: impl Into<String>) -> Self {
        Self::Config {
            internal: internal.into(),
        }
    }

    pub fn database(err: DbErr) -> Self {
        Self::Database { internal: err }
    }

    pub fn internal(internal: Option<String>) -> Self {
        Self::Internal { internal }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Config { .. } | Self::Database { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::NotFound { resource, id } => match id {
                Some(id) => format!("{resource} with ID '{id}' not found"),
                None => format!("{resource} not found"),
            },
            Self::Validation(errors) => errors.summary(),
            Self::BadRequest { message } => message.clone(),
            Self::Config { .. } | Self::Database { .. } | Self::Internal { .. } => {
                "A technical error occurred. Please try again later.".to_string()
            }
        }
    }

    /// Log internal details. No-op unless a `tracing` subscriber is installed.
    fn log_internal(&self) {
        match self {
            Self::Database { internal } => {
                tracing::error!(error = ?internal, "database error");
            }
            Self::Config { internal } => {
                tracing::error!(details = %internal, "configuration error");
            }
            Self::Internal {
                internal: Some(details),
            } => {
                tracing::error!(details = %details, "internal error");
            }
            _ => {
                tracing::debug!(
                    status = %self.status_code(),
                    error = %self.user_message(),
                    "api error"
                );
            }
        }
    }

    /// Convert into the uniform envelope, logging internals along the way.
    #[must_use]
    pub fn into_reply(self) -> Reply {
        self.log_internal();
        let code = self.status_code();
        match self {
            Self::Validation(errors) => errors.into_reply(),
            other => Reply::failure(code, other.user_message(), None),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_reply().into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ApiError {}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match &err {
            DbErr::RecordNotFound(msg) => {
                let resource = msg.split_whitespace().next().unwrap_or("Resource");
                Self::NotFound {
                    resource: resource.to_string(),
                    id: None,
                }
            }
            _ => Self::Database { internal: err },
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_with_id() {
        let err = ApiError::not_found("product", Some("42".to_string()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.user_message(), "product with ID '42' not found");
    }

    #[test]
    fn test_not_found_without_id() {
        let err = ApiError::not_found("product", None);
        assert_eq!(err.user_message(), "product not found");
    }

    #[test]
    fn test_internal_errors_are_generic() {
        // Config, database and unexpected failures all surface the same
        // generic message; the detail stays in the log.
        let cases = vec![
            ApiError::config("no status column on table widgets"),
            ApiError::database(DbErr::Type("bad cast".to_string())),
            ApiError::internal(Some("panic in hook".to_string())),
        ];
        for err in cases {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert!(!err.user_message().contains("widgets"));
            assert!(!err.user_message().contains("bad cast"));
            assert!(!err.user_message().contains("panic"));
        }
    }

    #[test]
    fn test_dberr_record_not_found_becomes_404() {
        let err: ApiError = DbErr::RecordNotFound("product not found".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_dberr_other_becomes_500() {
        let err: ApiError = DbErr::Custom("boom".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_reply_envelope_shape() {
        let reply = ApiError::not_found("product", None).into_reply();
        assert_eq!(reply.code, StatusCode::NOT_FOUND);
        assert!(!reply.body.status);
        assert_eq!(
            reply.body.errors,
            serde_json::json!({ "message": ["product not found"] })
        );
    }
}
