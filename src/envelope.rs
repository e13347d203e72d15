//! The uniform response envelope.
//!
//! Every operation in this layer — listing, retrieval, edit-data assembly,
//! deletion, status toggling, and every failure path — answers with the same
//! JSON shape: `{status, message, data, errors}`, plus the optional
//! config-gated `response_code` and `request_data` fields.
//!
//! Invariant: when `status` is `false`, `errors` is always non-null. If the
//! caller supplied fewer than two error entries the envelope synthesizes
//! `{"message": [message]}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use utoipa::ToSchema;

use crate::config::ListConfig;

/// Keys masked before request data is echoed back in an envelope.
const SENSITIVE_KEYS: &[&str] = &["password", "password_confirmation", "token"];

/// The `{status, message, data, errors}` wrapper returned by every operation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiResponse {
    /// `true` on success, `false` on any failure.
    pub status: bool,
    /// Human-readable summary; on validation failure this is the first field
    /// error plus a count of the rest.
    pub message: String,
    /// Operation payload; `null` on failure.
    pub data: Value,
    /// Per-field error message lists; `null` on success.
    pub errors: Value,
    /// HTTP status duplicated in the body (config-gated).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_code: Option<u16>,
    /// Sanitized echo of the request (config-gated, sensitive keys masked).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_data: Option<Value>,
}

/// An envelope paired with the HTTP status it rides on.
#[derive(Debug, Clone)]
pub struct Reply {
    pub code: StatusCode,
    pub body: ApiResponse,
}

impl Reply {
    /// Success envelope with a payload.
    #[must_use]
    pub fn success(message: impl Into<String>, data: Value) -> Self {
        Self {
            code: StatusCode::OK,
            body: ApiResponse {
                status: true,
                message: message.into(),
                data,
                errors: Value::Null,
                response_code: None,
                request_data: None,
            },
        }
    }

    /// Failure envelope. Caller-supplied error maps with more than one entry
    /// pass through untouched; anything smaller is replaced by the synthetic
    /// `{"message": [message]}` entry so `errors` is never empty.
    #[must_use]
    pub fn failure(code: StatusCode, message: impl Into<String>, errors: Option<Value>) -> Self {
        let message = message.into();
        let errors = match errors {
            Some(Value::Object(map)) if map.len() > 1 => Value::Object(map),
            _ => json!({ "message": [message.clone()] }),
        };
        Self {
            code,
            body: ApiResponse {
                status: false,
                message,
                data: Value::Null,
                errors,
                response_code: None,
                request_data: None,
            },
        }
    }

    /// Apply the config-gated optional fields: the duplicated response code
    /// and the masked request echo.
    #[must_use]
    pub fn with_options(mut self, config: &ListConfig, request: Option<&Value>) -> Self {
        if config.include_response_code {
            self.body.response_code = Some(self.code.as_u16());
        }
        if config.echo_request_data {
            if let Some(raw) = request {
                self.body.request_data = Some(mask_sensitive(raw));
            }
        }
        self
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.code, Json(self.body)).into_response()
    }
}

/// Replace sensitive values with `"********"` recursively before an echo.
#[must_use]
pub fn mask_sensitive(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, val) in map {
                if SENSITIVE_KEYS.contains(&key.as_str()) {
                    out.insert(key.clone(), Value::String("********".to_string()));
                } else {
                    out.insert(key.clone(), mask_sensitive(val));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(mask_sensitive).collect()),
        other => other.clone(),
    }
}
