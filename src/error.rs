use http::StatusCode;
use serde_json::{Value, json};
use thiserror::Error;

/// Failures surfaced to the caller of a function.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}: missing {missing:?}, invalid {invalid:?}")]
    Validation {
        message: &'static str,
        required: &'static [&'static str],
        missing: Vec<&'static str>,
        /// Fields present but unusable, e.g. `items[1].quantity`.
        invalid: Vec<String>,
    },
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("endpoint not found")]
    NotFound,
    #[error("malformed request body: {0}")]
    MalformedBody(serde_json::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MalformedBody(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            Self::Validation {
                message,
                required,
                missing,
                invalid,
            } => {
                let mut body = json!({
                    "success": false,
                    "error": message,
                    "required": required,
                    "missing": missing,
                });
                if !invalid.is_empty() {
                    body["invalid"] = json!(invalid);
                }
                body
            }
            Self::MethodNotAllowed => json!({
                "success": false,
                "error": "Método no permitido",
                "allowedMethods": ["POST"],
            }),
            Self::NotFound => json!({ "success": false, "error": "Endpoint not found" }),
            Self::MalformedBody(error) => internal(error.to_string()),
            Self::Internal(error) => internal(format!("{error:#}")),
        }
    }
}

fn internal(message: String) -> Value {
    json!({
        "success": false,
        "error": "Error interno del servidor",
        "message": message,
    })
}

/// Why a carrier call produced no usable answer. Never shown to callers.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("carrier request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("carrier did not answer within {0:?}")]
    Timeout(std::time::Duration),
    #[error("carrier answered with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("carrier reply is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("carrier reply has no usable rate")]
    NoRate,
    #[error("carrier reply has no tracking number")]
    MissingTracking,
}
