//! Typed errors and status mapping.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::handler::Operation;

/// Wire-level error object (`errors[]` member of an error document).
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ErrorObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ErrorSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

impl ErrorObject {
    pub fn new(status: &str, code: &str, title: &str, detail: impl Into<String>) -> Self {
        ErrorObject {
            status: Some(status.to_string()),
            code: Some(code.to_string()),
            title: Some(title.to_string()),
            detail: Some(detail.into()),
            ..ErrorObject::default()
        }
    }

    /// Validation error pointing at a document or query location.
    pub fn invalid(pointer: &str, detail: impl Into<String>) -> Self {
        ErrorObject {
            status: Some("422".to_string()),
            code: Some("EINVALID".to_string()),
            title: Some("Invalid Query".to_string()),
            detail: Some(detail.into()),
            source: Some(ErrorSource {
                pointer: Some(pointer.to_string()),
                parameter: None,
            }),
            ..ErrorObject::default()
        }
    }
}

/// Request-fatal errors raised by the codec, resolver, and pipeline.
///
/// The pipeline never recovers these locally: they halt the step sequence and
/// surface to the transport layer, which maps [`JsonapiError::status`] to a
/// protocol status code and [`JsonapiError::into_errors`] to the error
/// envelope body.
#[derive(Error, Debug)]
pub enum JsonapiError {
    /// Input shape violates the schema; may batch several per-field objects.
    #[error("validation failed")]
    Validation(Vec<ErrorObject>),
    /// Errors returned verbatim by a handler's `error` outcome.
    #[error("handler returned errors")]
    Handler(Vec<ErrorObject>),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Write or relationship access on a foreign (reverse-computed) relation.
    #[error("relation '{relation}' is foreign")]
    ForeignRelation {
        relation: String,
        meta: Map<String, Value>,
    },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("handler not ready for {0}")]
    Unavailable(Operation),
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal: {0}")]
    Unknown(String),
}

impl JsonapiError {
    pub fn status(&self) -> u16 {
        match self {
            JsonapiError::Validation(_) => 422,
            JsonapiError::Handler(errors) => errors
                .first()
                .and_then(|e| e.status.as_deref())
                .and_then(|s| s.parse().ok())
                .unwrap_or(500),
            JsonapiError::NotFound(_) => 404,
            JsonapiError::Forbidden(_) => 403,
            JsonapiError::ForeignRelation { .. } => 404,
            JsonapiError::Conflict(_) => 409,
            JsonapiError::Unavailable(_) => 503,
            JsonapiError::Unauthorized => 401,
            JsonapiError::Unknown(_) => 500,
        }
    }

    /// The `errors[]` member for the error envelope.
    pub fn into_errors(self) -> Vec<ErrorObject> {
        match self {
            JsonapiError::Validation(errors) | JsonapiError::Handler(errors) => errors,
            JsonapiError::NotFound(detail) => vec![ErrorObject::new(
                "404",
                "ENOTFOUND",
                "Resource not found",
                detail,
            )],
            JsonapiError::Forbidden(detail) => vec![ErrorObject::new(
                "403",
                "EFORBIDDEN",
                "Request not allowed",
                detail,
            )],
            JsonapiError::ForeignRelation { relation, meta } => {
                let mut error = ErrorObject::new(
                    "404",
                    "EFOREIGN",
                    "Relation is Foreign",
                    format!(
                        "The relation '{}' is a foreign relation and cannot be accessed in this manner.",
                        relation
                    ),
                );
                error.meta = Some(meta);
                vec![error]
            }
            JsonapiError::Conflict(detail) => vec![ErrorObject::new(
                "409",
                "ECONFLICT",
                "Resource already exists",
                detail,
            )],
            JsonapiError::Unavailable(operation) => vec![ErrorObject::new(
                "503",
                "EUNAVAILABLE",
                "Resource temporarily unavailable",
                format!("The resource is temporarily unavailable for {}.", operation),
            )],
            JsonapiError::Unauthorized => vec![ErrorObject::new(
                "401",
                "EUNAUTHORIZED",
                "Unauthorized",
                "The client is not authorized to perform this operation.",
            )],
            JsonapiError::Unknown(detail) => {
                vec![ErrorObject::new("500", "EUNKNOWN", "Unknown Error", detail)]
            }
        }
    }
}
