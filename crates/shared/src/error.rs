use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure kinds surfaced to the user. The view layer owns the mapping to
/// message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Http422,
    UnknownException,
    ConnectionException,
    TimeOutException,
    InvalidProductModel,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 5] = [
        ErrorCode::Http422,
        ErrorCode::UnknownException,
        ErrorCode::ConnectionException,
        ErrorCode::TimeOutException,
        ErrorCode::InvalidProductModel,
    ];
}

/// One entry of a GraphQL `errors` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ServiceError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
            extensions: None,
        }
    }
}

pub fn join_service_errors(errors: &[ServiceError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
