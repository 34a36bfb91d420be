//! Backend error classification
//!
//! Every failure of a backend call is reclassified here, at the gateway
//! boundary, into one of a small set of kinds. Upstream error codes and HTTP
//! statuses are derived from these kinds only; raw transport errors never
//! escape the gateway.
//!
//! | Variant | Gateway kind | HTTP Status |
//! |------|------|------------|
//! | TableNotFound | NotFound | 404 |
//! | RecordNotFound | NotFound | 404 |
//! | InvalidFieldData | InvalidFieldData | 422 |
//! | Unknown | Unknown | 502 |

use serde_json::Value;

/// Classified failure of a single backend call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Table '{table}' not found: {message}")]
    TableNotFound { table: String, message: String },

    #[error("Record not found in table '{table}': {message}")]
    RecordNotFound { table: String, message: String },

    #[error("Invalid field data for table '{table}': {message}")]
    InvalidFieldData { table: String, message: String },

    /// Anything else, including network failures and undecodable responses
    #[error("Backend request failed: {message}")]
    Unknown {
        status: Option<u16>,
        message: String,
    },
}

/// Coarse classification used by callers that only care about the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    NotFound,
    InvalidFieldData,
    Unknown,
}

impl BackendError {
    pub fn table_not_found(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
            message: message.into(),
        }
    }

    pub fn record_not_found(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecordNotFound {
            table: table.into(),
            message: message.into(),
        }
    }

    pub fn invalid_field_data(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFieldData {
            table: table.into(),
            message: message.into(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            status: None,
            message: message.into(),
        }
    }

    pub fn unknown_status(status: u16, message: impl Into<String>) -> Self {
        Self::Unknown {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> BackendErrorKind {
        match self {
            Self::TableNotFound { .. } | Self::RecordNotFound { .. } => BackendErrorKind::NotFound,
            Self::InvalidFieldData { .. } => BackendErrorKind::InvalidFieldData,
            Self::Unknown { .. } => BackendErrorKind::Unknown,
        }
    }

    /// Stable error code surfaced to clients and the audit log
    pub fn code(&self) -> &'static str {
        match self {
            Self::TableNotFound { .. } => "TABLE_NOT_FOUND",
            Self::RecordNotFound { .. } => "RECORD_NOT_FOUND",
            Self::InvalidFieldData { .. } => "INVALID_FIELD_DATA",
            Self::Unknown { .. } => "BACKEND_ERROR",
        }
    }

    /// HTTP status this error maps to at the API surface
    pub fn http_status(&self) -> u16 {
        match self {
            Self::TableNotFound { .. } | Self::RecordNotFound { .. } => 404,
            Self::InvalidFieldData { .. } => 422,
            Self::Unknown { .. } => 502,
        }
    }

    /// Backend-provided detail, without the classification prefix
    pub fn message(&self) -> &str {
        match self {
            Self::TableNotFound { message, .. }
            | Self::RecordNotFound { message, .. }
            | Self::InvalidFieldData { message, .. }
            | Self::Unknown { message, .. } => message,
        }
    }
}

/// Maps raw backend responses onto [`BackendError`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendErrorMapper;

impl BackendErrorMapper {
    /// Classify a non-success HTTP response
    pub fn map_http_error(&self, table: &str, status_code: u16, response_body: &str) -> BackendError {
        let (error_type, message) = parse_error_body(response_body);
        let message = message.unwrap_or_else(|| fallback_message(status_code, response_body));

        match status_code {
            404 => {
                if names_table(error_type.as_deref(), &message) {
                    BackendError::table_not_found(table, message)
                } else {
                    BackendError::record_not_found(table, message)
                }
            }
            // The backend answers 403 instead of 404 for tables the token cannot see
            403 if error_type.as_deref() == Some("INVALID_PERMISSIONS_OR_MODEL_NOT_FOUND") => {
                BackendError::table_not_found(table, message)
            }
            400 | 422 => BackendError::invalid_field_data(table, message),
            _ => BackendError::unknown_status(status_code, message),
        }
    }

    /// Classify a transport-level failure (connect, timeout, TLS, decode)
    pub fn map_transport_error(&self, error: &reqwest::Error) -> BackendError {
        if error.is_timeout() {
            BackendError::unknown(format!("Backend request timed out: {}", error))
        } else if error.is_decode() {
            BackendError::unknown(format!("Failed to decode backend response: {}", error))
        } else {
            BackendError::unknown(format!("Network error: {}", error))
        }
    }
}

/// Extract `(type, message)` from either `{"error": {"type", "message"}}`
/// or `{"error": "TYPE"}`
fn parse_error_body(body: &str) -> (Option<String>, Option<String>) {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return (None, None);
    };

    match value.get("error") {
        Some(Value::String(error_type)) => (Some(error_type.clone()), None),
        Some(Value::Object(error)) => {
            let error_type = error
                .get("type")
                .and_then(Value::as_str)
                .map(str::to_string);
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string);
            (error_type, message)
        }
        _ => (None, None),
    }
}

fn names_table(error_type: Option<&str>, message: &str) -> bool {
    if let Some(error_type) = error_type {
        if matches!(
            error_type,
            "TABLE_NOT_FOUND" | "MODEL_NOT_FOUND" | "INVALID_PERMISSIONS_OR_MODEL_NOT_FOUND"
        ) {
            return true;
        }
    }
    message.to_ascii_lowercase().contains("table")
}

fn fallback_message(status_code: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status_code)
    } else {
        format!("HTTP {}: {}", status_code, body)
    }
}
