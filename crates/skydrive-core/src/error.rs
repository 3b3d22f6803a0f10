//! Service error type
//!
//! Every failure a handler can return is an [`AppError`]. How a variant is
//! presented over HTTP (status, code, retry hint, redaction) lives here in
//! [`ErrorMetadata`], so the API crate only renders it.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Level an error is logged at when rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Warn,
    Error,
}

/// Presentation of an error to API clients
pub trait ErrorMetadata {
    fn http_status_code(&self) -> u16;

    /// Stable code such as `NOT_FOUND`
    fn error_code(&self) -> &'static str;

    /// True when retrying the same request may succeed
    fn is_recoverable(&self) -> bool;

    fn suggested_action(&self) -> Option<&'static str>;

    /// Message safe to show the caller
    fn client_message(&self) -> String;

    /// Sensitive errors never expose their details
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Preview generation error: {0}")]
    Preview(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error: {message}")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

struct VariantMeta {
    status: u16,
    code: &'static str,
    recoverable: bool,
    action: Option<&'static str>,
    sensitive: bool,
    level: LogLevel,
}

const RETRY_LATER: Option<&str> = Some("Retry after a short delay");

impl VariantMeta {
    const fn client(status: u16, code: &'static str, action: Option<&'static str>) -> Self {
        VariantMeta {
            status,
            code,
            recoverable: false,
            action,
            sensitive: false,
            level: LogLevel::Debug,
        }
    }

    const fn server(code: &'static str) -> Self {
        VariantMeta {
            status: 500,
            code,
            recoverable: true,
            action: RETRY_LATER,
            sensitive: true,
            level: LogLevel::Error,
        }
    }
}

impl AppError {
    fn meta(&self) -> VariantMeta {
        match self {
            AppError::Database(_) => VariantMeta::server("DATABASE_ERROR"),
            AppError::Storage(_) => VariantMeta::server("STORAGE_ERROR"),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                VariantMeta::server("INTERNAL_ERROR")
            }
            AppError::Preview(_) => VariantMeta {
                level: LogLevel::Warn,
                ..VariantMeta::client(
                    422,
                    "PREVIEW_ERROR",
                    Some("Check the file is a valid PNG, JPEG or PDF"),
                )
            },
            AppError::InvalidInput(_) => VariantMeta::client(
                400,
                "INVALID_INPUT",
                Some("Check request parameters and try again"),
            ),
            AppError::BadRequest(_) => VariantMeta::client(
                400,
                "BAD_REQUEST",
                Some("Check request format and parameters"),
            ),
            AppError::NotFound(_) => {
                VariantMeta::client(404, "NOT_FOUND", Some("Verify the resource ID exists"))
            }
            AppError::Forbidden(_) => VariantMeta::client(
                403,
                "FORBIDDEN",
                Some("Ask the file owner to share it with you"),
            ),
            AppError::Conflict(_) => VariantMeta::client(409, "CONFLICT", None),
            AppError::PayloadTooLarge(_) => VariantMeta::client(
                413,
                "PAYLOAD_TOO_LARGE",
                Some("Reduce file size below the upload limit"),
            ),
            AppError::Unauthorized(_) => VariantMeta::client(
                401,
                "UNAUTHORIZED",
                Some("Log in again to obtain a fresh access token"),
            ),
        }
    }

    /// Variant name reported as `error_type` in non-production responses
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::Preview(_) => "Preview",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::BadRequest(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Conflict(_) => "Conflict",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Display text followed by up to five `Caused by:` lines.
    pub fn detailed_message(&self) -> String {
        const MAX_CAUSES: usize = 5;

        let mut details = self.to_string();
        let mut causes = std::iter::successors(std::error::Error::source(self), |e| e.source());
        for cause in causes.by_ref().take(MAX_CAUSES) {
            details.push_str("\n  Caused by: ");
            details.push_str(&cause.to_string());
        }
        if causes.next().is_some() {
            details.push_str("\n  ... (truncated)");
        }
        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        self.meta().status
    }

    fn error_code(&self) -> &'static str {
        self.meta().code
    }

    fn is_recoverable(&self) -> bool {
        self.meta().recoverable
    }

    fn suggested_action(&self) -> Option<&'static str> {
        self.meta().action
    }

    fn is_sensitive(&self) -> bool {
        self.meta().sensitive
    }

    fn log_level(&self) -> LogLevel {
        self.meta().level
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
            AppError::Preview(msg)
            | AppError::InvalidInput(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::Unauthorized(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_errors_are_retryable_and_hidden() {
        #[cfg(feature = "sqlx")]
        let err = AppError::from(sqlx::Error::PoolClosed);
        #[cfg(not(feature = "sqlx"))]
        let err = AppError::Database("pool closed".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "Failed to access database");
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_access_errors() {
        let not_found = AppError::NotFound("File not found".to_string());
        assert_eq!(not_found.http_status_code(), 404);
        assert_eq!(not_found.client_message(), "File not found");

        let forbidden = AppError::Forbidden("Access denied".to_string());
        assert_eq!(forbidden.http_status_code(), 403);
        assert_eq!(forbidden.error_code(), "FORBIDDEN");
        assert!(!forbidden.is_sensitive());

        let conflict = AppError::Conflict("File is already shared with this user".to_string());
        assert_eq!(conflict.http_status_code(), 409);
        assert_eq!(conflict.suggested_action(), None);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = AppError::Internal("connection string leaked".to_string());
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.is_sensitive());

        let err = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(err.error_type(), "Internal");
        assert_eq!(err.http_status_code(), 500);
    }

    #[test]
    fn test_detailed_message_walks_causes() {
        let source = anyhow::anyhow!("disk unplugged").context("write failed");
        let err = AppError::InternalWithSource {
            message: "upload".to_string(),
            source,
        };
        let details = err.detailed_message();
        assert!(details.starts_with("Internal error: upload"));
        assert!(details.contains("Caused by: write failed"));
    }

    #[test]
    fn test_preview_errors_warn_with_422() {
        let err = AppError::Preview("empty document".to_string());
        assert_eq!(err.http_status_code(), 422);
        assert_eq!(err.log_level(), LogLevel::Warn);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_payload_too_large() {
        let err = AppError::PayloadTooLarge("File exceeds 3145728 bytes".to_string());
        assert_eq!(err.http_status_code(), 413);
        assert_eq!(err.log_level(), LogLevel::Debug);
    }
}
