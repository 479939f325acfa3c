//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Error Categories
//!
//! Collaborator failures (VCS, pull-request hosting, filesystem) carry an
//! [`ErrorCategory`] that decides whether the retry policy tries again:
//!
//! - **Transient**: Temporary server-side issues (retry)
//! - **RateLimit**: Remote throttling (retry with backoff)
//! - **Network**: Connectivity issues (retry with backoff)
//! - **Auth**: Authentication failures (fail fast)
//! - **Conflict**: Branch or ref already exists (fail fast)
//!
//! Pipeline-level failures are split by severity: `Config` and `Validation`
//! abort a run before scanning, everything else is recovered by the stage
//! that raised it (synthetic issues, transform warnings, hook errors).

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Error categories used by the retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Remote throttling - wait then retry
    RateLimit,
    /// Authentication failed - fail fast, don't retry
    Auth,
    /// Network/connectivity issues - retry with backoff
    Network,
    /// Target already exists or diverged - don't retry
    Conflict,
    /// Invalid request - don't retry, fix request
    BadRequest,
    /// Temporary server issues - retry
    Transient,
    /// Unknown error - conservative retry
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Check if this category is worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::Network | Self::Transient | Self::Unknown
        )
    }

    /// Classify an HTTP status code returned by a hosting API
    pub fn from_http_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimit,
            401 | 403 => Self::Auth,
            409 | 422 => Self::Conflict,
            400 | 404 => Self::BadRequest,
            500 | 502 | 503 | 504 => Self::Transient,
            _ => Self::Unknown,
        }
    }

    /// Classify an I/O error kind from a local collaborator
    pub fn from_io_kind(kind: std::io::ErrorKind) -> Self {
        use std::io::ErrorKind;
        match kind {
            ErrorKind::NotFound | ErrorKind::InvalidInput | ErrorKind::InvalidData => {
                Self::BadRequest
            }
            ErrorKind::PermissionDenied => Self::Auth,
            ErrorKind::AlreadyExists => Self::Conflict,
            ErrorKind::TimedOut | ErrorKind::Interrupted | ErrorKind::WouldBlock => {
                Self::Transient
            }
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected => Self::Network,
            _ => Self::Unknown,
        }
    }
}

// =============================================================================
// Integration Error
// =============================================================================

/// Failure reported by an external collaborator
#[derive(Debug, Clone)]
pub struct IntegrationError {
    /// Error category for retry decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Collaborator that produced the error (e.g. "git", "github")
    pub service: Option<String>,
}

impl std::fmt::Display for IntegrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(service) = &self.service {
            write!(f, "[{}:{}] {}", service, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for IntegrationError {}

impl IntegrationError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            service: None,
        }
    }

    /// Add collaborator context
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Structured validation error with context
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// What validation failed
    pub kind: ValidationErrorKind,
    /// Field or component that failed validation
    pub field: Option<String>,
    /// Detailed message
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(field) = &self.field {
            write!(f, "Validation failed for '{}': {}", field, self.message)
        } else {
            write!(f, "Validation failed: {}", self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    /// Create a new validation error
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            message: message.into(),
        }
    }

    /// Add field context
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Validation error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Document shape is wrong (not a mapping, list expected, ...)
    Schema,
    /// Required field missing or empty
    MissingField,
    /// Field present but of the wrong type or format
    Format,
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ReviveError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // -------------------------------------------------------------------------
    // Fatal Errors (abort before scanning)
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(ValidationError),

    // -------------------------------------------------------------------------
    // Recoverable Errors
    // -------------------------------------------------------------------------
    #[error("Parse error in {path}: {message}")]
    Parse { message: String, path: String },

    #[error("Hook '{stage}' failed: {message}")]
    Hook { stage: String, message: String },

    #[error("Integration error: {0}")]
    Integration(IntegrationError),

    /// Operation timeout with context
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },
}

impl From<ValidationError> for ReviveError {
    fn from(err: ValidationError) -> Self {
        ReviveError::Validation(err)
    }
}

impl From<IntegrationError> for ReviveError {
    fn from(err: IntegrationError) -> Self {
        ReviveError::Integration(err)
    }
}

pub type Result<T> = std::result::Result<T, ReviveError>;

impl ReviveError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a parse error for a file
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Create a hook error
    pub fn hook(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Errors that abort a pipeline run before any stage executes
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Validation(_))
    }

    /// Check if the retry policy should try again
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Integration(e) => e.is_retryable(),
            Self::Io(e) => ErrorCategory::from_io_kind(e.kind()).is_retryable(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// True when the error is an I/O "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

// =============================================================================
// Tests
// =============================================================================
