//! Error taxonomy shared by every planner operation.
//!
//! Each variant carries a stable machine-readable code; validation failures
//! also name the offending field. Query helpers in `wedplan-db` return
//! `anyhow` errors, which surface here as [`CoreError::Internal`].

/// Errors returned by planner operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed input or an ownership mismatch that is reported as a bad
    /// request.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Missing, malformed or expired credentials.
    #[error("{0}")]
    Authentication(String),

    /// The target does not exist, or exists but belongs to someone else and
    /// must not be disclosed.
    #[error("{0}")]
    NotFound(String),

    /// The operation conflicts with existing state.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Authentication(_) => "AUTHENTICATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The offending input field, for validation failures.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// HTTP status code the error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Authentication(_) => 401,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
