use sea_orm::DbErr;
use thiserror::Error;

/// Error taxonomy surfaced by the core services.
///
/// Validation failures are permanent; the core never retries. Callers
/// branch on [`CoreError::code`] rather than on message text.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    /// A stored history payload failed to deserialize. Payloads are
    /// written by the recorder with a fixed schema, so this indicates
    /// data corruption rather than an expected condition.
    #[error("corrupt history payload: {0}")]
    CorruptRecord(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl CoreError {
    pub fn not_found(message: impl Into<String>) -> Self {
        CoreError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        CoreError::Conflict(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        CoreError::Forbidden(message.into())
    }

    /// Stable machine-readable code for the calling layer.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::Forbidden(_) => "FORBIDDEN",
            CoreError::CorruptRecord(_) | CoreError::Database(_) => "INTERNAL_ERROR",
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(CoreError::not_found("x").code(), "NOT_FOUND");
        assert_eq!(CoreError::conflict("x").code(), "CONFLICT");
        assert_eq!(CoreError::forbidden("x").code(), "FORBIDDEN");
        assert_eq!(
            CoreError::Database(DbErr::Custom("boom".to_string())).code(),
            "INTERNAL_ERROR"
        );
    }
}
