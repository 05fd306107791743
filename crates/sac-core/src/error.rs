//! Error taxonomy shared by every domain operation
//!
//! Variants map one-to-one onto HTTP status classes at the API boundary.
//! Store errors are wrapped, never surfaced verbatim to callers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing input; carries the offending field
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Caller's role or club scope does not cover the target
    #[error("{0}")]
    Authorization(String),

    /// Referenced entity absent
    #[error("{0} not found")]
    NotFound(String),

    /// Lifecycle rule violated (locked period, terminal state, double submit)
    #[error("{0}")]
    InvalidTransition(String),

    /// Uniqueness or capacity violated at write time
    #[error("{0}")]
    Conflict(String),

    /// Store unreachable or failing; retried by the client with backoff
    #[error("store error")]
    Infrastructure(#[from] sea_orm::DbErr),

    /// Unexpected internal failure (e.g. credential hashing)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<sea_orm::TransactionError<Error>> for Error {
    fn from(err: sea_orm::TransactionError<Error>) -> Self {
        match err {
            sea_orm::TransactionError::Connection(db) => Error::Infrastructure(db),
            sea_orm::TransactionError::Transaction(inner) => inner,
        }
    }
}

impl From<sac_auth::CredentialError> for Error {
    fn from(err: sac_auth::CredentialError) -> Self {
        match err {
            sac_auth::CredentialError::PhoneTooShort => {
                Error::validation("phone", "phone number must contain at least 4 digits")
            }
            other => Error::Internal(other.to_string()),
        }
    }
}
