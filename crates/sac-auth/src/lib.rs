//! Session tokens and credentials for the Student Activity Center platform

pub mod credential;
pub mod jwt;

pub use credential::{bootstrap_credential, hash_credential, verify_credential, CredentialError};
pub use jwt::{SessionClaims, SessionError, SessionValidator, AUDIENCE, ISSUER};
