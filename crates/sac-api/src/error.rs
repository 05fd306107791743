//! Domain error to HTTP response mapping
//!
//! Store errors are logged server-side and surfaced as a generic message;
//! raw database text never reaches the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::models::ErrorResponse;

pub enum ApiError {
    /// Domain error, mapped by taxonomy
    Core(sac_core::Error),
    /// Authentication failure (401), distinct from scope failures (403)
    Unauthorized { message: String, code: &'static str },
}

impl ApiError {
    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized {
            message: "invalid username or password".to_string(),
            code: "INVALID_CREDENTIALS",
        }
    }
}

impl From<sac_core::Error> for ApiError {
    fn from(err: sac_core::Error) -> Self {
        ApiError::Core(err)
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        ApiError::Core(sac_core::Error::Infrastructure(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use sac_core::Error;

        let (status, code, message) = match &self {
            ApiError::Unauthorized { message, code } => {
                (StatusCode::UNAUTHORIZED, *code, message.clone())
            }
            ApiError::Core(core) => match core {
                Error::Validation { .. } => {
                    (StatusCode::BAD_REQUEST, "VALIDATION", core.to_string())
                }
                Error::Authorization(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", core.to_string()),
                Error::InvalidTransition(msg) => {
                    (StatusCode::CONFLICT, "INVALID_TRANSITION", msg.clone())
                }
                Error::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                Error::Infrastructure(db) => {
                    error!("store error: {}", db);
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "SERVICE_UNAVAILABLE",
                        "the store is temporarily unavailable".to_string(),
                    )
                }
                Error::Internal(msg) => {
                    error!("internal error: {}", msg);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL",
                        "internal error".to_string(),
                    )
                }
            },
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: Some(code.to_string()),
            }),
        )
            .into_response()
    }
}
