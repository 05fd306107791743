//! Session token middleware
//!
//! Extracts the JWT from an HTTP-only cookie or the Authorization header,
//! validates it, and makes the caller's identity available to handlers via
//! Axum's Extension. Expired or malformed tokens never reach a handler.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use sac_auth::SessionValidator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::ErrorResponse;

/// Authenticated caller extracted from the session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// Account username
    pub username: String,
    /// Role at token issue time (student, lead, faculty, admin)
    pub role: String,
    /// Club run by this lead, if any
    pub club_id: Option<String>,
    /// Clubs assigned to this faculty member, if any
    pub assigned_clubs: Option<Vec<String>>,
    /// Whether this is a lead's proxy session acting as a student
    pub proxy: bool,
    /// Lead that delegated a proxy token
    pub delegator: Option<String>,
}

/// Token validation state shared across middleware instances
#[derive(Clone)]
pub struct JwtState {
    pub validator: Arc<SessionValidator>,
}

impl JwtState {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            validator: Arc::new(SessionValidator::new(secret)),
        }
    }
}

fn unauthorized(message: &str, code: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
            code: Some(code.to_string()),
        }),
    )
}

/// Authentication middleware for protected routes.
///
/// Accepts the token from the `session_token` cookie (web clients) or from
/// an `Authorization: Bearer <token>` header (API clients).
pub async fn require_auth(
    state: axum::extract::State<Arc<JwtState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    // Cookie first (preferred for web apps)
    let token = if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        cookie_header.to_str().ok().and_then(|cookies| {
            cookies
                .split(';')
                .map(|c| c.trim())
                .find(|c| c.starts_with("session_token="))
                .and_then(|c| c.strip_prefix("session_token="))
                .map(str::to_string)
        })
    } else {
        None
    };

    // Fall back to the Authorization header
    let token = match token {
        Some(t) => t,
        None => {
            let auth_header = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| {
                    unauthorized(
                        "Missing authentication token (cookie or Authorization header)",
                        "MISSING_AUTH",
                    )
                })?;

            auth_header
                .strip_prefix("Bearer ")
                .ok_or_else(|| {
                    unauthorized(
                        "Invalid Authorization header format. Expected 'Bearer <token>'",
                        "INVALID_AUTH_FORMAT",
                    )
                })?
                .to_string()
        }
    };

    let claims = state.validator.validate(&token).map_err(|e| {
        unauthorized(&format!("Invalid or expired token: {}", e), "INVALID_TOKEN")
    })?;

    let auth_user = AuthUser {
        username: claims.sub,
        role: claims.role,
        club_id: claims.club_id,
        assigned_clubs: claims.assigned_clubs,
        proxy: claims.proxy.unwrap_or(false),
        delegator: claims.delegator,
    };

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, middleware, routing::get, Router};
    use chrono::Duration;
    use sac_auth::SessionClaims;
    use tower::ServiceExt; // For oneshot()

    async fn protected_handler(axum::Extension(user): axum::Extension<AuthUser>) -> Json<AuthUser> {
        Json(user)
    }

    fn create_test_app(jwt_secret: &[u8]) -> Router {
        let jwt_state = Arc::new(JwtState::new(jwt_secret));

        Router::new()
            .route("/protected", get(protected_handler))
            .layer(middleware::from_fn_with_state(
                jwt_state.clone(),
                require_auth,
            ))
            .with_state(jwt_state)
    }

    #[tokio::test]
    async fn test_valid_bearer_token_passes() {
        let jwt_secret = b"test-secret-key";
        let app = create_test_app(jwt_secret);

        let claims = SessionClaims::new(
            "2211003456".to_string(),
            "student".to_string(),
            Duration::minutes(30),
        );
        let token = SessionValidator::encode(jwt_secret, &claims).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let user: AuthUser = serde_json::from_slice(&body).unwrap();

        assert_eq!(user.username, "2211003456");
        assert_eq!(user.role, "student");
        assert!(!user.proxy);
    }

    #[tokio::test]
    async fn test_cookie_token_passes() {
        let jwt_secret = b"test-secret-key";
        let app = create_test_app(jwt_secret);

        let claims = SessionClaims::new(
            "2109001122".to_string(),
            "lead".to_string(),
            Duration::minutes(30),
        )
        .with_club_id("AI01".to_string());
        let token = SessionValidator::encode(jwt_secret, &claims).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header("Cookie", format!("theme=dark; session_token={}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let user: AuthUser = serde_json::from_slice(&body).unwrap();

        assert_eq!(user.role, "lead");
        assert_eq!(user.club_id.as_deref(), Some("AI01"));
    }

    #[tokio::test]
    async fn test_missing_token_rejected() {
        let app = create_test_app(b"test-secret-key");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, Some("MISSING_AUTH".to_string()));
    }

    #[tokio::test]
    async fn test_malformed_authorization_header_rejected() {
        let app = create_test_app(b"test-secret-key");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header("Authorization", "Token abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, Some("INVALID_AUTH_FORMAT".to_string()));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let jwt_secret = b"test-secret-key";
        let app = create_test_app(jwt_secret);

        let claims = SessionClaims::new(
            "2211003456".to_string(),
            "student".to_string(),
            Duration::seconds(-10), // Already expired
        );
        let token = SessionValidator::encode(jwt_secret, &claims).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_rejected() {
        let app = create_test_app(b"test-secret-key");

        let claims = SessionClaims::new(
            "2211003456".to_string(),
            "student".to_string(),
            Duration::minutes(30),
        );
        let token = SessionValidator::encode(b"wrong-secret", &claims).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_proxy_claims_surface_in_auth_user() {
        let jwt_secret = b"test-secret-key";
        let app = create_test_app(jwt_secret);

        let lead = SessionClaims::new(
            "2109001122".to_string(),
            "lead".to_string(),
            Duration::minutes(30),
        );
        let proxy = SessionClaims::proxy_for(&lead, Duration::minutes(30));
        let token = SessionValidator::encode(jwt_secret, &proxy).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let user: AuthUser = serde_json::from_slice(&body).unwrap();

        assert!(user.proxy);
        assert_eq!(user.role, "student");
        assert_eq!(user.delegator.as_deref(), Some("2109001122"));
    }
}
