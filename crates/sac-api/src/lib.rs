//! REST surface for the Student Activity Center platform

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use sac_core::registration::RegistrationPolicy;
use sac_mailer::Mailer;
use sea_orm::DatabaseConnection;

/// Application state shared across handlers
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: String,
    pub session_ttl_minutes: i64,
    pub registration: RegistrationPolicy,
    pub mailer: Mailer,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Student Activity Center API",
        version = "0.1.0",
        description = "REST API for club registration, submissions, and evaluations",
        contact(
            name = "SAC Platform Team",
            email = "platform@sac.edu"
        )
    ),
    paths(
        handlers::system::health_check,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::get_current_user,
        handlers::auth::change_password,
        handlers::auth::proxy_enter,
        handlers::auth::proxy_exit,
        handlers::student::get_profile,
        handlers::student::list_own_submissions,
        handlers::student::submit_day,
        handlers::student::resubmit_day,
        handlers::student::get_own_final,
        handlers::student::submit_final,
        handlers::student::resubmit_final,
        handlers::review::list_students,
        handlers::review::get_student_submissions,
        handlers::review::evaluate_day,
        handlers::review::reject_day,
        handlers::review::evaluate_final_bundle,
        handlers::review::reject_final_bundle,
        handlers::clubs::list_clubs,
        handlers::clubs::get_club,
        handlers::clubs::create_club,
        handlers::clubs::delete_club,
        handlers::clubs::list_projects,
        handlers::clubs::create_project,
        handlers::clubs::delete_project,
        handlers::admin::promote_student,
        handlers::admin::update_student,
        handlers::admin::list_emails,
        handlers::admin::retry_email,
    ),
    components(
        schemas(
            models::ErrorResponse,
            models::HealthResponse,
            models::UserInfo,
            models::LoginRequest,
            models::LoginResponse,
            models::ChangePasswordRequest,
            models::RegisterRequest,
            models::RegisterResponse,
            models::ProxyTokenResponse,
            models::SubmissionView,
            models::DaySummaryView,
            models::InternalOverviewResponse,
            models::FinalOverviewResponse,
            models::SubmitDayRequest,
            models::SubmitFinalRequest,
            models::EvaluateDayRequest,
            models::EvaluateFinalRequest,
            models::RejectRequest,
            models::StudentProfileView,
            models::StudentSummary,
            models::StudentListQuery,
            models::StudentList,
            models::ReviewSubmissionsResponse,
            models::UpdateStudentRequest,
            models::PromoteRequest,
            models::ClubView,
            models::ClubList,
            models::CreateClubRequest,
            models::ProjectView,
            models::ProjectList,
            models::CreateProjectRequest,
            models::EmailQueueView,
            models::EmailQueueList,
            models::EmailQueueQuery,
        )
    ),
    tags(
        (name = "auth", description = "Authentication, registration, and proxy sessions"),
        (name = "student", description = "Student-facing submission endpoints"),
        (name = "review", description = "Role-scoped evaluation endpoints"),
        (name = "clubs", description = "Club and project management"),
        (name = "admin", description = "Administration endpoints"),
        (name = "system", description = "System health endpoints")
    )
)]
struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable CORS (for development)
    pub enable_cors: bool,
    /// JWT secret for signing session tokens
    pub jwt_secret: String,
    /// Session token lifetime in minutes
    pub session_ttl_minutes: i64,
    /// Domain used to derive student emails
    pub institution_domain: String,
    /// Allowed admission-year prefixes for enrollment numbers
    pub admission_year_prefixes: Vec<String>,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".parse().unwrap(),
            enable_cors: true,
            jwt_secret: "change-me-in-production".to_string(),
            session_ttl_minutes: 30,
            institution_domain: "university.edu".to_string(),
            admission_year_prefixes: vec!["22".into(), "23".into(), "24".into(), "25".into()],
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, db: DatabaseConnection, mailer: Mailer) -> Self {
        let state = Arc::new(AppState {
            db,
            jwt_secret: config.jwt_secret.clone(),
            session_ttl_minutes: config.session_ttl_minutes,
            registration: RegistrationPolicy {
                institution_domain: config.institution_domain.clone(),
                admission_year_prefixes: config.admission_year_prefixes.clone(),
            },
            mailer,
        });

        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let api_doc = ApiDoc::openapi();

        let jwt_state = Arc::new(middleware::JwtState::new(
            self.config.jwt_secret.as_bytes(),
        ));

        // PUBLIC routes (no authentication required)
        let public_router = Router::new()
            .route("/api/health", get(handlers::health_check))
            .route("/api/auth/register", post(handlers::register))
            .route("/api/auth/login", post(handlers::login))
            .route("/api/auth/logout", post(handlers::logout))
            .with_state(self.state.clone());

        // PROTECTED routes (require a session token)
        let protected_router = Router::new()
            .route("/api/auth/me", get(handlers::get_current_user))
            .route("/api/auth/change-password", post(handlers::change_password))
            .route("/api/lead/proxy/enter", post(handlers::proxy_enter))
            .route("/api/lead/proxy/exit", post(handlers::proxy_exit))
            // Student self-service
            .route("/api/student/profile", get(handlers::get_profile))
            .route(
                "/api/student/submissions",
                get(handlers::list_own_submissions),
            )
            .route(
                "/api/student/submissions/{day}",
                post(handlers::submit_day).put(handlers::resubmit_day),
            )
            .route(
                "/api/student/final",
                get(handlers::get_own_final)
                    .post(handlers::submit_final)
                    .put(handlers::resubmit_final),
            )
            // Role-scoped review
            .route("/api/review/students", get(handlers::list_students))
            .route(
                "/api/review/students/{username}/submissions",
                get(handlers::get_student_submissions),
            )
            .route(
                "/api/review/students/{username}/submissions/{day}/evaluate",
                post(handlers::evaluate_day),
            )
            .route(
                "/api/review/students/{username}/submissions/{day}/reject",
                post(handlers::reject_day),
            )
            .route(
                "/api/review/students/{username}/final/evaluate",
                post(handlers::evaluate_final_bundle),
            )
            .route(
                "/api/review/students/{username}/final/reject",
                post(handlers::reject_final_bundle),
            )
            // Clubs and projects
            .route(
                "/api/clubs",
                get(handlers::list_clubs).post(handlers::create_club),
            )
            .route(
                "/api/clubs/{id}",
                get(handlers::get_club).delete(handlers::delete_club),
            )
            .route(
                "/api/projects",
                get(handlers::list_projects).post(handlers::create_project),
            )
            .route("/api/projects/{id}", axum::routing::delete(handlers::delete_project))
            // Administration
            .route(
                "/api/admin/promote/{username}",
                post(handlers::promote_student),
            )
            .route(
                "/api/admin/students/{username}",
                put(handlers::update_student),
            )
            .route("/api/admin/emails", get(handlers::list_emails))
            .route("/api/admin/emails/{id}/retry", post(handlers::retry_email))
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                jwt_state.clone(),
                middleware::require_auth,
            ));

        let api_router = public_router.merge(protected_router);

        let router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", api_doc))
            .merge(api_router);

        // Configure CORS
        let cors = if self.config.enable_cors {
            use tower_http::cors::AllowOrigin;

            // Cookie-based auth requires credentials, which rules out
            // allow_origin(Any); development origins are matched explicitly.
            let cors_layer = CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::PATCH,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
                .allow_credentials(true)
                .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
                    let origin_str = origin.to_str().unwrap_or("");
                    origin_str.starts_with("http://localhost:")
                        || origin_str.starts_with("http://127.0.0.1:")
                        || origin_str.starts_with("https://localhost:")
                        || origin_str.starts_with("https://127.0.0.1:")
                }));

            Some(cors_layer)
        } else {
            None
        };

        let mut router = router.layer(TraceLayer::new_for_http());

        if let Some(cors) = cors {
            router = router.layer(cors);
        }

        router
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );
        info!("Swagger UI: http://{}/swagger-ui", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        // Ensure OpenAPI spec can be generated without panics
        let _api_doc = ApiDoc::openapi();
    }
}
