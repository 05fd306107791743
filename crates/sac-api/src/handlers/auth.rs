use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::AppendHeaders,
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::{info, warn};

use sac_auth::{hash_credential, verify_credential, SessionClaims, SessionValidator};
use sac_core::registration::{self, RegistrationDraft};
use sac_db::entities::club::ClubDomain;
use sac_db::entities::student::ResidenceType;
use sac_db::entities::user::UserRole;
use sac_db::entities::{faculty_club, lead, user};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

fn parse_residence_type(value: &str) -> Result<ResidenceType, ApiError> {
    match value {
        "Hostel" => Ok(ResidenceType::Hostel),
        "Day Scholar" => Ok(ResidenceType::DayScholar),
        _ => Err(sac_core::Error::validation(
            "residence_type",
            "must be \"Hostel\" or \"Day Scholar\"",
        )
        .into()),
    }
}

fn parse_domain(value: &str) -> Result<ClubDomain, ApiError> {
    ClubDomain::parse(value).ok_or_else(|| {
        sac_core::Error::validation("domain", format!("unknown program track {}", value)).into()
    })
}

fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "session_token={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        token, max_age_secs
    )
}

/// Build the session claims for an account, stamping lead/faculty scope.
async fn claims_for(
    state: &AppState,
    account: &user::Model,
) -> Result<SessionClaims, ApiError> {
    let ttl = Duration::minutes(state.session_ttl_minutes);
    let mut claims = SessionClaims::new(
        account.username.clone(),
        account.role.as_str().to_string(),
        ttl,
    );

    match account.role {
        UserRole::Lead => {
            let lead_row = lead::Entity::find_by_id(account.username.clone())
                .one(&state.db)
                .await?
                .ok_or_else(|| {
                    sac_core::Error::Internal(format!(
                        "lead {} has no club record",
                        account.username
                    ))
                })?;
            claims = claims.with_club_id(lead_row.club_id);
        }
        UserRole::Faculty => {
            let assigned: Vec<String> = faculty_club::Entity::find()
                .filter(faculty_club::Column::FacultyUsername.eq(account.username.as_str()))
                .order_by_asc(faculty_club::Column::ClubId)
                .all(&state.db)
                .await?
                .into_iter()
                .map(|row| row.club_id)
                .collect();
            claims = claims.with_assigned_clubs(assigned);
        }
        UserRole::Student | UserRole::Admin => {}
    }

    Ok(claims)
}

/// Register a new student account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account and profile created", body = RegisterResponse),
        (status = 400, description = "Validation failure", body = ErrorResponse),
        (status = 409, description = "Username already registered or club full", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let residence_type = parse_residence_type(&payload.residence_type)?;
    let domain = payload
        .domain
        .as_deref()
        .map(parse_domain)
        .transpose()?;

    let draft = RegistrationDraft {
        username: payload.username,
        name: payload.name,
        phone: payload.phone,
        gender: payload.gender,
        year: payload.year,
        branch: payload.branch,
        cluster: payload.cluster,
        country: payload.country,
        state: payload.state,
        district: payload.district,
        pincode: payload.pincode,
        residence_type,
        hostel_name: payload.hostel_name,
        bus_route: payload.bus_route,
        domain,
        club_id: payload.club_id,
        project_id: payload.project_id,
        rural_category: payload.rural_category,
        erp_receipt: payload.erp_receipt,
    };

    let account = registration::register(&state.db, &state.registration, draft).await?;
    info!("registered student {}", account.username);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: account.into(),
            must_change_password: true,
        }),
    ))
}

/// Sign in with username and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account disabled", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<
    (
        AppendHeaders<[(header::HeaderName, String); 1]>,
        Json<LoginResponse>,
    ),
    ApiError,
> {
    let account = user::Entity::find_by_id(payload.username.clone())
        .one(&state.db)
        .await?
        .ok_or_else(ApiError::invalid_credentials)?;

    if !account.is_active {
        return Err(sac_core::Error::Authorization("account is disabled".to_string()).into());
    }

    let valid = verify_credential(&payload.password, &account.password_hash)
        .map_err(sac_core::Error::from)?;
    if !valid {
        warn!("failed login attempt for {}", account.username);
        return Err(ApiError::invalid_credentials());
    }

    let claims = claims_for(&state, &account).await?;
    let token = SessionValidator::encode(state.jwt_secret.as_bytes(), &claims)
        .map_err(|e| sac_core::Error::Internal(e.to_string()))?;
    let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);

    let must_change_password = account.must_change_password;
    let cookie = session_cookie(&token, state.session_ttl_minutes * 60);

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(LoginResponse {
            user: account.into(),
            token,
            expires_at,
            must_change_password,
        }),
    ))
}

/// Sign out (clears the session cookie; tokens simply expire)
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Signed out")
    ),
    tag = "auth"
)]
pub async fn logout() -> (
    AppendHeaders<[(header::HeaderName, String); 1]>,
    StatusCode,
) {
    (
        AppendHeaders([(
            header::SET_COOKIE,
            "session_token=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0".to_string(),
        )]),
        StatusCode::NO_CONTENT,
    )
}

/// Current account
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current account", body = UserInfo),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserInfo>, ApiError> {
    let account = user::Entity::find_by_id(user.username.clone())
        .one(&state.db)
        .await?
        .ok_or_else(|| sac_core::Error::NotFound(format!("account {}", user.username)))?;

    Ok(Json(account.into()))
}

/// Rotate the credential; mandatory after registration
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Credential rotated"),
        (status = 400, description = "Weak password", body = ErrorResponse),
        (status = 401, description = "Current password mismatch", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    if payload.new_password.len() < 8 {
        return Err(sac_core::Error::validation(
            "new_password",
            "password must be at least 8 characters",
        )
        .into());
    }

    let account = user::Entity::find_by_id(user.username.clone())
        .one(&state.db)
        .await?
        .ok_or_else(|| sac_core::Error::NotFound(format!("account {}", user.username)))?;

    let valid = verify_credential(&payload.current_password, &account.password_hash)
        .map_err(sac_core::Error::from)?;
    if !valid {
        return Err(ApiError::invalid_credentials());
    }

    let hash = hash_credential(&payload.new_password).map_err(sac_core::Error::from)?;

    let mut active: user::ActiveModel = account.into();
    active.password_hash = Set(hash);
    active.must_change_password = Set(false);
    active.updated_at = Set(Utc::now());
    active.update(&state.db).await?;

    info!("credential rotated for {}", user.username);
    Ok(StatusCode::NO_CONTENT)
}

/// Enter a proxy session: a lead acting as their own student identity
#[utoipa::path(
    post,
    path = "/api/lead/proxy/enter",
    responses(
        (status = 200, description = "Proxy token issued", body = ProxyTokenResponse),
        (status = 403, description = "Caller is not a lead", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn proxy_enter(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProxyTokenResponse>, ApiError> {
    if user.proxy {
        return Err(sac_core::Error::InvalidTransition(
            "already in a proxy session".to_string(),
        )
        .into());
    }
    if super::parse_role(&user)? != UserRole::Lead {
        return Err(
            sac_core::Error::Authorization("only leads can enter a proxy session".to_string())
                .into(),
        );
    }

    let ttl = Duration::minutes(state.session_ttl_minutes);
    let lead_claims = SessionClaims::new(user.username.clone(), "lead".to_string(), ttl);
    let proxy_claims = SessionClaims::proxy_for(&lead_claims, ttl);

    let token = SessionValidator::encode(state.jwt_secret.as_bytes(), &proxy_claims)
        .map_err(|e| sac_core::Error::Internal(e.to_string()))?;
    let expires_at =
        DateTime::<Utc>::from_timestamp(proxy_claims.exp, 0).unwrap_or_else(Utc::now);

    info!("lead {} entered proxy session", user.username);
    Ok(Json(ProxyTokenResponse {
        token,
        expires_at,
        proxy: true,
    }))
}

/// Exit a proxy session: the only path back to the lead token
#[utoipa::path(
    post,
    path = "/api/lead/proxy/exit",
    responses(
        (status = 200, description = "Lead token restored", body = ProxyTokenResponse),
        (status = 403, description = "Caller is not in a proxy session", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn proxy_exit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProxyTokenResponse>, ApiError> {
    if !user.proxy {
        return Err(
            sac_core::Error::Authorization("not in a proxy session".to_string()).into(),
        );
    }

    let delegator = user.delegator.clone().ok_or_else(|| {
        sac_core::Error::Authorization("proxy token carries no delegator".to_string())
    })?;

    let account = user::Entity::find_by_id(delegator.clone())
        .one(&state.db)
        .await?
        .ok_or_else(|| sac_core::Error::NotFound(format!("account {}", delegator)))?;

    if account.role != UserRole::Lead || !account.is_active {
        return Err(sac_core::Error::Authorization(
            "the delegating account is no longer a lead".to_string(),
        )
        .into());
    }

    let claims = claims_for(&state, &account).await?;
    let token = SessionValidator::encode(state.jwt_secret.as_bytes(), &claims)
        .map_err(|e| sac_core::Error::Internal(e.to_string()))?;
    let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);

    info!("lead {} exited proxy session", delegator);
    Ok(Json(ProxyTokenResponse {
        token,
        expires_at,
        proxy: false,
    }))
}
