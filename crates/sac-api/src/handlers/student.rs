use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use sea_orm::EntityTrait;
use tracing::info;

use sac_core::lifecycle::{self, DayUrls, FinalUrls};
use sac_core::marks;
use sac_db::entities::final_submission::FinalKind;
use sac_db::entities::student::ResidenceType;
use sac_db::entities::{student, user};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

use super::require_student;

/// Bootstrap credentials cannot be used to submit; rotation comes first.
async fn ensure_rotated(state: &AppState, username: &str) -> Result<(), ApiError> {
    let account = user::Entity::find_by_id(username.to_string())
        .one(&state.db)
        .await?
        .ok_or_else(|| sac_core::Error::NotFound(format!("account {}", username)))?;

    if account.must_change_password {
        return Err(sac_core::Error::Authorization(
            "set a new password before submitting".to_string(),
        )
        .into());
    }

    Ok(())
}

pub(crate) fn profile_view(
    account: user::Model,
    profile: student::Model,
) -> StudentProfileView {
    StudentProfileView {
        username: profile.username,
        name: account.name,
        email: account.email,
        gender: profile.gender,
        year: profile.year,
        branch: profile.branch,
        cluster: profile.cluster,
        country: profile.country,
        state: profile.state,
        district: profile.district,
        pincode: profile.pincode,
        residence_type: match profile.residence_type {
            ResidenceType::Hostel => "Hostel".to_string(),
            ResidenceType::DayScholar => "Day Scholar".to_string(),
        },
        hostel_name: profile.hostel_name,
        bus_route: profile.bus_route,
        domain: profile.domain.map(|d| d.as_str().to_string()),
        club_id: profile.club_id,
        project_id: profile.project_id,
        rural_category: profile.rural_category,
        erp_receipt: profile.erp_receipt,
        phone: profile.phone,
    }
}

pub(crate) async fn internal_overview_response(
    state: &AppState,
    username: &str,
) -> Result<InternalOverviewResponse, ApiError> {
    let summaries = lifecycle::internal_overview(&state.db, username).await?;

    let all_items: Vec<_> = summaries
        .iter()
        .flat_map(|s| s.items.iter().cloned())
        .collect();
    let total_marks = marks::internal_total(&all_items);

    let days = summaries
        .into_iter()
        .map(|s| DaySummaryView {
            day: s.day,
            status: status_str(s.status).to_string(),
            items: s.items.into_iter().map(SubmissionView::from).collect(),
        })
        .collect();

    Ok(InternalOverviewResponse { days, total_marks })
}

pub(crate) async fn final_overview_response(
    state: &AppState,
    username: &str,
) -> Result<FinalOverviewResponse, ApiError> {
    let rows = lifecycle::final_overview(&state.db, username).await?;

    let status = rows
        .iter()
        .find(|r| r.kind == FinalKind::FinalReport)
        .map(|r| r.status)
        .unwrap_or(sac_db::entities::internal_submission::SubmissionStatus::NotSubmitted);
    let total_marks = marks::final_total(&rows);

    Ok(FinalOverviewResponse {
        items: rows.into_iter().map(SubmissionView::from).collect(),
        status: status_str(status).to_string(),
        total_marks,
    })
}

/// Own profile
#[utoipa::path(
    get,
    path = "/api/student/profile",
    responses(
        (status = 200, description = "Student profile", body = StudentProfileView),
        (status = 404, description = "Profile not found", body = ErrorResponse)
    ),
    tag = "student"
)]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<StudentProfileView>, ApiError> {
    require_student(&user)?;

    let account = user::Entity::find_by_id(user.username.clone())
        .one(&state.db)
        .await?
        .ok_or_else(|| sac_core::Error::NotFound(format!("account {}", user.username)))?;
    let profile = student::Entity::find_by_id(user.username.clone())
        .one(&state.db)
        .await?
        .ok_or_else(|| sac_core::Error::NotFound(format!("student {}", user.username)))?;

    Ok(Json(profile_view(account, profile)))
}

/// Own internal submissions, day by day
#[utoipa::path(
    get,
    path = "/api/student/submissions",
    responses(
        (status = 200, description = "Internal submission overview", body = InternalOverviewResponse)
    ),
    tag = "student"
)]
pub async fn list_own_submissions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<InternalOverviewResponse>, ApiError> {
    require_student(&user)?;
    Ok(Json(internal_overview_response(&state, &user.username).await?))
}

/// Submit the three URLs of an internal day
#[utoipa::path(
    post,
    path = "/api/student/submissions/{day}",
    params(
        ("day" = i32, Path, description = "Reporting day, 1..=6")
    ),
    request_body = SubmitDayRequest,
    responses(
        (status = 201, description = "Day submitted"),
        (status = 400, description = "Validation failure", body = ErrorResponse),
        (status = 409, description = "Day locked or already submitted", body = ErrorResponse)
    ),
    tag = "student"
)]
pub async fn submit_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(day): Path<i32>,
    Json(payload): Json<SubmitDayRequest>,
) -> Result<StatusCode, ApiError> {
    require_student(&user)?;
    ensure_rotated(&state, &user.username).await?;

    lifecycle::submit_internal(
        &state.db,
        &user.username,
        day,
        DayUrls {
            report: payload.report_url,
            linkedin: payload.linkedin_url,
            youtube: payload.youtube_url,
        },
    )
    .await?;

    info!("{} submitted day {}", user.username, day);
    Ok(StatusCode::CREATED)
}

/// Resubmit a rejected internal day
#[utoipa::path(
    put,
    path = "/api/student/submissions/{day}",
    params(
        ("day" = i32, Path, description = "Reporting day, 1..=6")
    ),
    request_body = SubmitDayRequest,
    responses(
        (status = 200, description = "Day resubmitted"),
        (status = 409, description = "Day is not in a rejected state", body = ErrorResponse)
    ),
    tag = "student"
)]
pub async fn resubmit_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(day): Path<i32>,
    Json(payload): Json<SubmitDayRequest>,
) -> Result<StatusCode, ApiError> {
    require_student(&user)?;
    ensure_rotated(&state, &user.username).await?;

    lifecycle::resubmit_internal(
        &state.db,
        &user.username,
        day,
        DayUrls {
            report: payload.report_url,
            linkedin: payload.linkedin_url,
            youtube: payload.youtube_url,
        },
    )
    .await?;

    info!("{} resubmitted day {}", user.username, day);
    Ok(StatusCode::OK)
}

/// Own final submission bundle
#[utoipa::path(
    get,
    path = "/api/student/final",
    responses(
        (status = 200, description = "Final submission overview", body = FinalOverviewResponse)
    ),
    tag = "student"
)]
pub async fn get_own_final(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<FinalOverviewResponse>, ApiError> {
    require_student(&user)?;
    Ok(Json(final_overview_response(&state, &user.username).await?))
}

/// Submit the final bundle
#[utoipa::path(
    post,
    path = "/api/student/final",
    request_body = SubmitFinalRequest,
    responses(
        (status = 201, description = "Final bundle submitted"),
        (status = 409, description = "Already submitted", body = ErrorResponse)
    ),
    tag = "student"
)]
pub async fn submit_final(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<SubmitFinalRequest>,
) -> Result<StatusCode, ApiError> {
    require_student(&user)?;
    ensure_rotated(&state, &user.username).await?;

    lifecycle::submit_final(
        &state.db,
        &user.username,
        FinalUrls {
            report: payload.report_url,
            youtube: payload.youtube_url,
            linkedin: payload.linkedin_url,
        },
    )
    .await?;

    info!("{} submitted the final bundle", user.username);
    Ok(StatusCode::CREATED)
}

/// Resubmit a rejected final bundle
#[utoipa::path(
    put,
    path = "/api/student/final",
    request_body = SubmitFinalRequest,
    responses(
        (status = 200, description = "Final bundle resubmitted"),
        (status = 409, description = "Final bundle is not in a rejected state", body = ErrorResponse)
    ),
    tag = "student"
)]
pub async fn resubmit_final(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<SubmitFinalRequest>,
) -> Result<StatusCode, ApiError> {
    require_student(&user)?;
    ensure_rotated(&state, &user.username).await?;

    lifecycle::resubmit_final(
        &state.db,
        &user.username,
        FinalUrls {
            report: payload.report_url,
            youtube: payload.youtube_url,
            linkedin: payload.linkedin_url,
        },
    )
    .await?;

    info!("{} resubmitted the final bundle", user.username);
    Ok(StatusCode::OK)
}
