use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use sea_orm::{ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::{debug, info};

use sac_core::lifecycle::{self, FinalEvaluation, InternalEvaluation};
use sac_db::entities::club::ClubDomain;
use sac_db::entities::final_submission::FinalKind;
use sac_db::entities::internal_submission::SubmissionKind;
use sac_db::entities::{student, user};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

use super::reviewer_from;

fn parse_internal_kind(value: &str) -> Result<SubmissionKind, ApiError> {
    match value {
        "report" => Ok(SubmissionKind::Report),
        "linkedin_link" => Ok(SubmissionKind::LinkedinLink),
        "youtube_link" => Ok(SubmissionKind::YoutubeLink),
        _ => Err(sac_core::Error::validation(
            "kind",
            format!("unknown submission kind {}", value),
        )
        .into()),
    }
}

fn parse_final_kind(value: &str) -> Result<FinalKind, ApiError> {
    match value {
        "final_report" => Ok(FinalKind::FinalReport),
        "final_youtube" => Ok(FinalKind::FinalYoutube),
        "final_linkedin" => Ok(FinalKind::FinalLinkedin),
        _ => Err(sac_core::Error::validation(
            "kind",
            format!("unknown submission kind {}", value),
        )
        .into()),
    }
}

fn summary_of(profile: &student::Model, name: String) -> StudentSummary {
    StudentSummary {
        username: profile.username.clone(),
        name,
        year: profile.year,
        branch: profile.branch.clone(),
        club_id: profile.club_id.clone(),
        project_id: profile.project_id.clone(),
    }
}

/// List students within the caller's club scope
#[utoipa::path(
    get,
    path = "/api/review/students",
    params(
        ("club" = Option<String>, Query, description = "Filter by club id (must lie within scope)"),
        ("domain" = Option<String>, Query, description = "Filter by program track code"),
        ("year" = Option<i32>, Query, description = "Filter by year of study"),
        ("offset" = Option<usize>, Query, description = "Pagination offset (default: 0)"),
        ("limit" = Option<usize>, Query, description = "Pagination limit (default: 100, max: 1000)")
    ),
    responses(
        (status = 200, description = "Students visible to the caller", body = StudentList),
        (status = 403, description = "Requested club outside the caller's scope", body = ErrorResponse)
    ),
    tag = "review"
)]
pub async fn list_students(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<StudentListQuery>,
) -> Result<Json<StudentList>, ApiError> {
    debug!("listing students with filters: {:?}", query);

    let reviewer = reviewer_from(&user)?;

    // Intersect the request with the caller's scope before touching the store
    let club_filter = match (&query.club, reviewer.scope.club_filter()) {
        (Some(requested), None) => Some(vec![requested.clone()]),
        (Some(requested), Some(_)) => {
            if !reviewer.scope.permits(Some(requested)) {
                return Err(sac_core::Error::Authorization(
                    "requested club is outside your scope".to_string(),
                )
                .into());
            }
            Some(vec![requested.clone()])
        }
        (None, scoped) => scoped,
    };

    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(100).clamp(1, 1000); // Cap at 1000

    // A scoped reviewer with no clubs sees nobody
    if club_filter.as_ref().map(|c| c.is_empty()).unwrap_or(false) {
        return Ok(Json(StudentList {
            students: Vec::new(),
            total: 0,
            offset,
            limit,
        }));
    }

    let mut condition = Condition::all();
    if let Some(clubs) = club_filter {
        condition = condition.add(student::Column::ClubId.is_in(clubs));
    }
    if let Some(ref domain) = query.domain {
        let domain = ClubDomain::parse(domain).ok_or_else(|| {
            sac_core::Error::validation("domain", format!("unknown program track {}", domain))
        })?;
        condition = condition.add(student::Column::Domain.eq(domain));
    }
    if let Some(year) = query.year {
        condition = condition.add(student::Column::Year.eq(year));
    }

    let paginator = student::Entity::find()
        .filter(condition)
        .order_by_asc(student::Column::Username)
        .paginate(&state.db, limit as u64);

    let total = paginator.num_items().await? as usize;

    let page_num = offset / limit;
    let profiles = paginator.fetch_page(page_num as u64).await?;

    // Batch-fetch display names
    let usernames: Vec<String> = profiles.iter().map(|p| p.username.clone()).collect();
    let accounts = user::Entity::find()
        .filter(user::Column::Username.is_in(usernames))
        .all(&state.db)
        .await?;

    let students = profiles
        .into_iter()
        .map(|profile| {
            let name = accounts
                .iter()
                .find(|a| a.username == profile.username)
                .map(|a| a.name.clone())
                .unwrap_or_default();
            summary_of(&profile, name)
        })
        .collect();

    Ok(Json(StudentList {
        students,
        total,
        offset,
        limit,
    }))
}

/// A student's submissions, scope-checked
#[utoipa::path(
    get,
    path = "/api/review/students/{username}/submissions",
    params(
        ("username" = String, Path, description = "Student enrollment number")
    ),
    responses(
        (status = 200, description = "The student's submissions", body = ReviewSubmissionsResponse),
        (status = 403, description = "Student outside the caller's scope", body = ErrorResponse)
    ),
    tag = "review"
)]
pub async fn get_student_submissions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(username): Path<String>,
) -> Result<Json<ReviewSubmissionsResponse>, ApiError> {
    let reviewer = reviewer_from(&user)?;

    let profile = student::Entity::find_by_id(username.clone())
        .one(&state.db)
        .await?;
    let club = profile.as_ref().and_then(|p| p.club_id.as_deref());
    if !reviewer.scope.permits(club) {
        return Err(sac_core::Error::Authorization(
            "not authorized to review this student".to_string(),
        )
        .into());
    }
    let profile =
        profile.ok_or_else(|| sac_core::Error::NotFound(format!("student {}", username)))?;

    let name = user::Entity::find_by_id(username.clone())
        .one(&state.db)
        .await?
        .map(|a| a.name)
        .unwrap_or_default();

    let internal = super::student::internal_overview_response(&state, &username).await?;
    let fin = super::student::final_overview_response(&state, &username).await?;

    Ok(Json(ReviewSubmissionsResponse {
        student: summary_of(&profile, name),
        internal,
        r#final: fin,
    }))
}

/// Evaluate sub-items of an internal day (partial update)
#[utoipa::path(
    post,
    path = "/api/review/students/{username}/submissions/{day}/evaluate",
    params(
        ("username" = String, Path, description = "Student enrollment number"),
        ("day" = i32, Path, description = "Reporting day, 1..=6")
    ),
    request_body = EvaluateDayRequest,
    responses(
        (status = 200, description = "Marks recorded"),
        (status = 400, description = "Marks out of range", body = ErrorResponse),
        (status = 403, description = "Student outside the caller's scope", body = ErrorResponse),
        (status = 409, description = "Nothing awaiting review", body = ErrorResponse)
    ),
    tag = "review"
)]
pub async fn evaluate_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((username, day)): Path<(String, i32)>,
    Json(payload): Json<EvaluateDayRequest>,
) -> Result<StatusCode, ApiError> {
    let reviewer = reviewer_from(&user)?;

    lifecycle::evaluate_internal(
        &state.db,
        &reviewer,
        &username,
        day,
        InternalEvaluation {
            report: payload.report,
            linkedin: payload.linkedin,
            youtube: payload.youtube,
        },
    )
    .await?;

    info!("{} evaluated day {} of {}", reviewer.username, day, username);
    Ok(StatusCode::OK)
}

/// Reject one sub-item of an internal day
#[utoipa::path(
    post,
    path = "/api/review/students/{username}/submissions/{day}/reject",
    params(
        ("username" = String, Path, description = "Student enrollment number"),
        ("day" = i32, Path, description = "Reporting day, 1..=6")
    ),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Sub-item rejected"),
        (status = 400, description = "Missing reason", body = ErrorResponse),
        (status = 403, description = "Student outside the caller's scope", body = ErrorResponse)
    ),
    tag = "review"
)]
pub async fn reject_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((username, day)): Path<(String, i32)>,
    Json(payload): Json<RejectRequest>,
) -> Result<StatusCode, ApiError> {
    let reviewer = reviewer_from(&user)?;
    let kind = parse_internal_kind(&payload.kind)?;

    lifecycle::reject_internal(&state.db, &reviewer, &username, day, kind, &payload.reason)
        .await?;

    info!(
        "{} rejected {} of day {} for {}",
        reviewer.username, payload.kind, day, username
    );
    Ok(StatusCode::OK)
}

/// Evaluate sub-items of the final bundle (partial update)
#[utoipa::path(
    post,
    path = "/api/review/students/{username}/final/evaluate",
    params(
        ("username" = String, Path, description = "Student enrollment number")
    ),
    request_body = EvaluateFinalRequest,
    responses(
        (status = 200, description = "Marks recorded"),
        (status = 400, description = "Marks out of range", body = ErrorResponse),
        (status = 403, description = "Student outside the caller's scope", body = ErrorResponse)
    ),
    tag = "review"
)]
pub async fn evaluate_final_bundle(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(username): Path<String>,
    Json(payload): Json<EvaluateFinalRequest>,
) -> Result<StatusCode, ApiError> {
    let reviewer = reviewer_from(&user)?;

    lifecycle::evaluate_final(
        &state.db,
        &reviewer,
        &username,
        FinalEvaluation {
            report: payload.report,
            youtube: payload.youtube,
            linkedin: payload.linkedin,
        },
    )
    .await?;

    info!("{} evaluated the final bundle of {}", reviewer.username, username);
    Ok(StatusCode::OK)
}

/// Reject one sub-item of the final bundle
#[utoipa::path(
    post,
    path = "/api/review/students/{username}/final/reject",
    params(
        ("username" = String, Path, description = "Student enrollment number")
    ),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Sub-item rejected"),
        (status = 403, description = "Student outside the caller's scope", body = ErrorResponse)
    ),
    tag = "review"
)]
pub async fn reject_final_bundle(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(username): Path<String>,
    Json(payload): Json<RejectRequest>,
) -> Result<StatusCode, ApiError> {
    let reviewer = reviewer_from(&user)?;
    let kind = parse_final_kind(&payload.kind)?;

    lifecycle::reject_final(&state.db, &reviewer, &username, kind, &payload.reason).await?;

    info!(
        "{} rejected {} of the final bundle for {}",
        reviewer.username, payload.kind, username
    );
    Ok(StatusCode::OK)
}
