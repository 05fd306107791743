use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use sac_core::membership::{
    claim_club_slot, claim_project_slot, promote_to_lead, release_club_slot,
    release_project_slot,
};
use sac_db::entities::email_queue::{self, EmailStatus};
use sac_db::entities::student::ResidenceType;
use sac_db::entities::{project, student, user};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

use super::require_admin;
use super::student::profile_view;

fn parse_email_status(value: &str) -> Result<EmailStatus, ApiError> {
    match value {
        "pending" => Ok(EmailStatus::Pending),
        "sent" => Ok(EmailStatus::Sent),
        "failed" => Ok(EmailStatus::Failed),
        _ => Err(sac_core::Error::validation(
            "status",
            format!("unknown email status {}", value),
        )
        .into()),
    }
}

/// Promote a student to lead of a club (admin)
#[utoipa::path(
    post,
    path = "/api/admin/promote/{username}",
    params(
        ("username" = String, Path, description = "Student enrollment number")
    ),
    request_body = PromoteRequest,
    responses(
        (status = 200, description = "Student promoted"),
        (status = 404, description = "Account or club not found", body = ErrorResponse),
        (status = 409, description = "Account is not a student", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn promote_student(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(username): Path<String>,
    Json(payload): Json<PromoteRequest>,
) -> Result<StatusCode, ApiError> {
    require_admin(&user)?;

    promote_to_lead(&state.db, &username, &payload.club_id).await?;

    info!("{} promoted to lead of {}", username, payload.club_id);
    Ok(StatusCode::OK)
}

/// Edit a student profile (admin). Residence and membership invariants are
/// revalidated on the resulting row.
#[utoipa::path(
    put,
    path = "/api/admin/students/{username}",
    params(
        ("username" = String, Path, description = "Student enrollment number")
    ),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Updated profile", body = StudentProfileView),
        (status = 400, description = "Residence invariant violated", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 409, description = "Target club or project is full", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn update_student(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(username): Path<String>,
    Json(payload): Json<UpdateStudentRequest>,
) -> Result<Json<StudentProfileView>, ApiError> {
    require_admin(&user)?;

    let updated = state
        .db
        .transaction::<_, student::Model, sac_core::Error>(|txn| {
            let username = username.clone();
            let payload = payload.clone();
            Box::pin(async move {
                let Some(profile) = student::Entity::find_by_id(username.clone()).one(txn).await?
                else {
                    return Err(sac_core::Error::NotFound(format!("student {}", username)));
                };

                let mut next = profile.clone();

                if let Some(gender) = payload.gender {
                    next.gender = gender;
                }
                if let Some(year) = payload.year {
                    if !(1..=4).contains(&year) {
                        return Err(sac_core::Error::validation(
                            "year",
                            "year must lie within 1..=4",
                        ));
                    }
                    next.year = year;
                }
                if let Some(branch) = payload.branch {
                    next.branch = branch;
                }
                if let Some(cluster) = payload.cluster {
                    next.cluster = cluster;
                }
                if let Some(pincode) = payload.pincode {
                    if pincode.len() != 6 || !pincode.chars().all(|c| c.is_ascii_digit()) {
                        return Err(sac_core::Error::validation(
                            "pincode",
                            "pincode must be 6 digits",
                        ));
                    }
                    next.pincode = pincode;
                }
                if let Some(ref residence) = payload.residence_type {
                    next.residence_type = match residence.as_str() {
                        "Hostel" => ResidenceType::Hostel,
                        "Day Scholar" => ResidenceType::DayScholar,
                        _ => {
                            return Err(sac_core::Error::validation(
                                "residence_type",
                                "must be \"Hostel\" or \"Day Scholar\"",
                            ));
                        }
                    };
                }
                if payload.hostel_name.is_some() {
                    next.hostel_name = payload.hostel_name;
                }
                if payload.bus_route.is_some() {
                    next.bus_route = payload.bus_route;
                }
                if payload.rural_category.is_some() {
                    next.rural_category = payload.rural_category;
                }
                if payload.erp_receipt.is_some() {
                    next.erp_receipt = payload.erp_receipt;
                }

                // Residence invariant on the resulting row
                match next.residence_type {
                    ResidenceType::Hostel => {
                        if next
                            .hostel_name
                            .as_deref()
                            .map(str::trim)
                            .unwrap_or("")
                            .is_empty()
                        {
                            return Err(sac_core::Error::validation(
                                "hostel_name",
                                "hostel residents must name their hostel",
                            ));
                        }
                        next.bus_route = None;
                    }
                    ResidenceType::DayScholar => {
                        next.hostel_name = None;
                    }
                }

                // Club reassignment claims the new slot before releasing the
                // old one; a full target club aborts the whole edit.
                if let Some(new_club) = payload.club_id.clone() {
                    if Some(&new_club) != profile.club_id.as_ref() {
                        let joined = claim_club_slot(txn, &new_club).await?;
                        if let Some(ref old_club) = profile.club_id {
                            release_club_slot(txn, old_club).await?;
                        }
                        if let Some(ref old_project) = profile.project_id {
                            release_project_slot(txn, old_project).await?;
                            next.project_id = None;
                        }
                        next.domain = Some(joined.domain);
                        next.club_id = Some(new_club);
                    }
                }

                if let Some(new_project) = payload.project_id.clone() {
                    if Some(&new_project) != next.project_id.as_ref() {
                        let Some(target_club) = next.club_id.clone() else {
                            return Err(sac_core::Error::validation(
                                "project_id",
                                "a project requires a club membership",
                            ));
                        };

                        let target = project::Entity::find_by_id(new_project.clone())
                            .one(txn)
                            .await?
                            .ok_or_else(|| {
                                sac_core::Error::NotFound(format!("project {}", new_project))
                            })?;
                        if target.club_id != target_club {
                            return Err(sac_core::Error::validation(
                                "project_id",
                                format!(
                                    "project {} does not belong to club {}",
                                    new_project, target_club
                                ),
                            ));
                        }

                        claim_project_slot(txn, &new_project).await?;
                        if let Some(ref old_project) = next.project_id {
                            release_project_slot(txn, old_project).await?;
                        }
                        next.project_id = Some(new_project);
                    }
                }

                let mut active: student::ActiveModel = profile.into();
                active.gender = Set(next.gender.clone());
                active.year = Set(next.year);
                active.branch = Set(next.branch.clone());
                active.cluster = Set(next.cluster.clone());
                active.pincode = Set(next.pincode.clone());
                active.residence_type = Set(next.residence_type.clone());
                active.hostel_name = Set(next.hostel_name.clone());
                active.bus_route = Set(next.bus_route.clone());
                active.domain = Set(next.domain);
                active.club_id = Set(next.club_id.clone());
                active.project_id = Set(next.project_id.clone());
                active.rural_category = Set(next.rural_category.clone());
                active.erp_receipt = Set(next.erp_receipt.clone());
                active.updated_at = Set(Utc::now());

                Ok(active.update(txn).await?)
            })
        })
        .await
        .map_err(sac_core::Error::from)?;

    let account = user::Entity::find_by_id(username.clone())
        .one(&state.db)
        .await?
        .ok_or_else(|| sac_core::Error::NotFound(format!("account {}", username)))?;

    info!("profile of {} edited by admin", username);
    Ok(Json(profile_view(account, updated)))
}

/// List the email queue (admin)
#[utoipa::path(
    get,
    path = "/api/admin/emails",
    params(
        ("status" = Option<String>, Query, description = "Filter by delivery status (pending, sent, failed)"),
        ("offset" = Option<usize>, Query, description = "Pagination offset (default: 0)"),
        ("limit" = Option<usize>, Query, description = "Pagination limit (default: 100, max: 1000)")
    ),
    responses(
        (status = 200, description = "Queued emails", body = EmailQueueList)
    ),
    tag = "admin"
)]
pub async fn list_emails(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<EmailQueueQuery>,
) -> Result<Json<EmailQueueList>, ApiError> {
    require_admin(&user)?;

    let mut condition = Condition::all();
    if let Some(ref status) = query.status {
        condition = condition.add(email_queue::Column::Status.eq(parse_email_status(status)?));
    }

    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(100).clamp(1, 1000); // Cap at 1000

    let paginator = email_queue::Entity::find()
        .filter(condition)
        .order_by_desc(email_queue::Column::CreatedAt)
        .paginate(&state.db, limit as u64);

    let total = paginator.num_items().await? as usize;

    let page_num = offset / limit;
    let emails: Vec<EmailQueueView> = paginator
        .fetch_page(page_num as u64)
        .await?
        .into_iter()
        .map(EmailQueueView::from)
        .collect();

    Ok(Json(EmailQueueList {
        emails,
        total,
        offset,
        limit,
    }))
}

/// Resubmit a failed (or still pending) email for delivery (admin)
#[utoipa::path(
    post,
    path = "/api/admin/emails/{id}/retry",
    params(
        ("id" = String, Path, description = "Email queue entry id")
    ),
    responses(
        (status = 200, description = "Entry queued for redelivery"),
        (status = 404, description = "Entry not found", body = ErrorResponse),
        (status = 409, description = "Entry was already delivered", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn retry_email(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_admin(&user)?;

    let id = Uuid::parse_str(&id)
        .map_err(|_| sac_core::Error::validation("id", "malformed email id"))?;

    let Some(entry) = email_queue::Entity::find_by_id(id).one(&state.db).await? else {
        return Err(sac_core::Error::NotFound(format!("email {}", id)).into());
    };
    if entry.status == EmailStatus::Sent {
        return Err(
            sac_core::Error::InvalidTransition("email was already delivered".to_string()).into(),
        );
    }

    let mut active: email_queue::ActiveModel = entry.into();
    active.status = Set(EmailStatus::Pending);
    active.error_message = Set(None);
    active.update(&state.db).await?;

    state.mailer.nudge(id);

    info!("email {} queued for redelivery", id);
    Ok(StatusCode::OK)
}
