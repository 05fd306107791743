//! Submission & evaluation lifecycle
//!
//! Per-item state machine:
//! `NotSubmitted -> Submitted -> (Approved | Rejected)`;
//! `Rejected -> resubmit -> New -> (Approved | Rejected)`.
//! `Approved` is terminal for an item.
//!
//! The three sub-items of an internal day (report + the two social links)
//! submit together as one composite unit but are evaluated independently.
//! The day status students see is the report row's status, derived here and
//! never stored.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use sac_db::entities::email_queue::{self, EmailStatus};
use sac_db::entities::final_submission::{self, FinalKind};
use sac_db::entities::internal_submission::{self, SubmissionKind, SubmissionStatus};
use sac_db::entities::{student, user};

use crate::marks::{self, INTERNAL_DAYS};
use crate::{Error, Result, Scope};

/// Gate applied before a day accepts a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRule {
    /// The previous day must be submitted or approved first
    Sequential,

    /// Always open (HWB/ESO days)
    Open,
}

/// Days 1..=4 progress sequentially; days 5..=6 are always open.
pub fn gate_for_day(day: i32) -> Result<GateRule> {
    match day {
        1..=4 => Ok(GateRule::Sequential),
        5..=6 => Ok(GateRule::Open),
        _ => Err(Error::validation(
            "day",
            format!("day must lie within 1..={}", INTERNAL_DAYS),
        )),
    }
}

/// Authenticated reviewer acting on submissions
#[derive(Debug, Clone)]
pub struct Reviewer {
    pub username: String,
    pub scope: Scope,
}

/// The three co-dependent URLs of an internal day
#[derive(Debug, Clone)]
pub struct DayUrls {
    pub report: String,
    pub linkedin: String,
    pub youtube: String,
}

impl DayUrls {
    fn entries(&self) -> [(SubmissionKind, &str); 3] {
        [
            (SubmissionKind::Report, self.report.as_str()),
            (SubmissionKind::LinkedinLink, self.linkedin.as_str()),
            (SubmissionKind::YoutubeLink, self.youtube.as_str()),
        ]
    }
}

/// The three URLs of the final bundle
#[derive(Debug, Clone)]
pub struct FinalUrls {
    pub report: String,
    pub youtube: String,
    pub linkedin: String,
}

impl FinalUrls {
    fn entries(&self) -> [(FinalKind, &str); 3] {
        [
            (FinalKind::FinalReport, self.report.as_str()),
            (FinalKind::FinalYoutube, self.youtube.as_str()),
            (FinalKind::FinalLinkedin, self.linkedin.as_str()),
        ]
    }
}

/// Partial evaluation of an internal day; absent fields are untouched
#[derive(Debug, Clone, Default)]
pub struct InternalEvaluation {
    pub report: Option<f64>,
    pub linkedin: Option<f64>,
    pub youtube: Option<f64>,
}

impl InternalEvaluation {
    fn entries(&self) -> Vec<(SubmissionKind, f64)> {
        let mut out = Vec::new();
        if let Some(v) = self.report {
            out.push((SubmissionKind::Report, v));
        }
        if let Some(v) = self.linkedin {
            out.push((SubmissionKind::LinkedinLink, v));
        }
        if let Some(v) = self.youtube {
            out.push((SubmissionKind::YoutubeLink, v));
        }
        out
    }
}

/// Partial evaluation of the final bundle; absent fields are untouched
#[derive(Debug, Clone, Default)]
pub struct FinalEvaluation {
    pub report: Option<f64>,
    pub youtube: Option<f64>,
    pub linkedin: Option<f64>,
}

impl FinalEvaluation {
    fn entries(&self) -> Vec<(FinalKind, f64)> {
        let mut out = Vec::new();
        if let Some(v) = self.report {
            out.push((FinalKind::FinalReport, v));
        }
        if let Some(v) = self.youtube {
            out.push((FinalKind::FinalYoutube, v));
        }
        if let Some(v) = self.linkedin {
            out.push((FinalKind::FinalLinkedin, v));
        }
        out
    }
}

/// One internal day as shown to the student
#[derive(Debug, Clone)]
pub struct DaySummary {
    pub day: i32,
    /// Representative status: the report row's status
    pub status: SubmissionStatus,
    pub items: Vec<internal_submission::Model>,
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(field, "a link is required"));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::validation(
            field,
            "links must start with http:// or https://",
        ));
    }
    Ok(())
}

/// Load the student row, enforcing the reviewer's club scope first so that a
/// scoped reviewer learns nothing about students outside it.
async fn authorize_target<C: ConnectionTrait>(
    conn: &C,
    scope: &Scope,
    username: &str,
) -> Result<student::Model> {
    let target = student::Entity::find_by_id(username.to_string())
        .one(conn)
        .await?;

    let club = target.as_ref().and_then(|s| s.club_id.as_deref());
    if !scope.permits(club) {
        return Err(Error::Authorization(
            "not authorized to review this student".to_string(),
        ));
    }

    target.ok_or_else(|| Error::NotFound(format!("student {}", username)))
}

async fn internal_row<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    day: i32,
    kind: SubmissionKind,
) -> Result<Option<internal_submission::Model>> {
    Ok(
        internal_submission::Entity::find_by_id((username.to_string(), day, kind))
            .one(conn)
            .await?,
    )
}

async fn final_row<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    kind: FinalKind,
) -> Result<Option<final_submission::Model>> {
    Ok(
        final_submission::Entity::find_by_id((username.to_string(), kind))
            .one(conn)
            .await?,
    )
}

async fn queue_notification<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    subject: String,
    body: String,
) -> Result<()> {
    // Missing accounts are a data error elsewhere; the notification is best-effort
    let Some(account) = user::Entity::find_by_id(username.to_string()).one(conn).await? else {
        return Ok(());
    };

    email_queue::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(account.email),
        username: Set(username.to_string()),
        subject: Set(subject),
        body: Set(body),
        status: Set(EmailStatus::Pending),
        error_message: Set(None),
        attempts: Set(0),
        created_at: Set(Utc::now()),
        sent_at: Set(None),
    }
    .insert(conn)
    .await?;

    debug!("queued notification for {}", username);
    Ok(())
}

// ============================================================
// Internal submissions
// ============================================================

/// Submit all three sub-items of an internal day.
///
/// Allowed only while the day is `NotSubmitted` (absent rows read as that)
/// and, for sequentially gated days, only once the previous day's report is
/// submitted or approved.
pub async fn submit_internal<C>(conn: &C, username: &str, day: i32, urls: DayUrls) -> Result<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    let gate = gate_for_day(day)?;
    validate_url("report_url", &urls.report)?;
    validate_url("linkedin_url", &urls.linkedin)?;
    validate_url("youtube_url", &urls.youtube)?;

    let username = username.to_string();
    conn.transaction::<_, (), Error>(|txn| {
        Box::pin(async move {
            if gate == GateRule::Sequential && day > 1 {
                let prev = internal_row(txn, &username, day - 1, SubmissionKind::Report).await?;
                let prev_status = prev
                    .map(|r| r.status)
                    .unwrap_or(SubmissionStatus::NotSubmitted);
                if !matches!(
                    prev_status,
                    SubmissionStatus::Submitted | SubmissionStatus::Approved
                ) {
                    return Err(Error::InvalidTransition(format!(
                        "day {} is locked until day {} is submitted",
                        day,
                        day - 1
                    )));
                }
            }

            let existing = internal_row(txn, &username, day, SubmissionKind::Report).await?;
            match existing.map(|r| r.status) {
                None | Some(SubmissionStatus::NotSubmitted) => {}
                Some(_) => {
                    return Err(Error::InvalidTransition(format!(
                        "day {} has already been submitted",
                        day
                    )));
                }
            }

            let now = Utc::now();
            for (kind, url) in urls.entries() {
                match internal_row(txn, &username, day, kind).await? {
                    Some(row) => {
                        let mut active: internal_submission::ActiveModel = row.into();
                        active.url = Set(url.trim().to_string());
                        active.status = Set(SubmissionStatus::Submitted);
                        active.updated_at = Set(now);
                        active.update(txn).await?;
                    }
                    None => {
                        internal_submission::ActiveModel {
                            username: Set(username.clone()),
                            day_number: Set(day),
                            kind: Set(kind),
                            url: Set(url.trim().to_string()),
                            status: Set(SubmissionStatus::Submitted),
                            marks: Set(None),
                            rejection_reason: Set(None),
                            evaluated_by: Set(None),
                            evaluated_at: Set(None),
                            version: Set(0),
                            created_at: Set(now),
                            updated_at: Set(now),
                        }
                        .insert(txn)
                        .await?;
                    }
                }
            }

            Ok(())
        })
    })
    .await?;

    Ok(())
}

/// Resubmit an internal day after a rejection.
///
/// Moves every non-approved sub-item to `New` with the fresh URLs. Approved
/// sub-items are terminal and keep their url and marks; the previous
/// evaluator stamps are retained as the prior round's history.
pub async fn resubmit_internal<C>(conn: &C, username: &str, day: i32, urls: DayUrls) -> Result<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    gate_for_day(day)?;
    validate_url("report_url", &urls.report)?;
    validate_url("linkedin_url", &urls.linkedin)?;
    validate_url("youtube_url", &urls.youtube)?;

    let username = username.to_string();
    conn.transaction::<_, (), Error>(|txn| {
        Box::pin(async move {
            let report = internal_row(txn, &username, day, SubmissionKind::Report).await?;
            match report.map(|r| r.status) {
                Some(SubmissionStatus::Rejected) => {}
                _ => {
                    return Err(Error::InvalidTransition(format!(
                        "day {} is not in a rejected state",
                        day
                    )));
                }
            }

            let now = Utc::now();
            for (kind, url) in urls.entries() {
                let Some(row) = internal_row(txn, &username, day, kind).await? else {
                    continue;
                };
                if row.status == SubmissionStatus::Approved {
                    continue;
                }

                let mut active: internal_submission::ActiveModel = row.into();
                active.url = Set(url.trim().to_string());
                active.status = Set(SubmissionStatus::New);
                active.rejection_reason = Set(None);
                active.updated_at = Set(now);
                active.update(txn).await?;
            }

            Ok(())
        })
    })
    .await?;

    Ok(())
}

/// Evaluate sub-items of an internal day.
///
/// Partial update: only the fields present in `input` are touched, each
/// independently approved with its marks. Requires the target rows to be
/// awaiting review and the reviewer's scope to cover the student's club.
pub async fn evaluate_internal<C>(
    conn: &C,
    reviewer: &Reviewer,
    username: &str,
    day: i32,
    input: InternalEvaluation,
) -> Result<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    gate_for_day(day)?;

    let entries = input.entries();
    if entries.is_empty() {
        return Err(Error::validation("evaluation", "no fields to evaluate"));
    }
    for (kind, value) in &entries {
        marks::validate_internal_marks(*kind, *value)?;
    }

    let username = username.to_string();
    let reviewer = reviewer.clone();
    conn.transaction::<_, (), Error>(|txn| {
        Box::pin(async move {
            authorize_target(txn, &reviewer.scope, &username).await?;

            let now = Utc::now();
            for (kind, value) in entries {
                let Some(row) = internal_row(txn, &username, day, kind).await? else {
                    return Err(Error::InvalidTransition(format!(
                        "day {} has nothing awaiting review",
                        day
                    )));
                };
                if !row.status.awaiting_review() {
                    return Err(Error::InvalidTransition(
                        "submission is not awaiting review".to_string(),
                    ));
                }

                let update = internal_submission::ActiveModel {
                    status: Set(SubmissionStatus::Approved),
                    marks: Set(Some(value)),
                    rejection_reason: Set(None),
                    evaluated_by: Set(Some(reviewer.username.clone())),
                    evaluated_at: Set(Some(now)),
                    version: Set(row.version + 1),
                    updated_at: Set(now),
                    ..Default::default()
                };

                let result = internal_submission::Entity::update_many()
                    .set(update)
                    .filter(internal_submission::Column::Username.eq(username.as_str()))
                    .filter(internal_submission::Column::DayNumber.eq(day))
                    .filter(internal_submission::Column::Kind.eq(kind))
                    .filter(internal_submission::Column::Version.eq(row.version))
                    .exec(txn)
                    .await?;

                if result.rows_affected == 0 {
                    return Err(Error::Conflict(
                        "submission was modified by another reviewer".to_string(),
                    ));
                }
            }

            Ok(())
        })
    })
    .await?;

    Ok(())
}

/// Reject one sub-item of an internal day with a reason.
///
/// Clears the sub-item's marks, stores the reason, and queues a notification
/// to the student in the same transaction.
pub async fn reject_internal<C>(
    conn: &C,
    reviewer: &Reviewer,
    username: &str,
    day: i32,
    kind: SubmissionKind,
    reason: &str,
) -> Result<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    gate_for_day(day)?;

    let reason = reason.trim().to_string();
    if reason.is_empty() {
        return Err(Error::validation("reason", "a rejection reason is required"));
    }

    let username = username.to_string();
    let reviewer = reviewer.clone();
    conn.transaction::<_, (), Error>(|txn| {
        Box::pin(async move {
            authorize_target(txn, &reviewer.scope, &username).await?;

            let Some(row) = internal_row(txn, &username, day, kind).await? else {
                return Err(Error::InvalidTransition(format!(
                    "day {} has nothing awaiting review",
                    day
                )));
            };
            if !row.status.awaiting_review() {
                return Err(Error::InvalidTransition(
                    "submission is not awaiting review".to_string(),
                ));
            }

            let now = Utc::now();
            let update = internal_submission::ActiveModel {
                status: Set(SubmissionStatus::Rejected),
                marks: Set(None),
                rejection_reason: Set(Some(reason.clone())),
                evaluated_by: Set(Some(reviewer.username.clone())),
                evaluated_at: Set(Some(now)),
                version: Set(row.version + 1),
                updated_at: Set(now),
                ..Default::default()
            };

            let result = internal_submission::Entity::update_many()
                .set(update)
                .filter(internal_submission::Column::Username.eq(username.as_str()))
                .filter(internal_submission::Column::DayNumber.eq(day))
                .filter(internal_submission::Column::Kind.eq(kind))
                .filter(internal_submission::Column::Version.eq(row.version))
                .exec(txn)
                .await?;

            if result.rows_affected == 0 {
                return Err(Error::Conflict(
                    "submission was modified by another reviewer".to_string(),
                ));
            }

            queue_notification(
                txn,
                &username,
                format!("Day {} submission needs changes", day),
                format!(
                    "Your day {} submission was returned by a reviewer: {}",
                    day, reason
                ),
            )
            .await?;

            Ok(())
        })
    })
    .await?;

    Ok(())
}

/// All internal days for a student, with the derived representative status
pub async fn internal_overview<C: ConnectionTrait>(
    conn: &C,
    username: &str,
) -> Result<Vec<DaySummary>> {
    let rows = internal_submission::Entity::find()
        .filter(internal_submission::Column::Username.eq(username))
        .all(conn)
        .await?;

    let summaries = (1..=INTERNAL_DAYS)
        .map(|day| {
            let items: Vec<internal_submission::Model> = rows
                .iter()
                .filter(|r| r.day_number == day)
                .cloned()
                .collect();
            let status = items
                .iter()
                .find(|r| r.kind == SubmissionKind::Report)
                .map(|r| r.status)
                .unwrap_or(SubmissionStatus::NotSubmitted);
            DaySummary { day, status, items }
        })
        .collect();

    Ok(summaries)
}

// ============================================================
// Final submissions
// ============================================================

/// Submit the final bundle (report + presentation video + social post).
pub async fn submit_final<C>(conn: &C, username: &str, urls: FinalUrls) -> Result<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    validate_url("report_url", &urls.report)?;
    validate_url("youtube_url", &urls.youtube)?;
    validate_url("linkedin_url", &urls.linkedin)?;

    let username = username.to_string();
    conn.transaction::<_, (), Error>(|txn| {
        Box::pin(async move {
            let existing = final_row(txn, &username, FinalKind::FinalReport).await?;
            match existing.map(|r| r.status) {
                None | Some(SubmissionStatus::NotSubmitted) => {}
                Some(_) => {
                    return Err(Error::InvalidTransition(
                        "the final submission has already been made".to_string(),
                    ));
                }
            }

            let now = Utc::now();
            for (kind, url) in urls.entries() {
                match final_row(txn, &username, kind).await? {
                    Some(row) => {
                        let mut active: final_submission::ActiveModel = row.into();
                        active.url = Set(url.trim().to_string());
                        active.status = Set(SubmissionStatus::Submitted);
                        active.updated_at = Set(now);
                        active.update(txn).await?;
                    }
                    None => {
                        final_submission::ActiveModel {
                            username: Set(username.clone()),
                            kind: Set(kind),
                            url: Set(url.trim().to_string()),
                            status: Set(SubmissionStatus::Submitted),
                            marks: Set(None),
                            rejection_reason: Set(None),
                            evaluated_by: Set(None),
                            evaluated_at: Set(None),
                            version: Set(0),
                            created_at: Set(now),
                            updated_at: Set(now),
                        }
                        .insert(txn)
                        .await?;
                    }
                }
            }

            Ok(())
        })
    })
    .await?;

    Ok(())
}

/// Resubmit the final bundle after a rejection.
pub async fn resubmit_final<C>(conn: &C, username: &str, urls: FinalUrls) -> Result<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    validate_url("report_url", &urls.report)?;
    validate_url("youtube_url", &urls.youtube)?;
    validate_url("linkedin_url", &urls.linkedin)?;

    let username = username.to_string();
    conn.transaction::<_, (), Error>(|txn| {
        Box::pin(async move {
            let report = final_row(txn, &username, FinalKind::FinalReport).await?;
            match report.map(|r| r.status) {
                Some(SubmissionStatus::Rejected) => {}
                _ => {
                    return Err(Error::InvalidTransition(
                        "the final submission is not in a rejected state".to_string(),
                    ));
                }
            }

            let now = Utc::now();
            for (kind, url) in urls.entries() {
                let Some(row) = final_row(txn, &username, kind).await? else {
                    continue;
                };
                if row.status == SubmissionStatus::Approved {
                    continue;
                }

                let mut active: final_submission::ActiveModel = row.into();
                active.url = Set(url.trim().to_string());
                active.status = Set(SubmissionStatus::New);
                active.rejection_reason = Set(None);
                active.updated_at = Set(now);
                active.update(txn).await?;
            }

            Ok(())
        })
    })
    .await?;

    Ok(())
}

/// Evaluate sub-items of the final bundle (partial update).
pub async fn evaluate_final<C>(
    conn: &C,
    reviewer: &Reviewer,
    username: &str,
    input: FinalEvaluation,
) -> Result<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    let entries = input.entries();
    if entries.is_empty() {
        return Err(Error::validation("evaluation", "no fields to evaluate"));
    }
    for (kind, value) in &entries {
        marks::validate_final_marks(*kind, *value)?;
    }

    let username = username.to_string();
    let reviewer = reviewer.clone();
    conn.transaction::<_, (), Error>(|txn| {
        Box::pin(async move {
            authorize_target(txn, &reviewer.scope, &username).await?;

            let now = Utc::now();
            for (kind, value) in entries {
                let Some(row) = final_row(txn, &username, kind).await? else {
                    return Err(Error::InvalidTransition(
                        "the final submission has nothing awaiting review".to_string(),
                    ));
                };
                if !row.status.awaiting_review() {
                    return Err(Error::InvalidTransition(
                        "submission is not awaiting review".to_string(),
                    ));
                }

                let update = final_submission::ActiveModel {
                    status: Set(SubmissionStatus::Approved),
                    marks: Set(Some(value)),
                    rejection_reason: Set(None),
                    evaluated_by: Set(Some(reviewer.username.clone())),
                    evaluated_at: Set(Some(now)),
                    version: Set(row.version + 1),
                    updated_at: Set(now),
                    ..Default::default()
                };

                let result = final_submission::Entity::update_many()
                    .set(update)
                    .filter(final_submission::Column::Username.eq(username.as_str()))
                    .filter(final_submission::Column::Kind.eq(kind))
                    .filter(final_submission::Column::Version.eq(row.version))
                    .exec(txn)
                    .await?;

                if result.rows_affected == 0 {
                    return Err(Error::Conflict(
                        "submission was modified by another reviewer".to_string(),
                    ));
                }
            }

            Ok(())
        })
    })
    .await?;

    Ok(())
}

/// Reject one sub-item of the final bundle with a reason.
pub async fn reject_final<C>(
    conn: &C,
    reviewer: &Reviewer,
    username: &str,
    kind: FinalKind,
    reason: &str,
) -> Result<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    let reason = reason.trim().to_string();
    if reason.is_empty() {
        return Err(Error::validation("reason", "a rejection reason is required"));
    }

    let username = username.to_string();
    let reviewer = reviewer.clone();
    conn.transaction::<_, (), Error>(|txn| {
        Box::pin(async move {
            authorize_target(txn, &reviewer.scope, &username).await?;

            let Some(row) = final_row(txn, &username, kind).await? else {
                return Err(Error::InvalidTransition(
                    "the final submission has nothing awaiting review".to_string(),
                ));
            };
            if !row.status.awaiting_review() {
                return Err(Error::InvalidTransition(
                    "submission is not awaiting review".to_string(),
                ));
            }

            let now = Utc::now();
            let update = final_submission::ActiveModel {
                status: Set(SubmissionStatus::Rejected),
                marks: Set(None),
                rejection_reason: Set(Some(reason.clone())),
                evaluated_by: Set(Some(reviewer.username.clone())),
                evaluated_at: Set(Some(now)),
                version: Set(row.version + 1),
                updated_at: Set(now),
                ..Default::default()
            };

            let result = final_submission::Entity::update_many()
                .set(update)
                .filter(final_submission::Column::Username.eq(username.as_str()))
                .filter(final_submission::Column::Kind.eq(kind))
                .filter(final_submission::Column::Version.eq(row.version))
                .exec(txn)
                .await?;

            if result.rows_affected == 0 {
                return Err(Error::Conflict(
                    "submission was modified by another reviewer".to_string(),
                ));
            }

            queue_notification(
                txn,
                &username,
                "Final submission needs changes".to_string(),
                format!("Your final submission was returned by a reviewer: {}", reason),
            )
            .await?;

            Ok(())
        })
    })
    .await?;

    Ok(())
}

/// All final sub-items for a student
pub async fn final_overview<C: ConnectionTrait>(
    conn: &C,
    username: &str,
) -> Result<Vec<final_submission::Model>> {
    Ok(final_submission::Entity::find()
        .filter(final_submission::Column::Username.eq(username))
        .all(conn)
        .await?)
}
