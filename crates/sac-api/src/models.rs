use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use sac_db::entities::final_submission::{self, FinalKind};
use sac_db::entities::internal_submission::{self, SubmissionKind, SubmissionStatus};

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

// ============================================================================
// Authentication
// ============================================================================

/// Account information returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    /// Enrollment number or staff username
    pub username: String,
    /// Account role (student, lead, faculty, admin)
    pub role: String,
    /// Display name
    pub name: String,
    /// Institution email
    pub email: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserInfo,
    /// Session token
    pub token: String,
    /// Token expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Set while the bootstrap credential is still in effect; the client must
    /// route to the password change screen before anything else
    pub must_change_password: bool,
}

/// Credential rotation request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Registration request: the complete wizard draft, validated server-side
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// 10-digit enrollment number
    pub username: String,
    pub name: String,
    /// 10-digit phone number; the last four digits seed the bootstrap credential
    pub phone: String,
    pub gender: String,
    pub year: i32,
    pub branch: String,
    pub cluster: String,
    pub country: String,
    pub state: String,
    pub district: String,
    pub pincode: String,
    /// "Hostel" or "Day Scholar"
    pub residence_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostel_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus_route: Option<String>,
    /// Program track code (TEC, LCH, ESO, IIE, HWB)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub club_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rural_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erp_receipt: Option<String>,
}

/// Registration response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub user: UserInfo,
    /// The account starts on a bootstrap credential and must rotate it at
    /// first login
    pub must_change_password: bool,
}

/// Proxy session token response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProxyTokenResponse {
    /// Token scoped to the lead's own student identity
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// Whether this token is a proxy token
    pub proxy: bool,
}

// ============================================================================
// Submissions
// ============================================================================

/// One submission sub-item
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmissionView {
    /// Sub-item kind (report, linkedin_link, youtube_link, final_report, ...)
    pub kind: String,
    pub url: String,
    /// Lifecycle status (not_submitted, submitted, new, approved, rejected)
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marks: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluated_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluated_at: Option<DateTime<Utc>>,
}

/// One internal day as shown on dashboards
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DaySummaryView {
    /// Day number, 1..=6
    pub day: i32,
    /// Representative status: the report sub-item's status
    pub status: String,
    pub items: Vec<SubmissionView>,
}

/// Internal submission overview with running total
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InternalOverviewResponse {
    pub days: Vec<DaySummaryView>,
    /// Sum of approved marks (out of 60)
    pub total_marks: f64,
}

/// Final submission overview with running total
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FinalOverviewResponse {
    pub items: Vec<SubmissionView>,
    /// Representative status: the final report sub-item's status
    pub status: String,
    /// Sum of approved marks (out of 40)
    pub total_marks: f64,
}

/// Submit (or resubmit) the three co-dependent URLs of an internal day
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitDayRequest {
    pub report_url: String,
    pub linkedin_url: String,
    pub youtube_url: String,
}

/// Submit (or resubmit) the final bundle
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitFinalRequest {
    pub report_url: String,
    pub youtube_url: String,
    pub linkedin_url: String,
}

/// Partial evaluation of an internal day; absent fields are untouched
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvaluateDayRequest {
    /// Report marks out of 7
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<f64>,
    /// LinkedIn post marks out of 2.75
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<f64>,
    /// YouTube video marks out of 2.75
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<f64>,
}

/// Partial evaluation of the final bundle; absent fields are untouched
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvaluateFinalRequest {
    /// Final report marks out of 25
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<f64>,
    /// Presentation video marks out of 7.5
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<f64>,
    /// Social post marks out of 7.5
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<f64>,
}

/// Reject one sub-item with a reason
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RejectRequest {
    /// Sub-item kind to reject
    pub kind: String,
    /// Non-empty rejection reason, surfaced to the student
    pub reason: String,
}

// ============================================================================
// Students and dashboards
// ============================================================================

/// Student profile as returned to its owner and reviewers
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentProfileView {
    pub username: String,
    pub name: String,
    pub email: String,
    pub gender: String,
    pub year: i32,
    pub branch: String,
    pub cluster: String,
    pub country: String,
    pub state: String,
    pub district: String,
    pub pincode: String,
    pub residence_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostel_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus_route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub club_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rural_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erp_receipt: Option<String>,
    pub phone: String,
}

/// Row in a reviewer's student list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentSummary {
    pub username: String,
    pub name: String,
    pub year: i32,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub club_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// Query parameters for the reviewer student list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentListQuery {
    /// Filter by club id (must lie within the caller's scope)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub club: Option<String>,
    /// Filter by program track code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Filter by year of study
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Pagination offset (default: 0)
    #[serde(default)]
    pub offset: Option<usize>,
    /// Pagination limit (default: 100, max: 1000)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// List of students with pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentList {
    pub students: Vec<StudentSummary>,
    /// Total count (without pagination)
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

/// A student's submissions as seen by a reviewer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewSubmissionsResponse {
    pub student: StudentSummary,
    pub internal: InternalOverviewResponse,
    pub r#final: FinalOverviewResponse,
}

/// Admin edit of a student profile; absent fields are untouched
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateStudentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
    /// "Hostel" or "Day Scholar"; residence invariants are revalidated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residence_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostel_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus_route: Option<String>,
    /// Club reassignment; capacity is claimed on the new club and released
    /// on the old one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub club_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rural_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erp_receipt: Option<String>,
}

/// Promote a student to lead of a club
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromoteRequest {
    pub club_id: String,
}

// ============================================================================
// Clubs and projects
// ============================================================================

/// Club information
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClubView {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Program track code
    pub domain: String,
    pub member_limit: i32,
    pub member_count: i32,
    /// Ordered category labels
    pub categories: Vec<String>,
}

/// List of clubs
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClubList {
    pub clubs: Vec<ClubView>,
    pub total: usize,
}

/// Create a club
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateClubRequest {
    /// Short code, at most 4 characters
    pub id: String,
    pub name: String,
    pub description: String,
    /// Program track code (TEC, LCH, ESO, IIE, HWB)
    pub domain: String,
    /// Maximum members (default 50)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_limit: Option<i32>,
    /// Ordered category labels
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Project information
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectView {
    pub id: String,
    pub club_id: String,
    pub domain: String,
    pub category: String,
    pub name: String,
    pub description: String,
    pub rural: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rural_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    pub member_count: i32,
}

/// List of projects
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectList {
    pub projects: Vec<ProjectView>,
    pub total: usize,
}

/// Create a project under a club
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    pub id: String,
    pub club_id: String,
    /// Must be one of the owning club's category labels
    pub category: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub rural: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rural_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

// ============================================================================
// Email queue (admin)
// ============================================================================

/// Queued email as shown to admins
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmailQueueView {
    pub id: String,
    pub email: String,
    pub username: String,
    pub subject: String,
    /// Delivery status (pending, sent, failed)
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

/// List of queued emails with pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmailQueueList {
    pub emails: Vec<EmailQueueView>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

/// Query parameters for the email queue list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmailQueueQuery {
    /// Filter by delivery status (pending, sent, failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

// ============================================================================
// Entity conversions
// ============================================================================

pub fn status_str(status: SubmissionStatus) -> &'static str {
    match status {
        SubmissionStatus::NotSubmitted => "not_submitted",
        SubmissionStatus::Submitted => "submitted",
        SubmissionStatus::New => "new",
        SubmissionStatus::Approved => "approved",
        SubmissionStatus::Rejected => "rejected",
    }
}

pub fn kind_str(kind: SubmissionKind) -> &'static str {
    match kind {
        SubmissionKind::Report => "report",
        SubmissionKind::LinkedinLink => "linkedin_link",
        SubmissionKind::YoutubeLink => "youtube_link",
    }
}

pub fn final_kind_str(kind: FinalKind) -> &'static str {
    match kind {
        FinalKind::FinalReport => "final_report",
        FinalKind::FinalYoutube => "final_youtube",
        FinalKind::FinalLinkedin => "final_linkedin",
    }
}

impl From<internal_submission::Model> for SubmissionView {
    fn from(m: internal_submission::Model) -> Self {
        SubmissionView {
            kind: kind_str(m.kind).to_string(),
            url: m.url,
            status: status_str(m.status).to_string(),
            marks: m.marks,
            rejection_reason: m.rejection_reason,
            evaluated_by: m.evaluated_by,
            evaluated_at: m.evaluated_at,
        }
    }
}

impl From<final_submission::Model> for SubmissionView {
    fn from(m: final_submission::Model) -> Self {
        SubmissionView {
            kind: final_kind_str(m.kind).to_string(),
            url: m.url,
            status: status_str(m.status).to_string(),
            marks: m.marks,
            rejection_reason: m.rejection_reason,
            evaluated_by: m.evaluated_by,
            evaluated_at: m.evaluated_at,
        }
    }
}

impl From<sac_db::entities::user::Model> for UserInfo {
    fn from(m: sac_db::entities::user::Model) -> Self {
        UserInfo {
            username: m.username,
            role: m.role.as_str().to_string(),
            name: m.name,
            email: m.email,
        }
    }
}

impl From<sac_db::entities::email_queue::Model> for EmailQueueView {
    fn from(m: sac_db::entities::email_queue::Model) -> Self {
        use sac_db::entities::email_queue::EmailStatus;
        EmailQueueView {
            id: m.id.to_string(),
            email: m.email,
            username: m.username,
            subject: m.subject,
            status: match m.status {
                EmailStatus::Pending => "pending",
                EmailStatus::Sent => "sent",
                EmailStatus::Failed => "failed",
            }
            .to_string(),
            error_message: m.error_message,
            attempts: m.attempts,
            created_at: m.created_at,
            sent_at: m.sent_at,
        }
    }
}

impl From<sac_db::entities::project::Model> for ProjectView {
    fn from(m: sac_db::entities::project::Model) -> Self {
        ProjectView {
            id: m.id,
            club_id: m.club_id,
            domain: m.domain.as_str().to_string(),
            category: m.category,
            name: m.name,
            description: m.description,
            rural: m.rural,
            rural_category: m.rural_category,
            image_path: m.image_path,
            member_count: m.member_count,
        }
    }
}
