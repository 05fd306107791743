//! Internal submission items
//!
//! One row per (username, day_number, kind). The three kinds of a day form
//! one composite unit at submission time but are evaluated independently,
//! so each row carries its own status and marks.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of an internal submission sub-item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    #[sea_orm(string_value = "report")]
    Report,

    #[sea_orm(string_value = "linkedin_link")]
    LinkedinLink,

    #[sea_orm(string_value = "youtube_link")]
    YoutubeLink,
}

impl SubmissionKind {
    pub const ALL: [SubmissionKind; 3] = [
        SubmissionKind::Report,
        SubmissionKind::LinkedinLink,
        SubmissionKind::YoutubeLink,
    ];
}

/// Lifecycle status of a submission item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Initial state; absent rows read as this
    #[sea_orm(string_value = "not_submitted")]
    NotSubmitted,

    /// Submitted, awaiting first review
    #[sea_orm(string_value = "submitted")]
    Submitted,

    /// Resubmitted after a rejection, awaiting re-review
    #[sea_orm(string_value = "new")]
    New,

    /// Terminal; no further edits
    #[sea_orm(string_value = "approved")]
    Approved,

    /// Recoverable via resubmission
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl SubmissionStatus {
    /// Whether a reviewer may act on an item in this state
    pub fn awaiting_review(&self) -> bool {
        matches!(self, SubmissionStatus::Submitted | SubmissionStatus::New)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "internal_submissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,

    /// Reporting day, 1..=6
    #[sea_orm(primary_key, auto_increment = false)]
    pub day_number: i32,

    #[sea_orm(primary_key, auto_increment = false)]
    pub kind: SubmissionKind,

    pub url: String,

    pub status: SubmissionStatus,

    pub marks: Option<f64>,

    /// Set only while status is rejected
    pub rejection_reason: Option<String>,

    pub evaluated_by: Option<String>,

    pub evaluated_at: Option<ChronoDateTimeUtc>,

    /// Optimistic concurrency counter; bumped on every reviewer write
    pub version: i32,

    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::Username",
        to = "super::user::Column::Username",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
