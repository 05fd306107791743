//! Final submission items
//!
//! Same lifecycle as internal submissions, fixed "final" slot instead of a
//! day number. One row per (username, kind).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub use super::internal_submission::SubmissionStatus;

/// Kind of a final submission sub-item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum FinalKind {
    #[sea_orm(string_value = "final_report")]
    FinalReport,

    #[sea_orm(string_value = "final_youtube")]
    FinalYoutube,

    #[sea_orm(string_value = "final_linkedin")]
    FinalLinkedin,
}

impl FinalKind {
    pub const ALL: [FinalKind; 3] = [
        FinalKind::FinalReport,
        FinalKind::FinalYoutube,
        FinalKind::FinalLinkedin,
    ];
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "final_submissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,

    #[sea_orm(primary_key, auto_increment = false)]
    pub kind: FinalKind,

    pub url: String,

    pub status: SubmissionStatus,

    pub marks: Option<f64>,

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
