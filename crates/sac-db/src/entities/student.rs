//! Student profile entity
//!
//! One row per student account. Club/project membership is the `club_id` /
//! `project_id` pair on this row; there is no separate membership table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::club::ClubDomain;

/// Where the student resides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ResidenceType {
    /// Campus hostel; `hostel_name` must be set
    #[sea_orm(string_value = "Hostel")]
    Hostel,

    /// Commuting student; `bus_route` may be set
    #[sea_orm(string_value = "Day Scholar")]
    #[serde(rename = "Day Scholar")]
    DayScholar,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,

    pub gender: String,

    pub year: i32,

    pub branch: String,

    pub cluster: String,

    pub country: String,

    pub state: String,

    pub district: String,

    pub pincode: String,

    pub residence_type: ResidenceType,

    /// Set iff residence_type is Hostel
    pub hostel_name: Option<String>,

    /// Only meaningful for day scholars
    pub bus_route: Option<String>,

    /// Selected program track, if the student picked a club
    pub domain: Option<ClubDomain>,

    pub club_id: Option<String>,

    pub project_id: Option<String>,

    pub rural_category: Option<String>,

    /// ERP fee receipt reference
    pub erp_receipt: Option<String>,

    pub phone: String,

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

    #[sea_orm(
        belongs_to = "super::club::Entity",
        from = "Column::ClubId",
        to = "super::club::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Club,

    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Project,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::club::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Club.def()
    }
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
