//! Project entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::club::ClubDomain;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub club_id: String,

    pub domain: ClubDomain,

    /// Must be one of the owning club's category labels
    pub category: String,

    pub name: String,

    pub description: String,

    /// Rural-outreach flag
    pub rural: bool,

    pub rural_category: Option<String>,

    /// Static-store path of the project image, if any
    pub image_path: Option<String>,

    /// Current member count. TEC projects cap at 2; enforced at assignment
    /// time with an atomic conditional update, not a schema constraint.
    pub member_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::club::Entity",
        from = "Column::ClubId",
        to = "super::club::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Club,

    #[sea_orm(has_many = "super::student::Entity")]
    Students,
}

impl Related<super::club::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Club.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
