//! Club entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Program track a club belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum ClubDomain {
    /// Technical
    #[sea_orm(string_value = "TEC")]
    #[serde(rename = "TEC")]
    Tec,

    /// Literary and cultural
    #[sea_orm(string_value = "LCH")]
    #[serde(rename = "LCH")]
    Lch,

    /// Outreach
    #[sea_orm(string_value = "ESO")]
    #[serde(rename = "ESO")]
    Eso,

    /// Innovation and entrepreneurship
    #[sea_orm(string_value = "IIE")]
    #[serde(rename = "IIE")]
    Iie,

    /// Health and wellbeing
    #[sea_orm(string_value = "HWB")]
    #[serde(rename = "HWB")]
    Hwb,
}

impl ClubDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClubDomain::Tec => "TEC",
            ClubDomain::Lch => "LCH",
            ClubDomain::Eso => "ESO",
            ClubDomain::Iie => "IIE",
            ClubDomain::Hwb => "HWB",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "TEC" => Some(ClubDomain::Tec),
            "LCH" => Some(ClubDomain::Lch),
            "ESO" => Some(ClubDomain::Eso),
            "IIE" => Some(ClubDomain::Iie),
            "HWB" => Some(ClubDomain::Hwb),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clubs")]
pub struct Model {
    /// Short club code, at most 4 characters
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    pub description: String,

    pub domain: ClubDomain,

    /// Maximum number of student members
    pub member_limit: i32,

    /// Current member count, maintained by atomic conditional updates
    pub member_count: i32,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Ordered category labels owned by this club
    #[sea_orm(has_many = "super::club_category::Entity")]
    Categories,

    /// Projects under this club; deletion is restricted while any exist
    #[sea_orm(has_many = "super::project::Entity")]
    Projects,

    /// Students whose membership points at this club
    #[sea_orm(has_many = "super::student::Entity")]
    Students,

    /// Lead running this club
    #[sea_orm(has_many = "super::lead::Entity")]
    Leads,
}

impl Related<super::club_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl Related<super::lead::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Leads.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
