//! Account entity for all principals (students, leads, faculty, admins)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of an account in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Registered student
    #[sea_orm(string_value = "student")]
    Student,

    /// Student promoted to run one club
    #[sea_orm(string_value = "lead")]
    Lead,

    /// Faculty member assigned to one or more clubs
    #[sea_orm(string_value = "faculty")]
    Faculty,

    /// System administrator with full access
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Lead => "lead",
            UserRole::Faculty => "faculty",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(UserRole::Student),
            "lead" => Some(UserRole::Lead),
            "faculty" => Some(UserRole::Faculty),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Business key. For students this is the 10-digit enrollment number
    /// whose first two digits encode the admission year.
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,

    /// Account role
    pub role: UserRole,

    /// Display name
    pub name: String,

    /// Institution email, derived from the username for students
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id credential hash
    pub password_hash: String,

    /// Set while the bootstrap credential is still in effect
    pub must_change_password: bool,

    /// Whether the account is active
    pub is_active: bool,

    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Student profile for accounts with role student (retained after promotion)
    #[sea_orm(has_one = "super::student::Entity")]
    Student,

    /// Lead record for accounts with role lead
    #[sea_orm(has_one = "super::lead::Entity")]
    Lead,

    /// Faculty record for accounts with role faculty
    #[sea_orm(has_one = "super::faculty::Entity")]
    Faculty,

    /// Internal submission items owned by this account
    #[sea_orm(has_many = "super::internal_submission::Entity")]
    InternalSubmissions,

    /// Final submission items owned by this account
    #[sea_orm(has_many = "super::final_submission::Entity")]
    FinalSubmissions,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::lead::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lead.def()
    }
}

impl Related<super::faculty::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Faculty.def()
    }
}

impl Related<super::internal_submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InternalSubmissions.def()
    }
}

impl Related<super::final_submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinalSubmissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
