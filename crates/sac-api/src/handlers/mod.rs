//! HTTP handlers, grouped by area

pub mod admin;
pub mod auth;
pub mod clubs;
pub mod review;
pub mod student;
pub mod system;

pub use admin::*;
pub use auth::*;
pub use clubs::*;
pub use review::*;
pub use student::*;
pub use system::*;

use sac_core::lifecycle::Reviewer;
use sac_core::Scope;
use sac_db::entities::user::UserRole;

use crate::error::ApiError;
use crate::middleware::AuthUser;

pub(crate) fn parse_role(user: &AuthUser) -> Result<UserRole, ApiError> {
    UserRole::parse(&user.role)
        .ok_or_else(|| sac_core::Error::Authorization("unknown role".to_string()).into())
}

pub(crate) fn require_admin(user: &AuthUser) -> Result<(), ApiError> {
    if !user.proxy && parse_role(user)? == UserRole::Admin {
        Ok(())
    } else {
        Err(sac_core::Error::Authorization("admin access required".to_string()).into())
    }
}

/// Student-facing routes. Proxy tokens carry the student role and pass here.
pub(crate) fn require_student(user: &AuthUser) -> Result<(), ApiError> {
    if parse_role(user)? == UserRole::Student {
        Ok(())
    } else {
        Err(sac_core::Error::Authorization("student access required".to_string()).into())
    }
}

/// Resolve a reviewer from the caller. Proxy sessions are never reviewers,
/// whatever role the delegator holds.
pub(crate) fn reviewer_from(user: &AuthUser) -> Result<Reviewer, ApiError> {
    if user.proxy {
        return Err(
            sac_core::Error::Authorization("proxy sessions cannot review".to_string()).into(),
        );
    }

    let role = parse_role(user)?;
    let scope = Scope::from_claims(
        &role,
        user.club_id.as_deref(),
        user.assigned_clubs.as_deref(),
    )?;

    Ok(Reviewer {
        username: user.username.clone(),
        scope,
    })
}
