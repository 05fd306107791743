//! Reviewer club scoping
//!
//! Every list and evaluate path intersects the target student set with the
//! caller's scope before reading or mutating. Failing to filter here would
//! be an authorization bypass, so the scope is resolved once from the
//! verified token claims and threaded through the whole request.

use std::collections::HashSet;

use sac_db::entities::user::UserRole;

use crate::{Error, Result};

/// Club visibility of an authenticated reviewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Admin: unrestricted
    All,

    /// Faculty: the set of assigned clubs
    Clubs(HashSet<String>),

    /// Lead: exactly one club
    Club(String),
}

impl Scope {
    /// Resolve the reviewer scope from verified token claims.
    ///
    /// Students have no reviewer scope; proxy tokens never reach this point
    /// because the middleware refuses them on reviewer routes.
    pub fn from_claims(
        role: &UserRole,
        club_id: Option<&str>,
        assigned_clubs: Option<&[String]>,
    ) -> Result<Scope> {
        match role {
            UserRole::Admin => Ok(Scope::All),
            UserRole::Faculty => Ok(Scope::Clubs(
                assigned_clubs
                    .unwrap_or(&[])
                    .iter()
                    .cloned()
                    .collect(),
            )),
            UserRole::Lead => club_id
                .map(|id| Scope::Club(id.to_string()))
                .ok_or_else(|| Error::Authorization("lead token carries no club".to_string())),
            UserRole::Student => Err(Error::Authorization(
                "students cannot review submissions".to_string(),
            )),
        }
    }

    /// Whether a student with the given club membership is visible
    pub fn permits(&self, student_club: Option<&str>) -> bool {
        match self {
            Scope::All => true,
            Scope::Clubs(clubs) => student_club.map(|c| clubs.contains(c)).unwrap_or(false),
            Scope::Club(club) => student_club.map(|c| c == club).unwrap_or(false),
        }
    }

    /// Club ids to restrict list queries to; `None` means unrestricted
    pub fn club_filter(&self) -> Option<Vec<String>> {
        match self {
            Scope::All => None,
            Scope::Clubs(clubs) => Some(clubs.iter().cloned().collect()),
            Scope::Club(club) => Some(vec![club.clone()]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_sees_everything() {
        let scope = Scope::from_claims(&UserRole::Admin, None, None).unwrap();
        assert_eq!(scope, Scope::All);
        assert!(scope.permits(Some("AI01")));
        assert!(scope.permits(None));
        assert!(scope.club_filter().is_none());
    }

    #[test]
    fn test_faculty_limited_to_assigned_clubs() {
        let assigned = vec!["AI01".to_string()];
        let scope = Scope::from_claims(&UserRole::Faculty, None, Some(&assigned)).unwrap();

        assert!(scope.permits(Some("AI01")));
        assert!(!scope.permits(Some("RB02")));
        assert!(!scope.permits(None));
        assert_eq!(scope.club_filter(), Some(vec!["AI01".to_string()]));
    }

    #[test]
    fn test_faculty_with_no_assignments_sees_nobody() {
        let scope = Scope::from_claims(&UserRole::Faculty, None, None).unwrap();
        assert!(!scope.permits(Some("AI01")));
    }

    #[test]
    fn test_lead_limited_to_own_club() {
        let scope = Scope::from_claims(&UserRole::Lead, Some("RB02"), None).unwrap();

        assert!(scope.permits(Some("RB02")));
        assert!(!scope.permits(Some("AI01")));
        assert!(!scope.permits(None));
    }

    #[test]
    fn test_lead_token_without_club_rejected() {
        let result = Scope::from_claims(&UserRole::Lead, None, None);
        assert!(matches!(result, Err(Error::Authorization(_))));
    }

    #[test]
    fn test_student_has_no_reviewer_scope() {
        let result = Scope::from_claims(&UserRole::Student, None, None);
        assert!(matches!(result, Err(Error::Authorization(_))));
    }
}
