//! Student registration
//!
//! The client wizard collects the draft step by step; the server validates
//! the whole draft once and commits account + profile + membership + welcome
//! mail as a single transaction. A failure anywhere leaves nothing behind.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, TransactionTrait};
use uuid::Uuid;

use sac_auth::{bootstrap_credential, hash_credential};
use sac_db::entities::club::ClubDomain;
use sac_db::entities::email_queue::{self, EmailStatus};
use sac_db::entities::student::ResidenceType;
use sac_db::entities::user::UserRole;
use sac_db::entities::{student, user};

use crate::membership::{claim_club_slot, claim_project_slot};
use crate::{Error, Result};

/// Institution-level registration rules, carried in from configuration
#[derive(Debug, Clone)]
pub struct RegistrationPolicy {
    /// Domain used to derive student emails (`<username>@<domain>`)
    pub institution_domain: String,
    /// Allowed admission-year prefixes for the first two username digits
    pub admission_year_prefixes: Vec<String>,
}

impl RegistrationPolicy {
    pub fn derived_email(&self, username: &str) -> String {
        format!("{}@{}", username, self.institution_domain)
    }
}

/// Complete registration draft, validated as one immutable record
#[derive(Debug, Clone)]
pub struct RegistrationDraft {
    pub username: String,
    pub name: String,
    pub phone: String,
    pub gender: String,
    pub year: i32,
    pub branch: String,
    pub cluster: String,
    pub country: String,
    pub state: String,
    pub district: String,
    pub pincode: String,
    pub residence_type: ResidenceType,
    pub hostel_name: Option<String>,
    pub bus_route: Option<String>,
    pub domain: Option<ClubDomain>,
    pub club_id: Option<String>,
    pub project_id: Option<String>,
    pub rural_category: Option<String>,
    pub erp_receipt: Option<String>,
}

fn non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(field, "required"));
    }
    Ok(())
}

fn all_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// Validate a draft against the policy. No store access; pure field checks.
pub fn validate_draft(policy: &RegistrationPolicy, draft: &RegistrationDraft) -> Result<()> {
    if draft.username.len() != 10 || !all_digits(&draft.username) {
        return Err(Error::validation(
            "username",
            "enrollment number must be exactly 10 digits",
        ));
    }

    let prefix = &draft.username[..2];
    if !policy.admission_year_prefixes.iter().any(|p| p == prefix) {
        return Err(Error::validation(
            "username",
            format!("admission year {} is not accepted", prefix),
        ));
    }

    non_empty("name", &draft.name)?;
    non_empty("gender", &draft.gender)?;
    non_empty("branch", &draft.branch)?;
    non_empty("cluster", &draft.cluster)?;
    non_empty("country", &draft.country)?;
    non_empty("state", &draft.state)?;
    non_empty("district", &draft.district)?;

    if !(1..=4).contains(&draft.year) {
        return Err(Error::validation("year", "year must lie within 1..=4"));
    }

    if draft.pincode.len() != 6 || !all_digits(&draft.pincode) {
        return Err(Error::validation("pincode", "pincode must be 6 digits"));
    }

    if draft.phone.len() != 10 || !all_digits(&draft.phone) {
        return Err(Error::validation(
            "phone",
            "phone number must be exactly 10 digits",
        ));
    }

    match draft.residence_type {
        ResidenceType::Hostel => {
            if draft
                .hostel_name
                .as_deref()
                .map(str::trim)
                .unwrap_or("")
                .is_empty()
            {
                return Err(Error::validation(
                    "hostel_name",
                    "hostel residents must name their hostel",
                ));
            }
            if draft.bus_route.is_some() {
                return Err(Error::validation(
                    "bus_route",
                    "bus routes apply to day scholars only",
                ));
            }
        }
        ResidenceType::DayScholar => {
            if draft.hostel_name.is_some() {
                return Err(Error::validation(
                    "hostel_name",
                    "day scholars cannot name a hostel",
                ));
            }
        }
    }

    if draft.project_id.is_some() && draft.club_id.is_none() {
        return Err(Error::validation(
            "project_id",
            "a project requires a club selection",
        ));
    }

    Ok(())
}

/// Commit a validated registration: account + profile + membership claims +
/// welcome mail, all in one transaction.
pub async fn register<C>(
    conn: &C,
    policy: &RegistrationPolicy,
    draft: RegistrationDraft,
) -> Result<user::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    validate_draft(policy, &draft)?;

    let email = policy.derived_email(&draft.username);
    let credential = bootstrap_credential(&draft.username, &draft.phone)?;
    let password_hash = hash_credential(&credential)?;

    let account = conn
        .transaction::<_, user::Model, Error>(|txn| {
            Box::pin(async move {
                if user::Entity::find_by_id(draft.username.clone())
                    .one(txn)
                    .await?
                    .is_some()
                {
                    return Err(Error::Conflict(format!(
                        "username {} is already registered",
                        draft.username
                    )));
                }

                // Claim capacity before writing the profile so a full club
                // rolls the whole registration back.
                let mut resolved_domain = draft.domain;
                if let Some(club_id) = draft.club_id.as_deref() {
                    let joined = claim_club_slot(txn, club_id).await?;
                    if let Some(domain) = draft.domain {
                        if domain != joined.domain {
                            return Err(Error::validation(
                                "club_id",
                                format!("club {} does not belong to the selected domain", club_id),
                            ));
                        }
                    }
                    resolved_domain = Some(joined.domain);

                    if let Some(project_id) = draft.project_id.as_deref() {
                        let project = claim_project_slot(txn, project_id).await?;
                        if project.club_id != club_id {
                            return Err(Error::validation(
                                "project_id",
                                format!(
                                    "project {} does not belong to club {}",
                                    project_id, club_id
                                ),
                            ));
                        }
                    }
                }

                let now = Utc::now();
                let account = user::ActiveModel {
                    username: Set(draft.username.clone()),
                    role: Set(UserRole::Student),
                    name: Set(draft.name.trim().to_string()),
                    email: Set(email.clone()),
                    password_hash: Set(password_hash),
                    must_change_password: Set(true),
                    is_active: Set(true),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(txn)
                .await?;

                student::ActiveModel {
                    username: Set(draft.username.clone()),
                    gender: Set(draft.gender.clone()),
                    year: Set(draft.year),
                    branch: Set(draft.branch.clone()),
                    cluster: Set(draft.cluster.clone()),
                    country: Set(draft.country.clone()),
                    state: Set(draft.state.clone()),
                    district: Set(draft.district.clone()),
                    pincode: Set(draft.pincode.clone()),
                    residence_type: Set(draft.residence_type.clone()),
                    hostel_name: Set(draft.hostel_name.clone()),
                    bus_route: Set(draft.bus_route.clone()),
                    domain: Set(resolved_domain),
                    club_id: Set(draft.club_id.clone()),
                    project_id: Set(draft.project_id.clone()),
                    rural_category: Set(draft.rural_category.clone()),
                    erp_receipt: Set(draft.erp_receipt.clone()),
                    phone: Set(draft.phone.clone()),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(txn)
                .await?;

                email_queue::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    email: Set(email),
                    username: Set(draft.username.clone()),
                    subject: Set("Welcome to the Student Activity Center".to_string()),
                    body: Set(
                        "Your registration is complete. Sign in with your bootstrap \
                         credential and set a new password."
                            .to_string(),
                    ),
                    status: Set(EmailStatus::Pending),
                    error_message: Set(None),
                    attempts: Set(0),
                    created_at: Set(now),
                    sent_at: Set(None),
                }
                .insert(txn)
                .await?;

                Ok(account)
            })
        })
        .await?;

    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RegistrationPolicy {
        RegistrationPolicy {
            institution_domain: "university.edu".to_string(),
            admission_year_prefixes: vec!["22".into(), "23".into(), "24".into(), "25".into()],
        }
    }

    fn draft() -> RegistrationDraft {
        RegistrationDraft {
            username: "2211003456".to_string(),
            name: "Asha Verma".to_string(),
            phone: "9876543210".to_string(),
            gender: "F".to_string(),
            year: 2,
            branch: "CSE".to_string(),
            cluster: "C3".to_string(),
            country: "India".to_string(),
            state: "Odisha".to_string(),
            district: "Khordha".to_string(),
            pincode: "751024".to_string(),
            residence_type: ResidenceType::Hostel,
            hostel_name: Some("KP-6".to_string()),
            bus_route: None,
            domain: None,
            club_id: None,
            project_id: None,
            rural_category: None,
            erp_receipt: None,
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(validate_draft(&policy(), &draft()).is_ok());
    }

    #[test]
    fn test_username_must_be_ten_digits() {
        let mut d = draft();
        d.username = "22110034".to_string();
        assert!(validate_draft(&policy(), &d).is_err());

        d.username = "22110034ab".to_string();
        assert!(validate_draft(&policy(), &d).is_err());

        d.username = "221100345678".to_string();
        assert!(validate_draft(&policy(), &d).is_err());
    }

    #[test]
    fn test_admission_year_prefix_enforced() {
        let mut d = draft();
        d.username = "1911003456".to_string();
        let err = validate_draft(&policy(), &d).unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "username"));
    }

    #[test]
    fn test_hostel_name_required_iff_hostel() {
        let mut d = draft();
        d.hostel_name = None;
        assert!(validate_draft(&policy(), &d).is_err());

        let mut d = draft();
        d.residence_type = ResidenceType::DayScholar;
        d.hostel_name = Some("KP-6".to_string());
        assert!(validate_draft(&policy(), &d).is_err());

        let mut d = draft();
        d.residence_type = ResidenceType::DayScholar;
        d.hostel_name = None;
        d.bus_route = Some("Route 12".to_string());
        assert!(validate_draft(&policy(), &d).is_ok());
    }

    #[test]
    fn test_bus_route_rejected_for_hostel_residents() {
        let mut d = draft();
        d.bus_route = Some("Route 12".to_string());
        assert!(validate_draft(&policy(), &d).is_err());
    }

    #[test]
    fn test_project_requires_club() {
        let mut d = draft();
        d.project_id = Some("P-AI-01".to_string());
        d.club_id = None;
        assert!(validate_draft(&policy(), &d).is_err());
    }

    #[test]
    fn test_phone_must_be_ten_digits() {
        let mut d = draft();
        d.phone = "98765".to_string();
        assert!(validate_draft(&policy(), &d).is_err());
    }

    #[test]
    fn test_derived_email() {
        assert_eq!(
            policy().derived_email("2211003456"),
            "2211003456@university.edu"
        );
    }
}
