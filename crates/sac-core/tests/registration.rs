//! Registration, capacity, and promotion integration tests

use chrono::Utc;
use sac_core::membership::{claim_club_slot, promote_to_lead};
use sac_core::registration::{register, RegistrationDraft, RegistrationPolicy};
use sac_core::Error;
use sac_db::entities::club::ClubDomain;
use sac_db::entities::student::ResidenceType;
use sac_db::entities::user::UserRole;
use sac_db::entities::{club, email_queue, lead, project, student, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

async fn setup_db() -> DatabaseConnection {
    let db = sac_db::connect("sqlite::memory:").await.expect("connect");
    sac_db::migrate(&db).await.expect("migrate");
    db
}

fn policy() -> RegistrationPolicy {
    RegistrationPolicy {
        institution_domain: "university.edu".to_string(),
        admission_year_prefixes: vec!["22".into(), "23".into(), "24".into(), "25".into()],
    }
}

fn draft(username: &str) -> RegistrationDraft {
    RegistrationDraft {
        username: username.to_string(),
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

async fn seed_club(db: &DatabaseConnection, id: &str, domain: ClubDomain, limit: i32) {
    club::ActiveModel {
        id: Set(id.to_string()),
        name: Set(format!("Club {}", id)),
        description: Set("test club".to_string()),
        domain: Set(domain),
        member_limit: Set(limit),
        member_count: Set(0),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert club");
}

async fn seed_project(db: &DatabaseConnection, id: &str, club_id: &str, domain: ClubDomain) {
    project::ActiveModel {
        id: Set(id.to_string()),
        club_id: Set(club_id.to_string()),
        domain: Set(domain),
        category: Set("General".to_string()),
        name: Set(format!("Project {}", id)),
        description: Set("test project".to_string()),
        rural: Set(false),
        rural_category: Set(None),
        image_path: Set(None),
        member_count: Set(0),
    }
    .insert(db)
    .await
    .expect("insert project");
}

#[tokio::test]
async fn test_registration_creates_account_profile_and_welcome_mail() {
    let db = setup_db().await;

    let account = register(&db, &policy(), draft("2211003456"))
        .await
        .expect("register");

    assert_eq!(account.username, "2211003456");
    assert_eq!(account.role, UserRole::Student);
    assert_eq!(account.email, "2211003456@university.edu");
    assert!(account.must_change_password);

    let profile = student::Entity::find_by_id("2211003456".to_string())
        .one(&db)
        .await
        .unwrap()
        .expect("profile must exist");
    assert_eq!(profile.hostel_name.as_deref(), Some("KP-6"));

    let queued = email_queue::Entity::find()
        .filter(email_queue::Column::Username.eq("2211003456"))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(queued, 1);
}

#[tokio::test]
async fn test_bootstrap_credential_verifies() {
    let db = setup_db().await;

    let account = register(&db, &policy(), draft("2211003456"))
        .await
        .expect("register");

    // username + last 4 phone digits
    assert!(sac_auth::verify_credential("22110034563210", &account.password_hash).unwrap());
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    // Scenario C: the second registration of the same enrollment number fails
    let db = setup_db().await;

    register(&db, &policy(), draft("2211003456"))
        .await
        .expect("first registration");

    let err = register(&db, &policy(), draft("2211003456"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let accounts = user::Entity::find().count(&db).await.unwrap();
    assert_eq!(accounts, 1);
}

#[tokio::test]
async fn test_registration_with_club_claims_slot() {
    let db = setup_db().await;
    seed_club(&db, "AI01", ClubDomain::Tec, 50).await;

    let mut d = draft("2211003456");
    d.club_id = Some("AI01".to_string());

    register(&db, &policy(), d).await.expect("register");

    let joined = club::Entity::find_by_id("AI01".to_string())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(joined.member_count, 1);

    let profile = student::Entity::find_by_id("2211003456".to_string())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.club_id.as_deref(), Some("AI01"));
    // Domain is resolved from the club
    assert_eq!(profile.domain, Some(ClubDomain::Tec));
}

#[tokio::test]
async fn test_full_club_rolls_back_whole_registration() {
    let db = setup_db().await;
    seed_club(&db, "AI01", ClubDomain::Tec, 0).await;

    let mut d = draft("2211003456");
    d.club_id = Some("AI01".to_string());

    let err = register(&db, &policy(), d).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // No account without a profile, no profile without an account: nothing at all
    assert_eq!(user::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(student::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(email_queue::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_last_club_slot_has_exactly_one_winner() {
    let db = setup_db().await;
    seed_club(&db, "AI01", ClubDomain::Tec, 1).await;

    let first = claim_club_slot(&db, "AI01").await;
    let second = claim_club_slot(&db, "AI01").await;

    assert!(first.is_ok());
    assert!(matches!(second, Err(Error::Conflict(_))));

    let joined = club::Entity::find_by_id("AI01".to_string())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(joined.member_count, 1, "never over-subscribed");
}

#[tokio::test]
async fn test_concurrent_claims_never_oversubscribe() {
    let db = setup_db().await;
    seed_club(&db, "AI01", ClubDomain::Tec, 1).await;

    let db1 = db.clone();
    let db2 = db.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { claim_club_slot(&db1, "AI01").await }),
        tokio::spawn(async move { claim_club_slot(&db2, "AI01").await }),
    );

    let results = [a.unwrap(), b.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(Error::Conflict(_))))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);
}

#[tokio::test]
async fn test_tec_project_cap_of_two() {
    let db = setup_db().await;
    seed_club(&db, "AI01", ClubDomain::Tec, 50).await;
    seed_project(&db, "P-AI-01", "AI01", ClubDomain::Tec).await;

    for i in 0..2 {
        let mut d = draft(&format!("221100345{}", i));
        d.club_id = Some("AI01".to_string());
        d.project_id = Some("P-AI-01".to_string());
        register(&db, &policy(), d)
            .await
            .expect("first two members fit");
    }

    let mut d = draft("2211003459");
    d.club_id = Some("AI01".to_string());
    d.project_id = Some("P-AI-01".to_string());
    let err = register(&db, &policy(), d).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // The failed registration released its club slot with the rollback
    let joined = club::Entity::find_by_id("AI01".to_string())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(joined.member_count, 2);
}

#[tokio::test]
async fn test_project_from_another_club_rejected() {
    let db = setup_db().await;
    seed_club(&db, "AI01", ClubDomain::Tec, 50).await;
    seed_club(&db, "RB02", ClubDomain::Tec, 50).await;
    seed_project(&db, "P-RB-01", "RB02", ClubDomain::Tec).await;

    let mut d = draft("2211003456");
    d.club_id = Some("AI01".to_string());
    d.project_id = Some("P-RB-01".to_string());

    let err = register(&db, &policy(), d).await.unwrap_err();
    assert!(matches!(err, Error::Validation { ref field, .. } if field == "project_id"));
}

#[tokio::test]
async fn test_promotion_is_atomic() {
    // Scenario D: a promotion that fails midway leaves neither write visible
    let db = setup_db().await;
    seed_club(&db, "AI01", ClubDomain::Tec, 50).await;

    register(&db, &policy(), draft("2211003456"))
        .await
        .expect("register");

    // Promotion against a missing club fails after the role read; the
    // transaction must roll the role flip back.
    let err = promote_to_lead(&db, "2211003456", "NOPE").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let account = user::Entity::find_by_id("2211003456".to_string())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.role, UserRole::Student, "role flip rolled back");
    assert_eq!(lead::Entity::find().count(&db).await.unwrap(), 0);

    // A valid promotion commits both writes together
    promote_to_lead(&db, "2211003456", "AI01")
        .await
        .expect("promote");

    let account = user::Entity::find_by_id("2211003456".to_string())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.role, UserRole::Lead);

    let lead_row = lead::Entity::find_by_id("2211003456".to_string())
        .one(&db)
        .await
        .unwrap()
        .expect("lead record exists");
    assert_eq!(lead_row.club_id, "AI01");

    // The student profile survives the promotion
    assert!(student::Entity::find_by_id("2211003456".to_string())
        .one(&db)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_double_promotion_rejected() {
    let db = setup_db().await;
    seed_club(&db, "AI01", ClubDomain::Tec, 50).await;

    register(&db, &policy(), draft("2211003456"))
        .await
        .expect("register");
    promote_to_lead(&db, "2211003456", "AI01")
        .await
        .expect("promote");

    let err = promote_to_lead(&db, "2211003456", "AI01")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition(_)));
}
