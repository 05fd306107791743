//! Integration tests for sac-db
//!
//! Tests schema and entity operations against a real SQLite in-memory database

use chrono::Utc;
use sac_db::{
    connect,
    entities::{
        club, email_queue, internal_submission, student, user,
        internal_submission::{SubmissionKind, SubmissionStatus},
    },
    migrate,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};

/// Helper to create a test database
async fn setup_test_db() -> sea_orm::DatabaseConnection {
    let db = connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    migrate(&db).await.expect("Failed to run migrations");

    db
}

fn test_user(username: &str, role: user::UserRole) -> user::ActiveModel {
    user::ActiveModel {
        username: Set(username.to_string()),
        role: Set(role),
        name: Set("Test Account".to_string()),
        email: Set(format!("{}@university.edu", username)),
        password_hash: Set("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string()),
        must_change_password: Set(true),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
}

#[tokio::test]
async fn test_database_connection() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let backend = db.get_database_backend();
    assert!(matches!(backend, sea_orm::DatabaseBackend::Sqlite));
}

#[tokio::test]
async fn test_migrations_run_successfully() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let result = migrate(&db).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_create_account_and_profile() {
    let db = setup_test_db().await;

    test_user("2211003456", user::UserRole::Student)
        .insert(&db)
        .await
        .expect("Failed to insert user");

    let profile = student::ActiveModel {
        username: Set("2211003456".to_string()),
        gender: Set("F".to_string()),
        year: Set(2),
        branch: Set("CSE".to_string()),
        cluster: Set("C3".to_string()),
        country: Set("India".to_string()),
        state: Set("Odisha".to_string()),
        district: Set("Khordha".to_string()),
        pincode: Set("751024".to_string()),
        residence_type: Set(student::ResidenceType::Hostel),
        hostel_name: Set(Some("KP-6".to_string())),
        bus_route: Set(None),
        domain: Set(None),
        club_id: Set(None),
        project_id: Set(None),
        rural_category: Set(None),
        erp_receipt: Set(Some("ERP-9912".to_string())),
        phone: Set("9876543210".to_string()),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    };

    let inserted = profile.insert(&db).await.expect("Failed to insert profile");
    assert_eq!(inserted.username, "2211003456");
    assert_eq!(inserted.residence_type, student::ResidenceType::Hostel);
    assert_eq!(inserted.hostel_name.as_deref(), Some("KP-6"));
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let db = setup_test_db().await;

    test_user("2211003457", user::UserRole::Student)
        .insert(&db)
        .await
        .expect("First insert should succeed");

    let result = test_user("2211003457", user::UserRole::Student)
        .insert(&db)
        .await;

    assert!(result.is_err(), "Duplicate username must violate the PK");
}

#[tokio::test]
async fn test_submission_composite_key_roundtrip() {
    let db = setup_test_db().await;

    test_user("2211003458", user::UserRole::Student)
        .insert(&db)
        .await
        .expect("Failed to insert user");

    let item = internal_submission::ActiveModel {
        username: Set("2211003458".to_string()),
        day_number: Set(1),
        kind: Set(SubmissionKind::Report),
        url: Set("https://docs.example.com/report-day1".to_string()),
        status: Set(SubmissionStatus::Submitted),
        marks: Set(None),
        rejection_reason: Set(None),
        evaluated_by: Set(None),
        evaluated_at: Set(None),
        version: Set(0),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    };

    item.insert(&db).await.expect("Failed to insert submission");

    let found = internal_submission::Entity::find_by_id((
        "2211003458".to_string(),
        1,
        SubmissionKind::Report,
    ))
    .one(&db)
    .await
    .expect("Failed to query")
    .expect("Submission not found");

    assert_eq!(found.status, SubmissionStatus::Submitted);
    assert_eq!(found.url, "https://docs.example.com/report-day1");
    assert!(found.marks.is_none());
}

#[tokio::test]
async fn test_submission_evaluation_update() {
    let db = setup_test_db().await;

    test_user("2211003459", user::UserRole::Student)
        .insert(&db)
        .await
        .expect("Failed to insert user");

    let item = internal_submission::ActiveModel {
        username: Set("2211003459".to_string()),
        day_number: Set(1),
        kind: Set(SubmissionKind::Report),
        url: Set("https://docs.example.com/r1".to_string()),
        status: Set(SubmissionStatus::Submitted),
        marks: Set(None),
        rejection_reason: Set(None),
        evaluated_by: Set(None),
        evaluated_at: Set(None),
        version: Set(0),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    };

    let inserted = item.insert(&db).await.expect("Failed to insert");

    let mut active: internal_submission::ActiveModel = inserted.into();
    active.status = Set(SubmissionStatus::Approved);
    active.marks = Set(Some(6.0));
    active.evaluated_by = Set(Some("lead01".to_string()));
    active.evaluated_at = Set(Some(Utc::now()));
    active.version = Set(1);

    let updated = active.update(&db).await.expect("Failed to update");

    assert_eq!(updated.status, SubmissionStatus::Approved);
    assert_eq!(updated.marks, Some(6.0));
    assert_eq!(updated.evaluated_by.as_deref(), Some("lead01"));
    assert_eq!(updated.version, 1);
}

#[tokio::test]
async fn test_query_submissions_by_username() {
    let db = setup_test_db().await;

    test_user("2211003460", user::UserRole::Student)
        .insert(&db)
        .await
        .expect("Failed to insert user");

    for kind in SubmissionKind::ALL {
        let item = internal_submission::ActiveModel {
            username: Set("2211003460".to_string()),
            day_number: Set(1),
            kind: Set(kind),
            url: Set(format!("https://example.com/{:?}", kind)),
            status: Set(SubmissionStatus::Submitted),
            marks: Set(None),
            rejection_reason: Set(None),
            evaluated_by: Set(None),
            evaluated_at: Set(None),
            version: Set(0),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        };
        item.insert(&db).await.expect("Failed to insert");
    }

    let rows = internal_submission::Entity::find()
        .filter(internal_submission::Column::Username.eq("2211003460"))
        .all(&db)
        .await
        .expect("Failed to query");

    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.day_number == 1));
}

#[tokio::test]
async fn test_account_deletion_cascades_to_submissions() {
    let db = setup_test_db().await;

    let account = test_user("2211003461", user::UserRole::Student)
        .insert(&db)
        .await
        .expect("Failed to insert user");

    let item = internal_submission::ActiveModel {
        username: Set("2211003461".to_string()),
        day_number: Set(1),
        kind: Set(SubmissionKind::Report),
        url: Set("https://example.com/r".to_string()),
        status: Set(SubmissionStatus::Submitted),
        marks: Set(None),
        rejection_reason: Set(None),
        evaluated_by: Set(None),
        evaluated_at: Set(None),
        version: Set(0),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    };
    item.insert(&db).await.expect("Failed to insert");

    user::Entity::delete_by_id(account.username.clone())
        .exec(&db)
        .await
        .expect("Failed to delete account");

    let remaining = internal_submission::Entity::find()
        .filter(internal_submission::Column::Username.eq("2211003461"))
        .count(&db)
        .await
        .expect("Failed to count");

    assert_eq!(remaining, 0, "Submissions must cascade with the account");
}

#[tokio::test]
async fn test_club_defaults() {
    let db = setup_test_db().await;

    let club = club::ActiveModel {
        id: Set("AI01".to_string()),
        name: Set("Applied AI".to_string()),
        description: Set("Machine learning projects".to_string()),
        domain: Set(club::ClubDomain::Tec),
        member_limit: Set(50),
        member_count: Set(0),
        created_at: Set(Utc::now()),
    };

    let inserted = club.insert(&db).await.expect("Failed to insert club");
    assert_eq!(inserted.member_limit, 50);
    assert_eq!(inserted.member_count, 0);
    assert_eq!(inserted.domain, club::ClubDomain::Tec);
}

#[tokio::test]
async fn test_email_queue_lifecycle_columns() {
    let db = setup_test_db().await;

    let id = uuid::Uuid::new_v4();
    let entry = email_queue::ActiveModel {
        id: Set(id),
        email: Set("2211003462@university.edu".to_string()),
        username: Set("2211003462".to_string()),
        subject: Set("Welcome to the Student Activity Center".to_string()),
        body: Set("Your registration is complete.".to_string()),
        status: Set(email_queue::EmailStatus::Pending),
        error_message: Set(None),
        attempts: Set(0),
        created_at: Set(Utc::now()),
        sent_at: Set(None),
    };

    entry.insert(&db).await.expect("Failed to insert email");

    let found = email_queue::Entity::find_by_id(id)
        .one(&db)
        .await
        .expect("Failed to query")
        .expect("Email not found");

    let mut active: email_queue::ActiveModel = found.into();
    active.status = Set(email_queue::EmailStatus::Failed);
    active.error_message = Set(Some("connection refused".to_string()));
    active.attempts = Set(1);

    let failed = active.update(&db).await.expect("Failed to update");
    assert_eq!(failed.status, email_queue::EmailStatus::Failed);
    assert_eq!(failed.attempts, 1);
    assert!(failed.sent_at.is_none());
}
