//! Lifecycle integration tests against a real SQLite in-memory database

use chrono::Utc;
use sac_core::lifecycle::{
    self, DayUrls, FinalUrls, InternalEvaluation, Reviewer,
};
use sac_core::{Error, Scope};
use sac_db::entities::email_queue;
use sac_db::entities::final_submission::FinalKind;
use sac_db::entities::internal_submission::{SubmissionKind, SubmissionStatus};
use sac_db::entities::{student, user};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

async fn setup_db() -> DatabaseConnection {
    let db = sac_db::connect("sqlite::memory:").await.expect("connect");
    sac_db::migrate(&db).await.expect("migrate");
    db
}

async fn seed_student(db: &DatabaseConnection, username: &str, club_id: Option<&str>) {
    user::ActiveModel {
        username: Set(username.to_string()),
        role: Set(user::UserRole::Student),
        name: Set("Test Student".to_string()),
        email: Set(format!("{}@university.edu", username)),
        password_hash: Set("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string()),
        must_change_password: Set(false),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert user");

    student::ActiveModel {
        username: Set(username.to_string()),
        gender: Set("M".to_string()),
        year: Set(2),
        branch: Set("CSE".to_string()),
        cluster: Set("C1".to_string()),
        country: Set("India".to_string()),
        state: Set("Odisha".to_string()),
        district: Set("Khordha".to_string()),
        pincode: Set("751024".to_string()),
        residence_type: Set(student::ResidenceType::DayScholar),
        hostel_name: Set(None),
        bus_route: Set(None),
        domain: Set(None),
        club_id: Set(club_id.map(str::to_string)),
        project_id: Set(None),
        rural_category: Set(None),
        erp_receipt: Set(None),
        phone: Set("9876543210".to_string()),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert student");
}

async fn seed_club(db: &DatabaseConnection, id: &str) {
    sac_db::entities::club::ActiveModel {
        id: Set(id.to_string()),
        name: Set(format!("Club {}", id)),
        description: Set("test club".to_string()),
        domain: Set(sac_db::entities::club::ClubDomain::Tec),
        member_limit: Set(50),
        member_count: Set(0),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert club");
}

fn day_urls(tag: &str) -> DayUrls {
    DayUrls {
        report: format!("https://docs.example.com/report-{}", tag),
        linkedin: format!("https://linkedin.com/posts/{}", tag),
        youtube: format!("https://youtube.com/watch?v={}", tag),
    }
}

fn admin_reviewer() -> Reviewer {
    Reviewer {
        username: "admin".to_string(),
        scope: Scope::All,
    }
}

#[tokio::test]
async fn test_submit_creates_three_submitted_items() {
    let db = setup_db().await;
    seed_student(&db, "2211000001", None).await;

    lifecycle::submit_internal(&db, "2211000001", 1, day_urls("d1"))
        .await
        .expect("submit");

    let overview = lifecycle::internal_overview(&db, "2211000001")
        .await
        .expect("overview");

    assert_eq!(overview.len(), 6);
    assert_eq!(overview[0].status, SubmissionStatus::Submitted);
    assert_eq!(overview[0].items.len(), 3);
    assert!(overview[0]
        .items
        .iter()
        .all(|i| i.status == SubmissionStatus::Submitted));
    assert_eq!(overview[1].status, SubmissionStatus::NotSubmitted);
}

#[tokio::test]
async fn test_submit_requires_all_three_urls() {
    let db = setup_db().await;
    seed_student(&db, "2211000002", None).await;

    let mut urls = day_urls("d1");
    urls.linkedin = "".to_string();

    let err = lifecycle::submit_internal(&db, "2211000002", 1, urls)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { ref field, .. } if field == "linkedin_url"));

    // No partial state: nothing was written
    let overview = lifecycle::internal_overview(&db, "2211000002")
        .await
        .unwrap();
    assert!(overview[0].items.is_empty());
}

#[tokio::test]
async fn test_double_submit_rejected_not_overwritten() {
    let db = setup_db().await;
    seed_student(&db, "2211000003", None).await;

    lifecycle::submit_internal(&db, "2211000003", 1, day_urls("first"))
        .await
        .expect("first submit");

    let err = lifecycle::submit_internal(&db, "2211000003", 1, day_urls("second"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition(_)));

    // The original URLs survive
    let overview = lifecycle::internal_overview(&db, "2211000003")
        .await
        .unwrap();
    let report = overview[0]
        .items
        .iter()
        .find(|i| i.kind == SubmissionKind::Report)
        .unwrap();
    assert!(report.url.contains("first"));
}

#[tokio::test]
async fn test_sequential_gate_blocks_day_three() {
    let db = setup_db().await;
    seed_student(&db, "2211000004", None).await;

    lifecycle::submit_internal(&db, "2211000004", 1, day_urls("d1"))
        .await
        .expect("day 1");

    // Day 3 requires day 2 to be submitted or approved
    let err = lifecycle::submit_internal(&db, "2211000004", 3, day_urls("d3"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition(_)));

    lifecycle::submit_internal(&db, "2211000004", 2, day_urls("d2"))
        .await
        .expect("day 2");
    lifecycle::submit_internal(&db, "2211000004", 3, day_urls("d3"))
        .await
        .expect("day 3 opens after day 2");
}

#[tokio::test]
async fn test_ungated_days_always_open() {
    let db = setup_db().await;
    seed_student(&db, "2211000005", None).await;

    // Days 5 and 6 are open regardless of days 1..=4
    lifecycle::submit_internal(&db, "2211000005", 5, day_urls("d5"))
        .await
        .expect("day 5 needs no predecessor");
    lifecycle::submit_internal(&db, "2211000005", 6, day_urls("d6"))
        .await
        .expect("day 6 needs no predecessor");
}

#[tokio::test]
async fn test_day_out_of_range_rejected() {
    let db = setup_db().await;
    seed_student(&db, "2211000006", None).await;

    let err = lifecycle::submit_internal(&db, "2211000006", 7, day_urls("d7"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[tokio::test]
async fn test_evaluate_report_leaves_links_submitted() {
    // Scenario A: evaluating the report does not touch the link sub-items
    let db = setup_db().await;
    seed_student(&db, "2211000007", None).await;

    lifecycle::submit_internal(&db, "2211000007", 1, day_urls("d1"))
        .await
        .expect("submit");

    lifecycle::evaluate_internal(
        &db,
        &admin_reviewer(),
        "2211000007",
        1,
        InternalEvaluation {
            report: Some(6.0),
            ..Default::default()
        },
    )
    .await
    .expect("evaluate");

    let overview = lifecycle::internal_overview(&db, "2211000007")
        .await
        .unwrap();
    let day = &overview[0];

    let report = day
        .items
        .iter()
        .find(|i| i.kind == SubmissionKind::Report)
        .unwrap();
    assert_eq!(report.status, SubmissionStatus::Approved);
    assert_eq!(report.marks, Some(6.0));
    assert_eq!(report.evaluated_by.as_deref(), Some("admin"));

    for kind in [SubmissionKind::LinkedinLink, SubmissionKind::YoutubeLink] {
        let item = day.items.iter().find(|i| i.kind == kind).unwrap();
        assert_eq!(item.status, SubmissionStatus::Submitted);
        assert!(item.marks.is_none());
    }

    // Representative day status follows the report
    assert_eq!(day.status, SubmissionStatus::Approved);
}

#[tokio::test]
async fn test_evaluate_rejects_out_of_range_marks() {
    let db = setup_db().await;
    seed_student(&db, "2211000008", None).await;

    lifecycle::submit_internal(&db, "2211000008", 1, day_urls("d1"))
        .await
        .expect("submit");

    let err = lifecycle::evaluate_internal(
        &db,
        &admin_reviewer(),
        "2211000008",
        1,
        InternalEvaluation {
            report: Some(8.0), // max is 7
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[tokio::test]
async fn test_evaluate_approved_item_is_terminal() {
    let db = setup_db().await;
    seed_student(&db, "2211000009", None).await;

    lifecycle::submit_internal(&db, "2211000009", 1, day_urls("d1"))
        .await
        .expect("submit");

    let evaluation = InternalEvaluation {
        report: Some(6.0),
        ..Default::default()
    };
    lifecycle::evaluate_internal(&db, &admin_reviewer(), "2211000009", 1, evaluation.clone())
        .await
        .expect("first evaluation");

    let err = lifecycle::evaluate_internal(&db, &admin_reviewer(), "2211000009", 1, evaluation)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition(_)));
}

#[tokio::test]
async fn test_reject_resubmit_reevaluate_flow() {
    // Scenario B: reject with reason, resubmit to new, approve on re-review
    let db = setup_db().await;
    seed_student(&db, "2211000010", None).await;

    lifecycle::submit_internal(&db, "2211000010", 1, day_urls("v1"))
        .await
        .expect("submit");

    lifecycle::reject_internal(
        &db,
        &admin_reviewer(),
        "2211000010",
        1,
        SubmissionKind::Report,
        "low quality",
    )
    .await
    .expect("reject");

    let overview = lifecycle::internal_overview(&db, "2211000010")
        .await
        .unwrap();
    let report = overview[0]
        .items
        .iter()
        .find(|i| i.kind == SubmissionKind::Report)
        .unwrap();
    assert_eq!(report.status, SubmissionStatus::Rejected);
    assert_eq!(report.rejection_reason.as_deref(), Some("low quality"));
    assert!(report.marks.is_none());
    assert_eq!(overview[0].status, SubmissionStatus::Rejected);

    // The rejection queued a notification in the same transaction
    let queued = email_queue::Entity::find()
        .filter(email_queue::Column::Username.eq("2211000010"))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].status, email_queue::EmailStatus::Pending);

    lifecycle::resubmit_internal(&db, "2211000010", 1, day_urls("v2"))
        .await
        .expect("resubmit");

    let overview = lifecycle::internal_overview(&db, "2211000010")
        .await
        .unwrap();
    let report = overview[0]
        .items
        .iter()
        .find(|i| i.kind == SubmissionKind::Report)
        .unwrap();
    assert_eq!(report.status, SubmissionStatus::New);
    assert!(report.rejection_reason.is_none());
    assert!(report.url.contains("v2"));

    lifecycle::evaluate_internal(
        &db,
        &admin_reviewer(),
        "2211000010",
        1,
        InternalEvaluation {
            report: Some(5.5),
            ..Default::default()
        },
    )
    .await
    .expect("re-evaluate");

    let overview = lifecycle::internal_overview(&db, "2211000010")
        .await
        .unwrap();
    assert_eq!(overview[0].status, SubmissionStatus::Approved);
}

#[tokio::test]
async fn test_resubmit_requires_rejected_state() {
    let db = setup_db().await;
    seed_student(&db, "2211000011", None).await;

    lifecycle::submit_internal(&db, "2211000011", 1, day_urls("d1"))
        .await
        .expect("submit");

    let err = lifecycle::resubmit_internal(&db, "2211000011", 1, day_urls("again"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition(_)));
}

#[tokio::test]
async fn test_resubmit_keeps_approved_subitems() {
    let db = setup_db().await;
    seed_student(&db, "2211000012", None).await;

    lifecycle::submit_internal(&db, "2211000012", 1, day_urls("v1"))
        .await
        .expect("submit");

    // Approve the youtube link, reject the report
    lifecycle::evaluate_internal(
        &db,
        &admin_reviewer(),
        "2211000012",
        1,
        InternalEvaluation {
            youtube: Some(2.5),
            ..Default::default()
        },
    )
    .await
    .expect("approve youtube");

    lifecycle::reject_internal(
        &db,
        &admin_reviewer(),
        "2211000012",
        1,
        SubmissionKind::Report,
        "missing sections",
    )
    .await
    .expect("reject report");

    lifecycle::resubmit_internal(&db, "2211000012", 1, day_urls("v2"))
        .await
        .expect("resubmit");

    let overview = lifecycle::internal_overview(&db, "2211000012")
        .await
        .unwrap();
    let day = &overview[0];

    let youtube = day
        .items
        .iter()
        .find(|i| i.kind == SubmissionKind::YoutubeLink)
        .unwrap();
    assert_eq!(youtube.status, SubmissionStatus::Approved);
    assert_eq!(youtube.marks, Some(2.5));
    assert!(youtube.url.contains("v1"), "approved items keep their url");

    let report = day
        .items
        .iter()
        .find(|i| i.kind == SubmissionKind::Report)
        .unwrap();
    assert_eq!(report.status, SubmissionStatus::New);
    assert!(report.url.contains("v2"));
}

#[tokio::test]
async fn test_faculty_scope_enforced_on_evaluate() {
    let db = setup_db().await;
    seed_club(&db, "AI01").await;
    seed_club(&db, "RB02").await;
    seed_student(&db, "2211000013", Some("RB02")).await;

    lifecycle::submit_internal(&db, "2211000013", 1, day_urls("d1"))
        .await
        .expect("submit");

    let faculty = Reviewer {
        username: "fac.mehta".to_string(),
        scope: Scope::from_claims(
            &user::UserRole::Faculty,
            None,
            Some(&["AI01".to_string()]),
        )
        .unwrap(),
    };

    let err = lifecycle::evaluate_internal(
        &db,
        &faculty,
        "2211000013",
        1,
        InternalEvaluation {
            report: Some(6.0),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Authorization(_)));

    // No state change
    let overview = lifecycle::internal_overview(&db, "2211000013")
        .await
        .unwrap();
    assert_eq!(overview[0].status, SubmissionStatus::Submitted);
}

#[tokio::test]
async fn test_scoped_reviewer_gets_authorization_error_for_unknown_student() {
    // A scoped reviewer must not learn whether the target exists
    let db = setup_db().await;

    let lead = Reviewer {
        username: "2109001122".to_string(),
        scope: Scope::Club("AI01".to_string()),
    };

    let err = lifecycle::evaluate_internal(
        &db,
        &lead,
        "9999999999",
        1,
        InternalEvaluation {
            report: Some(1.0),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Authorization(_)));
}

#[tokio::test]
async fn test_reject_requires_reason() {
    let db = setup_db().await;
    seed_student(&db, "2211000014", None).await;

    lifecycle::submit_internal(&db, "2211000014", 1, day_urls("d1"))
        .await
        .expect("submit");

    let err = lifecycle::reject_internal(
        &db,
        &admin_reviewer(),
        "2211000014",
        1,
        SubmissionKind::Report,
        "   ",
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Validation { ref field, .. } if field == "reason"));
}

#[tokio::test]
async fn test_final_bundle_lifecycle() {
    let db = setup_db().await;
    seed_student(&db, "2211000015", None).await;

    lifecycle::submit_final(
        &db,
        "2211000015",
        FinalUrls {
            report: "https://docs.example.com/final".to_string(),
            youtube: "https://youtube.com/watch?v=final".to_string(),
            linkedin: "https://linkedin.com/posts/final".to_string(),
        },
    )
    .await
    .expect("submit final");

    let rows = lifecycle::final_overview(&db, "2211000015").await.unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows
        .iter()
        .all(|r| r.status == SubmissionStatus::Submitted));

    lifecycle::evaluate_final(
        &db,
        &admin_reviewer(),
        "2211000015",
        sac_core::lifecycle::FinalEvaluation {
            report: Some(22.0),
            ..Default::default()
        },
    )
    .await
    .expect("evaluate final report");

    let rows = lifecycle::final_overview(&db, "2211000015").await.unwrap();
    let report = rows
        .iter()
        .find(|r| r.kind == FinalKind::FinalReport)
        .unwrap();
    assert_eq!(report.status, SubmissionStatus::Approved);
    assert_eq!(report.marks, Some(22.0));

    // The presentation video caps at 7.5
    let err = lifecycle::evaluate_final(
        &db,
        &admin_reviewer(),
        "2211000015",
        sac_core::lifecycle::FinalEvaluation {
            youtube: Some(8.0),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}
