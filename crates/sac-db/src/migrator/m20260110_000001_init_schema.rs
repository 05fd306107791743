//! Consolidated initial schema migration

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. Create users table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(string_len(User::Username, 64).primary_key())
                    .col(string_len(User::Role, 32).not_null().default("student"))
                    .col(string_len(User::Name, 255).not_null())
                    .col(string_len(User::Email, 255).not_null().unique_key())
                    .col(string_len(User::PasswordHash, 255).not_null())
                    .col(
                        boolean(User::MustChangePassword)
                            .not_null()
                            .default(false),
                    )
                    .col(boolean(User::IsActive).not_null().default(true))
                    .col(
                        timestamp_with_time_zone(User::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(User::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_role")
                    .table(User::Table)
                    .col(User::Role)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. Create clubs table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Club::Table)
                    .if_not_exists()
                    .col(string_len(Club::Id, 4).primary_key())
                    .col(string_len(Club::Name, 255).not_null())
                    .col(text(Club::Description).not_null())
                    .col(string_len(Club::Domain, 8).not_null())
                    .col(integer(Club::MemberLimit).not_null().default(50))
                    .col(integer(Club::MemberCount).not_null().default(0))
                    .col(
                        timestamp_with_time_zone(Club::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_clubs_domain")
                    .table(Club::Table)
                    .col(Club::Domain)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 3. Create club_categories table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(ClubCategory::Table)
                    .if_not_exists()
                    .col(string_len(ClubCategory::ClubId, 4).not_null())
                    .col(string_len(ClubCategory::Name, 255).not_null())
                    .col(integer(ClubCategory::Position).not_null())
                    .primary_key(
                        Index::create()
                            .col(ClubCategory::ClubId)
                            .col(ClubCategory::Name),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_club_categories_club_id")
                            .from(ClubCategory::Table, ClubCategory::ClubId)
                            .to(Club::Table, Club::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 4. Create projects table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Project::Table)
                    .if_not_exists()
                    .col(string_len(Project::Id, 32).primary_key())
                    .col(string_len(Project::ClubId, 4).not_null())
                    .col(string_len(Project::Domain, 8).not_null())
                    .col(string_len(Project::Category, 255).not_null())
                    .col(string_len(Project::Name, 255).not_null())
                    .col(text(Project::Description).not_null())
                    .col(boolean(Project::Rural).not_null().default(false))
                    .col(string_len_null(Project::RuralCategory, 255))
                    .col(string_len_null(Project::ImagePath, 255))
                    .col(integer(Project::MemberCount).not_null().default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_club_id")
                            .from(Project::Table, Project::ClubId)
                            .to(Club::Table, Club::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_projects_club_id")
                    .table(Project::Table)
                    .col(Project::ClubId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 5. Create students table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Student::Table)
                    .if_not_exists()
                    .col(string_len(Student::Username, 64).primary_key())
                    .col(string_len(Student::Gender, 32).not_null())
                    .col(integer(Student::Year).not_null())
                    .col(string_len(Student::Branch, 64).not_null())
                    .col(string_len(Student::Cluster, 64).not_null())
                    .col(string_len(Student::Country, 64).not_null())
                    .col(string_len(Student::State, 64).not_null())
                    .col(string_len(Student::District, 64).not_null())
                    .col(string_len(Student::Pincode, 16).not_null())
                    .col(string_len(Student::ResidenceType, 32).not_null())
                    .col(string_len_null(Student::HostelName, 255))
                    .col(string_len_null(Student::BusRoute, 255))
                    .col(string_len_null(Student::Domain, 8))
                    .col(string_len_null(Student::ClubId, 4))
                    .col(string_len_null(Student::ProjectId, 32))
                    .col(string_len_null(Student::RuralCategory, 255))
                    .col(string_len_null(Student::ErpReceipt, 64))
                    .col(string_len(Student::Phone, 16).not_null())
                    .col(
                        timestamp_with_time_zone(Student::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Student::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_username")
                            .from(Student::Table, Student::Username)
                            .to(User::Table, User::Username)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_club_id")
                            .from(Student::Table, Student::ClubId)
                            .to(Club::Table, Club::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_project_id")
                            .from(Student::Table, Student::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_students_club_id")
                    .table(Student::Table)
                    .col(Student::ClubId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_students_project_id")
                    .table(Student::Table)
                    .col(Student::ProjectId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 6. Create leads table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Lead::Table)
                    .if_not_exists()
                    .col(string_len(Lead::Username, 64).primary_key())
                    .col(string_len(Lead::ClubId, 4).not_null())
                    .col(
                        timestamp_with_time_zone(Lead::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leads_username")
                            .from(Lead::Table, Lead::Username)
                            .to(User::Table, User::Username)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leads_club_id")
                            .from(Lead::Table, Lead::ClubId)
                            .to(Club::Table, Club::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_leads_club_id")
                    .table(Lead::Table)
                    .col(Lead::ClubId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 7. Create faculty table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Faculty::Table)
                    .if_not_exists()
                    .col(string_len(Faculty::Username, 64).primary_key())
                    .col(
                        timestamp_with_time_zone(Faculty::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_faculty_username")
                            .from(Faculty::Table, Faculty::Username)
                            .to(User::Table, User::Username)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 8. Create faculty_clubs junction table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(FacultyClub::Table)
                    .if_not_exists()
                    .col(string_len(FacultyClub::FacultyUsername, 64).not_null())
                    .col(string_len(FacultyClub::ClubId, 4).not_null())
                    .primary_key(
                        Index::create()
                            .col(FacultyClub::FacultyUsername)
                            .col(FacultyClub::ClubId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_faculty_clubs_faculty_username")
                            .from(FacultyClub::Table, FacultyClub::FacultyUsername)
                            .to(Faculty::Table, Faculty::Username)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_faculty_clubs_club_id")
                            .from(FacultyClub::Table, FacultyClub::ClubId)
                            .to(Club::Table, Club::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_faculty_clubs_club_id")
                    .table(FacultyClub::Table)
                    .col(FacultyClub::ClubId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 9. Create internal_submissions table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(InternalSubmission::Table)
                    .if_not_exists()
                    .col(string_len(InternalSubmission::Username, 64).not_null())
                    .col(integer(InternalSubmission::DayNumber).not_null())
                    .col(string_len(InternalSubmission::Kind, 32).not_null())
                    .col(text(InternalSubmission::Url).not_null())
                    .col(
                        string_len(InternalSubmission::Status, 32)
                            .not_null()
                            .default("not_submitted"),
                    )
                    .col(double_null(InternalSubmission::Marks))
                    .col(text_null(InternalSubmission::RejectionReason))
                    .col(string_len_null(InternalSubmission::EvaluatedBy, 64))
                    .col(timestamp_with_time_zone_null(
                        InternalSubmission::EvaluatedAt,
                    ))
                    .col(integer(InternalSubmission::Version).not_null().default(0))
                    .col(
                        timestamp_with_time_zone(InternalSubmission::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(InternalSubmission::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(InternalSubmission::Username)
                            .col(InternalSubmission::DayNumber)
                            .col(InternalSubmission::Kind),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_internal_submissions_username")
                            .from(InternalSubmission::Table, InternalSubmission::Username)
                            .to(User::Table, User::Username)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_internal_submissions_username")
                    .table(InternalSubmission::Table)
                    .col(InternalSubmission::Username)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_internal_submissions_status")
                    .table(InternalSubmission::Table)
                    .col(InternalSubmission::Status)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 10. Create final_submissions table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(FinalSubmission::Table)
                    .if_not_exists()
                    .col(string_len(FinalSubmission::Username, 64).not_null())
                    .col(string_len(FinalSubmission::Kind, 32).not_null())
                    .col(text(FinalSubmission::Url).not_null())
                    .col(
                        string_len(FinalSubmission::Status, 32)
                            .not_null()
                            .default("not_submitted"),
                    )
                    .col(double_null(FinalSubmission::Marks))
                    .col(text_null(FinalSubmission::RejectionReason))
                    .col(string_len_null(FinalSubmission::EvaluatedBy, 64))
                    .col(timestamp_with_time_zone_null(FinalSubmission::EvaluatedAt))
                    .col(integer(FinalSubmission::Version).not_null().default(0))
                    .col(
                        timestamp_with_time_zone(FinalSubmission::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(FinalSubmission::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(FinalSubmission::Username)
                            .col(FinalSubmission::Kind),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_final_submissions_username")
                            .from(FinalSubmission::Table, FinalSubmission::Username)
                            .to(User::Table, User::Username)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 11. Create email_queue table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(EmailQueue::Table)
                    .if_not_exists()
                    .col(uuid(EmailQueue::Id).primary_key())
                    .col(string_len(EmailQueue::Email, 255).not_null())
                    .col(string_len(EmailQueue::Username, 64).not_null())
                    .col(string_len(EmailQueue::Subject, 255).not_null())
                    .col(text(EmailQueue::Body).not_null())
                    .col(
                        string_len(EmailQueue::Status, 32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(text_null(EmailQueue::ErrorMessage))
                    .col(integer(EmailQueue::Attempts).not_null().default(0))
                    .col(
                        timestamp_with_time_zone(EmailQueue::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(EmailQueue::SentAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_email_queue_status")
                    .table(EmailQueue::Table)
                    .col(EmailQueue::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order (respecting foreign keys)
        manager
            .drop_table(Table::drop().table(EmailQueue::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(FinalSubmission::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(InternalSubmission::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(FacultyClub::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Faculty::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Lead::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Student::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Project::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ClubCategory::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Club::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;

        Ok(())
    }
}

// ============================================================
// Table identifiers
// ============================================================

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Username,
    Role,
    Name,
    Email,
    PasswordHash,
    MustChangePassword,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Club {
    #[sea_orm(iden = "clubs")]
    Table,
    Id,
    Name,
    Description,
    Domain,
    MemberLimit,
    MemberCount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ClubCategory {
    #[sea_orm(iden = "club_categories")]
    Table,
    ClubId,
    Name,
    Position,
}

#[derive(DeriveIden)]
enum Project {
    #[sea_orm(iden = "projects")]
    Table,
    Id,
    ClubId,
    Domain,
    Category,
    Name,
    Description,
    Rural,
    RuralCategory,
    ImagePath,
    MemberCount,
}

#[derive(DeriveIden)]
enum Student {
    #[sea_orm(iden = "students")]
    Table,
    Username,
    Gender,
    Year,
    Branch,
    Cluster,
    Country,
    State,
    District,
    Pincode,
    ResidenceType,
    HostelName,
    BusRoute,
    Domain,
    ClubId,
    ProjectId,
    RuralCategory,
    ErpReceipt,
    Phone,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Lead {
    #[sea_orm(iden = "leads")]
    Table,
    Username,
    ClubId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Faculty {
    #[sea_orm(iden = "faculty")]
    Table,
    Username,
    CreatedAt,
}

#[derive(DeriveIden)]
enum FacultyClub {
    #[sea_orm(iden = "faculty_clubs")]
    Table,
    FacultyUsername,
    ClubId,
}

#[derive(DeriveIden)]
enum InternalSubmission {
    #[sea_orm(iden = "internal_submissions")]
    Table,
    Username,
    DayNumber,
    Kind,
    Url,
    Status,
    Marks,
    RejectionReason,
    EvaluatedBy,
    EvaluatedAt,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FinalSubmission {
    #[sea_orm(iden = "final_submissions")]
    Table,
    Username,
    Kind,
    Url,
    Status,
    Marks,
    RejectionReason,
    EvaluatedBy,
    EvaluatedAt,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EmailQueue {
    #[sea_orm(iden = "email_queue")]
    Table,
    Id,
    Email,
    Username,
    Subject,
    Body,
    Status,
    ErrorMessage,
    Attempts,
    CreatedAt,
    SentAt,
}
