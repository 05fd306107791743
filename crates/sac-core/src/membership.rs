//! Club and project membership
//!
//! Membership is the `club_id`/`project_id` pair on the student profile.
//! Capacity checks are atomic conditional updates on the counter columns,
//! never a separate read followed by a write: two students racing for the
//! last slot resolve to exactly one winner.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::info;

use sac_db::entities::club::ClubDomain;
use sac_db::entities::user::UserRole;
use sac_db::entities::{club, lead, project, user};

use crate::{Error, Result};

/// Hard cap on technical-domain project membership
pub const TEC_PROJECT_CAP: i32 = 2;

/// Claim a club slot: `member_count` is incremented only while it is below
/// `member_limit`. Zero rows affected means the club is missing or full.
pub async fn claim_club_slot<C: ConnectionTrait>(conn: &C, club_id: &str) -> Result<club::Model> {
    let result = club::Entity::update_many()
        .col_expr(
            club::Column::MemberCount,
            Expr::col(club::Column::MemberCount).add(1),
        )
        .filter(club::Column::Id.eq(club_id))
        .filter(Expr::col(club::Column::MemberCount).lt(Expr::col(club::Column::MemberLimit)))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return match club::Entity::find_by_id(club_id.to_string()).one(conn).await? {
            None => Err(Error::NotFound(format!("club {}", club_id))),
            Some(_) => Err(Error::Conflict(format!("club {} is full", club_id))),
        };
    }

    club::Entity::find_by_id(club_id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("club {}", club_id)))
}

/// Claim a project slot. Technical-domain projects cap at two members;
/// other domains are bounded only by their club.
pub async fn claim_project_slot<C: ConnectionTrait>(
    conn: &C,
    project_id: &str,
) -> Result<project::Model> {
    let Some(target) = project::Entity::find_by_id(project_id.to_string())
        .one(conn)
        .await?
    else {
        return Err(Error::NotFound(format!("project {}", project_id)));
    };

    let mut update = project::Entity::update_many()
        .col_expr(
            project::Column::MemberCount,
            Expr::col(project::Column::MemberCount).add(1),
        )
        .filter(project::Column::Id.eq(project_id));

    if target.domain == ClubDomain::Tec {
        update = update.filter(project::Column::MemberCount.lt(TEC_PROJECT_CAP));
    }

    let result = update.exec(conn).await?;
    if result.rows_affected == 0 {
        return Err(Error::Conflict(format!("project {} is full", project_id)));
    }

    Ok(target)
}

/// Release a previously claimed club slot (admin reassignment path)
pub async fn release_club_slot<C: ConnectionTrait>(conn: &C, club_id: &str) -> Result<()> {
    club::Entity::update_many()
        .col_expr(
            club::Column::MemberCount,
            Expr::col(club::Column::MemberCount).sub(1),
        )
        .filter(club::Column::Id.eq(club_id))
        .filter(club::Column::MemberCount.gt(0))
        .exec(conn)
        .await?;

    Ok(())
}

/// Release a previously claimed project slot
pub async fn release_project_slot<C: ConnectionTrait>(conn: &C, project_id: &str) -> Result<()> {
    project::Entity::update_many()
        .col_expr(
            project::Column::MemberCount,
            Expr::col(project::Column::MemberCount).sub(1),
        )
        .filter(project::Column::Id.eq(project_id))
        .filter(project::Column::MemberCount.gt(0))
        .exec(conn)
        .await?;

    Ok(())
}

/// Promote a student to lead of a club.
///
/// The role flip and the lead record are one transaction: a failure midway
/// leaves neither visible. The student profile is retained; leads are
/// students with extra privileges, not a separate identity.
pub async fn promote_to_lead<C>(conn: &C, username: &str, club_id: &str) -> Result<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    let username = username.to_string();
    let club_id = club_id.to_string();

    conn.transaction::<_, (), Error>(|txn| {
        Box::pin(async move {
            let Some(account) = user::Entity::find_by_id(username.clone()).one(txn).await? else {
                return Err(Error::NotFound(format!("account {}", username)));
            };

            if account.role != UserRole::Student {
                return Err(Error::InvalidTransition(format!(
                    "account {} is not a student",
                    username
                )));
            }

            if club::Entity::find_by_id(club_id.clone())
                .one(txn)
                .await?
                .is_none()
            {
                return Err(Error::NotFound(format!("club {}", club_id)));
            }

            let mut active: user::ActiveModel = account.into();
            active.role = Set(UserRole::Lead);
            active.updated_at = Set(Utc::now());
            active.update(txn).await?;

            lead::ActiveModel {
                username: Set(username.clone()),
                club_id: Set(club_id.clone()),
                created_at: Set(Utc::now()),
            }
            .insert(txn)
            .await?;

            info!("promoted {} to lead of {}", username, club_id);
            Ok(())
        })
    })
    .await?;

    Ok(())
}
