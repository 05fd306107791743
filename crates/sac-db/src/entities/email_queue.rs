//! Persisted email queue
//!
//! The durable source of truth for outbound mail. The in-process dispatcher
//! is only an accelerator; rows survive restarts and failed rows are retried
//! by flipping them back to pending.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Delivery status of a queued email
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    #[sea_orm(string_value = "pending")]
    Pending,

    #[sea_orm(string_value = "sent")]
    Sent,

    #[sea_orm(string_value = "failed")]
    Failed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "email_queue")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub email: String,

    pub username: String,

    pub subject: String,

    pub body: String,

    pub status: EmailStatus,

    pub error_message: Option<String>,

    /// Delivery attempts so far
    pub attempts: i32,

    pub created_at: ChronoDateTimeUtc,

    pub sent_at: Option<ChronoDateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
