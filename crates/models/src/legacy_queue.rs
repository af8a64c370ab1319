//! Rows of the queue table consumed by the legacy worker.

use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "legacy_queue")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub channel: String,
    pub job: String,
    pub pushed_at: i64,
    pub ttr: i32,
    pub delay: i32,
    pub priority: i32,
    pub reserved_at: Option<i64>,
    pub attempt: Option<i32>,
    pub done_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef { panic!("no relations defined here") }
}

impl ActiveModelBehavior for ActiveModel {}

pub const DEFAULT_TTR_SECS: i32 = 300;
pub const DEFAULT_PRIORITY: i32 = 1024;

/// Envelope stored in `job`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct JobEnvelope {
    pub class: String,
    pub payload: serde_json::Value,
}

/// Append a job for the legacy consumer.
pub async fn push<C: ConnectionTrait>(
    db: &C,
    channel: &str,
    class: &str,
    payload: serde_json::Value,
) -> Result<Model, errors::ModelError> {
    if class.trim().is_empty() { return Err(errors::ModelError::Validation("job class required".into())); }
    let envelope = JobEnvelope { class: class.to_string(), payload };
    let job = serde_json::to_string(&envelope).map_err(|e| errors::ModelError::Validation(e.to_string()))?;
    let am = ActiveModel {
        id: sea_orm::NotSet,
        channel: Set(channel.to_string()),
        job: Set(job),
        pushed_at: Set(Utc::now().timestamp()),
        ttr: Set(DEFAULT_TTR_SECS),
        delay: Set(0),
        priority: Set(DEFAULT_PRIORITY),
        reserved_at: Set(None),
        attempt: Set(None),
        done_at: Set(None),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
