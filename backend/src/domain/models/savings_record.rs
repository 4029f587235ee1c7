//! Domain model for a contribution logged against a savings goal.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::expense::BlobRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsRecord {
    pub id: String,
    pub goal_id: String,
    pub description: String,
    /// Always positive: contributions only
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub user_id: String,
    pub screenshot: Option<BlobRef>,
}

impl SavingsRecord {
    pub fn generate_id() -> String {
        format!("saving::{}", Uuid::new_v4())
    }
}
