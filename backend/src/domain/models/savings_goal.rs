//! Domain model for a savings goal.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: String,
    pub name: String,
    pub target_amount: f64,
    /// Denormalized running total of all contributions; may exceed
    /// `target_amount` (goal exceeded)
    pub current_amount: f64,
    pub deadline: DateTime<Utc>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl SavingsGoal {
    pub fn generate_id() -> String {
        format!("goal::{}", Uuid::new_v4())
    }
}
