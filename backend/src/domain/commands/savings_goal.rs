//! Commands and results for savings goal operations.
use chrono::{DateTime, Utc};

use crate::domain::models::savings_goal::SavingsGoal;
use crate::domain::models::savings_record::SavingsRecord;

#[derive(Debug, Clone)]
pub struct CreateSavingsGoalCommand {
    pub user_id: String,
    pub name: String,
    pub target_amount: f64,
    pub deadline: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateSavingsGoalResult {
    pub goal: SavingsGoal,
    pub success_message: String,
}

#[derive(Debug, Clone)]
pub struct UpdateSavingsGoalCommand {
    pub user_id: String,
    pub goal_id: String,
    pub name: Option<String>,
    pub target_amount: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct UpdateSavingsGoalResult {
    pub goal: SavingsGoal,
    pub success_message: String,
}

#[derive(Debug, Clone)]
pub struct DeleteSavingsGoalCommand {
    pub user_id: String,
    pub goal_id: String,
}

#[derive(Debug, Clone)]
pub struct DeleteSavingsGoalResult {
    pub goal: SavingsGoal,
    pub deleted_records: Vec<SavingsRecord>,
    pub success_message: String,
}
