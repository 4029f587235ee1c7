//! Commands and results for budget operations.
use chrono::{DateTime, Utc};

use crate::domain::models::budget::Budget;
use crate::domain::models::expense::Expense;

#[derive(Debug, Clone)]
pub struct CreateBudgetCommand {
    pub user_id: String,
    pub name: String,
    pub amount: f64,
    pub deadline: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateBudgetResult {
    pub budget: Budget,
    pub success_message: String,
}

#[derive(Debug, Clone)]
pub struct UpdateBudgetCommand {
    pub user_id: String,
    pub budget_id: String,
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct UpdateBudgetResult {
    pub budget: Budget,
    pub success_message: String,
}

#[derive(Debug, Clone)]
pub struct DeleteBudgetCommand {
    pub user_id: String,
    pub budget_id: String,
}

#[derive(Debug, Clone)]
pub struct DeleteBudgetResult {
    pub budget: Budget,
    /// Children removed by the cascade
    pub deleted_expenses: Vec<Expense>,
    pub success_message: String,
}
