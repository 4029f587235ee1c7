//! Domain model for a budget.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub name: String,
    /// Spending ceiling for this budget
    pub amount: f64,
    /// Denormalized running total of all live expenses referencing this
    /// budget; may legitimately exceed `amount` (over budget)
    pub spent_amount: f64,
    pub deadline: DateTime<Utc>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Budget {
    pub fn generate_id() -> String {
        format!("budget::{}", Uuid::new_v4())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BudgetValidationError {
    #[error("Budget name cannot be empty")]
    EmptyName,
    #[error("Budget name cannot exceed 256 characters")]
    NameTooLong,
    #[error("Budget amount must be positive")]
    NonPositiveAmount,
}

/// Validate user-supplied budget fields before any persistence attempt.
pub fn validate_budget_fields(name: &str, amount: f64) -> Result<(), BudgetValidationError> {
    if name.trim().is_empty() {
        return Err(BudgetValidationError::EmptyName);
    }
    if name.len() > 256 {
        return Err(BudgetValidationError::NameTooLong);
    }
    if !(amount > 0.0) || !amount.is_finite() {
        return Err(BudgetValidationError::NonPositiveAmount);
    }
    Ok(())
}
