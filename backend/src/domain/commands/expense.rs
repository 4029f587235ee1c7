//! Commands and results for expense operations.
use chrono::{DateTime, Utc};

use crate::domain::models::expense::{AttachmentUpload, Expense};

#[derive(Debug, Clone)]
pub struct LogExpenseCommand {
    pub user_id: String,
    pub budget_id: String,
    pub description: String,
    pub amount: f64,
    /// Uses the current time when not provided
    pub date: Option<DateTime<Utc>>,
    pub receipt: Option<AttachmentUpload>,
}

#[derive(Debug, Clone)]
pub struct EditExpenseCommand {
    pub user_id: String,
    pub expense_id: String,
    pub budget_id: String,
    /// The amount currently stored on the expense, supplied by the caller.
    /// The aggregate delta is `amount - previous_amount`; it is never
    /// re-derived from a read.
    pub previous_amount: f64,
    pub description: String,
    pub amount: f64,
    pub date: Option<DateTime<Utc>>,
    pub receipt: Option<AttachmentUpload>,
}

#[derive(Debug, Clone)]
pub struct DeleteExpenseCommand {
    pub user_id: String,
    pub expense_id: String,
    pub budget_id: String,
    /// The amount currently stored on the expense, supplied by the caller
    pub amount: f64,
}

/// Result for log/edit. The record and aggregate are committed even when
/// `attachment_error` is set; only the file step failed.
#[derive(Debug, Clone)]
pub struct ExpenseResult {
    pub expense: Expense,
    pub attachment_error: Option<String>,
    pub success_message: String,
}

#[derive(Debug, Clone)]
pub struct DeleteExpenseResult {
    pub success_message: String,
}
