use serde::{Deserialize, Serialize};

/// A budget as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetDto {
    pub id: String,
    /// Display name, e.g. "Groceries"
    pub name: String,
    /// Spending ceiling for this budget
    pub amount: f64,
    /// Running total of all expenses logged against this budget
    pub spent_amount: f64,
    /// Deadline (RFC 3339)
    pub deadline: String,
    pub user_id: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBudgetRequest {
    pub name: String,
    pub amount: f64,
    /// Deadline (RFC 3339)
    pub deadline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBudgetRequest {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub deadline: Option<String>,
}

/// Reference to an uploaded attachment (receipt or screenshot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentDto {
    pub url: String,
    pub storage_path: String,
}

/// Inline file payload for create/edit requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentUploadDto {
    /// Original file name; the extension is kept in the stored path
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDto {
    pub id: String,
    pub budget_id: String,
    pub description: String,
    pub amount: f64,
    /// Transaction date (RFC 3339)
    pub date: String,
    pub user_id: String,
    pub receipt: Option<AttachmentDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogExpenseRequest {
    pub description: String,
    /// Must be positive
    pub amount: f64,
    /// Optional date override (RFC 3339) - uses current time if not provided
    pub date: Option<String>,
    pub receipt: Option<AttachmentUploadDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditExpenseRequest {
    pub budget_id: String,
    /// The amount currently stored on the expense, supplied by the caller so
    /// the aggregate delta can be computed without an extra read
    pub previous_amount: f64,
    pub description: String,
    pub amount: f64,
    pub date: Option<String>,
    pub receipt: Option<AttachmentUploadDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteExpenseRequest {
    pub budget_id: String,
    /// The amount currently stored on the expense
    pub amount: f64,
}

/// Response wrapper for operations that also attempt a file upload.
///
/// `attachment_error` is set when the record and aggregate were committed but
/// the file step failed; the caller can retry by re-editing the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseResponse {
    pub expense: ExpenseDto,
    pub attachment_error: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteBudgetResponse {
    pub deleted_expenses: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoalDto {
    pub id: String,
    pub name: String,
    pub target_amount: f64,
    /// Running total of all contributions logged against this goal
    pub current_amount: f64,
    pub deadline: String,
    pub user_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSavingsGoalRequest {
    pub name: String,
    pub target_amount: f64,
    pub deadline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSavingsGoalRequest {
    pub name: Option<String>,
    pub target_amount: Option<f64>,
    pub deadline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsRecordDto {
    pub id: String,
    pub goal_id: String,
    pub description: String,
    pub amount: f64,
    pub date: String,
    pub user_id: String,
    pub screenshot: Option<AttachmentDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSavingsRecordRequest {
    pub description: String,
    pub amount: f64,
    pub date: Option<String>,
    pub screenshot: Option<AttachmentUploadDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditSavingsRecordRequest {
    pub goal_id: String,
    pub previous_amount: f64,
    pub description: String,
    pub amount: f64,
    pub date: Option<String>,
    pub screenshot: Option<AttachmentUploadDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteSavingsRecordRequest {
    pub goal_id: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsRecordResponse {
    pub record: SavingsRecordDto,
    pub attachment_error: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteSavingsGoalResponse {
    pub deleted_records: usize,
    pub message: String,
}

/// Input for the budgeting-tips boundary: plain-text summaries of the user's
/// recent activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipsRequest {
    pub expense_records: Vec<String>,
    pub saving_records: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipsResponse {
    pub tips: Vec<String>,
}
