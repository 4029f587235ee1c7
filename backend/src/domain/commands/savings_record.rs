//! Commands and results for savings record operations.
use chrono::{DateTime, Utc};

use crate::domain::models::expense::AttachmentUpload;
use crate::domain::models::savings_record::SavingsRecord;

#[derive(Debug, Clone)]
pub struct LogSavingsRecordCommand {
    pub user_id: String,
    pub goal_id: String,
    pub description: String,
    pub amount: f64,
    pub date: Option<DateTime<Utc>>,
    pub screenshot: Option<AttachmentUpload>,
}

#[derive(Debug, Clone)]
pub struct EditSavingsRecordCommand {
    pub user_id: String,
    pub record_id: String,
    pub goal_id: String,
    /// Caller-supplied amount currently stored on the record
    pub previous_amount: f64,
    pub description: String,
    pub amount: f64,
    pub date: Option<DateTime<Utc>>,
    pub screenshot: Option<AttachmentUpload>,
}

#[derive(Debug, Clone)]
pub struct DeleteSavingsRecordCommand {
    pub user_id: String,
    pub record_id: String,
    pub goal_id: String,
    pub amount: f64,
}

#[derive(Debug, Clone)]
pub struct SavingsRecordResult {
    pub record: SavingsRecord,
    pub attachment_error: Option<String>,
    pub success_message: String,
}

#[derive(Debug, Clone)]
pub struct DeleteSavingsRecordResult {
    pub success_message: String,
}
