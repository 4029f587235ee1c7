//! Domain model for an expense logged against a budget.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable reference to an uploaded file in blob storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobRef {
    pub url: String,
    /// Deletion key: the full path of the object in blob storage
    pub storage_path: String,
}

/// Inline file payload supplied alongside a create or edit.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub budget_id: String,
    pub description: String,
    /// Always positive; the sign is implied by the entity kind
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub user_id: String,
    pub receipt: Option<BlobRef>,
}

impl Expense {
    pub fn generate_id() -> String {
        format!("expense::{}", Uuid::new_v4())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecordValidationError {
    #[error("Description cannot be empty")]
    EmptyDescription,
    #[error("Description cannot exceed 256 characters")]
    DescriptionTooLong,
    #[error("Amount must be positive")]
    NonPositiveAmount,
}

/// Shared validation for expenses and savings records: both carry a
/// description and a strictly positive amount.
pub fn validate_record_fields(description: &str, amount: f64) -> Result<(), RecordValidationError> {
    if description.trim().is_empty() {
        return Err(RecordValidationError::EmptyDescription);
    }
    if description.len() > 256 {
        return Err(RecordValidationError::DescriptionTooLong);
    }
    if !(amount > 0.0) || !amount.is_finite() {
        return Err(RecordValidationError::NonPositiveAmount);
    }
    Ok(())
}
