//! Savings record service: keeps a goal's current amount consistent with its
//! contributions. Mirrors the expense service, additive-only domain.

use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};

use crate::domain::commands::savings_record::{
    DeleteSavingsRecordCommand, DeleteSavingsRecordResult, EditSavingsRecordCommand,
    LogSavingsRecordCommand, SavingsRecordResult,
};
use crate::domain::errors::DomainError;
use crate::domain::models::expense::{validate_record_fields, AttachmentUpload, BlobRef};
use crate::domain::models::savings_record::SavingsRecord;
use crate::domain::retry_transaction;
use crate::storage::traits::{AttachmentKind, BlobStorage, EntityStore, StorageError};

pub struct SavingsRecordService {
    store: Arc<dyn EntityStore>,
    blobs: Arc<dyn BlobStorage>,
}

impl SavingsRecordService {
    pub fn new(store: Arc<dyn EntityStore>, blobs: Arc<dyn BlobStorage>) -> Self {
        Self { store, blobs }
    }

    pub fn list_savings(
        &self,
        user_id: &str,
        goal_id: &str,
    ) -> Result<Vec<SavingsRecord>, DomainError> {
        Ok(self.store.list_savings(user_id, goal_id)?)
    }

    /// Log a contribution towards a goal.
    pub fn log_saving(
        &self,
        command: LogSavingsRecordCommand,
    ) -> Result<SavingsRecordResult, DomainError> {
        validate_record_fields(&command.description, command.amount)
            .map_err(|e| DomainError::Validation(e.to_string()))?;

        self.store
            .get_goal(&command.user_id, &command.goal_id)?
            .ok_or(DomainError::NotFound)?;

        let mut record = SavingsRecord {
            id: SavingsRecord::generate_id(),
            goal_id: command.goal_id.clone(),
            description: command.description.trim().to_string(),
            amount: command.amount,
            date: command.date.unwrap_or_else(Utc::now),
            user_id: command.user_id.clone(),
            screenshot: None,
        };

        retry_transaction(|| self.store.record_saving(&record))?;
        info!(
            "Logged contribution {} (${:.2}) towards goal {}",
            record.id, record.amount, record.goal_id
        );

        let attachment_error = match &command.screenshot {
            Some(file) => self.attach_screenshot(&mut record, file),
            None => None,
        };

        let success_message = match &attachment_error {
            None => "Contribution logged".to_string(),
            Some(_) => "Contribution logged, but the screenshot upload failed".to_string(),
        };
        Ok(SavingsRecordResult {
            record,
            attachment_error,
            success_message,
        })
    }

    /// Edit a contribution; the aggregate delta comes from the
    /// caller-supplied `previous_amount`.
    pub fn edit_saving(
        &self,
        command: EditSavingsRecordCommand,
    ) -> Result<SavingsRecordResult, DomainError> {
        validate_record_fields(&command.description, command.amount)
            .map_err(|e| DomainError::Validation(e.to_string()))?;

        let existing = self
            .store
            .get_saving(&command.user_id, &command.record_id)?
            .filter(|r| r.goal_id == command.goal_id)
            .ok_or(DomainError::NotFound)?;

        let delta = command.amount - command.previous_amount;
        let mut record = SavingsRecord {
            id: existing.id.clone(),
            goal_id: command.goal_id.clone(),
            description: command.description.trim().to_string(),
            amount: command.amount,
            date: command.date.unwrap_or(existing.date),
            user_id: command.user_id.clone(),
            screenshot: existing.screenshot.clone(),
        };

        retry_transaction(|| self.store.update_saving(&record, delta))?;
        info!(
            "Updated contribution {} ({:+.2} towards goal {})",
            record.id, delta, record.goal_id
        );

        let attachment_error = match &command.screenshot {
            Some(file) => {
                if let Some(old) = &existing.screenshot {
                    self.release_blob(&old.storage_path);
                }
                self.attach_screenshot(&mut record, file)
            }
            None => None,
        };

        let success_message = match &attachment_error {
            None => "Contribution updated".to_string(),
            Some(_) => "Contribution updated, but the screenshot upload failed".to_string(),
        };
        Ok(SavingsRecordResult {
            record,
            attachment_error,
            success_message,
        })
    }

    pub fn delete_saving(
        &self,
        command: DeleteSavingsRecordCommand,
    ) -> Result<DeleteSavingsRecordResult, DomainError> {
        let existing = self
            .store
            .get_saving(&command.user_id, &command.record_id)?
            .filter(|r| r.goal_id == command.goal_id)
            .ok_or(DomainError::NotFound)?;

        retry_transaction(|| {
            self.store.remove_saving(
                &command.user_id,
                &command.goal_id,
                &command.record_id,
                command.amount,
            )
        })?;
        info!(
            "Deleted contribution {} (-${:.2} towards goal {})",
            command.record_id, command.amount, command.goal_id
        );

        if let Some(screenshot) = &existing.screenshot {
            self.release_blob(&screenshot.storage_path);
        }

        Ok(DeleteSavingsRecordResult {
            success_message: "Contribution deleted".to_string(),
        })
    }

    fn attach_screenshot(
        &self,
        record: &mut SavingsRecord,
        file: &AttachmentUpload,
    ) -> Option<String> {
        let attach = || -> Result<BlobRef, StorageError> {
            let blob_ref = self.blobs.upload(
                &record.user_id,
                AttachmentKind::SavingsScreenshot,
                &record.id,
                file,
            )?;
            self.store
                .set_saving_screenshot(&record.user_id, &record.id, &blob_ref)?;
            Ok(blob_ref)
        };
        match attach() {
            Ok(blob_ref) => {
                record.screenshot = Some(blob_ref);
                None
            }
            Err(e) => {
                warn!(
                    "Screenshot attachment failed for record {}: {}",
                    record.id, e
                );
                Some(e.to_string())
            }
        }
    }

    fn release_blob(&self, storage_path: &str) {
        if let Err(e) = self.blobs.delete(storage_path) {
            warn!("Failed to release blob {}: {}", storage_path, e);
        }
    }
}
