//! Expense service: keeps a budget's spent counter consistent with its
//! expenses across create, edit and delete.
//!
//! Every amount mutation goes through the store's transactional child
//! operations, which read the parent's current counter at commit time. The
//! file step (upload, then patch the record with the reference) runs after
//! the transaction, keyed by the new record's id, and its failure leaves the
//! record and counter committed - a recoverable degraded state the caller is
//! told about via `attachment_error`.

use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};

use crate::domain::commands::expense::{
    DeleteExpenseCommand, DeleteExpenseResult, EditExpenseCommand, ExpenseResult,
    LogExpenseCommand,
};
use crate::domain::errors::DomainError;
use crate::domain::models::expense::{
    validate_record_fields, AttachmentUpload, BlobRef, Expense,
};
use crate::domain::retry_transaction;
use crate::storage::traits::{AttachmentKind, BlobStorage, EntityStore, StorageError};

pub struct ExpenseService {
    store: Arc<dyn EntityStore>,
    blobs: Arc<dyn BlobStorage>,
}

impl ExpenseService {
    pub fn new(store: Arc<dyn EntityStore>, blobs: Arc<dyn BlobStorage>) -> Self {
        Self { store, blobs }
    }

    pub fn list_expenses(
        &self,
        user_id: &str,
        budget_id: &str,
    ) -> Result<Vec<Expense>, DomainError> {
        Ok(self.store.list_expenses(user_id, budget_id)?)
    }

    /// Log a new expense against a budget.
    pub fn log_expense(&self, command: LogExpenseCommand) -> Result<ExpenseResult, DomainError> {
        validate_record_fields(&command.description, command.amount)
            .map_err(|e| DomainError::Validation(e.to_string()))?;

        self.store
            .get_budget(&command.user_id, &command.budget_id)?
            .ok_or(DomainError::NotFound)?;

        let mut expense = Expense {
            id: Expense::generate_id(),
            budget_id: command.budget_id.clone(),
            description: command.description.trim().to_string(),
            amount: command.amount,
            date: command.date.unwrap_or_else(Utc::now),
            user_id: command.user_id.clone(),
            receipt: None,
        };

        retry_transaction(|| self.store.record_expense(&expense))?;
        info!(
            "Logged expense {} (${:.2}) against budget {}",
            expense.id, expense.amount, expense.budget_id
        );

        let attachment_error = match &command.receipt {
            Some(file) => self.attach_receipt(&mut expense, file),
            None => None,
        };

        let success_message = match &attachment_error {
            None => "Expense logged".to_string(),
            Some(_) => "Expense logged, but the receipt upload failed".to_string(),
        };
        Ok(ExpenseResult {
            expense,
            attachment_error,
            success_message,
        })
    }

    /// Edit an existing expense. The aggregate delta is computed from the
    /// caller-supplied `previous_amount`, never re-derived from a read.
    pub fn edit_expense(&self, command: EditExpenseCommand) -> Result<ExpenseResult, DomainError> {
        validate_record_fields(&command.description, command.amount)
            .map_err(|e| DomainError::Validation(e.to_string()))?;

        let existing = self
            .store
            .get_expense(&command.user_id, &command.expense_id)?
            .filter(|e| e.budget_id == command.budget_id)
            .ok_or(DomainError::NotFound)?;

        let delta = command.amount - command.previous_amount;
        let mut expense = Expense {
            id: existing.id.clone(),
            budget_id: command.budget_id.clone(),
            description: command.description.trim().to_string(),
            amount: command.amount,
            date: command.date.unwrap_or(existing.date),
            user_id: command.user_id.clone(),
            receipt: existing.receipt.clone(),
        };

        retry_transaction(|| self.store.update_expense(&expense, delta))?;
        info!(
            "Updated expense {} ({:+.2} against budget {})",
            expense.id, delta, expense.budget_id
        );

        let attachment_error = match &command.receipt {
            Some(file) => {
                if let Some(old) = &existing.receipt {
                    self.release_blob(&old.storage_path);
                }
                self.attach_receipt(&mut expense, file)
            }
            None => None,
        };

        let success_message = match &attachment_error {
            None => "Expense updated".to_string(),
            Some(_) => "Expense updated, but the receipt upload failed".to_string(),
        };
        Ok(ExpenseResult {
            expense,
            attachment_error,
            success_message,
        })
    }

    /// Delete an expense, subtracting its caller-supplied amount from the
    /// parent budget and releasing any attached receipt.
    pub fn delete_expense(
        &self,
        command: DeleteExpenseCommand,
    ) -> Result<DeleteExpenseResult, DomainError> {
        let existing = self
            .store
            .get_expense(&command.user_id, &command.expense_id)?
            .filter(|e| e.budget_id == command.budget_id)
            .ok_or(DomainError::NotFound)?;

        retry_transaction(|| {
            self.store.remove_expense(
                &command.user_id,
                &command.budget_id,
                &command.expense_id,
                command.amount,
            )
        })?;
        info!(
            "Deleted expense {} (-${:.2} against budget {})",
            command.expense_id, command.amount, command.budget_id
        );

        if let Some(receipt) = &existing.receipt {
            self.release_blob(&receipt.storage_path);
        }

        Ok(DeleteExpenseResult {
            success_message: "Expense deleted".to_string(),
        })
    }

    /// Upload the receipt keyed by the expense id, then patch the record
    /// with the returned reference. Runs outside the aggregate transaction;
    /// returns the error message on failure instead of propagating.
    fn attach_receipt(&self, expense: &mut Expense, file: &AttachmentUpload) -> Option<String> {
        let attach = || -> Result<BlobRef, StorageError> {
            let blob_ref = self.blobs.upload(
                &expense.user_id,
                AttachmentKind::ExpenseReceipt,
                &expense.id,
                file,
            )?;
            self.store
                .set_expense_receipt(&expense.user_id, &expense.id, &blob_ref)?;
            Ok(blob_ref)
        };
        match attach() {
            Ok(blob_ref) => {
                expense.receipt = Some(blob_ref);
                None
            }
            Err(e) => {
                warn!("Receipt attachment failed for expense {}: {}", expense.id, e);
                Some(e.to_string())
            }
        }
    }

    /// Best-effort blob release: a missing object is success at the storage
    /// layer, and any other failure must not block the metadata update.
    fn release_blob(&self, storage_path: &str) {
        if let Err(e) = self.blobs.delete(storage_path) {
            warn!("Failed to release blob {}: {}", storage_path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::budget::CreateBudgetCommand;
    use crate::domain::BudgetService;
    use crate::storage::memory::{MemoryBlobStore, MemoryStore};
    use crate::storage::test_utils::{ConflictingStore, FailingBlobStore};
    use crate::storage::traits::{BudgetStorage, ExpenseStorage};

    fn services() -> (BudgetService, ExpenseService, Arc<MemoryStore>, Arc<MemoryBlobStore>) {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let budget_service = BudgetService::new(store.clone(), blobs.clone());
        let expense_service = ExpenseService::new(store.clone(), blobs.clone());
        (budget_service, expense_service, store, blobs)
    }

    fn create_budget(service: &BudgetService, user_id: &str, amount: f64) -> String {
        service
            .create_budget(CreateBudgetCommand {
                user_id: user_id.to_string(),
                name: "Groceries".to_string(),
                amount,
                deadline: Utc::now(),
            })
            .expect("Failed to create budget")
            .budget
            .id
    }

    fn log(service: &ExpenseService, user_id: &str, budget_id: &str, amount: f64) -> Expense {
        service
            .log_expense(LogExpenseCommand {
                user_id: user_id.to_string(),
                budget_id: budget_id.to_string(),
                description: "Weekly groceries".to_string(),
                amount,
                date: None,
                receipt: None,
            })
            .expect("Failed to log expense")
            .expense
    }

    fn spent(store: &MemoryStore, user_id: &str, budget_id: &str) -> f64 {
        store
            .get_budget(user_id, budget_id)
            .unwrap()
            .unwrap()
            .spent_amount
    }

    #[test]
    fn logging_an_expense_increments_the_parent_counter() {
        let (budgets, expenses, store, _) = services();
        let budget_id = create_budget(&budgets, "user-1", 100.0);

        log(&expenses, "user-1", &budget_id, 25.0);
        log(&expenses, "user-1", &budget_id, 30.0);

        assert_eq!(spent(&store, "user-1", &budget_id), 55.0);
    }

    #[test]
    fn editing_applies_the_delta_not_a_recomputed_sum() {
        let (budgets, expenses, store, _) = services();
        let budget_id = create_budget(&budgets, "user-1", 100.0);
        let expense = log(&expenses, "user-1", &budget_id, 50.0);
        log(&expenses, "user-1", &budget_id, 10.0);

        expenses
            .edit_expense(EditExpenseCommand {
                user_id: "user-1".to_string(),
                expense_id: expense.id.clone(),
                budget_id: budget_id.clone(),
                previous_amount: 50.0,
                description: "Weekly groceries".to_string(),
                amount: 80.0,
                date: None,
                receipt: None,
            })
            .expect("Failed to edit expense");

        // 50 + 10, then +30 from the edit
        assert_eq!(spent(&store, "user-1", &budget_id), 90.0);
    }

    #[test]
    fn deleting_subtracts_the_supplied_amount() {
        let (budgets, expenses, store, _) = services();
        let budget_id = create_budget(&budgets, "user-1", 100.0);
        let expense = log(&expenses, "user-1", &budget_id, 40.0);
        log(&expenses, "user-1", &budget_id, 15.0);

        expenses
            .delete_expense(DeleteExpenseCommand {
                user_id: "user-1".to_string(),
                expense_id: expense.id.clone(),
                budget_id: budget_id.clone(),
                amount: 40.0,
            })
            .expect("Failed to delete expense");

        assert_eq!(spent(&store, "user-1", &budget_id), 15.0);
        assert!(store.get_expense("user-1", &expense.id).unwrap().is_none());
    }

    #[test]
    fn counter_equals_sum_of_live_children_after_mixed_operations() {
        let (budgets, expenses, store, _) = services();
        let budget_id = create_budget(&budgets, "user-1", 500.0);

        let a = log(&expenses, "user-1", &budget_id, 20.0);
        let b = log(&expenses, "user-1", &budget_id, 35.0);
        log(&expenses, "user-1", &budget_id, 45.0);

        expenses
            .edit_expense(EditExpenseCommand {
                user_id: "user-1".to_string(),
                expense_id: a.id.clone(),
                budget_id: budget_id.clone(),
                previous_amount: 20.0,
                description: "Adjusted".to_string(),
                amount: 60.0,
                date: None,
                receipt: None,
            })
            .unwrap();
        expenses
            .delete_expense(DeleteExpenseCommand {
                user_id: "user-1".to_string(),
                expense_id: b.id.clone(),
                budget_id: budget_id.clone(),
                amount: 35.0,
            })
            .unwrap();

        let live_sum: f64 = store
            .list_expenses("user-1", &budget_id)
            .unwrap()
            .iter()
            .map(|e| e.amount)
            .sum();
        assert_eq!(live_sum, 105.0);
        assert_eq!(spent(&store, "user-1", &budget_id), live_sum);
    }

    #[test]
    fn rejects_non_positive_amounts_before_any_write() {
        let (budgets, expenses, store, _) = services();
        let budget_id = create_budget(&budgets, "user-1", 100.0);

        let err = expenses
            .log_expense(LogExpenseCommand {
                user_id: "user-1".to_string(),
                budget_id: budget_id.clone(),
                description: "Bad".to_string(),
                amount: -5.0,
                date: None,
                receipt: None,
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(spent(&store, "user-1", &budget_id), 0.0);
        assert!(store.list_expenses("user-1", &budget_id).unwrap().is_empty());
    }

    #[test]
    fn foreign_budget_is_reported_as_not_found() {
        let (budgets, expenses, _, _) = services();
        let budget_id = create_budget(&budgets, "user-1", 100.0);

        let err = expenses
            .log_expense(LogExpenseCommand {
                user_id: "user-2".to_string(),
                budget_id,
                description: "Sneaky".to_string(),
                amount: 5.0,
                date: None,
                receipt: None,
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[test]
    fn receipt_is_uploaded_after_the_record_and_patched_in() {
        let (budgets, expenses, store, blobs) = services();
        let budget_id = create_budget(&budgets, "user-1", 100.0);

        let result = expenses
            .log_expense(LogExpenseCommand {
                user_id: "user-1".to_string(),
                budget_id: budget_id.clone(),
                description: "With receipt".to_string(),
                amount: 12.0,
                date: None,
                receipt: Some(AttachmentUpload {
                    file_name: "receipt.png".to_string(),
                    bytes: vec![0xFF, 0xD8],
                }),
            })
            .unwrap();

        assert!(result.attachment_error.is_none());
        let receipt = result.expense.receipt.expect("receipt missing");
        // keyed by the record's id
        assert!(receipt.storage_path.contains(&result.expense.id));
        assert!(blobs.contains(&receipt.storage_path));

        let stored = store
            .get_expense("user-1", &result.expense.id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.receipt, Some(receipt));
    }

    #[test]
    fn upload_failure_is_non_fatal_and_reported_separately() {
        let store = Arc::new(MemoryStore::new());
        let budgets = BudgetService::new(store.clone(), Arc::new(FailingBlobStore));
        let expenses = ExpenseService::new(store.clone(), Arc::new(FailingBlobStore));
        let budget_id = create_budget(&budgets, "user-1", 100.0);

        let result = expenses
            .log_expense(LogExpenseCommand {
                user_id: "user-1".to_string(),
                budget_id: budget_id.clone(),
                description: "Receipt refused".to_string(),
                amount: 18.0,
                date: None,
                receipt: Some(AttachmentUpload {
                    file_name: "receipt.png".to_string(),
                    bytes: vec![1],
                }),
            })
            .unwrap();

        // record and counter stand; only the file step failed
        assert!(result.attachment_error.is_some());
        assert!(result.expense.receipt.is_none());
        assert_eq!(spent(&store, "user-1", &budget_id), 18.0);
        assert!(store
            .get_expense("user-1", &result.expense.id)
            .unwrap()
            .is_some());
    }

    #[test]
    fn replacing_a_receipt_releases_the_old_blob_first() {
        let (budgets, expenses, _, blobs) = services();
        let budget_id = create_budget(&budgets, "user-1", 100.0);

        let first = expenses
            .log_expense(LogExpenseCommand {
                user_id: "user-1".to_string(),
                budget_id: budget_id.clone(),
                description: "With receipt".to_string(),
                amount: 12.0,
                date: None,
                receipt: Some(AttachmentUpload {
                    file_name: "old.png".to_string(),
                    bytes: vec![1],
                }),
            })
            .unwrap();
        let old_path = first.expense.receipt.as_ref().unwrap().storage_path.clone();

        let edited = expenses
            .edit_expense(EditExpenseCommand {
                user_id: "user-1".to_string(),
                expense_id: first.expense.id.clone(),
                budget_id: budget_id.clone(),
                previous_amount: 12.0,
                description: "With new receipt".to_string(),
                amount: 12.0,
                date: None,
                receipt: Some(AttachmentUpload {
                    file_name: "new.png".to_string(),
                    bytes: vec![2],
                }),
            })
            .unwrap();

        assert!(!blobs.contains(&old_path));
        let new_path = &edited.expense.receipt.as_ref().unwrap().storage_path;
        assert!(blobs.contains(new_path));
        assert_eq!(blobs.object_count(), 1);
    }

    #[test]
    fn transient_conflicts_are_retried_until_commit() {
        let inner = Arc::new(MemoryStore::new());
        let flaky = Arc::new(ConflictingStore::new(inner.clone(), 2));
        let blobs = Arc::new(MemoryBlobStore::new());
        let budgets = BudgetService::new(inner.clone(), blobs.clone());
        let expenses = ExpenseService::new(flaky, blobs);
        let budget_id = create_budget(&budgets, "user-1", 100.0);

        let result = expenses.log_expense(LogExpenseCommand {
            user_id: "user-1".to_string(),
            budget_id: budget_id.clone(),
            description: "Eventually lands".to_string(),
            amount: 9.0,
            date: None,
            receipt: None,
        });

        assert!(result.is_ok());
        assert_eq!(spent(&inner, "user-1", &budget_id), 9.0);
    }

    #[test]
    fn exhausted_retries_leave_no_partial_mutation() {
        let inner = Arc::new(MemoryStore::new());
        let flaky = Arc::new(ConflictingStore::new(inner.clone(), 10));
        let blobs = Arc::new(MemoryBlobStore::new());
        let budgets = BudgetService::new(inner.clone(), blobs.clone());
        let expenses = ExpenseService::new(flaky, blobs);
        let budget_id = create_budget(&budgets, "user-1", 100.0);

        let err = expenses
            .log_expense(LogExpenseCommand {
                user_id: "user-1".to_string(),
                budget_id: budget_id.clone(),
                description: "Never lands".to_string(),
                amount: 9.0,
                date: None,
                receipt: None,
            })
            .unwrap_err();

        assert!(matches!(err, DomainError::Storage(_)));
        assert_eq!(spent(&inner, "user-1", &budget_id), 0.0);
        assert!(inner.list_expenses("user-1", &budget_id).unwrap().is_empty());
    }

    #[test]
    fn interleaved_edit_and_delete_converge_to_the_surviving_sum() {
        for iteration in 0..25 {
            let (budgets, _, store, blobs) = services();
            let budget_id = create_budget(&budgets, "user-1", 1000.0);
            let expenses = Arc::new(ExpenseService::new(
                store.clone() as Arc<dyn EntityStore>,
                blobs.clone() as Arc<dyn BlobStorage>,
            ));

            let keep = log(&expenses, "user-1", &budget_id, 50.0);
            let doomed = log(&expenses, "user-1", &budget_id, 70.0);

            let edit_service = expenses.clone();
            let edit_budget = budget_id.clone();
            let edit_id = keep.id.clone();
            let editor = std::thread::spawn(move || {
                edit_service
                    .edit_expense(EditExpenseCommand {
                        user_id: "user-1".to_string(),
                        expense_id: edit_id,
                        budget_id: edit_budget,
                        previous_amount: 50.0,
                        description: "Edited".to_string(),
                        amount: 80.0,
                        date: None,
                        receipt: None,
                    })
                    .unwrap();
            });

            let delete_service = expenses.clone();
            let delete_budget = budget_id.clone();
            let delete_id = doomed.id.clone();
            let deleter = std::thread::spawn(move || {
                delete_service
                    .delete_expense(DeleteExpenseCommand {
                        user_id: "user-1".to_string(),
                        expense_id: delete_id,
                        budget_id: delete_budget,
                        amount: 70.0,
                    })
                    .unwrap();
            });

            editor.join().unwrap();
            deleter.join().unwrap();

            assert_eq!(
                spent(&store, "user-1", &budget_id),
                80.0,
                "diverged on iteration {}",
                iteration
            );
        }
    }
}
