//! Budget service: parent CRUD and cascade delete.

use std::sync::Arc;

use chrono::Utc;
use log::info;

use crate::domain::commands::budget::{
    CreateBudgetCommand, CreateBudgetResult, DeleteBudgetCommand, DeleteBudgetResult,
    UpdateBudgetCommand, UpdateBudgetResult,
};
use crate::domain::errors::DomainError;
use crate::domain::models::budget::{validate_budget_fields, Budget};
use crate::storage::traits::{BlobStorage, EntityStore};

pub struct BudgetService {
    store: Arc<dyn EntityStore>,
    blobs: Arc<dyn BlobStorage>,
}

impl BudgetService {
    pub fn new(store: Arc<dyn EntityStore>, blobs: Arc<dyn BlobStorage>) -> Self {
        Self { store, blobs }
    }

    pub fn create_budget(
        &self,
        command: CreateBudgetCommand,
    ) -> Result<CreateBudgetResult, DomainError> {
        validate_budget_fields(&command.name, command.amount)
            .map_err(|e| DomainError::Validation(e.to_string()))?;

        let budget = Budget {
            id: Budget::generate_id(),
            name: command.name.trim().to_string(),
            amount: command.amount,
            spent_amount: 0.0,
            deadline: command.deadline,
            user_id: command.user_id,
            created_at: Utc::now(),
        };
        self.store.store_budget(&budget)?;
        info!("Created budget {} (\"{}\")", budget.id, budget.name);

        Ok(CreateBudgetResult {
            budget,
            success_message: "Budget created".to_string(),
        })
    }

    pub fn get_budget(&self, user_id: &str, budget_id: &str) -> Result<Budget, DomainError> {
        self.store
            .get_budget(user_id, budget_id)?
            .ok_or(DomainError::NotFound)
    }

    pub fn list_budgets(&self, user_id: &str) -> Result<Vec<Budget>, DomainError> {
        Ok(self.store.list_budgets(user_id)?)
    }

    /// Update the user-editable fields. The spent counter is owned by the
    /// expense transactions and cannot be set here.
    pub fn update_budget(
        &self,
        command: UpdateBudgetCommand,
    ) -> Result<UpdateBudgetResult, DomainError> {
        let mut budget = self.get_budget(&command.user_id, &command.budget_id)?;

        if let Some(name) = command.name {
            budget.name = name;
        }
        if let Some(amount) = command.amount {
            budget.amount = amount;
        }
        if let Some(deadline) = command.deadline {
            budget.deadline = deadline;
        }
        validate_budget_fields(&budget.name, budget.amount)
            .map_err(|e| DomainError::Validation(e.to_string()))?;
        budget.name = budget.name.trim().to_string();

        self.store.update_budget(&budget)?;
        let budget = self.get_budget(&command.user_id, &command.budget_id)?;
        info!("Updated budget {}", budget.id);

        Ok(UpdateBudgetResult {
            budget,
            success_message: "Budget updated".to_string(),
        })
    }

    /// Delete a budget and everything it owns: all expenses go in the same
    /// atomic batch as the parent, then their receipts are released
    /// best-effort.
    pub fn delete_budget(
        &self,
        command: DeleteBudgetCommand,
    ) -> Result<DeleteBudgetResult, DomainError> {
        let (budget, deleted_expenses) = self
            .store
            .delete_budget_with_expenses(&command.user_id, &command.budget_id)?;
        info!(
            "Deleted budget {} and {} expense(s)",
            budget.id,
            deleted_expenses.len()
        );

        for expense in &deleted_expenses {
            if let Some(receipt) = &expense.receipt {
                if let Err(e) = self.blobs.delete(&receipt.storage_path) {
                    log::warn!("Failed to release receipt {}: {}", receipt.storage_path, e);
                }
            }
        }

        Ok(DeleteBudgetResult {
            budget,
            deleted_expenses,
            success_message: "Budget deleted".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::expense::LogExpenseCommand;
    use crate::domain::models::expense::AttachmentUpload;
    use crate::domain::ExpenseService;
    use crate::storage::memory::{MemoryBlobStore, MemoryStore};
    use crate::storage::traits::{BudgetStorage, ExpenseStorage};

    fn services() -> (BudgetService, ExpenseService, Arc<MemoryStore>, Arc<MemoryBlobStore>) {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        (
            BudgetService::new(store.clone(), blobs.clone()),
            ExpenseService::new(store.clone(), blobs.clone()),
            store,
            blobs,
        )
    }

    #[test]
    fn creates_with_a_zero_spent_counter() {
        let (budgets, _, _, _) = services();
        let result = budgets
            .create_budget(CreateBudgetCommand {
                user_id: "user-1".to_string(),
                name: "Groceries".to_string(),
                amount: 300.0,
                deadline: Utc::now(),
            })
            .unwrap();
        assert_eq!(result.budget.spent_amount, 0.0);
        assert_eq!(result.budget.amount, 300.0);
    }

    #[test]
    fn rejects_empty_name_and_non_positive_amount() {
        let (budgets, _, _, _) = services();
        assert!(matches!(
            budgets.create_budget(CreateBudgetCommand {
                user_id: "user-1".to_string(),
                name: "   ".to_string(),
                amount: 100.0,
                deadline: Utc::now(),
            }),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            budgets.create_budget(CreateBudgetCommand {
                user_id: "user-1".to_string(),
                name: "Groceries".to_string(),
                amount: 0.0,
                deadline: Utc::now(),
            }),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn lookup_across_owners_is_not_found() {
        let (budgets, _, _, _) = services();
        let id = budgets
            .create_budget(CreateBudgetCommand {
                user_id: "user-1".to_string(),
                name: "Groceries".to_string(),
                amount: 100.0,
                deadline: Utc::now(),
            })
            .unwrap()
            .budget
            .id;
        assert!(matches!(
            budgets.get_budget("user-2", &id),
            Err(DomainError::NotFound)
        ));
    }

    #[test]
    fn cascade_delete_removes_expenses_and_their_receipts() {
        let (budgets, expenses, store, blobs) = services();
        let budget_id = budgets
            .create_budget(CreateBudgetCommand {
                user_id: "user-1".to_string(),
                name: "Travel".to_string(),
                amount: 100.0,
                deadline: Utc::now(),
            })
            .unwrap()
            .budget
            .id;

        let with_receipt = expenses
            .log_expense(LogExpenseCommand {
                user_id: "user-1".to_string(),
                budget_id: budget_id.clone(),
                description: "Train ticket".to_string(),
                amount: 42.0,
                date: None,
                receipt: Some(AttachmentUpload {
                    file_name: "ticket.jpg".to_string(),
                    bytes: vec![1, 2],
                }),
            })
            .unwrap();
        let plain = expenses
            .log_expense(LogExpenseCommand {
                user_id: "user-1".to_string(),
                budget_id: budget_id.clone(),
                description: "Snacks".to_string(),
                amount: 8.0,
                date: None,
                receipt: None,
            })
            .unwrap();

        let result = budgets
            .delete_budget(DeleteBudgetCommand {
                user_id: "user-1".to_string(),
                budget_id: budget_id.clone(),
            })
            .unwrap();
        assert_eq!(result.deleted_expenses.len(), 2);

        assert!(store.get_budget("user-1", &budget_id).unwrap().is_none());
        assert!(store
            .get_expense("user-1", &with_receipt.expense.id)
            .unwrap()
            .is_none());
        assert!(store.get_expense("user-1", &plain.expense.id).unwrap().is_none());
        assert_eq!(blobs.object_count(), 0);
    }

    #[test]
    fn update_edits_fields_but_not_the_counter() {
        let (budgets, expenses, _, _) = services();
        let budget_id = budgets
            .create_budget(CreateBudgetCommand {
                user_id: "user-1".to_string(),
                name: "Groceries".to_string(),
                amount: 100.0,
                deadline: Utc::now(),
            })
            .unwrap()
            .budget
            .id;
        expenses
            .log_expense(LogExpenseCommand {
                user_id: "user-1".to_string(),
                budget_id: budget_id.clone(),
                description: "Bread".to_string(),
                amount: 30.0,
                date: None,
                receipt: None,
            })
            .unwrap();

        let result = budgets
            .update_budget(UpdateBudgetCommand {
                user_id: "user-1".to_string(),
                budget_id: budget_id.clone(),
                name: Some("Food".to_string()),
                amount: Some(250.0),
                deadline: None,
            })
            .unwrap();

        assert_eq!(result.budget.name, "Food");
        assert_eq!(result.budget.amount, 250.0);
        assert_eq!(result.budget.spent_amount, 30.0);
    }
}
