//! Shared storage test doubles.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::models::budget::Budget;
use crate::domain::models::expense::{AttachmentUpload, BlobRef, Expense};
use crate::domain::models::notification::ThresholdNotification;
use crate::domain::models::savings_goal::SavingsGoal;
use crate::domain::models::savings_record::SavingsRecord;
use crate::storage::memory::MemoryStore;
use crate::storage::traits::{
    AttachmentKind, BlobStorage, BudgetObserver, BudgetStorage, ExpenseStorage,
    NotificationSink, SavingsGoalObserver, SavingsGoalStorage, SavingsRecordStorage,
    StorageError, SubscriptionId,
};

/// Notification sink that records every delivered payload.
#[derive(Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<ThresholdNotification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<ThresholdNotification> {
        self.delivered.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, notification: &ThresholdNotification) {
        self.delivered.lock().unwrap().push(notification.clone());
    }
}

/// Blob store whose uploads and deletions always fail.
pub struct FailingBlobStore;

impl BlobStorage for FailingBlobStore {
    fn upload(
        &self,
        _user_id: &str,
        _kind: AttachmentKind,
        _record_id: &str,
        _file: &AttachmentUpload,
    ) -> Result<BlobRef, StorageError> {
        Err(StorageError::Backend("upload refused".to_string()))
    }

    fn delete(&self, _storage_path: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend("delete refused".to_string()))
    }
}

/// Wraps a [`MemoryStore`] and answers the first N aggregate transactions
/// with a conflict, to exercise the bounded-retry path in services.
pub struct ConflictingStore {
    inner: Arc<MemoryStore>,
    conflicts_remaining: AtomicU32,
}

impl ConflictingStore {
    pub fn new(inner: Arc<MemoryStore>, conflicts: u32) -> Self {
        Self {
            inner,
            conflicts_remaining: AtomicU32::new(conflicts),
        }
    }

    fn maybe_conflict(&self) -> Result<(), StorageError> {
        let remaining = self.conflicts_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.conflicts_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(StorageError::Conflict);
        }
        Ok(())
    }
}

impl BudgetStorage for ConflictingStore {
    fn store_budget(&self, budget: &Budget) -> Result<(), StorageError> {
        self.inner.store_budget(budget)
    }
    fn get_budget(&self, user_id: &str, budget_id: &str) -> Result<Option<Budget>, StorageError> {
        self.inner.get_budget(user_id, budget_id)
    }
    fn list_budgets(&self, user_id: &str) -> Result<Vec<Budget>, StorageError> {
        self.inner.list_budgets(user_id)
    }
    fn update_budget(&self, budget: &Budget) -> Result<(), StorageError> {
        self.inner.update_budget(budget)
    }
    fn delete_budget_with_expenses(
        &self,
        user_id: &str,
        budget_id: &str,
    ) -> Result<(Budget, Vec<Expense>), StorageError> {
        self.inner.delete_budget_with_expenses(user_id, budget_id)
    }
    fn subscribe_budget_updates(&self, observer: BudgetObserver) -> SubscriptionId {
        self.inner.subscribe_budget_updates(observer)
    }
    fn unsubscribe_budget_updates(&self, id: SubscriptionId) {
        self.inner.unsubscribe_budget_updates(id)
    }
}

impl ExpenseStorage for ConflictingStore {
    fn record_expense(&self, expense: &Expense) -> Result<(), StorageError> {
        self.maybe_conflict()?;
        self.inner.record_expense(expense)
    }
    fn get_expense(
        &self,
        user_id: &str,
        expense_id: &str,
    ) -> Result<Option<Expense>, StorageError> {
        self.inner.get_expense(user_id, expense_id)
    }
    fn list_expenses(&self, user_id: &str, budget_id: &str) -> Result<Vec<Expense>, StorageError> {
        self.inner.list_expenses(user_id, budget_id)
    }
    fn update_expense(&self, expense: &Expense, amount_delta: f64) -> Result<(), StorageError> {
        self.maybe_conflict()?;
        self.inner.update_expense(expense, amount_delta)
    }
    fn remove_expense(
        &self,
        user_id: &str,
        budget_id: &str,
        expense_id: &str,
        amount: f64,
    ) -> Result<(), StorageError> {
        self.maybe_conflict()?;
        self.inner.remove_expense(user_id, budget_id, expense_id, amount)
    }
    fn set_expense_receipt(
        &self,
        user_id: &str,
        expense_id: &str,
        receipt: &BlobRef,
    ) -> Result<(), StorageError> {
        self.inner.set_expense_receipt(user_id, expense_id, receipt)
    }
}

impl SavingsGoalStorage for ConflictingStore {
    fn store_goal(&self, goal: &SavingsGoal) -> Result<(), StorageError> {
        self.inner.store_goal(goal)
    }
    fn get_goal(&self, user_id: &str, goal_id: &str) -> Result<Option<SavingsGoal>, StorageError> {
        self.inner.get_goal(user_id, goal_id)
    }
    fn list_goals(&self, user_id: &str) -> Result<Vec<SavingsGoal>, StorageError> {
        self.inner.list_goals(user_id)
    }
    fn update_goal(&self, goal: &SavingsGoal) -> Result<(), StorageError> {
        self.inner.update_goal(goal)
    }
    fn delete_goal_with_records(
        &self,
        user_id: &str,
        goal_id: &str,
    ) -> Result<(SavingsGoal, Vec<SavingsRecord>), StorageError> {
        self.inner.delete_goal_with_records(user_id, goal_id)
    }
    fn subscribe_goal_updates(&self, observer: SavingsGoalObserver) -> SubscriptionId {
        self.inner.subscribe_goal_updates(observer)
    }
    fn unsubscribe_goal_updates(&self, id: SubscriptionId) {
        self.inner.unsubscribe_goal_updates(id)
    }
}

impl SavingsRecordStorage for ConflictingStore {
    fn record_saving(&self, record: &SavingsRecord) -> Result<(), StorageError> {
        self.maybe_conflict()?;
        self.inner.record_saving(record)
    }
    fn get_saving(
        &self,
        user_id: &str,
        record_id: &str,
    ) -> Result<Option<SavingsRecord>, StorageError> {
        self.inner.get_saving(user_id, record_id)
    }
    fn list_savings(
        &self,
        user_id: &str,
        goal_id: &str,
    ) -> Result<Vec<SavingsRecord>, StorageError> {
        self.inner.list_savings(user_id, goal_id)
    }
    fn update_saving(&self, record: &SavingsRecord, amount_delta: f64) -> Result<(), StorageError> {
        self.maybe_conflict()?;
        self.inner.update_saving(record, amount_delta)
    }
    fn remove_saving(
        &self,
        user_id: &str,
        goal_id: &str,
        record_id: &str,
        amount: f64,
    ) -> Result<(), StorageError> {
        self.maybe_conflict()?;
        self.inner.remove_saving(user_id, goal_id, record_id, amount)
    }
    fn set_saving_screenshot(
        &self,
        user_id: &str,
        record_id: &str,
        screenshot: &BlobRef,
    ) -> Result<(), StorageError> {
        self.inner.set_saving_screenshot(user_id, record_id, screenshot)
    }
}
