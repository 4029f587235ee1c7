//! # Storage Traits
//!
//! The persisted entity store, blob storage and notification sink are
//! external collaborators. These traits define the capability set the domain
//! layer depends on, so any backend (the managed platform in production, the
//! in-memory store in tests) can be injected without touching the services.
//!
//! Every aggregate mutation goes through the transactional child operations
//! on these traits: the store reads the parent's current counter and writes
//! the adjusted value in a single committed step. No caller may read an
//! aggregate and blind-write it back.

use crate::domain::models::budget::Budget;
use crate::domain::models::expense::{AttachmentUpload, BlobRef, Expense};
use crate::domain::models::notification::ThresholdNotification;
use crate::domain::models::savings_goal::SavingsGoal;
use crate::domain::models::savings_record::SavingsRecord;

/// Errors surfaced by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A transactional write lost a race and should be retried with a fresh
    /// read of the current state
    #[error("transaction conflict")]
    Conflict,
    /// The referenced document does not exist, or does not belong to the
    /// requesting owner; callers cannot tell the two apart
    #[error("document not found")]
    NotFound,
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Committed before/after snapshot pair for a single update event.
#[derive(Debug, Clone)]
pub struct DocumentChange<T> {
    pub before: T,
    pub after: T,
}

/// Handle returned by a subscription; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

pub type BudgetObserver = Box<dyn Fn(&DocumentChange<Budget>) + Send + Sync>;
pub type SavingsGoalObserver = Box<dyn Fn(&DocumentChange<SavingsGoal>) + Send + Sync>;

/// Budget document operations plus the update change stream.
///
/// The change stream is at-least-once: observers run after the write is
/// durable, may see the same change more than once, and must not assume
/// exactly-once delivery.
pub trait BudgetStorage: Send + Sync {
    fn store_budget(&self, budget: &Budget) -> Result<(), StorageError>;

    /// Owner-scoped lookup; a budget owned by another user is `None`
    fn get_budget(&self, user_id: &str, budget_id: &str) -> Result<Option<Budget>, StorageError>;

    /// List all budgets for an owner, most recently created first
    fn list_budgets(&self, user_id: &str) -> Result<Vec<Budget>, StorageError>;

    /// Rewrite the user-editable fields (never the spent counter)
    fn update_budget(&self, budget: &Budget) -> Result<(), StorageError>;

    /// Atomically remove a budget and all expenses referencing it, returning
    /// what was removed so attached files can be released afterwards
    fn delete_budget_with_expenses(
        &self,
        user_id: &str,
        budget_id: &str,
    ) -> Result<(Budget, Vec<Expense>), StorageError>;

    fn subscribe_budget_updates(&self, observer: BudgetObserver) -> SubscriptionId;
    fn unsubscribe_budget_updates(&self, id: SubscriptionId);
}

/// Expense operations. The child-mutating calls also adjust the parent
/// budget's spent counter in the same committed transaction.
pub trait ExpenseStorage: Send + Sync {
    /// Insert the expense and add its amount to the parent's spent counter
    fn record_expense(&self, expense: &Expense) -> Result<(), StorageError>;

    fn get_expense(&self, user_id: &str, expense_id: &str) -> Result<Option<Expense>, StorageError>;

    /// List expenses for a budget, most recent date first
    fn list_expenses(&self, user_id: &str, budget_id: &str) -> Result<Vec<Expense>, StorageError>;

    /// Rewrite the expense's fields and add `amount_delta` to the parent's
    /// spent counter, atomically
    fn update_expense(&self, expense: &Expense, amount_delta: f64) -> Result<(), StorageError>;

    /// Remove the expense and subtract `amount` from the parent's spent
    /// counter, atomically
    fn remove_expense(
        &self,
        user_id: &str,
        budget_id: &str,
        expense_id: &str,
        amount: f64,
    ) -> Result<(), StorageError>;

    /// Patch only the receipt reference; part of the out-of-band file step,
    /// deliberately not coupled to any aggregate transaction
    fn set_expense_receipt(
        &self,
        user_id: &str,
        expense_id: &str,
        receipt: &BlobRef,
    ) -> Result<(), StorageError>;
}

/// Savings goal operations, mirroring `BudgetStorage`.
pub trait SavingsGoalStorage: Send + Sync {
    fn store_goal(&self, goal: &SavingsGoal) -> Result<(), StorageError>;
    fn get_goal(&self, user_id: &str, goal_id: &str) -> Result<Option<SavingsGoal>, StorageError>;
    fn list_goals(&self, user_id: &str) -> Result<Vec<SavingsGoal>, StorageError>;
    fn update_goal(&self, goal: &SavingsGoal) -> Result<(), StorageError>;
    fn delete_goal_with_records(
        &self,
        user_id: &str,
        goal_id: &str,
    ) -> Result<(SavingsGoal, Vec<SavingsRecord>), StorageError>;
    fn subscribe_goal_updates(&self, observer: SavingsGoalObserver) -> SubscriptionId;
    fn unsubscribe_goal_updates(&self, id: SubscriptionId);
}

/// Savings record operations, mirroring `ExpenseStorage`.
pub trait SavingsRecordStorage: Send + Sync {
    fn record_saving(&self, record: &SavingsRecord) -> Result<(), StorageError>;
    fn get_saving(&self, user_id: &str, record_id: &str)
        -> Result<Option<SavingsRecord>, StorageError>;
    fn list_savings(&self, user_id: &str, goal_id: &str)
        -> Result<Vec<SavingsRecord>, StorageError>;
    fn update_saving(&self, record: &SavingsRecord, amount_delta: f64)
        -> Result<(), StorageError>;
    fn remove_saving(
        &self,
        user_id: &str,
        goal_id: &str,
        record_id: &str,
        amount: f64,
    ) -> Result<(), StorageError>;
    fn set_saving_screenshot(
        &self,
        user_id: &str,
        record_id: &str,
        screenshot: &BlobRef,
    ) -> Result<(), StorageError>;
}

/// Full capability set of the entity store, as injected into services.
pub trait EntityStore:
    BudgetStorage + ExpenseStorage + SavingsGoalStorage + SavingsRecordStorage
{
}

impl<T> EntityStore for T where
    T: BudgetStorage + ExpenseStorage + SavingsGoalStorage + SavingsRecordStorage
{
}

/// What kind of record an attachment belongs to; determines the storage
/// path prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    ExpenseReceipt,
    SavingsScreenshot,
}

impl AttachmentKind {
    pub fn path_prefix(&self) -> &'static str {
        match self {
            AttachmentKind::ExpenseReceipt => "expense-receipts",
            AttachmentKind::SavingsScreenshot => "savings-screenshots",
        }
    }
}

/// Blob storage for receipts and screenshots.
pub trait BlobStorage: Send + Sync {
    /// Upload a file keyed by (owner, kind, record id) and return a durable
    /// reference
    fn upload(
        &self,
        user_id: &str,
        kind: AttachmentKind,
        record_id: &str,
        file: &AttachmentUpload,
    ) -> Result<BlobRef, StorageError>;

    /// Delete by storage path. Deleting an object that does not exist is
    /// success, not an error.
    fn delete(&self, storage_path: &str) -> Result<(), StorageError>;
}

/// Receives threshold notifications; actual delivery (push, email) happens
/// behind this boundary.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: &ThresholdNotification);
}
