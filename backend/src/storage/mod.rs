//! Storage layer: the injected platform collaborator.

pub mod memory;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

pub use traits::{
    AttachmentKind, BlobStorage, BudgetStorage, DocumentChange, EntityStore, ExpenseStorage,
    NotificationSink, SavingsGoalStorage, SavingsRecordStorage, StorageError, SubscriptionId,
};
