//! Domain layer: services, models and commands.

pub mod budget_service;
pub mod commands;
pub mod errors;
pub mod expense_service;
pub mod models;
pub mod savings_goal_service;
pub mod savings_record_service;
pub mod threshold_notifier;
pub mod tips;

pub use budget_service::BudgetService;
pub use errors::DomainError;
pub use expense_service::ExpenseService;
pub use savings_goal_service::SavingsGoalService;
pub use savings_record_service::SavingsRecordService;
pub use threshold_notifier::ThresholdNotifier;

use log::warn;

use crate::storage::traits::StorageError;

const MAX_TRANSACTION_ATTEMPTS: u32 = 3;

/// Run an aggregate transaction, retrying on conflict.
///
/// Each attempt is a fresh transaction that re-reads the current committed
/// state inside the store, so a retry can never replay a stale snapshot.
pub(crate) fn retry_transaction<T>(
    mut transaction: impl FnMut() -> Result<T, StorageError>,
) -> Result<T, StorageError> {
    let mut attempt = 1;
    loop {
        match transaction() {
            Err(StorageError::Conflict) if attempt < MAX_TRANSACTION_ATTEMPTS => {
                warn!(
                    "aggregate transaction conflict, retrying (attempt {}/{})",
                    attempt, MAX_TRANSACTION_ATTEMPTS
                );
                attempt += 1;
            }
            other => return other,
        }
    }
}
