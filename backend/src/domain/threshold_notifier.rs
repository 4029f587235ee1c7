//! Threshold notifier: reacts to committed budget and savings-goal updates
//! and emits a notification the moment an aggregate crosses its target.
//!
//! Edge-triggered: the decision looks at the before AND after snapshots of
//! the same update, so writes that stay at or above the target do not
//! re-notify, and dropping back below re-arms the crossing. The notifier
//! keeps no state of its own; re-delivery of the same change pair at worst
//! duplicates the notification, which downstream delivery deduplicates.

use std::sync::Arc;

use log::info;

use crate::domain::models::budget::Budget;
use crate::domain::models::notification::{ThresholdKind, ThresholdNotification};
use crate::domain::models::savings_goal::SavingsGoal;
use crate::storage::traits::{
    BudgetStorage, DocumentChange, NotificationSink, SavingsGoalStorage, SubscriptionId,
};

/// Whether a single update moved the aggregate from below its target to at
/// or above it.
pub fn threshold_crossed(
    before_current: f64,
    before_target: f64,
    after_current: f64,
    after_target: f64,
) -> bool {
    let was_below = before_current < before_target;
    let is_at_or_above = after_current >= after_target;
    was_below && is_at_or_above
}

pub struct ThresholdNotifier {
    sink: Arc<dyn NotificationSink>,
}

impl ThresholdNotifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    pub fn on_budget_update(&self, change: &DocumentChange<Budget>) {
        let before = &change.before;
        let after = &change.after;
        if threshold_crossed(
            before.spent_amount,
            before.amount,
            after.spent_amount,
            after.amount,
        ) {
            info!(
                "User {} has reached the limit for budget \"{}\" (spent {:.2}, budget {:.2})",
                after.user_id, after.name, after.spent_amount, after.amount
            );
            self.sink.deliver(&ThresholdNotification {
                kind: ThresholdKind::BudgetLimitReached,
                user_id: after.user_id.clone(),
                entity_name: after.name.clone(),
                current_value: after.spent_amount,
                target_value: after.amount,
            });
        }
    }

    pub fn on_goal_update(&self, change: &DocumentChange<SavingsGoal>) {
        let before = &change.before;
        let after = &change.after;
        if threshold_crossed(
            before.current_amount,
            before.target_amount,
            after.current_amount,
            after.target_amount,
        ) {
            info!(
                "User {} has reached the savings goal \"{}\" (saved {:.2}, target {:.2})",
                after.user_id, after.name, after.current_amount, after.target_amount
            );
            self.sink.deliver(&ThresholdNotification {
                kind: ThresholdKind::SavingsGoalReached,
                user_id: after.user_id.clone(),
                entity_name: after.name.clone(),
                current_value: after.current_amount,
                target_value: after.target_amount,
            });
        }
    }

    /// Subscribe to both update streams of the store. Returns the handles,
    /// which keep the subscriptions alive until passed back to the store.
    pub fn watch<S>(self: &Arc<Self>, store: &S) -> (SubscriptionId, SubscriptionId)
    where
        S: BudgetStorage + SavingsGoalStorage + ?Sized,
    {
        let notifier = Arc::clone(self);
        let budgets = store
            .subscribe_budget_updates(Box::new(move |change| notifier.on_budget_update(change)));
        let notifier = Arc::clone(self);
        let goals =
            store.subscribe_goal_updates(Box::new(move |change| notifier.on_goal_update(change)));
        (budgets, goals)
    }
}

/// Default sink: logs the payload. Stands in for real push/email delivery.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&self, notification: &ThresholdNotification) {
        info!(
            "notification for {}: {:?} \"{}\" at {:.2}/{:.2}",
            notification.user_id,
            notification.kind,
            notification.entity_name,
            notification.current_value,
            notification.target_value
        );
    }
}
