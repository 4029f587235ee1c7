//! Threshold notification payload.
use serde::{Deserialize, Serialize};

/// Which crossing produced the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdKind {
    BudgetLimitReached,
    SavingsGoalReached,
}

/// Payload handed to the notification sink when an aggregate crosses its
/// target. Delivery (push, email) happens downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdNotification {
    pub kind: ThresholdKind,
    pub user_id: String,
    pub entity_name: String,
    pub current_value: f64,
    pub target_value: f64,
}
