//! Savings goal service: parent CRUD and cascade delete, mirroring the
//! budget side.

use std::sync::Arc;

use chrono::Utc;
use log::info;

use crate::domain::commands::savings_goal::{
    CreateSavingsGoalCommand, CreateSavingsGoalResult, DeleteSavingsGoalCommand,
    DeleteSavingsGoalResult, UpdateSavingsGoalCommand, UpdateSavingsGoalResult,
};
use crate::domain::errors::DomainError;
use crate::domain::models::budget::validate_budget_fields;
use crate::domain::models::savings_goal::SavingsGoal;
use crate::storage::traits::{BlobStorage, EntityStore};

pub struct SavingsGoalService {
    store: Arc<dyn EntityStore>,
    blobs: Arc<dyn BlobStorage>,
}

impl SavingsGoalService {
    pub fn new(store: Arc<dyn EntityStore>, blobs: Arc<dyn BlobStorage>) -> Self {
        Self { store, blobs }
    }

    pub fn create_goal(
        &self,
        command: CreateSavingsGoalCommand,
    ) -> Result<CreateSavingsGoalResult, DomainError> {
        validate_budget_fields(&command.name, command.target_amount)
            .map_err(|e| DomainError::Validation(e.to_string()))?;

        let goal = SavingsGoal {
            id: SavingsGoal::generate_id(),
            name: command.name.trim().to_string(),
            target_amount: command.target_amount,
            current_amount: 0.0,
            deadline: command.deadline,
            user_id: command.user_id,
            created_at: Utc::now(),
        };
        self.store.store_goal(&goal)?;
        info!("Created savings goal {} (\"{}\")", goal.id, goal.name);

        Ok(CreateSavingsGoalResult {
            goal,
            success_message: "Savings goal created".to_string(),
        })
    }

    pub fn get_goal(&self, user_id: &str, goal_id: &str) -> Result<SavingsGoal, DomainError> {
        self.store
            .get_goal(user_id, goal_id)?
            .ok_or(DomainError::NotFound)
    }

    pub fn list_goals(&self, user_id: &str) -> Result<Vec<SavingsGoal>, DomainError> {
        Ok(self.store.list_goals(user_id)?)
    }

    pub fn update_goal(
        &self,
        command: UpdateSavingsGoalCommand,
    ) -> Result<UpdateSavingsGoalResult, DomainError> {
        let mut goal = self.get_goal(&command.user_id, &command.goal_id)?;

        if let Some(name) = command.name {
            goal.name = name;
        }
        if let Some(target_amount) = command.target_amount {
            goal.target_amount = target_amount;
        }
        if let Some(deadline) = command.deadline {
            goal.deadline = deadline;
        }
        validate_budget_fields(&goal.name, goal.target_amount)
            .map_err(|e| DomainError::Validation(e.to_string()))?;
        goal.name = goal.name.trim().to_string();

        self.store.update_goal(&goal)?;
        let goal = self.get_goal(&command.user_id, &command.goal_id)?;
        info!("Updated savings goal {}", goal.id);

        Ok(UpdateSavingsGoalResult {
            goal,
            success_message: "Savings goal updated".to_string(),
        })
    }

    pub fn delete_goal(
        &self,
        command: DeleteSavingsGoalCommand,
    ) -> Result<DeleteSavingsGoalResult, DomainError> {
        let (goal, deleted_records) = self
            .store
            .delete_goal_with_records(&command.user_id, &command.goal_id)?;
        info!(
            "Deleted savings goal {} and {} record(s)",
            goal.id,
            deleted_records.len()
        );

        for record in &deleted_records {
            if let Some(screenshot) = &record.screenshot {
                if let Err(e) = self.blobs.delete(&screenshot.storage_path) {
                    log::warn!(
                        "Failed to release screenshot {}: {}",
                        screenshot.storage_path,
                        e
                    );
                }
            }
        }

        Ok(DeleteSavingsGoalResult {
            goal,
            deleted_records,
            success_message: "Savings goal deleted".to_string(),
        })
    }
}
