//! In-memory entity store.
//!
//! All documents live behind a single mutex, so every transactional child
//! operation (insert/update/remove plus the parent counter adjustment)
//! commits as one serialized step: the counter is read and rewritten at
//! commit time, never from a caller-cached snapshot, and lost updates are
//! impossible. Update change events are dispatched after the data lock is
//! released, with cloned before/after snapshots of the committed state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use log::debug;

use crate::domain::models::budget::Budget;
use crate::domain::models::expense::{BlobRef, Expense};
use crate::domain::models::savings_goal::SavingsGoal;
use crate::domain::models::savings_record::SavingsRecord;
use crate::storage::traits::{
    BudgetObserver, BudgetStorage, DocumentChange, ExpenseStorage, SavingsGoalObserver,
    SavingsGoalStorage, SavingsRecordStorage, StorageError, SubscriptionId,
};

#[derive(Default)]
struct Documents {
    budgets: HashMap<String, Budget>,
    expenses: HashMap<String, Expense>,
    goals: HashMap<String, SavingsGoal>,
    savings: HashMap<String, SavingsRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<Documents>,
    budget_observers: Mutex<Vec<(SubscriptionId, BudgetObserver)>>,
    goal_observers: Mutex<Vec<(SubscriptionId, SavingsGoalObserver)>>,
    next_subscription: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_subscription_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed))
    }

    fn emit_budget_change(&self, change: DocumentChange<Budget>) {
        debug!(
            "budget {} updated: spent {:.2} -> {:.2}",
            change.after.id, change.before.spent_amount, change.after.spent_amount
        );
        let observers = self
            .budget_observers
            .lock()
            .expect("budget observer lock poisoned");
        for (_, observer) in observers.iter() {
            observer(&change);
        }
    }

    fn emit_goal_change(&self, change: DocumentChange<SavingsGoal>) {
        debug!(
            "savings goal {} updated: current {:.2} -> {:.2}",
            change.after.id, change.before.current_amount, change.after.current_amount
        );
        let observers = self
            .goal_observers
            .lock()
            .expect("goal observer lock poisoned");
        for (_, observer) in observers.iter() {
            observer(&change);
        }
    }
}

impl BudgetStorage for MemoryStore {
    fn store_budget(&self, budget: &Budget) -> Result<(), StorageError> {
        let mut docs = self.documents.lock().expect("document lock poisoned");
        if docs.budgets.contains_key(&budget.id) {
            return Err(StorageError::Backend(format!(
                "duplicate budget id {}",
                budget.id
            )));
        }
        docs.budgets.insert(budget.id.clone(), budget.clone());
        Ok(())
    }

    fn get_budget(&self, user_id: &str, budget_id: &str) -> Result<Option<Budget>, StorageError> {
        let docs = self.documents.lock().expect("document lock poisoned");
        Ok(docs
            .budgets
            .get(budget_id)
            .filter(|b| b.user_id == user_id)
            .cloned())
    }

    fn list_budgets(&self, user_id: &str) -> Result<Vec<Budget>, StorageError> {
        let docs = self.documents.lock().expect("document lock poisoned");
        let mut budgets: Vec<Budget> = docs
            .budgets
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        budgets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(budgets)
    }

    fn update_budget(&self, budget: &Budget) -> Result<(), StorageError> {
        let change = {
            let mut docs = self.documents.lock().expect("document lock poisoned");
            let stored = docs
                .budgets
                .get_mut(&budget.id)
                .filter(|b| b.user_id == budget.user_id)
                .ok_or(StorageError::NotFound)?;
            let before = stored.clone();
            stored.name = budget.name.clone();
            stored.amount = budget.amount;
            stored.deadline = budget.deadline;
            // spent_amount is only ever touched by the child transactions
            DocumentChange {
                before,
                after: stored.clone(),
            }
        };
        self.emit_budget_change(change);
        Ok(())
    }

    fn delete_budget_with_expenses(
        &self,
        user_id: &str,
        budget_id: &str,
    ) -> Result<(Budget, Vec<Expense>), StorageError> {
        let mut docs = self.documents.lock().expect("document lock poisoned");
        match docs.budgets.get(budget_id) {
            Some(b) if b.user_id == user_id => {}
            _ => return Err(StorageError::NotFound),
        }
        // Children and parent leave the store in the same committed step, so
        // the parent is never visible without its children reachable.
        let removed: Vec<Expense> = {
            let ids: Vec<String> = docs
                .expenses
                .values()
                .filter(|e| e.budget_id == budget_id)
                .map(|e| e.id.clone())
                .collect();
            ids.iter()
                .filter_map(|id| docs.expenses.remove(id))
                .collect()
        };
        let budget = docs
            .budgets
            .remove(budget_id)
            .ok_or(StorageError::NotFound)?;
        Ok((budget, removed))
    }

    fn subscribe_budget_updates(&self, observer: BudgetObserver) -> SubscriptionId {
        let id = self.next_subscription_id();
        self.budget_observers
            .lock()
            .expect("budget observer lock poisoned")
            .push((id, observer));
        id
    }

    fn unsubscribe_budget_updates(&self, id: SubscriptionId) {
        self.budget_observers
            .lock()
            .expect("budget observer lock poisoned")
            .retain(|(sub, _)| *sub != id);
    }
}

impl ExpenseStorage for MemoryStore {
    fn record_expense(&self, expense: &Expense) -> Result<(), StorageError> {
        let change = {
            let mut docs = self.documents.lock().expect("document lock poisoned");
            match docs.budgets.get(&expense.budget_id) {
                Some(b) if b.user_id == expense.user_id => {}
                _ => return Err(StorageError::NotFound),
            }
            if docs.expenses.contains_key(&expense.id) {
                return Err(StorageError::Backend(format!(
                    "duplicate expense id {}",
                    expense.id
                )));
            }
            docs.expenses.insert(expense.id.clone(), expense.clone());
            let budget = docs
                .budgets
                .get_mut(&expense.budget_id)
                .ok_or(StorageError::NotFound)?;
            let before = budget.clone();
            budget.spent_amount += expense.amount;
            DocumentChange {
                before,
                after: budget.clone(),
            }
        };
        self.emit_budget_change(change);
        Ok(())
    }

    fn get_expense(
        &self,
        user_id: &str,
        expense_id: &str,
    ) -> Result<Option<Expense>, StorageError> {
        let docs = self.documents.lock().expect("document lock poisoned");
        Ok(docs
            .expenses
            .get(expense_id)
            .filter(|e| e.user_id == user_id)
            .cloned())
    }

    fn list_expenses(&self, user_id: &str, budget_id: &str) -> Result<Vec<Expense>, StorageError> {
        let docs = self.documents.lock().expect("document lock poisoned");
        let mut expenses: Vec<Expense> = docs
            .expenses
            .values()
            .filter(|e| e.budget_id == budget_id && e.user_id == user_id)
            .cloned()
            .collect();
        expenses.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(expenses)
    }

    fn update_expense(&self, expense: &Expense, amount_delta: f64) -> Result<(), StorageError> {
        let change = {
            let mut docs = self.documents.lock().expect("document lock poisoned");
            match docs.expenses.get(&expense.id) {
                Some(e) if e.user_id == expense.user_id && e.budget_id == expense.budget_id => {}
                _ => return Err(StorageError::NotFound),
            }
            docs.expenses.insert(expense.id.clone(), expense.clone());
            let budget = docs
                .budgets
                .get_mut(&expense.budget_id)
                .ok_or(StorageError::NotFound)?;
            let before = budget.clone();
            budget.spent_amount += amount_delta;
            DocumentChange {
                before,
                after: budget.clone(),
            }
        };
        self.emit_budget_change(change);
        Ok(())
    }

    fn remove_expense(
        &self,
        user_id: &str,
        budget_id: &str,
        expense_id: &str,
        amount: f64,
    ) -> Result<(), StorageError> {
        let change = {
            let mut docs = self.documents.lock().expect("document lock poisoned");
            match docs.expenses.get(expense_id) {
                Some(e) if e.user_id == user_id && e.budget_id == budget_id => {}
                _ => return Err(StorageError::NotFound),
            }
            // resolve the parent before touching the child map, so nothing
            // is mutated on any error branch
            let budget = docs
                .budgets
                .get_mut(budget_id)
                .ok_or(StorageError::NotFound)?;
            let before = budget.clone();
            budget.spent_amount -= amount;
            let after = budget.clone();
            docs.expenses.remove(expense_id);
            DocumentChange { before, after }
        };
        self.emit_budget_change(change);
        Ok(())
    }

    fn set_expense_receipt(
        &self,
        user_id: &str,
        expense_id: &str,
        receipt: &BlobRef,
    ) -> Result<(), StorageError> {
        let mut docs = self.documents.lock().expect("document lock poisoned");
        let expense = docs
            .expenses
            .get_mut(expense_id)
            .filter(|e| e.user_id == user_id)
            .ok_or(StorageError::NotFound)?;
        expense.receipt = Some(receipt.clone());
        Ok(())
    }
}

impl SavingsGoalStorage for MemoryStore {
    fn store_goal(&self, goal: &SavingsGoal) -> Result<(), StorageError> {
        let mut docs = self.documents.lock().expect("document lock poisoned");
        if docs.goals.contains_key(&goal.id) {
            return Err(StorageError::Backend(format!(
                "duplicate goal id {}",
                goal.id
            )));
        }
        docs.goals.insert(goal.id.clone(), goal.clone());
        Ok(())
    }

    fn get_goal(&self, user_id: &str, goal_id: &str) -> Result<Option<SavingsGoal>, StorageError> {
        let docs = self.documents.lock().expect("document lock poisoned");
        Ok(docs
            .goals
            .get(goal_id)
            .filter(|g| g.user_id == user_id)
            .cloned())
    }

    fn list_goals(&self, user_id: &str) -> Result<Vec<SavingsGoal>, StorageError> {
        let docs = self.documents.lock().expect("document lock poisoned");
        let mut goals: Vec<SavingsGoal> = docs
            .goals
            .values()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect();
        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(goals)
    }

    fn update_goal(&self, goal: &SavingsGoal) -> Result<(), StorageError> {
        let change = {
            let mut docs = self.documents.lock().expect("document lock poisoned");
            let stored = docs
                .goals
                .get_mut(&goal.id)
                .filter(|g| g.user_id == goal.user_id)
                .ok_or(StorageError::NotFound)?;
            let before = stored.clone();
            stored.name = goal.name.clone();
            stored.target_amount = goal.target_amount;
            stored.deadline = goal.deadline;
            DocumentChange {
                before,
                after: stored.clone(),
            }
        };
        self.emit_goal_change(change);
        Ok(())
    }

    fn delete_goal_with_records(
        &self,
        user_id: &str,
        goal_id: &str,
    ) -> Result<(SavingsGoal, Vec<SavingsRecord>), StorageError> {
        let mut docs = self.documents.lock().expect("document lock poisoned");
        match docs.goals.get(goal_id) {
            Some(g) if g.user_id == user_id => {}
            _ => return Err(StorageError::NotFound),
        }
        let removed: Vec<SavingsRecord> = {
            let ids: Vec<String> = docs
                .savings
                .values()
                .filter(|r| r.goal_id == goal_id)
                .map(|r| r.id.clone())
                .collect();
            ids.iter()
                .filter_map(|id| docs.savings.remove(id))
                .collect()
        };
        let goal = docs.goals.remove(goal_id).ok_or(StorageError::NotFound)?;
        Ok((goal, removed))
    }

    fn subscribe_goal_updates(&self, observer: SavingsGoalObserver) -> SubscriptionId {
        let id = self.next_subscription_id();
        self.goal_observers
            .lock()
            .expect("goal observer lock poisoned")
            .push((id, observer));
        id
    }

    fn unsubscribe_goal_updates(&self, id: SubscriptionId) {
        self.goal_observers
            .lock()
            .expect("goal observer lock poisoned")
            .retain(|(sub, _)| *sub != id);
    }
}

impl SavingsRecordStorage for MemoryStore {
    fn record_saving(&self, record: &SavingsRecord) -> Result<(), StorageError> {
        let change = {
            let mut docs = self.documents.lock().expect("document lock poisoned");
            match docs.goals.get(&record.goal_id) {
                Some(g) if g.user_id == record.user_id => {}
                _ => return Err(StorageError::NotFound),
            }
            if docs.savings.contains_key(&record.id) {
                return Err(StorageError::Backend(format!(
                    "duplicate savings record id {}",
                    record.id
                )));
            }
            docs.savings.insert(record.id.clone(), record.clone());
            let goal = docs
                .goals
                .get_mut(&record.goal_id)
                .ok_or(StorageError::NotFound)?;
            let before = goal.clone();
            goal.current_amount += record.amount;
            DocumentChange {
                before,
                after: goal.clone(),
            }
        };
        self.emit_goal_change(change);
        Ok(())
    }

    fn get_saving(
        &self,
        user_id: &str,
        record_id: &str,
    ) -> Result<Option<SavingsRecord>, StorageError> {
        let docs = self.documents.lock().expect("document lock poisoned");
        Ok(docs
            .savings
            .get(record_id)
            .filter(|r| r.user_id == user_id)
            .cloned())
    }

    fn list_savings(
        &self,
        user_id: &str,
        goal_id: &str,
    ) -> Result<Vec<SavingsRecord>, StorageError> {
        let docs = self.documents.lock().expect("document lock poisoned");
        let mut records: Vec<SavingsRecord> = docs
            .savings
            .values()
            .filter(|r| r.goal_id == goal_id && r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }

    fn update_saving(&self, record: &SavingsRecord, amount_delta: f64) -> Result<(), StorageError> {
        let change = {
            let mut docs = self.documents.lock().expect("document lock poisoned");
            match docs.savings.get(&record.id) {
                Some(r) if r.user_id == record.user_id && r.goal_id == record.goal_id => {}
                _ => return Err(StorageError::NotFound),
            }
            docs.savings.insert(record.id.clone(), record.clone());
            let goal = docs
                .goals
                .get_mut(&record.goal_id)
                .ok_or(StorageError::NotFound)?;
            let before = goal.clone();
            goal.current_amount += amount_delta;
            DocumentChange {
                before,
                after: goal.clone(),
            }
        };
        self.emit_goal_change(change);
        Ok(())
    }

    fn remove_saving(
        &self,
        user_id: &str,
        goal_id: &str,
        record_id: &str,
        amount: f64,
    ) -> Result<(), StorageError> {
        let change = {
            let mut docs = self.documents.lock().expect("document lock poisoned");
            match docs.savings.get(record_id) {
                Some(r) if r.user_id == user_id && r.goal_id == goal_id => {}
                _ => return Err(StorageError::NotFound),
            }
            let goal = docs.goals.get_mut(goal_id).ok_or(StorageError::NotFound)?;
            let before = goal.clone();
            goal.current_amount -= amount;
            let after = goal.clone();
            docs.savings.remove(record_id);
            DocumentChange { before, after }
        };
        self.emit_goal_change(change);
        Ok(())
    }

    fn set_saving_screenshot(
        &self,
        user_id: &str,
        record_id: &str,
        screenshot: &BlobRef,
    ) -> Result<(), StorageError> {
        let mut docs = self.documents.lock().expect("document lock poisoned");
        let record = docs
            .savings
            .get_mut(record_id)
            .filter(|r| r.user_id == user_id)
            .ok_or(StorageError::NotFound)?;
        record.screenshot = Some(screenshot.clone());
        Ok(())
    }
}
