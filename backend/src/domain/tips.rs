//! Budgeting-tips boundary.
//!
//! The real advice comes from an external prompt/LLM call with this fixed
//! input/output schema; the domain only owns the seam and a canned fallback
//! used when no provider is configured.

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipsInput {
    /// Plain-text summaries of recent expenses, e.g. "Groceries: $75.50"
    pub expense_records: Vec<String>,
    pub saving_records: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipsOutput {
    pub tips: Vec<String>,
}

pub trait TipsProvider: Send + Sync {
    fn budgeting_tips(&self, input: &TipsInput) -> Result<TipsOutput, DomainError>;
}

/// Fallback provider: generic advice, no external call.
pub struct CannedTipsProvider;

impl TipsProvider for CannedTipsProvider {
    fn budgeting_tips(&self, input: &TipsInput) -> Result<TipsOutput, DomainError> {
        let mut tips = Vec::new();
        if input.expense_records.is_empty() {
            tips.push("Start logging your expenses to see where your money goes.".to_string());
        } else {
            tips.push(
                "Review your largest expense categories and set a ceiling for each.".to_string(),
            );
        }
        if input.saving_records.is_empty() {
            tips.push("Set up a savings goal and contribute a fixed amount each month.".to_string());
        } else {
            tips.push("Automate your contributions right after payday.".to_string());
        }
        Ok(TipsOutput { tips })
    }
}
