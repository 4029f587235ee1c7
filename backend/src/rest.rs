//! HTTP surface: thin axum handlers mapping wire DTOs to domain commands.
//!
//! The owner id arrives in the `X-User-Id` header; the authentication flow
//! that produces it is an external collaborator.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::commands::budget::{
    CreateBudgetCommand, DeleteBudgetCommand, UpdateBudgetCommand,
};
use crate::domain::commands::expense::{
    DeleteExpenseCommand, EditExpenseCommand, LogExpenseCommand,
};
use crate::domain::commands::savings_goal::{
    CreateSavingsGoalCommand, DeleteSavingsGoalCommand, UpdateSavingsGoalCommand,
};
use crate::domain::commands::savings_record::{
    DeleteSavingsRecordCommand, EditSavingsRecordCommand, LogSavingsRecordCommand,
};
use crate::domain::models::budget::Budget;
use crate::domain::models::expense::{AttachmentUpload, BlobRef, Expense};
use crate::domain::models::savings_goal::SavingsGoal;
use crate::domain::models::savings_record::SavingsRecord;
use crate::domain::tips::{TipsInput, TipsProvider};
use crate::domain::{
    BudgetService, DomainError, ExpenseService, SavingsGoalService, SavingsRecordService,
};

#[derive(Clone)]
pub struct AppState {
    pub budgets: Arc<BudgetService>,
    pub expenses: Arc<ExpenseService>,
    pub goals: Arc<SavingsGoalService>,
    pub savings: Arc<SavingsRecordService>,
    pub tips: Arc<dyn TipsProvider>,
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/budgets", post(create_budget).get(list_budgets))
        .route(
            "/budgets/:id",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
        .route("/budgets/:id/expenses", post(log_expense).get(list_expenses))
        .route("/expenses/:id", put(edit_expense).delete(delete_expense))
        .route("/savings-goals", post(create_goal).get(list_goals))
        .route(
            "/savings-goals/:id",
            get(get_goal).put(update_goal).delete(delete_goal),
        )
        .route(
            "/savings-goals/:id/records",
            post(log_saving).get(list_savings),
        )
        .route("/savings-records/:id", put(edit_saving).delete(delete_saving))
        .route("/tips", post(budgeting_tips))
        .with_state(state)
}

fn user_id(headers: &HeaderMap) -> Result<String, (StatusCode, String)> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing X-User-Id header".to_string(),
        ))
}

fn error_response(err: DomainError) -> (StatusCode, String) {
    match err {
        DomainError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        DomainError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
        DomainError::Storage(msg) => {
            tracing::error!("storage failure: {}", msg);
            (StatusCode::INTERNAL_SERVER_ERROR, "Storage failure".to_string())
        }
    }
}

fn parse_date(value: &str) -> Result<DateTime<Utc>, (StatusCode, String)> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid date: {}", e)))
}

fn parse_optional_date(
    value: &Option<String>,
) -> Result<Option<DateTime<Utc>>, (StatusCode, String)> {
    value.as_deref().map(parse_date).transpose()
}

fn attachment_from_dto(dto: &shared::AttachmentUploadDto) -> AttachmentUpload {
    AttachmentUpload {
        file_name: dto.file_name.clone(),
        bytes: dto.bytes.clone(),
    }
}

fn blob_ref_to_dto(blob_ref: &BlobRef) -> shared::AttachmentDto {
    shared::AttachmentDto {
        url: blob_ref.url.clone(),
        storage_path: blob_ref.storage_path.clone(),
    }
}

fn budget_to_dto(budget: &Budget) -> shared::BudgetDto {
    shared::BudgetDto {
        id: budget.id.clone(),
        name: budget.name.clone(),
        amount: budget.amount,
        spent_amount: budget.spent_amount,
        deadline: budget.deadline.to_rfc3339(),
        user_id: budget.user_id.clone(),
        created_at: budget.created_at.to_rfc3339(),
    }
}

fn expense_to_dto(expense: &Expense) -> shared::ExpenseDto {
    shared::ExpenseDto {
        id: expense.id.clone(),
        budget_id: expense.budget_id.clone(),
        description: expense.description.clone(),
        amount: expense.amount,
        date: expense.date.to_rfc3339(),
        user_id: expense.user_id.clone(),
        receipt: expense.receipt.as_ref().map(blob_ref_to_dto),
    }
}

fn goal_to_dto(goal: &SavingsGoal) -> shared::SavingsGoalDto {
    shared::SavingsGoalDto {
        id: goal.id.clone(),
        name: goal.name.clone(),
        target_amount: goal.target_amount,
        current_amount: goal.current_amount,
        deadline: goal.deadline.to_rfc3339(),
        user_id: goal.user_id.clone(),
        created_at: goal.created_at.to_rfc3339(),
    }
}

fn record_to_dto(record: &SavingsRecord) -> shared::SavingsRecordDto {
    shared::SavingsRecordDto {
        id: record.id.clone(),
        goal_id: record.goal_id.clone(),
        description: record.description.clone(),
        amount: record.amount,
        date: record.date.to_rfc3339(),
        user_id: record.user_id.clone(),
        screenshot: record.screenshot.as_ref().map(blob_ref_to_dto),
    }
}

async fn create_budget(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<shared::CreateBudgetRequest>,
) -> impl IntoResponse {
    info!("POST /api/budgets - name: {}", request.name);
    let user_id = match user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let deadline = match parse_date(&request.deadline) {
        Ok(d) => d,
        Err(e) => return e.into_response(),
    };
    match state.budgets.create_budget(CreateBudgetCommand {
        user_id,
        name: request.name,
        amount: request.amount,
        deadline,
    }) {
        Ok(result) => (StatusCode::CREATED, Json(budget_to_dto(&result.budget))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn list_budgets(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let user_id = match user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    match state.budgets.list_budgets(&user_id) {
        Ok(budgets) => {
            let dtos: Vec<shared::BudgetDto> = budgets.iter().map(budget_to_dto).collect();
            (StatusCode::OK, Json(dtos)).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

async fn get_budget(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(budget_id): Path<String>,
) -> impl IntoResponse {
    let user_id = match user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    match state.budgets.get_budget(&user_id, &budget_id) {
        Ok(budget) => (StatusCode::OK, Json(budget_to_dto(&budget))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn update_budget(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(budget_id): Path<String>,
    Json(request): Json<shared::UpdateBudgetRequest>,
) -> impl IntoResponse {
    let user_id = match user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let deadline = match parse_optional_date(&request.deadline) {
        Ok(d) => d,
        Err(e) => return e.into_response(),
    };
    match state.budgets.update_budget(UpdateBudgetCommand {
        user_id,
        budget_id,
        name: request.name,
        amount: request.amount,
        deadline,
    }) {
        Ok(result) => (StatusCode::OK, Json(budget_to_dto(&result.budget))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn delete_budget(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(budget_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/budgets/{}", budget_id);
    let user_id = match user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    match state
        .budgets
        .delete_budget(DeleteBudgetCommand { user_id, budget_id })
    {
        Ok(result) => (
            StatusCode::OK,
            Json(shared::DeleteBudgetResponse {
                deleted_expenses: result.deleted_expenses.len(),
                message: result.success_message,
            }),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn log_expense(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(budget_id): Path<String>,
    Json(request): Json<shared::LogExpenseRequest>,
) -> impl IntoResponse {
    info!("POST /api/budgets/{}/expenses", budget_id);
    let user_id = match user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let date = match parse_optional_date(&request.date) {
        Ok(d) => d,
        Err(e) => return e.into_response(),
    };
    match state.expenses.log_expense(LogExpenseCommand {
        user_id,
        budget_id,
        description: request.description,
        amount: request.amount,
        date,
        receipt: request.receipt.as_ref().map(attachment_from_dto),
    }) {
        Ok(result) => (
            StatusCode::CREATED,
            Json(shared::ExpenseResponse {
                expense: expense_to_dto(&result.expense),
                attachment_error: result.attachment_error,
                message: result.success_message,
            }),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn list_expenses(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(budget_id): Path<String>,
) -> impl IntoResponse {
    let user_id = match user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    // surfacing the list through the budget service keeps owner scoping in
    // one place
    match state.budgets.get_budget(&user_id, &budget_id) {
        Ok(_) => {}
        Err(e) => return error_response(e).into_response(),
    }
    match state.expenses.list_expenses(&user_id, &budget_id) {
        Ok(expenses) => {
            let dtos: Vec<shared::ExpenseDto> = expenses.iter().map(expense_to_dto).collect();
            (StatusCode::OK, Json(dtos)).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

async fn edit_expense(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(expense_id): Path<String>,
    Json(request): Json<shared::EditExpenseRequest>,
) -> impl IntoResponse {
    info!("PUT /api/expenses/{}", expense_id);
    let user_id = match user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let date = match parse_optional_date(&request.date) {
        Ok(d) => d,
        Err(e) => return e.into_response(),
    };
    match state.expenses.edit_expense(EditExpenseCommand {
        user_id,
        expense_id,
        budget_id: request.budget_id,
        previous_amount: request.previous_amount,
        description: request.description,
        amount: request.amount,
        date,
        receipt: request.receipt.as_ref().map(attachment_from_dto),
    }) {
        Ok(result) => (
            StatusCode::OK,
            Json(shared::ExpenseResponse {
                expense: expense_to_dto(&result.expense),
                attachment_error: result.attachment_error,
                message: result.success_message,
            }),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn delete_expense(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(expense_id): Path<String>,
    Json(request): Json<shared::DeleteExpenseRequest>,
) -> impl IntoResponse {
    info!("DELETE /api/expenses/{}", expense_id);
    let user_id = match user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    match state.expenses.delete_expense(DeleteExpenseCommand {
        user_id,
        expense_id,
        budget_id: request.budget_id,
        amount: request.amount,
    }) {
        Ok(result) => (StatusCode::OK, result.success_message).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn create_goal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<shared::CreateSavingsGoalRequest>,
) -> impl IntoResponse {
    info!("POST /api/savings-goals - name: {}", request.name);
    let user_id = match user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let deadline = match parse_date(&request.deadline) {
        Ok(d) => d,
        Err(e) => return e.into_response(),
    };
    match state.goals.create_goal(CreateSavingsGoalCommand {
        user_id,
        name: request.name,
        target_amount: request.target_amount,
        deadline,
    }) {
        Ok(result) => (StatusCode::CREATED, Json(goal_to_dto(&result.goal))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn list_goals(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let user_id = match user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    match state.goals.list_goals(&user_id) {
        Ok(goals) => {
            let dtos: Vec<shared::SavingsGoalDto> = goals.iter().map(goal_to_dto).collect();
            (StatusCode::OK, Json(dtos)).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

async fn get_goal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(goal_id): Path<String>,
) -> impl IntoResponse {
    let user_id = match user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    match state.goals.get_goal(&user_id, &goal_id) {
        Ok(goal) => (StatusCode::OK, Json(goal_to_dto(&goal))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn update_goal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(goal_id): Path<String>,
    Json(request): Json<shared::UpdateSavingsGoalRequest>,
) -> impl IntoResponse {
    let user_id = match user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let deadline = match parse_optional_date(&request.deadline) {
        Ok(d) => d,
        Err(e) => return e.into_response(),
    };
    match state.goals.update_goal(UpdateSavingsGoalCommand {
        user_id,
        goal_id,
        name: request.name,
        target_amount: request.target_amount,
        deadline,
    }) {
        Ok(result) => (StatusCode::OK, Json(goal_to_dto(&result.goal))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn delete_goal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(goal_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/savings-goals/{}", goal_id);
    let user_id = match user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    match state
        .goals
        .delete_goal(DeleteSavingsGoalCommand { user_id, goal_id })
    {
        Ok(result) => (
            StatusCode::OK,
            Json(shared::DeleteSavingsGoalResponse {
                deleted_records: result.deleted_records.len(),
                message: result.success_message,
            }),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn log_saving(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(goal_id): Path<String>,
    Json(request): Json<shared::LogSavingsRecordRequest>,
) -> impl IntoResponse {
    info!("POST /api/savings-goals/{}/records", goal_id);
    let user_id = match user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let date = match parse_optional_date(&request.date) {
        Ok(d) => d,
        Err(e) => return e.into_response(),
    };
    match state.savings.log_saving(LogSavingsRecordCommand {
        user_id,
        goal_id,
        description: request.description,
        amount: request.amount,
        date,
        screenshot: request.screenshot.as_ref().map(attachment_from_dto),
    }) {
        Ok(result) => (
            StatusCode::CREATED,
            Json(shared::SavingsRecordResponse {
                record: record_to_dto(&result.record),
                attachment_error: result.attachment_error,
                message: result.success_message,
            }),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn list_savings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(goal_id): Path<String>,
) -> impl IntoResponse {
    let user_id = match user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    match state.goals.get_goal(&user_id, &goal_id) {
        Ok(_) => {}
        Err(e) => return error_response(e).into_response(),
    }
    match state.savings.list_savings(&user_id, &goal_id) {
        Ok(records) => {
            let dtos: Vec<shared::SavingsRecordDto> = records.iter().map(record_to_dto).collect();
            (StatusCode::OK, Json(dtos)).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

async fn edit_saving(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(record_id): Path<String>,
    Json(request): Json<shared::EditSavingsRecordRequest>,
) -> impl IntoResponse {
    info!("PUT /api/savings-records/{}", record_id);
    let user_id = match user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let date = match parse_optional_date(&request.date) {
        Ok(d) => d,
        Err(e) => return e.into_response(),
    };
    match state.savings.edit_saving(EditSavingsRecordCommand {
        user_id,
        record_id,
        goal_id: request.goal_id,
        previous_amount: request.previous_amount,
        description: request.description,
        amount: request.amount,
        date,
        screenshot: request.screenshot.as_ref().map(attachment_from_dto),
    }) {
        Ok(result) => (
            StatusCode::OK,
            Json(shared::SavingsRecordResponse {
                record: record_to_dto(&result.record),
                attachment_error: result.attachment_error,
                message: result.success_message,
            }),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn delete_saving(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(record_id): Path<String>,
    Json(request): Json<shared::DeleteSavingsRecordRequest>,
) -> impl IntoResponse {
    info!("DELETE /api/savings-records/{}", record_id);
    let user_id = match user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    match state.savings.delete_saving(DeleteSavingsRecordCommand {
        user_id,
        record_id,
        goal_id: request.goal_id,
        amount: request.amount,
    }) {
        Ok(result) => (StatusCode::OK, result.success_message).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn budgeting_tips(
    State(state): State<AppState>,
    Json(request): Json<shared::TipsRequest>,
) -> impl IntoResponse {
    match state.tips.budgeting_tips(&TipsInput {
        expense_records: request.expense_records,
        saving_records: request.saving_records,
    }) {
        Ok(output) => (
            StatusCode::OK,
            Json(shared::TipsResponse { tips: output.tips }),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}
