use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, Utc};
use model::entities::budget;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::budget::{BudgetCreate, BudgetDetails};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::error::Result;
use crate::middleware::AuthenticatedUser;
use crate::schemas::{AppState, ErrorResponse};

fn validate_limit(limit: &Decimal) -> std::result::Result<(), ValidationError> {
    if limit.is_sign_negative() || limit.is_zero() {
        return Err(ValidationError::new("limit_must_be_positive"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateBudgetRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    pub currency_id: i32,
    #[validate(custom(function = "validate_limit"))]
    pub limit: Decimal,
    /// Accounts the budget tracks; all must belong to the caller
    #[serde(default)]
    pub account_ids: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BudgetResponse {
    pub id: i32,
    pub name: String,
    pub currency_id: i32,
    pub limit: Decimal,
    /// Present on single-budget responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_ids: Option<Vec<i32>>,
    pub created_at: DateTime<Utc>,
}

impl From<budget::Model> for BudgetResponse {
    fn from(model: budget::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            currency_id: model.currency_id,
            limit: model.limit_amount,
            account_ids: None,
            created_at: model.created_at,
        }
    }
}

impl From<BudgetDetails> for BudgetResponse {
    fn from(details: BudgetDetails) -> Self {
        Self {
            account_ids: Some(details.account_ids),
            ..details.budget.into()
        }
    }
}

/// Get all budgets of the current user
#[utoipa::path(
    get,
    path = "/api/v1/budgets",
    tag = "budgets",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Budgets retrieved successfully", body = Vec<BudgetResponse>)
    )
)]
#[instrument(skip(state))]
pub async fn get_budgets(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<BudgetResponse>>> {
    let budgets = state.budgets.list(user.user_id()).await?;
    Ok(Json(budgets.into_iter().map(BudgetResponse::from).collect()))
}

/// Create a budget over some of the user's accounts
#[utoipa::path(
    post,
    path = "/api/v1/budgets",
    tag = "budgets",
    security(("bearer_auth" = [])),
    request_body = CreateBudgetRequest,
    responses(
        (status = 201, description = "Budget created successfully", body = BudgetResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(name = %request.name))]
pub async fn create_budget(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateBudgetRequest>>,
) -> Result<(StatusCode, Json<BudgetResponse>)> {
    let created = state
        .budgets
        .create(
            user.user_id(),
            BudgetCreate {
                name: request.name,
                currency_id: request.currency_id,
                limit_amount: request.limit,
            },
            request.account_ids,
        )
        .await?;
    info!("Budget created successfully with ID: {}", created.budget.id);
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Get a budget with its tracked accounts
#[utoipa::path(
    get,
    path = "/api/v1/budgets/{budget_id}",
    tag = "budgets",
    security(("bearer_auth" = [])),
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
    ),
    responses(
        (status = 200, description = "Budget retrieved successfully", body = BudgetResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budget(
    user: AuthenticatedUser,
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<BudgetResponse>> {
    let budget = state.budgets.get(user.user_id(), budget_id).await?;
    Ok(Json(budget.into()))
}

/// Delete a budget
#[utoipa::path(
    delete,
    path = "/api/v1/budgets/{budget_id}",
    tag = "budgets",
    security(("bearer_auth" = [])),
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
    ),
    responses(
        (status = 204, description = "Budget deleted successfully"),
        (status = 404, description = "Budget not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_budget(
    user: AuthenticatedUser,
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    state.budgets.delete(user.user_id(), budget_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
