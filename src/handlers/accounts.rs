use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, NaiveDate, Utc};
use model::entities::{account::AccountType, operation};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::account::{AccountCreate, AccountDetails, AccountUpdate};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::Result;
use crate::handlers::{currencies::CurrencyResponse, images::collect_files};
use crate::middleware::AuthenticatedUser;
use crate::schemas::{AppState, ErrorResponse};

/// Request body for creating a new account
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateAccountRequest {
    /// Account name (unique per user)
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[validate(length(max = 512))]
    pub notes: Option<String>,
    pub currency_id: i32,
    pub account_type: AccountType,
}

/// Request body for updating an account. An empty `notes` clears them.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,
    #[validate(length(max = 512))]
    pub notes: Option<String>,
    pub account_type: Option<AccountType>,
}

/// Account response model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub id: i32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub account_type: AccountType,
    pub currency: CurrencyResponse,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<AccountDetails> for AccountResponse {
    fn from(details: AccountDetails) -> Self {
        Self {
            id: details.account.id,
            name: details.account.name,
            notes: details.account.notes,
            account_type: details.account.account_type,
            currency: details.currency.into(),
            created_at: details.account.created_at,
            modified_at: details.account.modified_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OperationResponse {
    pub id: i32,
    pub account_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_id: Option<i32>,
    pub description: String,
    /// Negative for expenses
    pub amount: Decimal,
    pub date: NaiveDate,
}

impl From<operation::Model> for OperationResponse {
    fn from(model: operation::Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            import_id: model.import_id,
            description: model.description,
            amount: model.amount,
            date: model.date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportResponse {
    pub id: i32,
    pub file_name: String,
    pub imported_at: DateTime<Utc>,
    /// Number of operations created from the file
    pub operations: usize,
}

/// Get all accounts of the current user
#[utoipa::path(
    get,
    path = "/api/v1/accounts",
    tag = "accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Accounts retrieved successfully", body = Vec<AccountResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_accounts(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountResponse>>> {
    trace!("Entering get_accounts function");
    let accounts = state.accounts.list(user.user_id()).await?;
    debug!("Retrieved {} accounts", accounts.len());
    Ok(Json(accounts.into_iter().map(AccountResponse::from).collect()))
}

/// Create a new account
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    tag = "accounts",
    security(("bearer_auth" = [])),
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created successfully", body = AccountResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Account name already used", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(name = %request.name))]
pub async fn create_account(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateAccountRequest>>,
) -> Result<(StatusCode, Json<AccountResponse>)> {
    trace!("Entering create_account function");
    let account = state
        .accounts
        .create(
            user.user_id(),
            AccountCreate {
                name: request.name,
                notes: request.notes.filter(|n| !n.is_empty()),
                currency_id: request.currency_id,
                account_type: request.account_type,
            },
        )
        .await?;
    info!("Account created successfully with ID: {}", account.account.id);
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// Get an account by ID
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{account_id}",
    tag = "accounts",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = i32, Path, description = "Account ID"),
    ),
    responses(
        (status = 200, description = "Account retrieved successfully", body = AccountResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_account(
    user: AuthenticatedUser,
    Path(account_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<AccountResponse>> {
    let account = state.accounts.get(user.user_id(), account_id).await?;
    Ok(Json(account.into()))
}

/// Update an account
#[utoipa::path(
    put,
    path = "/api/v1/accounts/{account_id}",
    tag = "accounts",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = i32, Path, description = "Account ID"),
    ),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated successfully", body = AccountResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 409, description = "Account name already used", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_account(
    user: AuthenticatedUser,
    Path(account_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateAccountRequest>>,
) -> Result<Json<AccountResponse>> {
    trace!("Entering update_account function");
    let update = AccountUpdate {
        name: request.name,
        notes: request.notes.map(|n| Some(n).filter(|n| !n.is_empty())),
        account_type: request.account_type,
    };
    let account = state.accounts.update(user.user_id(), account_id, update).await?;
    info!("Account {} updated", account_id);
    Ok(Json(account.into()))
}

/// Delete an account
#[utoipa::path(
    delete,
    path = "/api/v1/accounts/{account_id}",
    tag = "accounts",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = i32, Path, description = "Account ID"),
    ),
    responses(
        (status = 204, description = "Account deleted successfully"),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_account(
    user: AuthenticatedUser,
    Path(account_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    state.accounts.delete(user.user_id(), account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Import a CSV statement into an account
///
/// The file needs a `date,description,amount` header, ISO dates and
/// decimal amounts.
#[utoipa::path(
    post,
    path = "/api/v1/accounts/{account_id}/import",
    tag = "accounts",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = i32, Path, description = "Account ID"),
    ),
    request_body(content = Vec<u8>, content_type = "multipart/form-data", description = "Exactly one CSV file"),
    responses(
        (status = 201, description = "Statement imported", body = ImportResponse),
        (status = 400, description = "Malformed statement", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, multipart))]
pub async fn import_statement(
    user: AuthenticatedUser,
    Path(account_id): Path<i32>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ImportResponse>)> {
    trace!("Entering import_statement function");
    let files = collect_files(multipart).await?;
    let summary = state
        .accounts
        .import_statement(user.user_id(), account_id, files)
        .await?;

    let response = ImportResponse {
        id: summary.import.id,
        file_name: summary.import.file_name,
        imported_at: summary.import.imported_at,
        operations: summary.operations.len(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// List operations of an account, newest first
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{account_id}/operations",
    tag = "accounts",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = i32, Path, description = "Account ID"),
    ),
    responses(
        (status = 200, description = "Operations retrieved successfully", body = Vec<OperationResponse>),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_account_operations(
    user: AuthenticatedUser,
    Path(account_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<Vec<OperationResponse>>> {
    let operations = state.accounts.operations(user.user_id(), account_id).await?;
    Ok(Json(operations.into_iter().map(OperationResponse::from).collect()))
}
