use std::sync::Arc;

use model::entities::{account::AccountType, currency, follow::FollowState};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use crate::handlers;
use crate::handlers::{
    accounts::{
        AccountResponse, CreateAccountRequest, ImportResponse, OperationResponse,
        UpdateAccountRequest,
    },
    budgets::{BudgetResponse, CreateBudgetRequest},
    currencies::CurrencyResponse,
    follows::{FollowResponse, FollowUserRequest, UserSummary},
    images::ImageResponse,
    users::{
        SignInRequest, SignInResponse, SignUpRequest, SignUpResponse, UpdateUserRequest,
        UserResponse,
    },
};
use crate::services::{
    accounts::AccountService,
    auth::AuthService,
    budgets::BudgetService,
    currencies::CurrencyService,
    file_storage::FileStorage,
    follows::FollowService,
    users::{AccountBootstrap, UserService},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for reference data
    pub cache: Cache<String, CachedData>,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub follows: Arc<FollowService>,
    pub accounts: Arc<AccountService>,
    pub budgets: Arc<BudgetService>,
    pub currencies: Arc<CurrencyService>,
    /// Upper bound for a request body, uploads included
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        cache: Cache<String, CachedData>,
        auth: Arc<AuthService>,
        storage: Arc<FileStorage>,
        bootstrap: Arc<dyn AccountBootstrap>,
        max_upload_bytes: usize,
    ) -> Self {
        let users = UserService::new(db.clone(), auth.clone(), storage, bootstrap);
        Self {
            users: Arc::new(users),
            follows: Arc::new(FollowService::new(db.clone())),
            accounts: Arc::new(AccountService::new(db.clone())),
            budgets: Arc::new(BudgetService::new(db.clone())),
            currencies: Arc::new(CurrencyService::new(db.clone(), cache.clone())),
            db,
            cache,
            auth,
            max_upload_bytes,
        }
    }
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    Currencies(Vec<currency::Model>),
    Currency(currency::Model),
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::currencies::list_currencies,
        handlers::currencies::get_currency,
        handlers::users::sign_up,
        handlers::users::sign_in,
        handlers::users::get_me,
        handlers::users::update_me,
        handlers::users::delete_me,
        handlers::users::get_user,
        handlers::images::list_images,
        handlers::images::upload_image,
        handlers::images::download_image,
        handlers::images::delete_image,
        handlers::follows::create_follow,
        handlers::follows::list_following,
        handlers::follows::list_followers,
        handlers::follows::approve_follower,
        handlers::follows::reject_follower,
        handlers::follows::unfollow,
        handlers::accounts::get_accounts,
        handlers::accounts::create_account,
        handlers::accounts::get_account,
        handlers::accounts::update_account,
        handlers::accounts::delete_account,
        handlers::accounts::import_statement,
        handlers::accounts::get_account_operations,
        handlers::budgets::get_budgets,
        handlers::budgets::create_budget,
        handlers::budgets::get_budget,
        handlers::budgets::delete_budget,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            CurrencyResponse,
            UserResponse,
            SignUpRequest,
            SignUpResponse,
            SignInRequest,
            SignInResponse,
            UpdateUserRequest,
            ImageResponse,
            FollowUserRequest,
            FollowResponse,
            UserSummary,
            FollowState,
            AccountResponse,
            AccountType,
            CreateAccountRequest,
            UpdateAccountRequest,
            OperationResponse,
            ImportResponse,
            BudgetResponse,
            CreateBudgetRequest,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "currencies", description = "Currency reference data"),
        (name = "users", description = "Sign-up, sign-in and profile management"),
        (name = "images", description = "User profile images"),
        (name = "follows", description = "Follow requests between users"),
        (name = "accounts", description = "Accounts, operations and statement imports"),
        (name = "budgets", description = "Budgets over the user's accounts"),
    ),
    info(
        title = "Ducket API",
        description = "Personal finance tracker API: accounts, budgets, imports and a social graph of users",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
