use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use store::user::UserProfile;
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::Result;
use crate::handlers::{currencies::CurrencyResponse, follows::UserSummary};
use crate::middleware::AuthenticatedUser;
use crate::schemas::{AppState, ErrorResponse};
use crate::services::users::{ProfileUpdate, SignUpData};

/// Request body for registering a new user
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct SignUpRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    /// Must not be registered yet
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    /// ISO 4217 code of the user's main currency
    #[validate(length(equal = 3))]
    pub currency_iso_code: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct SignInRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Request body for updating the current user. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
}

/// User response model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub currency: CurrencyResponse,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<UserProfile> for UserResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.user.id,
            name: profile.user.name,
            email: profile.user.email,
            currency: profile.currency.into(),
            created_at: profile.user.created_at,
            modified_at: profile.user.modified_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignUpResponse {
    pub user: UserResponse,
    /// False when the user was created without the default wallet account
    pub default_account_created: bool,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignInResponse {
    pub user: UserResponse,
    pub access_token: String,
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/v1/users/sign-up",
    tag = "users",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "User created successfully", body = SignUpResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn sign_up(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<SignUpRequest>>,
) -> Result<(StatusCode, Json<SignUpResponse>)> {
    trace!("Entering sign_up function");

    let result = state
        .users
        .sign_up(SignUpData {
            name: request.name,
            email: request.email,
            password: request.password,
            currency_iso_code: request.currency_iso_code,
        })
        .await?;
    let access_token = state.auth.create_access_token(result.user.user.id)?;

    info!("User signed up with ID: {}", result.user.user.id);
    let response = SignUpResponse {
        user: result.user.into(),
        default_account_created: result.default_account_created,
        access_token,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Exchange credentials for an access token
#[utoipa::path(
    post,
    path = "/api/v1/users/sign-in",
    tag = "users",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn sign_in(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<SignInRequest>>,
) -> Result<Json<SignInResponse>> {
    trace!("Entering sign_in function");
    let result = state.users.sign_in(&request.email, &request.password).await?;
    Ok(Json(SignInResponse {
        user: result.user.into(),
        access_token: result.access_token,
    }))
}

/// Get the current user
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User retrieved successfully", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_me(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>> {
    let profile = state.users.get_user(user.user_id()).await?;
    Ok(Json(profile.into()))
}

/// Update the current user
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_me(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateUserRequest>>,
) -> Result<Json<UserResponse>> {
    trace!("Entering update_me function");
    debug!(
        "Updating user {} (name: {}, password: {})",
        user.user_id(),
        request.name.is_some(),
        request.password.is_some()
    );

    let profile = state
        .users
        .update_user(
            user.user_id(),
            ProfileUpdate {
                name: request.name,
                password: request.password,
            },
        )
        .await?;
    Ok(Json(profile.into()))
}

/// Delete the current user and all of their data
#[utoipa::path(
    delete,
    path = "/api/v1/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "User deleted successfully"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_me(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    state.users.delete_user(user.user_id()).await?;
    info!("User {} deleted their account", user.user_id());
    Ok(StatusCode::NO_CONTENT)
}

/// Get the public part of a user by ID
///
/// Only id and name are exposed; the caller's own profile is at `/users/me`.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = UserSummary),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _user))]
pub async fn get_user(
    _user: AuthenticatedUser,
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<UserSummary>> {
    let profile = state.users.get_user(user_id).await?;
    Ok(Json(profile.user.into()))
}
