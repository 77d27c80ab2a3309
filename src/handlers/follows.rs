use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::{follow::FollowState, user};
use serde::{Deserialize, Serialize};
use store::follow::FollowEdge;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::error::Result;
use crate::middleware::AuthenticatedUser;
use crate::schemas::{AppState, ErrorResponse};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct FollowUserRequest {
    /// The user to follow
    pub user_id: i32,
}

/// Public part of a user, as seen by other users.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
}

impl From<user::Model> for UserSummary {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

/// A follow edge seen from one side; `user` is the other side.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FollowResponse {
    pub id: i32,
    pub state: FollowState,
    pub user: UserSummary,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<FollowEdge> for FollowResponse {
    fn from(edge: FollowEdge) -> Self {
        Self {
            id: edge.follow.id,
            state: edge.follow.state,
            user: edge.user.into(),
            created_at: edge.follow.created_at,
            modified_at: edge.follow.modified_at,
        }
    }
}

/// Ask to follow another user
#[utoipa::path(
    post,
    path = "/api/v1/follows",
    tag = "follows",
    security(("bearer_auth" = [])),
    request_body = FollowUserRequest,
    responses(
        (status = 201, description = "Follow request created", body = FollowResponse),
        (status = 400, description = "Cannot follow yourself", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Already requested", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_follow(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(request): Json<FollowUserRequest>,
) -> Result<(StatusCode, Json<FollowResponse>)> {
    let edge = state.follows.request(user.user_id(), request.user_id).await?;
    info!("User {} asked to follow {}", user.user_id(), request.user_id);
    Ok((StatusCode::CREATED, Json(edge.into())))
}

/// Users the current user follows or asked to follow
#[utoipa::path(
    get,
    path = "/api/v1/follows/following",
    tag = "follows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Following list", body = Vec<FollowResponse>)
    )
)]
#[instrument(skip(state))]
pub async fn list_following(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<FollowResponse>>> {
    let edges = state.follows.following(user.user_id()).await?;
    Ok(Json(edges.into_iter().map(FollowResponse::from).collect()))
}

/// Users who follow or asked to follow the current user
#[utoipa::path(
    get,
    path = "/api/v1/follows/followers",
    tag = "follows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Followers list", body = Vec<FollowResponse>)
    )
)]
#[instrument(skip(state))]
pub async fn list_followers(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<FollowResponse>>> {
    let edges = state.follows.followers(user.user_id()).await?;
    Ok(Json(edges.into_iter().map(FollowResponse::from).collect()))
}

/// Approve a pending follow request
#[utoipa::path(
    put,
    path = "/api/v1/follows/followers/{follow_id}/approve",
    tag = "follows",
    security(("bearer_auth" = [])),
    params(
        ("follow_id" = i32, Path, description = "Follow request ID"),
    ),
    responses(
        (status = 200, description = "Request approved", body = FollowResponse),
        (status = 404, description = "No pending request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn approve_follower(
    user: AuthenticatedUser,
    Path(follow_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<FollowResponse>> {
    let edge = state.follows.approve(user.user_id(), follow_id).await?;
    Ok(Json(edge.into()))
}

/// Reject a pending follow request
#[utoipa::path(
    delete,
    path = "/api/v1/follows/followers/{follow_id}",
    tag = "follows",
    security(("bearer_auth" = [])),
    params(
        ("follow_id" = i32, Path, description = "Follow request ID"),
    ),
    responses(
        (status = 204, description = "Request rejected"),
        (status = 404, description = "No pending request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn reject_follower(
    user: AuthenticatedUser,
    Path(follow_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    state.follows.reject(user.user_id(), follow_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Stop following a user, or withdraw a pending request
#[utoipa::path(
    delete,
    path = "/api/v1/follows/following/{follow_id}",
    tag = "follows",
    security(("bearer_auth" = [])),
    params(
        ("follow_id" = i32, Path, description = "Follow ID"),
    ),
    responses(
        (status = 204, description = "Unfollowed"),
        (status = 404, description = "Follow not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn unfollow(
    user: AuthenticatedUser,
    Path(follow_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    state.follows.unfollow(user.user_id(), follow_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
