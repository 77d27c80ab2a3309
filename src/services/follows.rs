//! Follow requests between users.
//!
//! `requested --approve--> approved`; rejecting or unfollowing deletes the
//! edge.

use sea_orm::DatabaseConnection;
use store::follow::FollowEdge;
use tracing::{info, instrument, trace, warn};

use crate::error::{ApiError, Result};

pub struct FollowService {
    db: DatabaseConnection,
}

impl FollowService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn request(&self, follower_id: i32, target_user_id: i32) -> Result<FollowEdge> {
        trace!("Entering follow request");

        if follower_id == target_user_id {
            warn!("User tried to follow themselves");
            return Err(ApiError::InvalidData("Cannot follow yourself".to_string()));
        }

        let Some(target) = store::user::find_one(&self.db, target_user_id).await? else {
            return Err(ApiError::NotFound("No such user was found".to_string()));
        };

        let created = store::follow::create_request(&self.db, follower_id, target_user_id).await;
        let follow = match created {
            Ok(follow) => follow,
            Err(e) if e.is_duplicate() => {
                return Err(ApiError::DuplicateEntity(
                    "Follow request already exists".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        info!(follow_id = follow.id, "Follow request created");
        Ok(FollowEdge {
            follow,
            user: target.user,
        })
    }

    /// Approve a pending request addressed to `user_id`.
    #[instrument(skip(self))]
    pub async fn approve(&self, user_id: i32, follow_id: i32) -> Result<FollowEdge> {
        trace!("Entering follow approve");

        let approved = store::follow::approve(&self.db, user_id, follow_id)
            .await?
            .ok_or_else(not_found_request)?;

        let follower = store::user::find_one(&self.db, approved.follower_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("No such user was found".to_string()))?;

        info!("Follow request approved");
        Ok(FollowEdge {
            follow: approved,
            user: follower.user,
        })
    }

    /// Decline a pending request addressed to `user_id`.
    #[instrument(skip(self))]
    pub async fn reject(&self, user_id: i32, follow_id: i32) -> Result<()> {
        let pending = store::follow::find_pending_for_followed(&self.db, user_id, follow_id)
            .await?
            .ok_or_else(not_found_request)?;

        store::follow::delete_one(&self.db, pending.id).await?;
        info!("Follow request rejected");
        Ok(())
    }

    /// Drop an edge started by `user_id`, pending or approved.
    #[instrument(skip(self))]
    pub async fn unfollow(&self, user_id: i32, follow_id: i32) -> Result<()> {
        let follow = store::follow::find_one_by_follower(&self.db, user_id, follow_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("No such follow was found".to_string()))?;

        store::follow::delete_one(&self.db, follow.id).await?;
        info!("User unfollowed");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn following(&self, user_id: i32) -> Result<Vec<FollowEdge>> {
        Ok(store::follow::find_following(&self.db, user_id).await?)
    }

    #[instrument(skip(self))]
    pub async fn followers(&self, user_id: i32) -> Result<Vec<FollowEdge>> {
        Ok(store::follow::find_followers(&self.db, user_id).await?)
    }
}

fn not_found_request() -> ApiError {
    ApiError::NotFound("No such follow request was found".to_string())
}
