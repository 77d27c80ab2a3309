//! Social graph edges between users.

use chrono::Utc;
use model::entities::{
    follow::{self, FollowState},
    user,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::Expr,
};
use tracing::{debug, info, instrument, trace};

use crate::error::{Result, StoreError};

/// An edge plus the user on the other end of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowEdge {
    pub follow: follow::Model,
    pub user: user::Model,
}

/// Create a `requested` edge from `follower_id` to `followed_id`.
///
/// A second edge for the same ordered pair is rejected by the unique index.
#[instrument(skip(db))]
pub async fn create_request<C: ConnectionTrait>(
    db: &C,
    follower_id: i32,
    followed_id: i32,
) -> Result<follow::Model> {
    trace!("Entering follow::create_request");

    let now = Utc::now();
    let edge = follow::ActiveModel {
        follower_id: Set(follower_id),
        followed_id: Set(followed_id),
        state: Set(FollowState::Requested),
        created_at: Set(now),
        modified_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(follow_id = edge.id, "Follow requested");
    Ok(edge)
}

#[instrument(skip(db))]
pub async fn find_one_by_follower<C: ConnectionTrait>(
    db: &C,
    follower_id: i32,
    follow_id: i32,
) -> Result<Option<follow::Model>> {
    Ok(follow::Entity::find_by_id(follow_id)
        .filter(follow::Column::FollowerId.eq(follower_id))
        .one(db)
        .await?)
}

/// A `requested` edge pointing at `followed_id`.
#[instrument(skip(db))]
pub async fn find_pending_for_followed<C: ConnectionTrait>(
    db: &C,
    followed_id: i32,
    follow_id: i32,
) -> Result<Option<follow::Model>> {
    Ok(follow::Entity::find_by_id(follow_id)
        .filter(follow::Column::FollowedId.eq(followed_id))
        .filter(follow::Column::State.eq(FollowState::Requested))
        .one(db)
        .await?)
}

/// Move a `requested` edge to `approved`.
///
/// The state filter is part of the update, so of two racing approvals only
/// one sees a row. Returns `None` when nothing was approved.
#[instrument(skip(db))]
pub async fn approve<C: ConnectionTrait>(
    db: &C,
    followed_id: i32,
    follow_id: i32,
) -> Result<Option<follow::Model>> {
    trace!("Entering follow::approve");

    let result = follow::Entity::update_many()
        .col_expr(follow::Column::State, Expr::value(FollowState::Approved))
        .col_expr(follow::Column::ModifiedAt, Expr::value(Utc::now()))
        .filter(follow::Column::Id.eq(follow_id))
        .filter(follow::Column::FollowedId.eq(followed_id))
        .filter(follow::Column::State.eq(FollowState::Requested))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        debug!("No pending follow request to approve");
        return Ok(None);
    }

    info!("Follow approved");
    Ok(follow::Entity::find_by_id(follow_id).one(db).await?)
}

#[instrument(skip(db))]
pub async fn delete_one<C: ConnectionTrait>(db: &C, follow_id: i32) -> Result<bool> {
    let result = follow::Entity::delete_by_id(follow_id).exec(db).await?;
    debug!(rows = result.rows_affected, "Delete follow completed");
    Ok(result.rows_affected > 0)
}

/// Edges where `user_id` is the follower, with the followed users.
#[instrument(skip(db))]
pub async fn find_following<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Vec<FollowEdge>> {
    let rows = follow::Entity::find()
        .filter(follow::Column::FollowerId.eq(user_id))
        .find_also_related(user::Entity)
        .order_by_asc(follow::Column::Id)
        .all(db)
        .await?;
    rows.into_iter().map(into_edge).collect()
}

/// Edges where `user_id` is followed, with the following users.
#[instrument(skip(db))]
pub async fn find_followers<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Vec<FollowEdge>> {
    let rows = follow::Entity::find()
        .filter(follow::Column::FollowedId.eq(user_id))
        .order_by_asc(follow::Column::Id)
        .all(db)
        .await?;

    let follower_ids: Vec<i32> = rows.iter().map(|f| f.follower_id).collect();
    let users = crate::user::find_many(db, &follower_ids).await?;

    rows.into_iter()
        .map(|follow| {
            let user = users
                .iter()
                .find(|u| u.id == follow.follower_id)
                .cloned()
                .ok_or_else(|| {
                    StoreError::InvalidReference(format!(
                        "follow {} points at missing user {}",
                        follow.id, follow.follower_id
                    ))
                })?;
            Ok(FollowEdge { follow, user })
        })
        .collect()
}

fn into_edge(row: (follow::Model, Option<user::Model>)) -> Result<FollowEdge> {
    match row {
        (follow, Some(user)) => Ok(FollowEdge { follow, user }),
        (follow, None) => Err(StoreError::InvalidReference(format!(
            "follow {} points at missing user {}",
            follow.id, follow.followed_id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_user, setup_db};

    #[tokio::test]
    async fn test_request_then_approve_once() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice@example.com").await;
        let bob = create_user(&db, "bob@example.com").await;

        let edge = create_request(&db, bob.user.id, alice.user.id).await.unwrap();
        assert_eq!(edge.state, FollowState::Requested);

        let pending = find_pending_for_followed(&db, alice.user.id, edge.id)
            .await
            .unwrap();
        assert_eq!(pending, Some(edge.clone()));

        // Only the followed user may approve
        assert!(approve(&db, bob.user.id, edge.id).await.unwrap().is_none());

        let approved = approve(&db, alice.user.id, edge.id).await.unwrap().unwrap();
        assert!(approved.is_approved());

        assert!(approve(&db, alice.user.id, edge.id).await.unwrap().is_none());
        assert!(
            find_pending_for_followed(&db, alice.user.id, edge.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_duplicate_edge() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice@example.com").await;
        let bob = create_user(&db, "bob@example.com").await;

        create_request(&db, bob.user.id, alice.user.id).await.unwrap();
        let duplicate = create_request(&db, bob.user.id, alice.user.id).await;
        assert!(matches!(duplicate, Err(StoreError::Duplicate(_))));

        // The reverse direction is a different edge
        create_request(&db, alice.user.id, bob.user.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_following_and_followers_carry_counterpart() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice@example.com").await;
        let bob = create_user(&db, "bob@example.com").await;
        let carol = create_user(&db, "carol@example.com").await;

        create_request(&db, bob.user.id, alice.user.id).await.unwrap();
        create_request(&db, carol.user.id, alice.user.id).await.unwrap();

        let followers = find_followers(&db, alice.user.id).await.unwrap();
        let names: Vec<_> = followers.iter().map(|e| e.user.name.as_str()).collect();
        assert_eq!(names, vec!["bob", "carol"]);

        let following = find_following(&db, bob.user.id).await.unwrap();
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].user.id, alice.user.id);

        assert!(find_following(&db, alice.user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_and_delete_by_follower() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice@example.com").await;
        let bob = create_user(&db, "bob@example.com").await;
        let edge = create_request(&db, bob.user.id, alice.user.id).await.unwrap();

        assert!(
            find_one_by_follower(&db, alice.user.id, edge.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            find_one_by_follower(&db, bob.user.id, edge.id)
                .await
                .unwrap()
                .is_some()
        );

        assert!(delete_one(&db, edge.id).await.unwrap());
        assert!(!delete_one(&db, edge.id).await.unwrap());
    }
}
