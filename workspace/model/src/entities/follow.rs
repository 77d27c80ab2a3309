use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// State of a follow relation.
///
/// `Requested` moves to `Approved` once; there is no way back. Rejecting or
/// unfollowing deletes the row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "snake_case")]
pub enum FollowState {
    #[sea_orm(string_value = "requested")]
    Requested,
    #[sea_orm(string_value = "approved")]
    Approved,
}

/// Directed edge of the social graph: `follower_id` follows `followed_id`.
/// At most one edge exists per ordered pair.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "follows")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub follower_id: i32,
    pub followed_id: i32,
    pub state: FollowState,
    pub created_at: DateTimeUtc,
    pub modified_at: DateTimeUtc,
}

impl Model {
    pub fn is_approved(&self) -> bool {
        self.state == FollowState::Approved
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FollowerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Follower,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FollowedId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Followed,
}

/// Joins land on the followed user.
impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Followed.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
