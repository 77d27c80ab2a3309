use sea_orm::entity::prelude::*;

/// Represents a user of the system.
/// The user is the root of the ownership tree: accounts, operations, budgets,
/// imports and import rules all belong to exactly one user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// Login identity. Uniqueness is enforced by the database index.
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    /// Preferred (main) currency of the user.
    pub currency_id: i32,
    pub created_at: DateTimeUtc,
    pub modified_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::currency::Entity",
        from = "Column::CurrencyId",
        to = "super::currency::Column::Id"
    )]
    Currency,
    // A user can own multiple accounts.
    #[sea_orm(has_many = "super::account::Entity")]
    Account,
    #[sea_orm(has_many = "super::user_image::Entity")]
    UserImage,
}

impl Related<super::currency::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Currency.def()
    }
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::user_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserImage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
