use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// A spending limit tracked over a set of the owner's accounts.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub currency_id: i32,
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub limit_amount: Decimal,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::currency::Entity",
        from = "Column::CurrencyId",
        to = "super::currency::Column::Id"
    )]
    Currency,
    #[sea_orm(has_many = "super::budget_account::Entity")]
    BudgetAccount,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        super::budget_account::Relation::Account.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::budget_account::Relation::Budget.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
