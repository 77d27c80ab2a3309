//! Budgets and the accounts they track.

use chrono::Utc;
use model::entities::{budget, budget_account};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::{debug, info, instrument, trace};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct BudgetCreate {
    pub name: String,
    pub currency_id: i32,
    pub limit_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetDetails {
    pub budget: budget::Model,
    pub account_ids: Vec<i32>,
}

/// Create a budget and link it to `account_ids`.
///
/// Ownership of the accounts is not checked here. Run inside a transaction
/// so a failed link leaves no half-built budget behind.
#[instrument(skip(db, data), fields(name = %data.name))]
pub async fn create_one<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    data: BudgetCreate,
    account_ids: &[i32],
) -> Result<BudgetDetails> {
    trace!("Entering budget::create_one");

    let budget = budget::ActiveModel {
        user_id: Set(user_id),
        currency_id: Set(data.currency_id),
        name: Set(data.name),
        limit_amount: Set(data.limit_amount),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for account_id in account_ids {
        budget_account::ActiveModel {
            budget_id: Set(budget.id),
            account_id: Set(*account_id),
        }
        .insert(db)
        .await?;
    }

    info!(budget_id = budget.id, accounts = account_ids.len(), "Budget created");
    let account_ids = find_account_ids(db, budget.id).await?;
    Ok(BudgetDetails {
        budget,
        account_ids,
    })
}

#[instrument(skip(db))]
pub async fn find_all_by_user<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<budget::Model>> {
    Ok(budget::Entity::find()
        .filter(budget::Column::UserId.eq(user_id))
        .order_by_asc(budget::Column::Id)
        .all(db)
        .await?)
}

#[instrument(skip(db))]
pub async fn find_one_by_user<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    budget_id: i32,
) -> Result<Option<BudgetDetails>> {
    let Some(budget) = budget::Entity::find_by_id(budget_id)
        .filter(budget::Column::UserId.eq(user_id))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let account_ids = find_account_ids(db, budget.id).await?;
    Ok(Some(BudgetDetails {
        budget,
        account_ids,
    }))
}

/// Removes the account links first, then the budget itself.
#[instrument(skip(db))]
pub async fn delete_one<C: ConnectionTrait>(db: &C, user_id: i32, budget_id: i32) -> Result<bool> {
    let owned = budget::Entity::find_by_id(budget_id)
        .filter(budget::Column::UserId.eq(user_id))
        .one(db)
        .await?;
    if owned.is_none() {
        return Ok(false);
    }

    let links = budget_account::Entity::delete_many()
        .filter(budget_account::Column::BudgetId.eq(budget_id))
        .exec(db)
        .await?;
    debug!(rows = links.rows_affected, "Budget links removed");

    let result = budget::Entity::delete_by_id(budget_id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

#[instrument(skip(db))]
pub async fn find_account_ids<C: ConnectionTrait>(db: &C, budget_id: i32) -> Result<Vec<i32>> {
    Ok(budget_account::Entity::find()
        .select_only()
        .column(budget_account::Column::AccountId)
        .filter(budget_account::Column::BudgetId.eq(budget_id))
        .order_by_asc(budget_account::Column::AccountId)
        .into_tuple::<i32>()
        .all(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{self, AccountCreate};
    use crate::test_utils::{create_user, setup_db};
    use crate::StoreError;
    use model::entities::account::AccountType;
    use model::entities::prelude::BudgetAccount;
    use sea_orm::{PaginatorTrait, TransactionTrait};

    async fn account_for(
        db: &sea_orm::DatabaseConnection,
        user_id: i32,
        currency_id: i32,
        name: &str,
    ) -> i32 {
        account::create_one(
            db,
            user_id,
            AccountCreate {
                name: name.to_string(),
                notes: None,
                currency_id,
                account_type: AccountType::BankAccount,
            },
        )
        .await
        .unwrap()
        .account
        .id
    }

    fn food(currency_id: i32) -> BudgetCreate {
        BudgetCreate {
            name: "Food".to_string(),
            currency_id,
            limit_amount: Decimal::new(40000, 2),
        }
    }

    #[tokio::test]
    async fn test_create_find_delete() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice@example.com").await;
        let first = account_for(&db, alice.user.id, alice.currency.id, "Main").await;
        let second = account_for(&db, alice.user.id, alice.currency.id, "Savings").await;

        let created = create_one(&db, alice.user.id, food(alice.currency.id), &[second, first])
            .await
            .unwrap();
        assert_eq!(created.account_ids, vec![first, second]);

        let found = find_one_by_user(&db, alice.user.id, created.budget.id)
            .await
            .unwrap();
        assert_eq!(found, Some(created.clone()));
        assert_eq!(find_all_by_user(&db, alice.user.id).await.unwrap().len(), 1);

        let bob = create_user(&db, "bob@example.com").await;
        assert!(!delete_one(&db, bob.user.id, created.budget.id).await.unwrap());
        assert!(delete_one(&db, alice.user.id, created.budget.id).await.unwrap());
        assert_eq!(BudgetAccount::find().count(&db).await.unwrap(), 0);
        assert!(find_all_by_user(&db, alice.user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_link_rolls_back_with_transaction() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice@example.com").await;

        let txn = db.begin().await.unwrap();
        let result = create_one(&txn, alice.user.id, food(alice.currency.id), &[9999]).await;
        assert!(matches!(result, Err(StoreError::InvalidReference(_))));
        txn.rollback().await.unwrap();

        assert!(find_all_by_user(&db, alice.user.id).await.unwrap().is_empty());
    }
}
