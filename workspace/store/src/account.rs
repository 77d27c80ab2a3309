//! Accounts, always scoped by their owner.

use chrono::Utc;
use model::entities::{
    account::{self, AccountType},
    currency,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::{debug, info, instrument, trace};

use crate::error::{Result, StoreError};

#[derive(Debug, Clone)]
pub struct AccountCreate {
    pub name: String,
    pub notes: Option<String>,
    pub currency_id: i32,
    pub account_type: AccountType,
}

/// `None` keeps the stored value. `notes: Some(None)` clears the notes.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub notes: Option<Option<String>>,
    pub account_type: Option<AccountType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDetails {
    pub account: account::Model,
    pub currency: currency::Model,
}

fn into_details(row: (account::Model, Option<currency::Model>)) -> Result<AccountDetails> {
    match row {
        (account, Some(currency)) => Ok(AccountDetails { account, currency }),
        (account, None) => Err(StoreError::InvalidReference(format!(
            "account {} points at missing currency {}",
            account.id, account.currency_id
        ))),
    }
}

/// Create an account for `user_id`. Account names are unique per owner.
#[instrument(skip(db, data), fields(name = %data.name))]
pub async fn create_one<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    data: AccountCreate,
) -> Result<AccountDetails> {
    trace!("Entering account::create_one");

    let currency = currency::Entity::find_by_id(data.currency_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            StoreError::InvalidReference(format!("unknown currency {}", data.currency_id))
        })?;

    let now = Utc::now();
    let account = account::ActiveModel {
        user_id: Set(user_id),
        currency_id: Set(currency.id),
        name: Set(data.name),
        notes: Set(data.notes),
        account_type: Set(data.account_type),
        created_at: Set(now),
        modified_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(account_id = account.id, "Account created");
    Ok(AccountDetails { account, currency })
}

#[instrument(skip(db))]
pub async fn find_all_by_user<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<AccountDetails>> {
    let rows = account::Entity::find()
        .filter(account::Column::UserId.eq(user_id))
        .find_also_related(currency::Entity)
        .order_by_asc(account::Column::Id)
        .all(db)
        .await?;
    debug!(count = rows.len(), "Loaded accounts");
    rows.into_iter().map(into_details).collect()
}

#[instrument(skip(db))]
pub async fn find_one_by_user<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    account_id: i32,
) -> Result<Option<AccountDetails>> {
    account::Entity::find_by_id(account_id)
        .filter(account::Column::UserId.eq(user_id))
        .find_also_related(currency::Entity)
        .one(db)
        .await?
        .map(into_details)
        .transpose()
}

/// Returns `None` when the account does not exist or belongs to someone else.
#[instrument(skip(db, data))]
pub async fn update_one<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    account_id: i32,
    data: AccountUpdate,
) -> Result<Option<AccountDetails>> {
    trace!("Entering account::update_one");

    let Some(existing) = account::Entity::find_by_id(account_id)
        .filter(account::Column::UserId.eq(user_id))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let mut active: account::ActiveModel = existing.into();
    if let Some(name) = data.name {
        active.name = Set(name);
    }
    if let Some(notes) = data.notes {
        active.notes = Set(notes);
    }
    if let Some(account_type) = data.account_type {
        active.account_type = Set(account_type);
    }
    active.modified_at = Set(Utc::now());
    active.update(db).await?;

    info!("Account updated");
    find_one_by_user(db, user_id, account_id).await
}

/// Returns whether an owned account was removed.
#[instrument(skip(db))]
pub async fn delete_one<C: ConnectionTrait>(db: &C, user_id: i32, account_id: i32) -> Result<bool> {
    let result = account::Entity::delete_many()
        .filter(account::Column::Id.eq(account_id))
        .filter(account::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    debug!(rows = result.rows_affected, "Delete account completed");
    Ok(result.rows_affected > 0)
}

/// The subset of `account_ids` owned by `user_id`.
#[instrument(skip(db))]
pub async fn find_owned_ids<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    account_ids: &[i32],
) -> Result<Vec<i32>> {
    if account_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(account::Entity::find()
        .select_only()
        .column(account::Column::Id)
        .filter(account::Column::UserId.eq(user_id))
        .filter(account::Column::Id.is_in(account_ids.iter().copied()))
        .into_tuple::<i32>()
        .all(db)
        .await?)
}
