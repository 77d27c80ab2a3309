//! Identity store: user rows, their images, and the cascade cleanup of
//! everything a user owns.

use chrono::Utc;
use model::entities::{
    account, budget, budget_account, currency, follow, import, import_rule, operation,
    periodic_budget, user, user_image,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait, Set,
};
use tracing::{debug, info, instrument, trace};

use crate::currency as currencies;
use crate::error::{Result, StoreError};

/// Data required to create a user.
#[derive(Debug, Clone)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    /// ISO 4217 code of the user's main currency.
    pub currency_iso_code: String,
    pub password_hash: String,
}

/// Fields that can change on an existing user. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub password_hash: Option<String>,
}

/// A user together with its main currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user: user::Model,
    pub currency: currency::Model,
}

fn into_profile(row: (user::Model, Option<currency::Model>)) -> Result<UserProfile> {
    match row {
        (user, Some(currency)) => Ok(UserProfile { user, currency }),
        (user, None) => Err(StoreError::InvalidReference(format!(
            "user {} points at missing currency {}",
            user.id, user.currency_id
        ))),
    }
}

/// Insert a new user.
///
/// The unique index on `email` is the only uniqueness check; a second user
/// with the same address comes back as [`StoreError::Duplicate`].
#[instrument(skip(db, data), fields(email = %data.email))]
pub async fn create_one<C: ConnectionTrait>(db: &C, data: UserCreate) -> Result<UserProfile> {
    trace!("Entering user::create_one");

    let currency = currencies::find_by_iso_code(db, &data.currency_iso_code)
        .await?
        .ok_or_else(|| {
            StoreError::InvalidReference(format!("unknown currency {}", data.currency_iso_code))
        })?;

    let now = Utc::now();
    let user = user::ActiveModel {
        name: Set(data.name),
        email: Set(data.email),
        password_hash: Set(data.password_hash),
        currency_id: Set(currency.id),
        created_at: Set(now),
        modified_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(user_id = user.id, "User created");
    Ok(UserProfile { user, currency })
}

/// Update name and/or password hash. Returns `None` if the user does not exist.
#[instrument(skip(db, data))]
pub async fn update_one<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    data: UserUpdate,
) -> Result<Option<UserProfile>> {
    trace!("Entering user::update_one");

    let Some(existing) = user::Entity::find_by_id(user_id).one(db).await? else {
        debug!("User not found for update");
        return Ok(None);
    };

    let mut active: user::ActiveModel = existing.into();
    if let Some(name) = data.name {
        active.name = Set(name);
    }
    if let Some(password_hash) = data.password_hash {
        active.password_hash = Set(password_hash);
    }
    active.modified_at = Set(Utc::now());
    active.update(db).await?;

    find_one(db, user_id).await
}

#[instrument(skip(db))]
pub async fn find_one<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Option<UserProfile>> {
    user::Entity::find_by_id(user_id)
        .find_also_related(currency::Entity)
        .one(db)
        .await?
        .map(into_profile)
        .transpose()
}

#[instrument(skip(db))]
pub async fn find_one_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<UserProfile>> {
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .find_also_related(currency::Entity)
        .one(db)
        .await?
        .map(into_profile)
        .transpose()
}

#[instrument(skip(db))]
pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<user::Model>> {
    Ok(user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?)
}

/// Load several users at once, in id order. Unknown ids are skipped.
#[instrument(skip(db))]
pub async fn find_many<C: ConnectionTrait>(db: &C, user_ids: &[i32]) -> Result<Vec<user::Model>> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids.iter().copied()))
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?)
}

/// Delete everything the user owns, leaving the user row itself in place.
///
/// Call inside a transaction together with [`delete_one`].
#[instrument(skip(db))]
pub async fn delete_data<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<()> {
    trace!("Entering user::delete_data");

    let operations = operation::Entity::delete_many()
        .filter(operation::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    debug!(rows = operations.rows_affected, "Deleted operations");

    let owned_budgets = budget::Entity::find()
        .select_only()
        .column(budget::Column::Id)
        .filter(budget::Column::UserId.eq(user_id))
        .into_query();
    budget_account::Entity::delete_many()
        .filter(budget_account::Column::BudgetId.in_subquery(owned_budgets))
        .exec(db)
        .await?;

    let budgets = budget::Entity::delete_many()
        .filter(budget::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    debug!(rows = budgets.rows_affected, "Deleted budgets");

    periodic_budget::Entity::delete_many()
        .filter(periodic_budget::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    let imports = import::Entity::delete_many()
        .filter(import::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    debug!(rows = imports.rows_affected, "Deleted imports");

    import_rule::Entity::delete_many()
        .filter(import_rule::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    let accounts = account::Entity::delete_many()
        .filter(account::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    debug!(rows = accounts.rows_affected, "Deleted accounts");

    user_image::Entity::delete_many()
        .filter(user_image::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    follow::Entity::delete_many()
        .filter(
            Condition::any()
                .add(follow::Column::FollowerId.eq(user_id))
                .add(follow::Column::FollowedId.eq(user_id)),
        )
        .exec(db)
        .await?;

    info!("User data deleted");
    Ok(())
}

/// Delete the user row only. Returns whether a row was removed.
#[instrument(skip(db))]
pub async fn delete_one<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<bool> {
    let result = user::Entity::delete_by_id(user_id).exec(db).await?;
    debug!(rows = result.rows_affected, "Delete user completed");
    Ok(result.rows_affected > 0)
}

// Images

#[instrument(skip(db))]
pub async fn create_image<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    file_path: &str,
) -> Result<user_image::Model> {
    let image = user_image::ActiveModel {
        user_id: Set(user_id),
        file_path: Set(file_path.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(image_id = image.id, "User image recorded");
    Ok(image)
}

/// Find an image owned by the given user.
#[instrument(skip(db))]
pub async fn find_image<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    image_id: i32,
) -> Result<Option<user_image::Model>> {
    Ok(user_image::Entity::find_by_id(image_id)
        .filter(user_image::Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

#[instrument(skip(db))]
pub async fn find_images<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<user_image::Model>> {
    Ok(user_image::Entity::find()
        .filter(user_image::Column::UserId.eq(user_id))
        .order_by_asc(user_image::Column::Id)
        .all(db)
        .await?)
}

#[instrument(skip(db))]
pub async fn delete_image<C: ConnectionTrait>(db: &C, image_id: i32) -> Result<bool> {
    let result = user_image::Entity::delete_by_id(image_id).exec(db).await?;
    Ok(result.rows_affected > 0)
}
