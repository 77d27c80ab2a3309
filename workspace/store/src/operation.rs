use chrono::{NaiveDate, Utc};
use model::entities::operation;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, instrument};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationCreate {
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}

/// Insert operations one by one so the caller gets the stored rows back.
#[instrument(skip(db, operations), fields(count = operations.len()))]
pub async fn create_many<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    account_id: i32,
    import_id: Option<i32>,
    operations: Vec<OperationCreate>,
) -> Result<Vec<operation::Model>> {
    let now = Utc::now();
    let mut created = Vec::with_capacity(operations.len());
    for data in operations {
        let model = operation::ActiveModel {
            user_id: Set(user_id),
            account_id: Set(account_id),
            import_id: Set(import_id),
            description: Set(data.description),
            amount: Set(data.amount),
            date: Set(data.date),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        created.push(model);
    }
    debug!(count = created.len(), "Operations created");
    Ok(created)
}

/// Operations of one account, newest date first.
#[instrument(skip(db))]
pub async fn find_all_by_account<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    account_id: i32,
) -> Result<Vec<operation::Model>> {
    Ok(operation::Entity::find()
        .filter(operation::Column::UserId.eq(user_id))
        .filter(operation::Column::AccountId.eq(account_id))
        .order_by_desc(operation::Column::Date)
        .order_by_asc(operation::Column::Id)
        .all(db)
        .await?)
}
