//! Statement import records.

use chrono::Utc;
use model::entities::import;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use tracing::{info, instrument};

use crate::error::Result;

#[instrument(skip(db))]
pub async fn create_one<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    account_id: i32,
    file_name: &str,
) -> Result<import::Model> {
    let record = import::ActiveModel {
        user_id: Set(user_id),
        account_id: Set(account_id),
        file_name: Set(file_name.to_string()),
        imported_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(import_id = record.id, "Import recorded");
    Ok(record)
}
