//! Read access to currency reference data.

use model::entities::currency;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::{instrument, trace};

use crate::error::Result;

#[instrument(skip(db))]
pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<currency::Model>> {
    trace!("Loading all currencies");
    Ok(currency::Entity::find()
        .order_by_asc(currency::Column::IsoCode)
        .all(db)
        .await?)
}

#[instrument(skip(db))]
pub async fn find_one<C: ConnectionTrait>(db: &C, currency_id: i32) -> Result<Option<currency::Model>> {
    Ok(currency::Entity::find_by_id(currency_id).one(db).await?)
}

/// Codes are stored upper-case, so the input is upper-cased before matching.
#[instrument(skip(db))]
pub async fn find_by_iso_code<C: ConnectionTrait>(
    db: &C,
    iso_code: &str,
) -> Result<Option<currency::Model>> {
    Ok(currency::Entity::find()
        .filter(currency::Column::IsoCode.eq(iso_code.to_uppercase()))
        .one(db)
        .await?)
}
