//! Currency reference data behind the in-process cache.
//!
//! Currencies are seeded by migrations and never change at runtime, so a
//! cached copy is always valid until it expires.

use model::entities::currency;
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use tracing::{debug, instrument, trace};

use crate::error::Result;
use crate::schemas::CachedData;

const ALL_CURRENCIES_KEY: &str = "currencies:all";

pub struct CurrencyService {
    db: DatabaseConnection,
    cache: Cache<String, CachedData>,
}

impl CurrencyService {
    pub fn new(db: DatabaseConnection, cache: Cache<String, CachedData>) -> Self {
        Self { db, cache }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<currency::Model>> {
        if let Some(CachedData::Currencies(currencies)) = self.cache.get(ALL_CURRENCIES_KEY).await {
            trace!("Currency list served from cache");
            return Ok(currencies);
        }

        let currencies = store::currency::find_all(&self.db).await?;
        debug!(count = currencies.len(), "Caching currency list");
        self.cache
            .insert(
                ALL_CURRENCIES_KEY.to_string(),
                CachedData::Currencies(currencies.clone()),
            )
            .await;
        Ok(currencies)
    }

    #[instrument(skip(self))]
    pub async fn find_by_iso_code(&self, iso_code: &str) -> Result<Option<currency::Model>> {
        let key = format!("currencies:{}", iso_code.to_uppercase());
        if let Some(CachedData::Currency(currency)) = self.cache.get(&key).await {
            trace!("Currency served from cache");
            return Ok(Some(currency));
        }

        let found = store::currency::find_by_iso_code(&self.db, iso_code).await?;
        if let Some(currency) = &found {
            self.cache
                .insert(key, CachedData::Currency(currency.clone()))
                .await;
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_list_is_cached() {
        let db = setup_test_db().await;
        let cache = Cache::new(100);
        let service = CurrencyService::new(db, cache.clone());

        let first = service.list().await.unwrap();
        assert!(!first.is_empty());
        assert!(cache.get(ALL_CURRENCIES_KEY).await.is_some());

        let second = service.list().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_find_by_iso_code() {
        let db = setup_test_db().await;
        let service = CurrencyService::new(db, Cache::new(100));

        let usd = service.find_by_iso_code("usd").await.unwrap().unwrap();
        assert_eq!(usd.iso_code, "USD");
        // Second lookup hits the cache
        assert_eq!(service.find_by_iso_code("USD").await.unwrap(), Some(usd));

        assert!(service.find_by_iso_code("XYZ").await.unwrap().is_none());
    }
}
