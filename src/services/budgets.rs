use model::entities::budget;
use sea_orm::{DatabaseConnection, TransactionTrait};
use store::budget::{BudgetCreate, BudgetDetails};
use tracing::{info, instrument, trace, warn};

use crate::error::{ApiError, Result};

pub struct BudgetService {
    db: DatabaseConnection,
}

impl BudgetService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, user_id: i32) -> Result<Vec<budget::Model>> {
        Ok(store::budget::find_all_by_user(&self.db, user_id).await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, user_id: i32, budget_id: i32) -> Result<BudgetDetails> {
        store::budget::find_one_by_user(&self.db, user_id, budget_id)
            .await?
            .ok_or_else(not_found)
    }

    /// Every linked account must belong to the caller.
    #[instrument(skip(self, data), fields(name = %data.name))]
    pub async fn create(
        &self,
        user_id: i32,
        data: BudgetCreate,
        mut account_ids: Vec<i32>,
    ) -> Result<BudgetDetails> {
        trace!("Entering budget create");

        account_ids.sort_unstable();
        account_ids.dedup();

        let txn = self.db.begin().await?;

        if store::currency::find_one(&txn, data.currency_id).await?.is_none() {
            return Err(ApiError::InvalidData(format!(
                "Unknown currency: {}",
                data.currency_id
            )));
        }

        let owned = store::account::find_owned_ids(&txn, user_id, &account_ids).await?;
        if owned.len() != account_ids.len() {
            warn!(?account_ids, ?owned, "Budget references accounts the user does not own");
            return Err(ApiError::InvalidData(
                "Budget can only track your own accounts".to_string(),
            ));
        }

        let created = store::budget::create_one(&txn, user_id, data, &account_ids).await?;
        txn.commit().await?;

        info!(budget_id = created.budget.id, "Budget created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: i32, budget_id: i32) -> Result<()> {
        let txn = self.db.begin().await?;
        if !store::budget::delete_one(&txn, user_id, budget_id).await? {
            return Err(not_found());
        }
        txn.commit().await?;
        info!("Budget deleted");
        Ok(())
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("No such budget was found".to_string())
}
