//! Accounts, their operations and statement imports.

use std::str::FromStr;

use chrono::NaiveDate;
use csv::StringRecord;
use model::entities::{import, operation};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, TransactionTrait};
use store::{
    account::{AccountCreate, AccountDetails, AccountUpdate},
    operation::OperationCreate,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{ApiError, Result};
use crate::services::users::UploadedFile;

/// Result of importing a statement file.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub import: import::Model,
    pub operations: Vec<operation::Model>,
}

pub struct AccountService {
    db: DatabaseConnection,
}

impl AccountService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, user_id: i32) -> Result<Vec<AccountDetails>> {
        Ok(store::account::find_all_by_user(&self.db, user_id).await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, user_id: i32, account_id: i32) -> Result<AccountDetails> {
        store::account::find_one_by_user(&self.db, user_id, account_id)
            .await?
            .ok_or_else(not_found)
    }

    #[instrument(skip(self, data), fields(name = %data.name))]
    pub async fn create(&self, user_id: i32, data: AccountCreate) -> Result<AccountDetails> {
        trace!("Entering account create");
        match store::account::create_one(&self.db, user_id, data).await {
            Ok(account) => Ok(account),
            Err(e) if e.is_duplicate() => Err(ApiError::DuplicateEntity(
                "Account with such name already exists".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, data))]
    pub async fn update(
        &self,
        user_id: i32,
        account_id: i32,
        data: AccountUpdate,
    ) -> Result<AccountDetails> {
        match store::account::update_one(&self.db, user_id, account_id, data).await {
            Ok(Some(account)) => Ok(account),
            Ok(None) => Err(not_found()),
            Err(e) if e.is_duplicate() => Err(ApiError::DuplicateEntity(
                "Account with such name already exists".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: i32, account_id: i32) -> Result<()> {
        if !store::account::delete_one(&self.db, user_id, account_id).await? {
            return Err(not_found());
        }
        info!("Account deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn operations(&self, user_id: i32, account_id: i32) -> Result<Vec<operation::Model>> {
        self.get(user_id, account_id).await?;
        Ok(store::operation::find_all_by_account(&self.db, user_id, account_id).await?)
    }

    /// Import a `date,description,amount` CSV statement into an account.
    ///
    /// The whole file is parsed before anything is written; the import row
    /// and its operations are stored in one transaction.
    #[instrument(skip(self, files), fields(files = files.len()))]
    pub async fn import_statement(
        &self,
        user_id: i32,
        account_id: i32,
        mut files: Vec<UploadedFile>,
    ) -> Result<ImportSummary> {
        trace!("Entering import_statement");

        self.get(user_id, account_id).await?;

        if files.len() != 1 {
            return Err(ApiError::InvalidData(
                "Exactly 1 statement file is required".to_string(),
            ));
        }
        let file = files.remove(0);

        let rows = parse_statement(&file.data)?;
        debug!(rows = rows.len(), "Statement parsed");

        let txn = self.db.begin().await?;
        let import = store::import::create_one(&txn, user_id, account_id, &file.file_name).await?;
        let operations =
            store::operation::create_many(&txn, user_id, account_id, Some(import.id), rows).await?;
        txn.commit().await?;

        info!(
            import_id = import.id,
            operations = operations.len(),
            "Statement imported"
        );
        Ok(ImportSummary { import, operations })
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("No such account was found".to_string())
}

/// Parse a statement with a `date,description,amount` header.
pub fn parse_statement(data: &[u8]) -> Result<Vec<OperationCreate>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| ApiError::InvalidData(format!("Cannot read statement header: {}", e)))?
        .clone();
    let expected = ["date", "description", "amount"];
    let actual: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    if actual != expected {
        warn!(?actual, "Unexpected statement header");
        return Err(ApiError::InvalidData(
            "Statement header must be date,description,amount".to_string(),
        ));
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1
        let line = idx + 2;
        let record = result.map_err(|e| ApiError::InvalidData(format!("Line {}: {}", line, e)))?;
        rows.push(
            parse_record(&record)
                .map_err(|e| ApiError::InvalidData(format!("Line {}: {}", line, e)))?,
        );
    }

    if rows.is_empty() {
        return Err(ApiError::InvalidData("Statement has no rows".to_string()));
    }
    Ok(rows)
}

fn parse_record(record: &StringRecord) -> std::result::Result<OperationCreate, String> {
    let date_str = record.get(0).ok_or("Missing date")?;
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}'", date_str))?;

    let description = record.get(1).ok_or("Missing description")?.to_string();

    let amount_str = record.get(2).ok_or("Missing amount")?;
    let amount =
        Decimal::from_str(amount_str).map_err(|_| format!("Invalid amount '{}'", amount_str))?;

    Ok(OperationCreate {
        description,
        amount,
        date,
    })
}
