use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use moka::future::Cache;
use sea_orm::Database;
use serde::Deserialize;
use tracing::{debug, info, trace};

use crate::schemas::AppState;
use crate::services::{auth::AuthService, file_storage::FileStorage, users::WalletBootstrap};

const CONFIG_FILE: &str = "ducket.toml";
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;
/// Ten years.
const MAX_TOKEN_EXPIRATION_HOURS: u64 = 24 * 365 * 10;

/// Application configuration.
///
/// Sources, later ones winning: built-in defaults, `ducket.toml` in the
/// working directory, then `DUCKET__SECTION__KEY` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub bind_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_expiration_hours: u64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub attachments_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder()
            .set_default("server.bind_address", "0.0.0.0:3000")?
            .set_default("database.url", "sqlite://ducket.db?mode=rwc")?
            .set_default("auth.jwt_secret", "")?
            .set_default("auth.token_expiration_hours", 24)?
            .set_default("auth.bcrypt_cost", i64::from(bcrypt::DEFAULT_COST))?
            .set_default("storage.attachments_dir", "./data/attachments")?
            .set_default("storage.max_upload_bytes", 10 * 1024 * 1024)?;

        let config_path = PathBuf::from(CONFIG_FILE);
        if config_path.exists() {
            debug!("Loading configuration file {}", CONFIG_FILE);
            builder = builder.add_source(config::File::from(config_path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("DUCKET")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            bail!("JWT secret is required (set DUCKET__AUTH__JWT_SECRET)");
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.auth.bcrypt_cost) {
            bail!(
                "bcrypt cost must be between {} and {}",
                MIN_BCRYPT_COST,
                MAX_BCRYPT_COST
            );
        }
        if !(1..=MAX_TOKEN_EXPIRATION_HOURS).contains(&self.auth.token_expiration_hours) {
            bail!(
                "auth.token_expiration_hours must be between 1 and {}",
                MAX_TOKEN_EXPIRATION_HOURS
            );
        }
        if self.storage.max_upload_bytes == 0 {
            bail!("storage.max_upload_bytes must be positive");
        }
        Ok(())
    }

    /// Command line values override whatever the files and environment said.
    pub fn with_overrides(
        mut self,
        database_url: Option<String>,
        bind_address: Option<String>,
    ) -> Self {
        if let Some(url) = database_url {
            self.database.url = url;
        }
        if let Some(address) = bind_address {
            self.server.bind_address = address;
        }
        self
    }
}

/// Connect to the database and wire up every service.
pub async fn initialize_app_state(config: &AppConfig) -> Result<AppState> {
    trace!("Entering initialize_app_state");
    info!("Connecting to database: {}", config.database.url);
    let db = Database::connect(&config.database.url)
        .await
        .with_context(|| format!("Failed to connect to {}", config.database.url))?;

    let storage = FileStorage::new(config.storage.attachments_dir.clone());
    storage
        .initialize()
        .await
        .context("Failed to create attachments directory")?;
    debug!("Attachments stored in {:?}", config.storage.attachments_dir);

    let auth = AuthService::new(
        config.auth.jwt_secret.clone(),
        config.auth.token_expiration_hours,
        config.auth.bcrypt_cost,
    );

    let cache = Cache::builder()
        .max_capacity(1000)
        .time_to_live(Duration::from_secs(300))
        .build();

    Ok(AppState::new(
        db,
        cache,
        Arc::new(auth),
        Arc::new(storage),
        Arc::new(WalletBootstrap),
        config.storage.max_upload_bytes,
    ))
}
