use anyhow::Result;
use tracing::{info, trace};

use super::{init_database, serve};
use crate::config::AppConfig;

pub async fn migrate_and_serve(config: &AppConfig) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations before starting the server");

    init_database(&config.database.url).await?;
    serve(config).await
}
