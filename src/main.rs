use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod error;
mod handlers;
mod middleware;
mod router;
mod schemas;
mod services;

#[cfg(test)]
mod openapi_tests;
#[cfg(test)]
mod tests;

use cli::Cli;

/// Main entry point for the Ducket application.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ducket=debug,store=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Ducket {} starting up", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    cli.run().await
}
