mod config;
mod ebay;
mod http;
mod ingest;
mod jobs;
mod models;
mod sheet;
mod storage;
mod store;
mod sync;

use config::AppConfig;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(target = "partsync", "job failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _ = dotenvy::dotenv();
    init_tracing();

    match std::env::args().nth(1).as_deref() {
        Some("ingest") => {
            let config = AppConfig::from_env()?;
            jobs::run_ingest(&config).await?;
        }
        Some("sync") => {
            let config = AppConfig::from_env()?;
            jobs::run_sync(&config).await?;
        }
        _ => {
            eprintln!("usage: parts-listing-sync <ingest|sync>");
            std::process::exit(2);
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
