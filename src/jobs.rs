use crate::config::AppConfig;
use crate::ebay::TokenManager;
use crate::ebay::auth::EbayAuthError;
use crate::http::build_client;
use crate::ingest::{Reconciler, ReconcileSummary, fingerprint_bytes, normalize, to_records};
use crate::sheet::{self, SheetError};
use crate::storage::{StorageClient, StorageError};
use crate::store::{CatalogStore, StoreError};
use crate::sync::{SyncError, Synchronizer};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Auth(#[from] EbayAuthError),
    #[error(transparent)]
    Sync(#[from] SyncError),
}

#[derive(Debug, Error)]
enum FileIngestError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The scheduled ingest job: pull the previous day's spreadsheet exports
/// and fold each one into the catalog. One bad file is logged and skipped;
/// it must not abort the rest of the run.
pub async fn run_ingest(config: &AppConfig) -> Result<(), JobError> {
    let store = CatalogStore::connect(&config.database_url).await?;
    store.init_schema().await?;
    let http = build_client(&config.http);
    let storage = StorageClient::new(config.storage.clone(), http);

    let keys = storage.list_candidate_files().await?;
    if keys.is_empty() {
        info!(
            target = "partsync.ingest",
            "no candidate files from the previous day"
        );
        return Ok(());
    }
    for key in keys {
        match ingest_file(&store, &storage, &key).await {
            Ok(Some(summary)) => info!(
                target = "partsync.ingest",
                file = %key,
                inserted = summary.inserted,
                updated = summary.updated,
                unchanged = summary.unchanged,
                "file reconciled"
            ),
            Ok(None) => info!(
                target = "partsync.ingest",
                file = %key,
                "file already processed; skipping"
            ),
            Err(err) => error!(
                target = "partsync.ingest",
                file = %key,
                error = %err,
                "file ingest failed"
            ),
        }
    }
    Ok(())
}

async fn ingest_file(
    store: &CatalogStore,
    storage: &StorageClient,
    key: &str,
) -> Result<Option<ReconcileSummary>, FileIngestError> {
    let bytes = storage.download(key).await?;
    ingest_bytes(store, key, &bytes).await
}

/// Returns `Ok(None)` when the content's fingerprint was already recorded.
///
/// The processed-file marker is written before reconciliation: a restart
/// between the two steps skips this file instead of folding it in twice.
/// Recovery is deleting the marker row and re-running.
async fn ingest_bytes(
    store: &CatalogStore,
    key: &str,
    bytes: &[u8],
) -> Result<Option<ReconcileSummary>, FileIngestError> {
    let file_hash = fingerprint_bytes(bytes);
    if let Some(previous) = store.find_processed(&file_hash).await? {
        debug!(
            target = "partsync.ingest",
            file = %previous.name,
            processed_at = %previous.processed_at,
            "fingerprint already recorded"
        );
        return Ok(None);
    }
    let table = sheet::parse_spreadsheet(bytes)?;
    let records = to_records(&normalize(&table));
    store.record_processed(file_name(key), &file_hash).await?;
    let summary = Reconciler::new(store).reconcile(&records).await?;
    Ok(Some(summary))
}

fn file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// The scheduled sync job: create listings for new/errored items, then
/// push quantity/price revisions for listed ones.
pub async fn run_sync(config: &AppConfig) -> Result<(), JobError> {
    let store = CatalogStore::connect(&config.database_url).await?;
    store.init_schema().await?;
    let http = build_client(&config.http);

    let token_manager = TokenManager::new(config.ebay.clone(), store.clone(), http.clone());
    let access_token = token_manager.ensure_access_token().await?;

    let synchronizer = Synchronizer::new(&store, &http, &config.ebay);
    synchronizer.run(&access_token).await?;
    Ok(())
}
