use crate::config::EbayConfig;
use crate::ebay::trading::{
    self, Ack, AddItemEntry, BulkAddRequest, BulkAddResponse, ItemPayload, ReviseRequest,
    ReviseStatusEntry,
};
use crate::models::Item;
use crate::store::{CatalogStore, StoreError};
use reqwest::Client;
use thiserror::Error;
use tracing::{info, warn};

/// Pagination-safety cap on create candidates per run.
const LISTING_RUN_CAP: i64 = 25_000;
/// The remote bulk-add endpoint accepts at most a handful of items per call.
const LISTING_BATCH_SIZE: usize = 5;
const REVISE_RUN_CAP: i64 = 10_000;
const REVISE_BATCH_SIZE: usize = 4;

const LISTING_CATEGORY_ID: &str = "6755";
const CONDITION_NEW: u32 = 1000;

/// Remote batch failures are logged and retried next run; only local store
/// failures propagate, since they mean catalog state can no longer be
/// trusted to match remote acknowledgments.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome for one submitted item, resolved from the batch response.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Listed { item_id: String },
    Failed { detail: String },
}

pub struct Synchronizer<'a> {
    store: &'a CatalogStore,
    http: &'a Client,
    config: &'a EbayConfig,
}

impl<'a> Synchronizer<'a> {
    pub fn new(store: &'a CatalogStore, http: &'a Client, config: &'a EbayConfig) -> Self {
        Self {
            store,
            http,
            config,
        }
    }

    pub async fn run(&self, access_token: &str) -> Result<(), SyncError> {
        self.push_new_listings(access_token).await?;
        self.revise_listed_items(access_token).await?;
        Ok(())
    }

    /// Create/list flow: not_listed|error → listed | error.
    pub async fn push_new_listings(&self, access_token: &str) -> Result<(), SyncError> {
        let items = self.store.listing_candidates(LISTING_RUN_CAP).await?;
        if items.is_empty() {
            info!(target = "partsync.sync", "no items to list");
            return Ok(());
        }
        info!(
            target = "partsync.sync",
            count = items.len(),
            "submitting create batches"
        );
        for batch in items.chunks(LISTING_BATCH_SIZE) {
            let request = build_add_request(access_token, batch);
            let response = match trading::bulk_add_items(self.http, self.config, &request).await {
                Ok(response) => response,
                Err(err) => {
                    // Transport failure: statuses stay put so the next
                    // scheduled run retries the whole batch.
                    warn!(
                        target = "partsync.sync",
                        error = %err,
                        batch = batch.len(),
                        "add-items batch submission failed"
                    );
                    continue;
                }
            };
            if response.ack == Ack::Failure {
                warn!(
                    target = "partsync.sync",
                    batch = batch.len(),
                    "add-items batch rejected outright; left for retry"
                );
                continue;
            }
            let outcomes = resolve_add_outcomes(batch.len(), &response);
            self.apply_add_outcomes(batch, &outcomes).await?;
        }
        Ok(())
    }

    pub(crate) async fn apply_add_outcomes(
        &self,
        batch: &[Item],
        outcomes: &[ItemOutcome],
    ) -> Result<(), SyncError> {
        for (item, outcome) in batch.iter().zip(outcomes) {
            match outcome {
                ItemOutcome::Listed { item_id } => {
                    self.store.mark_listed(&item.sku, item_id).await?;
                    info!(
                        target = "partsync.sync",
                        sku = %item.sku,
                        item_id = %item_id,
                        "item listed"
                    );
                }
                ItemOutcome::Failed { detail } => {
                    self.store.mark_error(&item.sku, detail).await?;
                    warn!(
                        target = "partsync.sync",
                        sku = %item.sku,
                        detail = %detail,
                        "item failed to list"
                    );
                }
            }
        }
        Ok(())
    }

    /// Revise flow: listed → updated, or still listed on failure. Faults are
    /// batch-level only: a rejected batch keeps all its members eligible for
    /// retry on the next run.
    pub async fn revise_listed_items(&self, access_token: &str) -> Result<(), SyncError> {
        let items = self.store.revise_candidates(REVISE_RUN_CAP).await?;
        if items.is_empty() {
            info!(target = "partsync.sync", "no listed items to revise");
            return Ok(());
        }
        info!(
            target = "partsync.sync",
            count = items.len(),
            "submitting revise batches"
        );
        for batch in items.chunks(REVISE_BATCH_SIZE) {
            let entries: Vec<ReviseStatusEntry> = batch
                .iter()
                .filter_map(|item| {
                    item.item_id.as_ref().map(|id| ReviseStatusEntry {
                        item_id: id.clone(),
                        quantity: item.stock,
                        start_price: format!("{:.2}", item.price),
                    })
                })
                .collect();
            let request = ReviseRequest {
                auth_token: access_token.to_string(),
                inventory_status: entries,
            };
            match trading::revise_inventory_status(self.http, self.config, &request).await {
                Ok(response) if response.ack == Ack::Success => {
                    let skus: Vec<String> = batch.iter().map(|item| item.sku.clone()).collect();
                    self.store.mark_updated(&skus).await?;
                    info!(
                        target = "partsync.sync",
                        batch = skus.len(),
                        "revise batch acknowledged"
                    );
                }
                Ok(response) => warn!(
                    target = "partsync.sync",
                    ack = ?response.ack,
                    errors = ?response.errors,
                    "revise batch rejected; items stay listed"
                ),
                Err(err) => warn!(
                    target = "partsync.sync",
                    error = %err,
                    "revise batch transport failure; items stay listed"
                ),
            }
        }
        Ok(())
    }
}

fn build_add_request(access_token: &str, batch: &[Item]) -> BulkAddRequest {
    BulkAddRequest {
        auth_token: access_token.to_string(),
        items: batch
            .iter()
            .enumerate()
            .map(|(index, item)| AddItemEntry {
                message_id: index,
                item: ItemPayload {
                    sku: item.sku.clone(),
                    title: item.pdescription.clone(),
                    description: build_description(item),
                    category_id: LISTING_CATEGORY_ID.to_string(),
                    start_price: format!("{:.2}", item.price),
                    quantity: 1,
                    condition_id: CONDITION_NEW,
                    country: "US",
                    currency: "USD",
                    picture_url: item.image_url.clone(),
                },
            })
            .collect(),
    }
}

fn build_description(item: &Item) -> String {
    format!(
        "Brand: {},\nPart Name: {},\nPart Link: {},\nOEM Number: {},\n\n{}",
        item.brand, item.part_name, item.partslink, item.oem_number, item.pdescription
    )
}

/// Maps per-item response entries back onto batch positions via their
/// correlation tokens. A token outside the batch bounds is its own error
/// class: it is logged, and any submitted item left without an
/// acknowledgment fails carrying the collected stray diagnostics rather
/// than crashing the run.
pub fn resolve_add_outcomes(batch_len: usize, response: &BulkAddResponse) -> Vec<ItemOutcome> {
    let mut slots: Vec<Option<ItemOutcome>> = (0..batch_len).map(|_| None).collect();
    let mut stray: Vec<String> = Vec::new();
    for entry in &response.items {
        let Some(slot) = slots.get_mut(entry.correlation_id) else {
            let detail = format!(
                "correlation token {} out of range for batch of {}",
                entry.correlation_id, batch_len
            );
            warn!(target = "partsync.sync", "{detail}");
            stray.push(detail);
            continue;
        };
        let outcome = match (&entry.item_id, &entry.errors) {
            (Some(item_id), _) => ItemOutcome::Listed {
                item_id: item_id.clone(),
            },
            (None, Some(detail)) => ItemOutcome::Failed {
                detail: detail.clone(),
            },
            (None, None) => ItemOutcome::Failed {
                detail: "response entry carried neither item id nor error".to_string(),
            },
        };
        *slot = Some(outcome);
    }

    // Every unacknowledged item carries the full stray list; with several
    // bad tokens there is no way to tell which one belonged to which slot.
    let fallback = if stray.is_empty() {
        "no acknowledgment for submitted item".to_string()
    } else {
        stray.join("; ")
    };
    slots
        .into_iter()
        .map(|slot| {
            slot.unwrap_or_else(|| ItemOutcome::Failed {
                detail: fallback.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ebay::trading::AddItemResult;
    use crate::models::ItemStatus;
    use crate::store::tests::{memory_store, sample_record};

    fn response(ack: Ack, items: Vec<AddItemResult>) -> BulkAddResponse {
        BulkAddResponse { ack, items }
    }

    fn result(correlation_id: usize, item_id: Option<&str>, errors: Option<&str>) -> AddItemResult {
        AddItemResult {
            correlation_id,
            item_id: item_id.map(String::from),
            errors: errors.map(String::from),
        }
    }

    #[test]
    fn resolves_mixed_batch_outcomes() {
        let outcomes = resolve_add_outcomes(
            2,
            &response(
                Ack::Warning,
                vec![
                    result(1, None, Some("title too long")),
                    result(0, Some("901"), None),
                ],
            ),
        );
        assert_eq!(
            outcomes[0],
            ItemOutcome::Listed {
                item_id: "901".into()
            }
        );
        assert_eq!(
            outcomes[1],
            ItemOutcome::Failed {
                detail: "title too long".into()
            }
        );
    }

    #[test]
    fn out_of_range_token_fails_the_unacknowledged_item() {
        // Batch of 2: token 0 succeeds, token 5 cannot be resolved. The
        // item at position 1 must end up failed, not panic the run.
        let outcomes = resolve_add_outcomes(
            2,
            &response(
                Ack::Warning,
                vec![result(0, Some("901"), None), result(5, Some("902"), None)],
            ),
        );
        assert_eq!(
            outcomes[0],
            ItemOutcome::Listed {
                item_id: "901".into()
            }
        );
        match &outcomes[1] {
            ItemOutcome::Failed { detail } => {
                assert!(detail.contains("out of range"), "got: {detail}")
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn every_stray_token_lands_in_each_unacknowledged_diagnostic() {
        let outcomes = resolve_add_outcomes(
            3,
            &response(
                Ack::Warning,
                vec![
                    result(0, Some("901"), None),
                    result(7, Some("902"), None),
                    result(9, None, Some("bad title")),
                ],
            ),
        );
        for outcome in &outcomes[1..] {
            match outcome {
                ItemOutcome::Failed { detail } => {
                    assert!(detail.contains("token 7"), "got: {detail}");
                    assert!(detail.contains("token 9"), "got: {detail}");
                }
                other => panic!("expected failure, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_acknowledgment_without_strays_gets_generic_detail() {
        let outcomes =
            resolve_add_outcomes(2, &response(Ack::Warning, vec![result(0, Some("901"), None)]));
        match &outcomes[1] {
            ItemOutcome::Failed { detail } => {
                assert!(detail.contains("no acknowledgment"), "got: {detail}")
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn outcomes_drive_catalog_status() {
        let store = memory_store().await;
        store
            .insert_records(&[sample_record("100", 9.99, 5), sample_record("200", 5.00, 2)])
            .await
            .expect("insert");
        let mut batch = store
            .fetch_by_skus(&["100".into(), "200".into()])
            .await
            .expect("fetch");
        batch.sort_by(|a, b| a.sku.cmp(&b.sku));

        let config = EbayConfig {
            base_url: "https://api.sandbox.ebay.com".into(),
            client_id: "id".into(),
            client_secret: "secret".into(),
            refresh_token: "refresh".into(),
            redirect_uri: "ru".into(),
        };
        let http = Client::new();
        let synchronizer = Synchronizer::new(&store, &http, &config);

        let outcomes = resolve_add_outcomes(
            2,
            &response(
                Ack::Warning,
                vec![result(0, Some("901"), None), result(5, Some("902"), None)],
            ),
        );
        synchronizer
            .apply_add_outcomes(&batch, &outcomes)
            .await
            .expect("apply");

        let items = store
            .fetch_by_skus(&["100".into(), "200".into()])
            .await
            .expect("fetch");
        let listed = items.iter().find(|i| i.sku == "100").expect("sku 100");
        assert_eq!(listed.status, ItemStatus::Listed);
        assert_eq!(listed.item_id.as_deref(), Some("901"));
        let failed = items.iter().find(|i| i.sku == "200").expect("sku 200");
        assert_eq!(failed.status, ItemStatus::Error);
        assert!(
            failed
                .debug_info
                .as_deref()
                .unwrap_or_default()
                .contains("out of range")
        );
    }

    #[tokio::test]
    async fn add_request_uses_positional_tokens() {
        let store = memory_store().await;
        store
            .insert_records(&[sample_record("100", 9.99, 5), sample_record("200", 5.00, 2)])
            .await
            .expect("insert");
        let mut batch = store
            .fetch_by_skus(&["100".into(), "200".into()])
            .await
            .expect("fetch");
        batch.sort_by(|a, b| a.sku.cmp(&b.sku));

        let request = build_add_request("tok", &batch);
        assert_eq!(request.auth_token, "tok");
        let tokens: Vec<usize> = request.items.iter().map(|e| e.message_id).collect();
        assert_eq!(tokens, vec![0, 1]);
        assert_eq!(request.items[0].item.start_price, "9.99");
        assert_eq!(request.items[0].item.quantity, 1);
    }
}
