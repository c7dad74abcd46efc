use crate::models::{IngestRecord, Item, ItemStatus};
use crate::store::{CatalogStore, ItemUpdate, StoreError};
use std::collections::HashMap;
use tracing::debug;

/// Records fetched and compared per catalog lookup round.
const CHUNK_SIZE: usize = 10_000;
/// Queued writes per transactional flush.
const BATCH_SIZE: usize = 1_000;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub inserted: u64,
    pub updated: u64,
    pub unchanged: u64,
}

/// Merges normalized records into the item catalog.
///
/// New SKUs become `not_listed` items; existing SKUs are updated only when
/// price or aggregate stock actually changed, and an item sitting in
/// `updated` reverts to `listed` so the synchronizer pushes the new values
/// on its next run. Each flush is one transaction; a failed flush surfaces
/// as an error and leaves prior committed flushes intact.
pub struct Reconciler<'a> {
    store: &'a CatalogStore,
    chunk_size: usize,
    batch_size: usize,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a CatalogStore) -> Self {
        Self {
            store,
            chunk_size: CHUNK_SIZE,
            batch_size: BATCH_SIZE,
        }
    }

    #[cfg(test)]
    fn with_sizes(store: &'a CatalogStore, chunk_size: usize, batch_size: usize) -> Self {
        Self {
            store,
            chunk_size,
            batch_size,
        }
    }

    pub async fn reconcile(
        &self,
        records: &[IngestRecord],
    ) -> Result<ReconcileSummary, StoreError> {
        let mut summary = ReconcileSummary::default();
        for chunk in records.chunks(self.chunk_size.max(1)) {
            let skus: Vec<String> = chunk.iter().map(|rec| rec.sku.clone()).collect();
            let existing: HashMap<String, Item> = self
                .store
                .fetch_by_skus(&skus)
                .await?
                .into_iter()
                .map(|item| (item.sku.clone(), item))
                .collect();

            let mut inserts: Vec<IngestRecord> = Vec::new();
            let mut updates: Vec<ItemUpdate> = Vec::new();
            for rec in chunk {
                match existing.get(&rec.sku) {
                    None => inserts.push(rec.clone()),
                    Some(item) => {
                        if !price_or_stock_changed(item, rec) {
                            summary.unchanged += 1;
                            continue;
                        }
                        updates.push(ItemUpdate {
                            sku: rec.sku.clone(),
                            price: rec.price,
                            stock_va: rec.stock_va,
                            stock_il: rec.stock_il,
                            stock_las1: rec.stock_las1,
                            stock_peru: rec.stock_peru,
                            stock_gpt: rec.stock_gpt,
                            stock_jax: rec.stock_jax,
                            stock: rec.stock,
                            status: next_status(item.status),
                        });
                    }
                }
                if inserts.len() >= self.batch_size {
                    summary.inserted += self.store.insert_records(&inserts).await?;
                    inserts.clear();
                }
                if updates.len() >= self.batch_size {
                    summary.updated += self.store.apply_updates(&updates).await?;
                    updates.clear();
                }
            }
            summary.inserted += self.store.insert_records(&inserts).await?;
            summary.updated += self.store.apply_updates(&updates).await?;
            debug!(
                target = "partsync.ingest",
                chunk = chunk.len(),
                inserted = summary.inserted,
                updated = summary.updated,
                "chunk reconciled"
            );
        }
        Ok(summary)
    }
}

fn price_or_stock_changed(item: &Item, rec: &IngestRecord) -> bool {
    cents(item.price) != cents(rec.price) || item.stock != rec.stock
}

// Prices are two-decimal currency values; comparing in cents avoids float
// representation noise from the DB round trip.
fn cents(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// A locally changed item that was already synced (`updated`) drops back to
/// `listed`; any other status is preserved.
fn next_status(current: ItemStatus) -> ItemStatus {
    if current == ItemStatus::Updated {
        ItemStatus::Listed
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{normalize, to_records};
    use crate::sheet::Table;
    use crate::store::tests::{memory_store, sample_record};

    fn source_table(rows: Vec<Vec<&str>>) -> Table {
        Table {
            headers: vec![
                "SKU".into(),
                "PART_NAME".into(),
                "STOCK_TOTAL".into(),
                "B2B_PRICE15".into(),
            ],
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
        }
    }

    #[tokio::test]
    async fn new_skus_land_as_not_listed() {
        let store = memory_store().await;
        let summary = Reconciler::new(&store)
            .reconcile(&[sample_record("100", 9.99, 5)])
            .await
            .expect("reconcile");
        assert_eq!(summary.inserted, 1);
        let item = &store.fetch_by_skus(&["100".into()]).await.expect("fetch")[0];
        assert_eq!(item.status, ItemStatus::NotListed);
        assert_eq!(item.stock, 5);
    }

    #[tokio::test]
    async fn malformed_rows_never_reach_the_catalog() {
        // One valid row and one sentinel row: exactly one item afterwards.
        let store = memory_store().await;
        let table = source_table(vec![
            vec!["100", "Fender Liner", "5", "9.99"],
            vec!["0", "", "0", ""],
        ]);
        let records = to_records(&normalize(&table));
        let summary = Reconciler::new(&store)
            .reconcile(&records)
            .await
            .expect("reconcile");
        assert_eq!(summary.inserted, 1);
        let items = store.fetch_by_skus(&["100".into(), "0".into()]).await.expect("fetch");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].sku, "100");
        assert_eq!(items[0].status, ItemStatus::NotListed);
    }

    #[tokio::test]
    async fn unchanged_records_queue_nothing() {
        let store = memory_store().await;
        let reconciler = Reconciler::new(&store);
        reconciler
            .reconcile(&[sample_record("100", 9.99, 5)])
            .await
            .expect("seed");
        let summary = reconciler
            .reconcile(&[sample_record("100", 9.99, 5)])
            .await
            .expect("reconcile");
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.unchanged, 1);
    }

    #[tokio::test]
    async fn synced_item_reverts_to_listed_on_local_change() {
        let store = memory_store().await;
        let reconciler = Reconciler::new(&store);
        reconciler
            .reconcile(&[sample_record("100", 9.99, 5)])
            .await
            .expect("seed");
        store.mark_listed("100", "901234").await.expect("listed");
        store.mark_updated(&["100".into()]).await.expect("updated");

        // Same price, new stock: the item must go back to `listed`, never
        // stay `updated` or fall to `not_listed`.
        let summary = reconciler
            .reconcile(&[sample_record("100", 9.99, 3)])
            .await
            .expect("reconcile");
        assert_eq!(summary.updated, 1);
        let item = &store.fetch_by_skus(&["100".into()]).await.expect("fetch")[0];
        assert_eq!(item.status, ItemStatus::Listed);
        assert_eq!(item.stock, 3);
        assert_eq!(item.item_id.as_deref(), Some("901234"));
    }

    #[tokio::test]
    async fn non_updated_status_survives_a_change() {
        let store = memory_store().await;
        let reconciler = Reconciler::new(&store);
        reconciler
            .reconcile(&[sample_record("100", 9.99, 5)])
            .await
            .expect("seed");
        store.mark_error("100", "bad title").await.expect("error");

        reconciler
            .reconcile(&[sample_record("100", 12.50, 5)])
            .await
            .expect("reconcile");
        let item = &store.fetch_by_skus(&["100".into()]).await.expect("fetch")[0];
        assert_eq!(item.status, ItemStatus::Error);
        assert!((item.price - 12.50).abs() < 0.001);
    }

    #[tokio::test]
    async fn small_batches_flush_incrementally() {
        let store = memory_store().await;
        let records: Vec<_> = (0..7)
            .map(|i| sample_record(&format!("{}", 100 + i), 9.99, 5))
            .collect();
        let summary = Reconciler::with_sizes(&store, 3, 2)
            .reconcile(&records)
            .await
            .expect("reconcile");
        assert_eq!(summary.inserted, 7);
        let skus: Vec<String> = records.iter().map(|r| r.sku.clone()).collect();
        assert_eq!(store.fetch_by_skus(&skus).await.expect("fetch").len(), 7);
    }

    #[tokio::test]
    async fn repeated_sku_in_one_run_inserts_once() {
        let store = memory_store().await;
        let summary = Reconciler::new(&store)
            .reconcile(&[sample_record("100", 9.99, 5), sample_record("100", 9.99, 5)])
            .await
            .expect("reconcile");
        assert_eq!(summary.inserted, 1);
    }
}
