use crate::models::{ApiToken, IngestRecord, Item, ItemStatus, ProcessedFile};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Price and stock fields queued for a batched catalog update.
#[derive(Debug, Clone)]
pub struct ItemUpdate {
    pub sku: String,
    pub price: f64,
    pub stock_va: i64,
    pub stock_il: i64,
    pub stock_las1: i64,
    pub stock_peru: i64,
    pub stock_gpt: i64,
    pub stock_jax: i64,
    pub stock: i64,
    pub status: ItemStatus,
}

/// Transactional record store for the item catalog, processed-file markers
/// and the marketplace credential. Bulk writes each run as a single
/// all-or-nothing transaction.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    pool: SqlitePool,
}

impl CatalogStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Runs are batch-sequential; one connection keeps catalog writes
        // serialized per SKU without extra locking.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                sku TEXT PRIMARY KEY,
                item_id TEXT UNIQUE,
                brand TEXT NOT NULL DEFAULT '',
                part_name TEXT NOT NULL DEFAULT '',
                partslink TEXT NOT NULL DEFAULT '',
                oem_number TEXT NOT NULL DEFAULT '',
                price REAL NOT NULL DEFAULT 0,
                shipping_revenue18 REAL NOT NULL DEFAULT 0,
                handling_revenue18 REAL NOT NULL DEFAULT 0,
                stock_va INTEGER NOT NULL DEFAULT 0,
                stock_il INTEGER NOT NULL DEFAULT 0,
                stock_las1 INTEGER NOT NULL DEFAULT 0,
                stock_peru INTEGER NOT NULL DEFAULT 0,
                stock_gpt INTEGER NOT NULL DEFAULT 0,
                stock_jax INTEGER NOT NULL DEFAULT 0,
                stock INTEGER NOT NULL DEFAULT 0,
                image_url TEXT,
                pdescription TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'not_listed',
                debug_info TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_status ON items(status)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS processed_files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                file_hash TEXT NOT NULL UNIQUE,
                processed_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS api_tokens (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                access_token TEXT NOT NULL,
                token_type TEXT NOT NULL DEFAULT 'User Access Token',
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ---- catalog ----

    pub async fn fetch_by_skus(&self, skus: &[String]) -> Result<Vec<Item>, StoreError> {
        if skus.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM items WHERE sku IN (");
        let mut separated = qb.separated(", ");
        for sku in skus {
            separated.push_bind(sku);
        }
        qb.push(")");
        let items = qb.build_query_as::<Item>().fetch_all(&self.pool).await?;
        Ok(items)
    }

    /// Bulk insert with insert-or-ignore semantics on the SKU key, in one
    /// transaction. Returns the number of rows actually inserted; re-sent
    /// SKUs in the same run fall out as ignored conflicts.
    pub async fn insert_records(&self, records: &[IngestRecord]) -> Result<u64, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT OR IGNORE INTO items (sku, brand, part_name, partslink, oem_number, \
             price, shipping_revenue18, handling_revenue18, stock_va, stock_il, stock_las1, \
             stock_peru, stock_gpt, stock_jax, stock, pdescription, status, created_at, updated_at) ",
        );
        qb.push_values(records, |mut b, rec| {
            b.push_bind(&rec.sku)
                .push_bind(&rec.brand)
                .push_bind(&rec.part_name)
                .push_bind(&rec.partslink)
                .push_bind(&rec.oem_number)
                .push_bind(rec.price)
                .push_bind(rec.shipping_revenue18)
                .push_bind(rec.handling_revenue18)
                .push_bind(rec.stock_va)
                .push_bind(rec.stock_il)
                .push_bind(rec.stock_las1)
                .push_bind(rec.stock_peru)
                .push_bind(rec.stock_gpt)
                .push_bind(rec.stock_jax)
                .push_bind(rec.stock)
                .push_bind(&rec.pdescription)
                .push_bind(ItemStatus::NotListed)
                .push_bind(now)
                .push_bind(now);
        });
        let result = qb.build().execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    /// Applies a batch of price/stock updates in one transaction.
    pub async fn apply_updates(&self, updates: &[ItemUpdate]) -> Result<u64, StoreError> {
        if updates.is_empty() {
            return Ok(0);
        }
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut affected = 0;
        for update in updates {
            let result = sqlx::query(
                "UPDATE items SET price = ?, stock_va = ?, stock_il = ?, stock_las1 = ?, \
                 stock_peru = ?, stock_gpt = ?, stock_jax = ?, stock = ?, status = ?, \
                 updated_at = ? WHERE sku = ?",
            )
            .bind(update.price)
            .bind(update.stock_va)
            .bind(update.stock_il)
            .bind(update.stock_las1)
            .bind(update.stock_peru)
            .bind(update.stock_gpt)
            .bind(update.stock_jax)
            .bind(update.stock)
            .bind(update.status)
            .bind(now)
            .bind(&update.sku)
            .execute(&mut *tx)
            .await?;
            affected += result.rows_affected();
        }
        tx.commit().await?;
        Ok(affected)
    }

    /// Items eligible for the create/list flow: sellable stock and either
    /// never listed or parked in error from a previous run.
    pub async fn listing_candidates(&self, limit: i64) -> Result<Vec<Item>, StoreError> {
        let items = sqlx::query_as::<_, Item>(
            "SELECT * FROM items WHERE stock != 0 AND status IN (?, ?) ORDER BY sku LIMIT ?",
        )
        .bind(ItemStatus::NotListed)
        .bind(ItemStatus::Error)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Items eligible for a quantity/price revision.
    pub async fn revise_candidates(&self, limit: i64) -> Result<Vec<Item>, StoreError> {
        let items = sqlx::query_as::<_, Item>(
            "SELECT * FROM items WHERE status = ? AND stock != 0 AND item_id IS NOT NULL \
             ORDER BY sku LIMIT ?",
        )
        .bind(ItemStatus::Listed)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn mark_listed(&self, sku: &str, item_id: &str) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE items SET item_id = ?, status = ?, debug_info = NULL, updated_at = ? \
             WHERE sku = ?",
        )
        .bind(item_id)
        .bind(ItemStatus::Listed)
        .bind(Utc::now())
        .bind(sku)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn mark_error(&self, sku: &str, debug_info: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE items SET status = ?, debug_info = ?, updated_at = ? WHERE sku = ?")
            .bind(ItemStatus::Error)
            .bind(debug_info)
            .bind(Utc::now())
            .bind(sku)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Marks every SKU in an acknowledged revise batch as `updated`, in one
    /// transaction.
    pub async fn mark_updated(&self, skus: &[String]) -> Result<(), StoreError> {
        if skus.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        for sku in skus {
            sqlx::query("UPDATE items SET status = ?, updated_at = ? WHERE sku = ?")
                .bind(ItemStatus::Updated)
                .bind(now)
                .bind(sku)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    // ---- processed files ----

    pub async fn find_processed(
        &self,
        file_hash: &str,
    ) -> Result<Option<ProcessedFile>, StoreError> {
        let processed = sqlx::query_as::<_, ProcessedFile>(
            "SELECT name, file_hash, processed_at FROM processed_files WHERE file_hash = ?",
        )
        .bind(file_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(processed)
    }

    pub async fn record_processed(&self, name: &str, file_hash: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO processed_files (name, file_hash, processed_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(file_hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ---- credential ----

    pub async fn load_token(&self) -> Result<Option<ApiToken>, StoreError> {
        let token = sqlx::query_as::<_, ApiToken>(
            "SELECT access_token, token_type, updated_at FROM api_tokens WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    /// Upserts the single credential row; safe to race, last writer wins.
    pub async fn save_token(&self, access_token: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO api_tokens (id, access_token, token_type, updated_at) \
             VALUES (1, ?, 'User Access Token', ?) \
             ON CONFLICT(id) DO UPDATE SET access_token = excluded.access_token, \
             updated_at = excluded.updated_at",
        )
        .bind(access_token)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
