#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marketplace listing lifecycle for a catalog item.
///
/// `not_listed` → `listed` on successful remote creation, `listed` →
/// `updated` once a quantity/price revision is acknowledged, and back to
/// `listed` when price or stock changes locally so the next sync run picks
/// the item up again. `error` carries a diagnostic in `debug_info` and is
/// only retried by the create flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ItemStatus {
    NotListed,
    Listed,
    Updated,
    Error,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::NotListed => "not_listed",
            ItemStatus::Listed => "listed",
            ItemStatus::Updated => "updated",
            ItemStatus::Error => "error",
        }
    }
}

/// A sellable catalog item keyed by its immutable SKU.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Item {
    pub sku: String,
    /// Remote listing identifier, assigned once on successful creation.
    pub item_id: Option<String>,
    pub brand: String,
    pub part_name: String,
    pub partslink: String,
    pub oem_number: String,
    pub price: f64,
    pub shipping_revenue18: f64,
    pub handling_revenue18: f64,
    pub stock_va: i64,
    pub stock_il: i64,
    pub stock_las1: i64,
    pub stock_peru: i64,
    pub stock_gpt: i64,
    pub stock_jax: i64,
    /// Aggregate stock across warehouses; the authoritative quantity.
    pub stock: i64,
    pub image_url: Option<String>,
    pub pdescription: String,
    pub status: ItemStatus,
    pub debug_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A normalized source-file row. Ephemeral: consumed by the reconciler,
/// never persisted in this shape.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestRecord {
    pub sku: String,
    pub brand: String,
    pub part_name: String,
    pub partslink: String,
    pub oem_number: String,
    pub price: f64,
    pub shipping_revenue18: f64,
    pub handling_revenue18: f64,
    pub stock_va: i64,
    pub stock_il: i64,
    pub stock_las1: i64,
    pub stock_peru: i64,
    pub stock_gpt: i64,
    pub stock_jax: i64,
    pub stock: i64,
    pub pdescription: String,
}

/// A source file already folded into the catalog. Fingerprint uniqueness
/// gives at-most-once full processing per distinct file content.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProcessedFile {
    pub name: String,
    pub file_hash: String,
    pub processed_at: DateTime<Utc>,
}

/// The current marketplace API credential. A single logical row, updated
/// in place whenever the token is refreshed (last writer wins).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiToken {
    pub access_token: String,
    pub token_type: String,
    pub updated_at: DateTime<Utc>,
}
