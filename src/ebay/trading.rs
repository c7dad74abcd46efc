use crate::config::EbayConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TradingError {
    #[error("request failed: {0}")]
    Request(String),
}

/// Batch-level acknowledgment from the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ack {
    Success,
    Warning,
    PartialFailure,
    Failure,
}

// ---- bulk add ----

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAddRequest {
    pub auth_token: String,
    pub items: Vec<AddItemEntry>,
}

/// One item of a bulk-add batch. `message_id` is the correlation token: the
/// item's position in the batch, echoed back by the marketplace because
/// response entries are not guaranteed to preserve array order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemEntry {
    pub message_id: usize,
    pub item: ItemPayload,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    pub sku: String,
    pub title: String,
    pub description: String,
    pub category_id: String,
    pub start_price: String,
    pub quantity: i64,
    pub condition_id: u32,
    pub country: &'static str,
    pub currency: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAddResponse {
    pub ack: Ack,
    #[serde(default)]
    pub items: Vec<AddItemResult>,
}

/// Per-item outcome inside a bulk-add response: a listing id on success, an
/// error detail otherwise, correlated back to the batch by `correlation_id`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemResult {
    pub correlation_id: usize,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub errors: Option<String>,
}

// ---- revise inventory status ----

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviseRequest {
    pub auth_token: String,
    pub inventory_status: Vec<ReviseStatusEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviseStatusEntry {
    pub item_id: String,
    pub quantity: i64,
    pub start_price: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviseResponse {
    pub ack: Ack,
    #[serde(default)]
    pub errors: Option<String>,
}

// ---- token status ----

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenStatusRequest {
    auth_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatusResponse {
    pub ack: Ack,
}

pub async fn bulk_add_items(
    client: &Client,
    config: &EbayConfig,
    request: &BulkAddRequest,
) -> Result<BulkAddResponse, TradingError> {
    post_json(client, &endpoint(config, "add_items"), request).await
}

pub async fn revise_inventory_status(
    client: &Client,
    config: &EbayConfig,
    request: &ReviseRequest,
) -> Result<ReviseResponse, TradingError> {
    post_json(client, &endpoint(config, "revise_inventory_status"), request).await
}

pub async fn get_token_status(
    client: &Client,
    config: &EbayConfig,
    access_token: &str,
) -> Result<TokenStatusResponse, TradingError> {
    let request = TokenStatusRequest {
        auth_token: access_token.to_string(),
    };
    post_json(client, &endpoint(config, "get_token_status"), &request).await
}

fn endpoint(config: &EbayConfig, call: &str) -> String {
    format!("{}/ws/trading/{call}", config.base_url.trim_end_matches('/'))
}

async fn post_json<Req, Resp>(client: &Client, url: &str, request: &Req) -> Result<Resp, TradingError>
where
    Req: Serialize,
    Resp: serde::de::DeserializeOwned,
{
    let response = client
        .post(url)
        .json(request)
        .send()
        .await
        .map_err(|err| TradingError::Request(err.to_string()))?;
    if !response.status().is_success() {
        return Err(TradingError::Request(format!(
            "HTTP {}",
            response.status()
        )));
    }
    response
        .json()
        .await
        .map_err(|err| TradingError::Request(err.to_string()))
}
