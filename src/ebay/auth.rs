use crate::config::EbayConfig;
use crate::ebay::trading::{self, Ack};
use crate::store::{CatalogStore, StoreError};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum EbayAuthError {
    #[error("missing ebay app credentials")]
    MissingCredentials,
    #[error("oauth request failed: {0}")]
    Request(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
}

/// Owns the marketplace credential: probes the cached token before use and
/// refreshes it reactively when the probe rejects it. The refreshed token
/// is persisted last-writer-wins, so concurrent refreshes are safe.
pub struct TokenManager {
    config: EbayConfig,
    store: CatalogStore,
    http: Client,
}

impl TokenManager {
    pub fn new(config: EbayConfig, store: CatalogStore, http: Client) -> Self {
        Self {
            config,
            store,
            http,
        }
    }

    pub async fn ensure_access_token(&self) -> Result<String, EbayAuthError> {
        if let Some(cached) = self.store.load_token().await? {
            match trading::get_token_status(&self.http, &self.config, &cached.access_token).await {
                Ok(status) if status.ack == Ack::Success => return Ok(cached.access_token),
                Ok(status) => info!(
                    target = "partsync.auth",
                    ack = ?status.ack,
                    "cached token rejected by status probe; refreshing"
                ),
                Err(err) => warn!(
                    target = "partsync.auth",
                    error = %err,
                    "token status probe failed; refreshing"
                ),
            }
        }
        let fresh = self.refresh_access_token().await?;
        self.store.save_token(&fresh).await?;
        Ok(fresh)
    }

    /// Exchanges the long-lived refresh secret for a short-lived access
    /// token via the basic-auth form endpoint.
    async fn refresh_access_token(&self) -> Result<String, EbayAuthError> {
        if self.config.client_id.is_empty() || self.config.client_secret.is_empty() {
            return Err(EbayAuthError::MissingCredentials);
        }
        let credentials = BASE64.encode(format!(
            "{}:{}",
            self.config.client_id, self.config.client_secret
        ));
        let url = format!(
            "{}/identity/v1/oauth2/token",
            self.config.base_url.trim_end_matches('/')
        );
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", self.config.refresh_token.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];
        let response = self
            .http
            .post(url)
            .header("Authorization", format!("Basic {credentials}"))
            .form(&params)
            .send()
            .await
            .map_err(|err| EbayAuthError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(EbayAuthError::Request(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|err| EbayAuthError::Request(err.to_string()))?;
        if payload.access_token.is_empty() {
            return Err(EbayAuthError::Request(
                "access_token missing from response".to_string(),
            ));
        }
        Ok(payload.access_token)
    }
}
