use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::store::Store;

pub const MARK_TOP_FEATURED_RPC: &str = "mark_top_videos_as_featured";

/// The remote procedure behind the `mark-top-featured` function. The caller's
/// token is forwarded as-is; authorization is left to the backend.
#[async_trait]
pub trait FeaturedRpc: Send + Sync {
    async fn mark_top_videos_as_featured(&self, token: &str, limit: i32) -> Result<Value, AppError>;
}

#[derive(Debug, Serialize)]
struct MarkTopFeaturedParams {
    p_limit: i32,
}

/// Calls the procedure through the backend's REST gateway.
#[derive(Clone, Debug)]
pub struct RestFeaturedRpc {
    http_client: Client,
    base_url: String,
}

impl RestFeaturedRpc {
    pub fn new(base_url: String) -> Self {
        Self {
            http_client: Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl FeaturedRpc for RestFeaturedRpc {
    #[tracing::instrument(name = "rpc mark_top_videos_as_featured", skip(self, token))]
    async fn mark_top_videos_as_featured(&self, token: &str, limit: i32) -> Result<Value, AppError> {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, MARK_TOP_FEATURED_RPC);

        let response = self
            .http_client
            .post(&url)
            .header("apikey", token)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .json(&MarkTopFeaturedParams { p_limit: limit })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("RPC failed with status {}", status));
            tracing::error!("{} failed: {}", MARK_TOP_FEATURED_RPC, message);
            return Err(AppError::ExternalService(anyhow::anyhow!(message)));
        }

        Ok(response.json::<Value>().await?)
    }
}

/// Runs the procedure's logic against the local store. Used when no backend
/// URL is configured.
pub struct StoreFeaturedRpc {
    store: Arc<dyn Store>,
}

impl StoreFeaturedRpc {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl FeaturedRpc for StoreFeaturedRpc {
    async fn mark_top_videos_as_featured(&self, _token: &str, limit: i32) -> Result<Value, AppError> {
        let updated = self.store.mark_top_videos_as_featured(limit).await?;
        Ok(Value::from(updated))
    }
}
