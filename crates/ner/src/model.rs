use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::schema::Entity;

/// A pretrained entity recognizer. Loaded once at startup, then shared read-only
/// across requests.
#[async_trait]
pub trait EntityModel: Send + Sync {
    /// Backend identifier, e.g. "remote" or "gazetteer".
    fn name(&self) -> &str;

    /// Extract entities from already-normalized text, in source order.
    async fn extract(&self, text: &str) -> Result<Vec<Entity>>;
}

/// Client for an out-of-process NER inference server.
#[derive(Clone)]
pub struct RemoteModel {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EntsRequest<'a> {
    model: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct EntsResponse {
    ents: Vec<Entity>,
}

impl RemoteModel {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build NER client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client,
        })
    }

    /// Connect to the inference server and confirm the model is being served.
    pub async fn load(base_url: String, model: String, timeout: Duration) -> Result<Self> {
        let remote = Self::new(base_url, model, timeout)?;
        let url = format!("{}/health", remote.base_url);

        let response = remote
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("NER server unreachable at {}", remote.base_url))?;

        if !response.status().is_success() {
            anyhow::bail!("NER server health check failed: {}", response.status());
        }

        tracing::info!(url = %remote.base_url, model = %remote.model, "Remote NER model ready");
        Ok(remote)
    }
}

#[async_trait]
impl EntityModel for RemoteModel {
    fn name(&self) -> &str {
        "remote"
    }

    async fn extract(&self, text: &str) -> Result<Vec<Entity>> {
        let url = format!("{}/ents", self.base_url);

        let request = EntsRequest {
            model: &self.model,
            text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to NER server")?;

        if !response.status().is_success() {
            anyhow::bail!("NER request failed: {}", response.status());
        }

        let ents: EntsResponse = response
            .json()
            .await
            .context("Failed to parse NER response")?;

        Ok(ents.ents)
    }
}
