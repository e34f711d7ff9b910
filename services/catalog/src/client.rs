use anyhow::Context;
use async_trait::async_trait;
use compose::{
    BlueprintItem, BlueprintsResponse, Compose, ComposeId, ComposeStatus, ComposesResponse,
};

/// The slice of the image-builder REST API the catalog reads.
#[async_trait]
pub trait ImageBuilderApi: Send + Sync {
    async fn composes(&self) -> anyhow::Result<Vec<Compose>>;
    async fn compose_status(&self, id: ComposeId) -> anyhow::Result<ComposeStatus>;
    async fn blueprints(&self, search: &str) -> anyhow::Result<Vec<BlueprintItem>>;
}

pub struct HttpImageBuilder {
    base_url: String,
    client: reqwest::Client,
}

impl HttpImageBuilder {
    pub fn new(base_url: String, client: reqwest::Client) -> Self {
        Self { base_url, client }
    }
}

#[async_trait]
impl ImageBuilderApi for HttpImageBuilder {
    async fn composes(&self) -> anyhow::Result<Vec<Compose>> {
        let url = format!("{}/composes", self.base_url);
        let resp = self.client.get(url).send().await?.error_for_status()?;
        let body: ComposesResponse = resp.json().await.context("Malformed composes response")?;
        Ok(body.data)
    }

    async fn compose_status(&self, id: ComposeId) -> anyhow::Result<ComposeStatus> {
        let url = format!("{}/composes/{id}", self.base_url);
        let resp = self.client.get(url).send().await?.error_for_status()?;
        resp.json().await.with_context(|| format!("Malformed status for compose {id}"))
    }

    async fn blueprints(&self, search: &str) -> anyhow::Result<Vec<BlueprintItem>> {
        let url = format!("{}/blueprints?search={}", self.base_url, urlencoding::encode(search));
        let resp = self.client.get(url).send().await?.error_for_status()?;
        let body: BlueprintsResponse = resp.json().await.context("Malformed blueprints response")?;
        Ok(body.data)
    }
}
