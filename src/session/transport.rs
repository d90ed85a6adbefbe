//! Outbound transport to the orchestrator
//!
//! The `Transport` trait lets the controller run against a scripted mock.

use super::error::TransportError;
use crate::config::{AppConfig, WorkflowSettings};
use crate::conversation::MessageContent;
use crate::topology::GraphTopology;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;

/// Raw response body chunks, in arrival order
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

/// One message in the conversation history sent upstream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn user(content: MessageContent) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: MessageContent::text(text),
        }
    }
}

/// Body of `POST /api/chat/stream`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatStreamRequest {
    pub messages: Vec<ChatMessage>,
    pub thread_id: String,
    #[serde(flatten)]
    pub settings: WorkflowSettings,
}

/// Opens event streams against the orchestrator
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the response body as a chunk stream.
    /// Dropping the stream stops delivery.
    async fn open(&self, request: &ChatStreamRequest) -> Result<ByteStream, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn open(&self, request: &ChatStreamRequest) -> Result<ByteStream, TransportError> {
        (**self).open(request).await
    }
}

// ============================================================================
// HTTP Transport
// ============================================================================

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &AppConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.orchestrator_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the workflow graph. Called once at startup.
    pub async fn fetch_topology(&self) -> Result<GraphTopology, TransportError> {
        let url = format!("{}/api/graph", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::from_status(status.as_u16(), &body));
        }
        Ok(response.json::<GraphTopology>().await?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, request: &ChatStreamRequest) -> Result<ByteStream, TransportError> {
        let url = format!("{}/api/chat/stream", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::from_status(status.as_u16(), &body));
        }

        tracing::debug!(thread_id = %request.thread_id, url = %url, "Orchestrator stream opened");

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(TransportError::from))
            .boxed())
    }
}
