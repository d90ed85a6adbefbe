//! Mock implementations for testing
//!
//! These mocks let session tests run without a live orchestrator.

use super::error::TransportError;
use super::transport::{ByteStream, ChatStreamRequest, Transport};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::Mutex;

// ============================================================================
// Scripted responses
// ============================================================================

/// What the mock transport does for one `open` call
pub enum MockResponse {
    /// Fail to open
    OpenError(TransportError),
    /// Deliver these items, then close (or stay open forever)
    Body {
        items: Vec<Result<Vec<u8>, TransportError>>,
        hold_open: bool,
    },
}

impl MockResponse {
    /// Deliver chunks then close cleanly
    pub fn chunks(chunks: Vec<Vec<u8>>) -> Self {
        MockResponse::Body {
            items: chunks.into_iter().map(Ok).collect(),
            hold_open: false,
        }
    }

    /// Deliver chunks then fail mid-stream
    pub fn chunks_then_error(chunks: Vec<Vec<u8>>, error: TransportError) -> Self {
        let mut items: Vec<_> = chunks.into_iter().map(Ok).collect();
        items.push(Err(error));
        MockResponse::Body {
            items,
            hold_open: false,
        }
    }

    /// Deliver chunks then never produce another chunk
    pub fn pending(chunks: Vec<Vec<u8>>) -> Self {
        MockResponse::Body {
            items: chunks.into_iter().map(Ok).collect(),
            hold_open: true,
        }
    }

    pub fn open_error(error: TransportError) -> Self {
        MockResponse::OpenError(error)
    }
}

// ============================================================================
// Mock Transport
// ============================================================================

/// Transport that replays queued responses
pub struct MockTransport {
    responses: Mutex<VecDeque<MockResponse>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<ChatStreamRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn recorded_requests(&self) -> Vec<ChatStreamRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&self, request: &ChatStreamRequest) -> Result<ByteStream, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockResponse::open_error(TransportError::network("No mock response queued")));

        match response {
            MockResponse::OpenError(error) => Err(error),
            MockResponse::Body { items, hold_open } => {
                let body = stream::iter(items);
                if hold_open {
                    Ok(body.chain(stream::pending()).boxed())
                } else {
                    Ok(body.boxed())
                }
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Format one SSE record the way the orchestrator does
pub fn sse_record(kind: &str, payload: &str) -> String {
    format!("event: {kind}\ndata: {payload}\n\n")
}

/// Split a body into fixed-size chunks, ignoring record boundaries
pub fn split_chunks(body: &[u8], size: usize) -> Vec<Vec<u8>> {
    body.chunks(size.max(1)).map(<[u8]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkflowSettings;

    fn request() -> ChatStreamRequest {
        ChatStreamRequest {
            messages: vec![],
            thread_id: "t".to_string(),
            settings: WorkflowSettings::default(),
        }
    }

    #[tokio::test]
    async fn test_mock_transport_replays_in_order() {
        let mock = MockTransport::new();
        mock.queue(MockResponse::chunks(split_chunks(b"abcde", 2)));

        let chunks: Vec<_> = mock
            .open(&request())
            .await
            .unwrap()
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(chunks, vec![b"ab".to_vec(), b"cd".to_vec(), b"e".to_vec()]);

        // Second call has nothing queued
        assert!(mock.open(&request()).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }
}
