use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{stream, Stream, StreamExt};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::{TransportError, TransportFailure};

pub type ChunkResult = Result<Bytes, TransportError>;

type BoxChunkStream = Pin<Box<dyn Stream<Item = ChunkResult> + Send>>;

#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub connect_timeout: Duration,
    /// Longest silence tolerated between two body chunks.
    pub read_timeout: Duration,
    pub max_error_body_bytes: usize,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(120),
            max_error_body_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub url: String,
    pub bearer_token: String,
    pub body: Value,
}

/// Cloneable cancellation switch for one stream. Cancelling twice, or after
/// the stream already ended, does nothing.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

impl From<CancellationToken> for CancelHandle {
    fn from(token: CancellationToken) -> Self {
        Self { token }
    }
}

/// Response body as an ordered sequence of raw byte chunks.
pub struct ChunkStream {
    inner: Option<BoxChunkStream>,
    cancel: CancelHandle,
}

impl ChunkStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = ChunkResult> + Send + 'static,
    {
        Self {
            inner: Some(Box::pin(stream)),
            cancel: CancelHandle::new(),
        }
    }

    /// In-memory stream yielding the given chunks in order.
    pub fn from_chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let chunks: Vec<ChunkResult> = chunks.into_iter().map(|chunk| Ok(chunk.into())).collect();
        Self::new(stream::iter(chunks))
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Stops chunk delivery and releases the underlying body.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.inner = None;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Next chunk in transport order, or `None` once the body ended or the
    /// stream was cancelled.
    pub async fn next_chunk(&mut self) -> Option<ChunkResult> {
        if self.cancel.is_cancelled() {
            self.inner = None;
            return None;
        }
        let inner = self.inner.as_mut()?;
        let next = tokio::select! {
            biased;
            _ = self.cancel.token.cancelled() => None,
            chunk = inner.next() => chunk,
        };
        if next.is_none() {
            self.inner = None;
        }
        next
    }
}

impl std::fmt::Debug for ChunkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStream")
            .field("open", &self.inner.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

#[async_trait::async_trait]
pub trait StreamTransport: Send + Sync {
    async fn open(&self, request: StreamRequest) -> Result<ChunkStream, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    settings: TransportSettings,
}

impl ReqwestTransport {
    pub fn new(settings: TransportSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.read_timeout)
            .build()
            .map_err(|err| TransportError::new(TransportFailure::InvalidRequest, err.to_string()))?;
        Ok(Self { client, settings })
    }

    async fn read_error_message(&self, response: reqwest::Response) -> String {
        let status = response.status();
        let limit = self.settings.max_error_body_bytes;
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(Ok(chunk)) = stream.next().await {
            body.extend_from_slice(&chunk);
            if body.len() >= limit {
                body.truncate(limit);
                break;
            }
        }
        error_message_from_body(&body)
            .unwrap_or_else(|| format!("failed to fetch an answer (HTTP {})", status.as_u16()))
    }
}

#[async_trait::async_trait]
impl StreamTransport for ReqwestTransport {
    async fn open(&self, request: StreamRequest) -> Result<ChunkStream, TransportError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|err| TransportError::new(TransportFailure::InvalidRequest, err.to_string()))?;
        let body = serde_json::to_vec(&request.body)
            .map_err(|err| TransportError::new(TransportFailure::InvalidRequest, err.to_string()))?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&request.bearer_token)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/x-ndjson, text/event-stream")
            .body(body)
            .send()
            .await
            .map_err(map_connect_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = self.read_error_message(response).await;
            return Err(TransportError::new(
                TransportFailure::HttpStatus(status.as_u16()),
                message,
            ));
        }
        if status == StatusCode::NO_CONTENT {
            return Err(TransportError::new(
                TransportFailure::MissingBody,
                "the server returned no answer body",
            ));
        }

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(map_body_error));
        Ok(ChunkStream::new(chunks))
    }
}

/// Human-readable message from a JSON error payload, if it carries one.
///
/// Accepts `{"detail": "..."}`, validation lists `{"detail": [{"msg": "..."}]}`,
/// `{"message": "..."}` and `{"error": "..."}`.
fn error_message_from_body(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let detail = value.get("detail");
    let message = detail
        .and_then(Value::as_str)
        .or_else(|| {
            detail
                .and_then(Value::as_array)
                .and_then(|items| items.first())
                .and_then(|item| item.get("msg"))
                .and_then(Value::as_str)
        })
        .or_else(|| value.get("message").and_then(Value::as_str))
        .or_else(|| value.get("error").and_then(Value::as_str))?;
    let message = message.trim();
    (!message.is_empty()).then(|| message.to_string())
}

fn map_connect_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(TransportFailure::Timeout, err.to_string());
    }
    if err.is_builder() {
        return TransportError::new(TransportFailure::InvalidRequest, err.to_string());
    }
    TransportError::new(TransportFailure::Connect, err.to_string())
}

fn map_body_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(TransportFailure::Timeout, err.to_string());
    }
    TransportError::new(TransportFailure::Body, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_is_preferred() {
        let body = br#"{"detail": "material not found", "message": "other"}"#;
        assert_eq!(
            error_message_from_body(body).as_deref(),
            Some("material not found")
        );
    }

    #[test]
    fn validation_list_uses_first_message() {
        let body = br#"{"detail": [{"loc": ["body", "question"], "msg": "field required"}]}"#;
        assert_eq!(
            error_message_from_body(body).as_deref(),
            Some("field required")
        );
    }

    #[test]
    fn message_and_error_fields_are_fallbacks() {
        assert_eq!(
            error_message_from_body(br#"{"message": "slow down"}"#).as_deref(),
            Some("slow down")
        );
        assert_eq!(
            error_message_from_body(br#"{"error": "bad token"}"#).as_deref(),
            Some("bad token")
        );
    }

    #[test]
    fn unusable_payloads_yield_none() {
        assert_eq!(error_message_from_body(b"<html>502</html>"), None);
        assert_eq!(error_message_from_body(b""), None);
        assert_eq!(error_message_from_body(br#"{"detail": "  "}"#), None);
        assert_eq!(error_message_from_body(br#"{"detail": 42}"#), None);
    }
}
