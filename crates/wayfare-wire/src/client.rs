//! Streaming client for the agent endpoint

use crate::{
    error::{Error, Result},
    stream::ChunkStream,
    types::{HistoryMode, TurnRequest},
    utf8::Utf8Decoder,
};
use async_stream::stream;
use futures::StreamExt;

/// Default streaming endpoint of a local agent service
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/agent/vibe/stream";

/// Client that opens one server-sent event stream per turn
#[derive(Debug, Clone)]
pub struct AgentClient {
    client: reqwest::Client,
    endpoint: String,
    history_mode: HistoryMode,
}

impl AgentClient {
    /// Create a client for an endpoint URL
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            history_mode: HistoryMode::default(),
        }
    }

    /// Reuse an existing reqwest client (shares its connection pool)
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Set which part of the conversation each request carries
    pub fn with_history_mode(mut self, mode: HistoryMode) -> Self {
        self.history_mode = mode;
        self
    }

    /// The endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The configured history mode
    pub fn history_mode(&self) -> HistoryMode {
        self.history_mode
    }

    /// POST the turn and return the response body as text chunks.
    ///
    /// Chunks are not aligned to frames. Dropping the stream closes the
    /// connection.
    pub async fn open_stream(&self, request: &TurnRequest) -> Result<ChunkStream> {
        if self.endpoint.is_empty() {
            return Err(Error::InvalidConfig("agent endpoint is empty".to_string()));
        }

        let body = request.body(self.history_mode);
        tracing::debug!(
            "Opening agent stream: {} (session {}, {:?} history)",
            self.endpoint,
            request.session_id,
            self.history_mode
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            };
            return Err(Error::status(status.as_u16(), message));
        }

        let mut bytes = response.bytes_stream();
        Ok(Box::pin(stream! {
            let mut decoder = Utf8Decoder::new();
            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => {
                        let text = decoder.decode(&chunk);
                        if !text.is_empty() {
                            yield Ok(text);
                        }
                    }
                    Err(e) => {
                        yield Err(Error::Http(e));
                        return;
                    }
                }
            }
            let rest = decoder.finish();
            if !rest.is_empty() {
                yield Ok(rest);
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let client = AgentClient::new(DEFAULT_ENDPOINT);
        assert_eq!(client.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(client.history_mode(), HistoryMode::Full);

        let client = client.with_history_mode(HistoryMode::Latest);
        assert_eq!(client.history_mode(), HistoryMode::Latest);
    }

    #[tokio::test]
    async fn test_empty_endpoint_is_rejected() {
        let client = AgentClient::new("");
        let request = TurnRequest {
            session_id: "s".into(),
            history: vec![],
            query: "hi".into(),
        };
        let err = client.open_stream(&request).await.err().unwrap();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
