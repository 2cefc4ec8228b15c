//! Transport abstraction for opening agent streams

use async_trait::async_trait;
use wayfare_wire::{AgentClient, ChunkStream, Result, TurnRequest};

/// Opens one streaming turn against the agent service
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the response body as text chunks.
    ///
    /// Dropping the returned stream must release the connection.
    async fn open(&self, request: TurnRequest) -> Result<ChunkStream>;
}

/// HTTP transport backed by [`AgentClient`]
pub struct HttpTransport {
    client: AgentClient,
}

impl HttpTransport {
    /// Create a transport for an already configured client
    pub fn new(client: AgentClient) -> Self {
        Self { client }
    }

    /// The underlying client
    pub fn client(&self) -> &AgentClient {
        &self.client
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, request: TurnRequest) -> Result<ChunkStream> {
        self.client.open_stream(&request).await
    }
}
