//! TCP transport: one JSON envelope per connection.
//!
//! Outbound, [`TcpTransport`] connects, writes the serialized envelope, and
//! closes. Inbound, [`serve`] accepts connections concurrently, reads one
//! envelope each, checks the token, and forwards the message to dispatch.
//! Malformed or unauthenticated payloads are dropped without a reply — the
//! sender gets nothing to probe against.

use crate::engine::Replicator;
use crate::error::{SyncError, SyncResult};
use crate::protocol::Envelope;
use crate::transport::Transport;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

/// Maximum accepted message size (1 MB).
const MAX_MESSAGE_SIZE: u64 = 1024 * 1024;

/// Fire-and-forget TCP delivery.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpTransport;

impl TcpTransport {
    /// Creates the transport.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn deliver(&self, addr: SocketAddr, envelope: &Envelope) -> SyncResult<()> {
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|e| SyncError::Network(format!("connect {addr}: {e}")))?;
        let bytes = serde_json::to_vec(envelope)?;
        stream
            .write_all(&bytes)
            .await
            .map_err(|e| SyncError::Network(format!("write {addr}: {e}")))?;
        stream
            .shutdown()
            .await
            .map_err(|e| SyncError::Network(format!("close {addr}: {e}")))?;
        Ok(())
    }
}

/// Accept loop: one task per connection, one message per connection.
///
/// Runs until the listener fails. Dispatch serializes on the node's state
/// lock internally, so concurrent connections are safe.
pub async fn serve<T: Transport>(
    listener: TcpListener,
    node: Arc<Replicator<T>>,
) -> SyncResult<()> {
    loop {
        let (stream, remote) = listener
            .accept()
            .await
            .map_err(|e| SyncError::Network(format!("accept: {e}")))?;
        let node = node.clone();
        tokio::spawn(async move {
            handle_connection(stream, remote, node).await;
        });
    }
}

async fn handle_connection<T: Transport>(
    stream: TcpStream,
    remote: SocketAddr,
    node: Arc<Replicator<T>>,
) {
    let mut buf = Vec::new();
    if let Err(e) = stream.take(MAX_MESSAGE_SIZE).read_to_end(&mut buf).await {
        debug!(%remote, "dropping connection: read failed: {e}");
        return;
    }

    let envelope: Envelope = match serde_json::from_slice(&buf) {
        Ok(env) => env,
        Err(e) => {
            debug!(%remote, "dropping malformed message: {e}");
            return;
        }
    };

    // Authentication gate: nothing past this point sees the token.
    if !node.token().verify(&envelope.token) {
        warn!(%remote, "rejecting message with bad token");
        return;
    }

    node.dispatch(envelope.message).await;
}
