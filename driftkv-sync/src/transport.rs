//! Transport abstraction.
//!
//! The engine hands a whole [`Envelope`] to the transport and the transport
//! owns everything below that: connections, framing, timeouts at the socket
//! level. Inbound, the transport delivers whole parsed messages to dispatch
//! after checking the token — see the TCP listener in [`crate::tcp`].

use crate::error::SyncResult;
use crate::protocol::Envelope;
use async_trait::async_trait;
use std::net::SocketAddr;

/// Delivers one serialized message to one peer.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends the envelope to the given address.
    ///
    /// Resolves once the message has been handed to the wire; there is no
    /// application-level acknowledgment.
    async fn deliver(&self, addr: SocketAddr, envelope: &Envelope) -> SyncResult<()>;
}

/// A mock transport for testing.
pub mod mock {
    use super::*;
    use crate::error::SyncError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Records every envelope instead of sending it, and can be programmed
    /// to fail a number of times per address to drive the retry path.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        sent: Mutex<Vec<(SocketAddr, Envelope)>>,
        failures: Mutex<HashMap<SocketAddr, u32>>,
    }

    impl MockTransport {
        /// Creates a mock that accepts everything.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes the next `count` deliveries to `addr` fail.
        pub fn fail_next(&self, addr: SocketAddr, count: u32) {
            self.failures.lock().unwrap().insert(addr, count);
        }

        /// Everything delivered so far, in order.
        pub fn sent(&self) -> Vec<(SocketAddr, Envelope)> {
            self.sent.lock().unwrap().clone()
        }

        /// Envelopes delivered to one address.
        pub fn sent_to(&self, addr: SocketAddr) -> Vec<Envelope> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter(|(a, _)| *a == addr)
                .map(|(_, e)| e.clone())
                .collect()
        }

        /// Forgets all recorded deliveries.
        pub fn clear(&self) {
            self.sent.lock().unwrap().clear();
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn deliver(&self, addr: SocketAddr, envelope: &Envelope) -> SyncResult<()> {
            {
                let mut failures = self.failures.lock().unwrap();
                if let Some(remaining) = failures.get_mut(&addr) {
                    if *remaining > 0 {
                        *remaining -= 1;
                        return Err(SyncError::Network(format!("mock failure to {addr}")));
                    }
                }
            }
            self.sent.lock().unwrap().push((addr, envelope.clone()));
            Ok(())
        }
    }
}
