//! TCP gateway: one short-lived connection per delivery.
//!
//! Each send is encoded once on the caller's thread, then written by a task
//! spawned on the runtime, so callers never wait on the network. Spawned tasks
//! are tracked; [`TcpGateway::drain`] lets the process flush in-flight sends
//! (the final stop broadcast in particular) before exiting.

use crate::{codec, framing, NetworkError, NetworkGateway};
use shardload_messages::OutboundMessage;
use shardload_types::Peer;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::{trace, warn};

/// Timeouts for outbound deliveries.
#[derive(Debug, Clone)]
pub struct TcpGatewayConfig {
    /// Maximum time to establish a connection.
    pub connect_timeout: Duration,
    /// Maximum time to write one frame.
    pub write_timeout: Duration,
}

impl Default for TcpGatewayConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    delivered: AtomicU64,
    failed: AtomicU64,
    bytes_sent: AtomicU64,
}

/// Snapshot of gateway delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayStats {
    /// Frames written successfully.
    pub delivered: u64,
    /// Deliveries that failed to encode, connect or write.
    pub failed: u64,
    /// Wire bytes written, excluding length prefixes.
    pub bytes_sent: u64,
}

/// Fire-and-forget TCP delivery.
pub struct TcpGateway {
    handle: Handle,
    tracker: TaskTracker,
    config: TcpGatewayConfig,
    counters: Arc<Counters>,
}

impl TcpGateway {
    /// Create a gateway bound to the current tokio runtime.
    pub fn new(config: TcpGatewayConfig) -> Result<Self, NetworkError> {
        let handle = Handle::try_current().map_err(|_| NetworkError::NoRuntime)?;
        Ok(Self::with_handle(handle, config))
    }

    /// Create a gateway that spawns deliveries on `handle`.
    pub fn with_handle(handle: Handle, config: TcpGatewayConfig) -> Self {
        Self {
            handle,
            tracker: TaskTracker::new(),
            config,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Current delivery counters.
    pub fn stats(&self) -> GatewayStats {
        GatewayStats {
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            bytes_sent: self.counters.bytes_sent.load(Ordering::Relaxed),
        }
    }

    /// Number of deliveries still in flight.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait up to `timeout` for in-flight deliveries to finish.
    ///
    /// Returns `false` if some were still running when the timeout elapsed.
    /// The gateway stays usable afterwards.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let drained = tokio::time::timeout(timeout, self.tracker.wait())
            .await
            .is_ok();
        self.tracker.reopen();
        drained
    }

    fn encode(&self, message: &OutboundMessage) -> Option<Arc<[u8]>> {
        match codec::encode_message(message) {
            Ok(data) => Some(Arc::from(data)),
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(message_type = message.type_name(), error = %e, "Failed to encode message");
                None
            }
        }
    }

    fn dispatch(&self, peer: Peer, data: Arc<[u8]>, message_type: &'static str) {
        let counters = self.counters.clone();
        let config = self.config.clone();
        self.tracker.spawn_on(
            async move {
                match deliver(&peer, &data, &config).await {
                    Ok(()) => {
                        counters.delivered.fetch_add(1, Ordering::Relaxed);
                        counters
                            .bytes_sent
                            .fetch_add(data.len() as u64, Ordering::Relaxed);
                        trace!(%peer, message_type, bytes = data.len(), "Delivered message");
                    }
                    Err(e) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        warn!(%peer, message_type, error = %e, "Failed to deliver message");
                    }
                }
            },
            &self.handle,
        );
    }
}

impl NetworkGateway for TcpGateway {
    fn send(&self, peer: &Peer, message: &OutboundMessage) {
        if let Some(data) = self.encode(message) {
            self.dispatch(peer.clone(), data, message.type_name());
        }
    }

    fn broadcast(&self, peers: &[Peer], message: &OutboundMessage) {
        if peers.is_empty() {
            return;
        }
        // Encode once, share the bytes across every delivery task.
        if let Some(data) = self.encode(message) {
            for peer in peers {
                self.dispatch(peer.clone(), data.clone(), message.type_name());
            }
        }
    }
}

async fn deliver(peer: &Peer, data: &[u8], config: &TcpGatewayConfig) -> Result<(), NetworkError> {
    let mut stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(peer.socket_addr()))
        .await
        .map_err(|_| NetworkError::Timeout(peer.clone()))?
        .map_err(|source| NetworkError::Connect {
            peer: peer.clone(),
            source,
        })?;

    tokio::time::timeout(config.write_timeout, framing::write_frame(&mut stream, data))
        .await
        .map_err(|_| NetworkError::Timeout(peer.clone()))??;

    stream.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InboundListener, InboundMessage};
    use shardload_types::test_utils::test_transaction;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    async fn start_listener() -> (Peer, mpsc::UnboundedReceiver<InboundMessage>, CancellationToken) {
        let listener = InboundListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(listener.run(cancel.clone(), move |_from, message| {
            let _ = tx.send(message);
        }));
        (Peer::new("127.0.0.1", addr.port()), rx, cancel)
    }

    #[tokio::test]
    async fn test_loopback_delivery() {
        let (peer, mut rx, cancel) = start_listener().await;
        let gateway = TcpGateway::new(TcpGatewayConfig::default()).unwrap();

        let txs = vec![test_transaction(0, 1, 50), test_transaction(0, 2, 20)];
        gateway.send(&peer, &OutboundMessage::transaction_list(txs.clone()));
        gateway.broadcast(std::slice::from_ref(&peer), &OutboundMessage::stop());

        assert!(gateway.drain(Duration::from_secs(5)).await);

        let mut received = Vec::new();
        for _ in 0..2 {
            let message = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            received.push(message);
        }
        // Separate connections, so arrival order is not guaranteed.
        assert!(received.iter().any(
            |m| matches!(m, InboundMessage::TransactionList(list) if list.transactions == txs)
        ));
        assert!(received.iter().any(|m| matches!(m, InboundMessage::Stop(_))));

        let stats = gateway.stats();
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.failed, 0);
        assert!(stats.bytes_sent > 0);
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_failed_delivery_is_counted_not_surfaced() {
        // Grab a free port, then close it so nothing is listening.
        let port = {
            let probe = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            probe.local_addr().unwrap().port()
        };
        let gateway = TcpGateway::new(TcpGatewayConfig::default()).unwrap();
        gateway.send(&Peer::new("127.0.0.1", port), &OutboundMessage::stop());

        assert!(gateway.drain(Duration::from_secs(5)).await);
        assert_eq!(gateway.stats().failed, 1);
        assert_eq!(gateway.stats().delivered, 0);
        assert_eq!(gateway.in_flight(), 0);
    }

    #[test]
    fn test_new_requires_runtime() {
        assert!(matches!(
            TcpGateway::new(TcpGatewayConfig::default()),
            Err(NetworkError::NoRuntime)
        ));
    }
}
