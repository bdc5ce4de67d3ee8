//! Inbound TCP listener.
//!
//! Accepts connections on the generator's client port, reads length-prefixed
//! frames, decodes them and hands each message to a handler. A connection may
//! carry any number of frames. Undecodable frames are logged and skipped; the
//! connection stays open.

use crate::framing::{self, MAX_FRAME_SIZE};
use crate::{codec, InboundMessage, NetworkError};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, trace, warn};

/// TCP listener delivering decoded messages to a handler.
pub struct InboundListener {
    listener: TcpListener,
}

impl InboundListener {
    /// Bind to `addr` (for example `0.0.0.0:9100`).
    pub async fn bind(addr: &str) -> Result<Self, NetworkError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| NetworkError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        Ok(Self { listener })
    }

    /// Address actually bound (useful when binding port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, NetworkError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `cancel` fires.
    ///
    /// The handler runs on the connection task; keep it short (apply under a
    /// lock, push into a channel).
    pub async fn run<H>(self, cancel: CancellationToken, handler: H)
    where
        H: Fn(SocketAddr, InboundMessage) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        let connections = TaskTracker::new();
        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, "Inbound listener started");
        }

        loop {
            let accepted = tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };
            match accepted {
                Ok((stream, from)) => {
                    trace!(%from, "Accepted connection");
                    connections.spawn(handle_connection(
                        stream,
                        from,
                        handler.clone(),
                        MAX_FRAME_SIZE,
                        cancel.clone(),
                    ));
                }
                Err(e) => warn!(error = %e, "Failed to accept connection"),
            }
        }

        connections.close();
        connections.wait().await;
        info!("Inbound listener stopped");
    }
}

async fn handle_connection<H>(
    mut stream: TcpStream,
    from: SocketAddr,
    handler: Arc<H>,
    max_frame_size: usize,
    cancel: CancellationToken,
) where
    H: Fn(SocketAddr, InboundMessage) + Send + Sync + 'static,
{
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => return,
            frame = framing::read_frame(&mut stream, max_frame_size) => frame,
        };
        match frame {
            Ok(bytes) => match codec::decode_message(&bytes) {
                Ok(message) => {
                    trace!(%from, message_type = message.type_name(), "Received message");
                    handler(from, message);
                }
                Err(e) => warn!(%from, error = %e, "Dropping undecodable frame"),
            },
            Err(e) if e.is_eof() => {
                debug!(%from, "Connection closed");
                return;
            }
            Err(e) => {
                warn!(%from, error = %e, "Closing connection after frame error");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_to_wire;
    use shardload_messages::{BlockSyncMessage, StopMessage};
    use shardload_types::{Block, BlockHeight, Hash, ShardGroupId};
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_bad_frame_does_not_drop_connection() {
        let listener = InboundListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(listener.run(cancel.clone(), move |_from, message| {
            let _ = tx.send(message);
        }));

        let block = Block::new(ShardGroupId(0), BlockHeight(1), Hash::ZERO, vec![]);
        let mut stream = TcpStream::connect(addr).await.unwrap();
        framing::write_frame(&mut stream, &[4, 0, 0, 0, 0xf0]).await.unwrap();
        framing::write_frame(
            &mut stream,
            &encode_to_wire(&BlockSyncMessage::new(vec![block.clone()])).unwrap(),
        )
        .await
        .unwrap();
        framing::write_frame(&mut stream, &encode_to_wire(&StopMessage { issued_at_ms: 3 }).unwrap())
            .await
            .unwrap();

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first, InboundMessage::BlockSync(BlockSyncMessage::new(vec![block])));
        let second = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second, InboundMessage::Stop(StopMessage { issued_at_ms: 3 }));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_bind_error() {
        let result = InboundListener::bind("not an address").await;
        assert!(matches!(result, Err(NetworkError::Bind { .. })));
    }
}
