//! In-memory gateway that records traffic instead of delivering it.
//!
//! Used by dispatch-loop tests and by `--dry-run`, where the generator runs
//! end to end without any leader listening.

use crate::NetworkGateway;
use parking_lot::Mutex;
use shardload_messages::OutboundMessage;
use shardload_types::Peer;

/// Where a recorded message was addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendTarget {
    /// Point-to-point send.
    Peer(Peer),
    /// One broadcast call covering these peers.
    Broadcast(Vec<Peer>),
}

/// A message captured by [`RecordingGateway`].
#[derive(Debug, Clone)]
pub struct OutboxEntry {
    /// Where the message was addressed.
    pub target: SendTarget,
    /// The message itself.
    pub message: OutboundMessage,
}

/// Gateway that buffers every send in an outbox.
///
/// A broadcast is recorded as a single entry so callers can count broadcast
/// calls separately from point-to-point sends.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    outbox: Mutex<Vec<OutboxEntry>>,
}

impl RecordingGateway {
    /// Create an empty recording gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every recorded entry, leaving the outbox empty.
    pub fn drain_outbox(&self) -> Vec<OutboxEntry> {
        std::mem::take(&mut *self.outbox.lock())
    }

    /// Copy of the recorded entries.
    pub fn entries(&self) -> Vec<OutboxEntry> {
        self.outbox.lock().clone()
    }

    /// Point-to-point sends addressed to `peer`.
    pub fn sends_to(&self, peer: &Peer) -> Vec<OutboundMessage> {
        self.outbox
            .lock()
            .iter()
            .filter(|entry| matches!(&entry.target, SendTarget::Peer(p) if p == peer))
            .map(|entry| entry.message.clone())
            .collect()
    }

    /// Broadcast calls with their peer lists.
    pub fn broadcasts(&self) -> Vec<(Vec<Peer>, OutboundMessage)> {
        self.outbox
            .lock()
            .iter()
            .filter_map(|entry| match &entry.target {
                SendTarget::Broadcast(peers) => Some((peers.clone(), entry.message.clone())),
                SendTarget::Peer(_) => None,
            })
            .collect()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.outbox.lock().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.outbox.lock().is_empty()
    }
}

impl NetworkGateway for RecordingGateway {
    fn send(&self, peer: &Peer, message: &OutboundMessage) {
        self.outbox.lock().push(OutboxEntry {
            target: SendTarget::Peer(peer.clone()),
            message: message.clone(),
        });
    }

    fn broadcast(&self, peers: &[Peer], message: &OutboundMessage) {
        self.outbox.lock().push(OutboxEntry {
            target: SendTarget::Broadcast(peers.to_vec()),
            message: message.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardload_types::test_utils::test_transaction;
    use std::sync::Arc;

    #[test]
    fn test_records_sends_and_broadcasts() {
        let gateway = RecordingGateway::new();
        let leader = Peer::new("127.0.0.1", 7000);
        let other = Peer::new("127.0.0.1", 7001);

        gateway.send(&leader, &OutboundMessage::transaction_list(vec![test_transaction(0, 1, 5)]));
        gateway.broadcast(&[leader.clone(), other.clone()], &OutboundMessage::stop());

        assert_eq!(gateway.len(), 2);
        assert_eq!(gateway.sends_to(&leader).len(), 1);
        assert!(gateway.sends_to(&other).is_empty());

        let broadcasts = gateway.broadcasts();
        assert_eq!(broadcasts.len(), 1);
        assert_eq!(broadcasts[0].0, vec![leader, other]);
        assert!(broadcasts[0].1.is_control());

        assert_eq!(gateway.drain_outbox().len(), 2);
        assert!(gateway.is_empty());
    }

    #[test]
    fn test_arc_forwards_broadcast() {
        let gateway = Arc::new(RecordingGateway::new());
        let peers = vec![Peer::new("a", 1), Peer::new("b", 2)];
        NetworkGateway::broadcast(&gateway, &peers, &OutboundMessage::stop());
        // Forwarded as one broadcast, not expanded into per-peer sends.
        assert_eq!(gateway.broadcasts().len(), 1);
    }
}
