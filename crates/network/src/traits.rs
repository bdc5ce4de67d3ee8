//! Gateway trait for outbound delivery.
//!
//! Implemented by the TCP gateway for real runs and by the recording gateway
//! for tests and dry runs.

use shardload_messages::OutboundMessage;
use shardload_types::Peer;

/// Best-effort delivery of outbound messages.
///
/// All sends are fire-and-forget: no confirmation, error or retry ever reaches
/// the caller. Implementations must return without waiting on the network so
/// the dispatch loop only suspends at its own tick delay.
pub trait NetworkGateway: Send + Sync {
    /// Send a message to a single peer.
    fn send(&self, peer: &Peer, message: &OutboundMessage);

    /// Send the same message to every peer in `peers`.
    fn broadcast(&self, peers: &[Peer], message: &OutboundMessage) {
        for peer in peers {
            self.send(peer, message);
        }
    }
}

impl<G: NetworkGateway + ?Sized> NetworkGateway for std::sync::Arc<G> {
    fn send(&self, peer: &Peer, message: &OutboundMessage) {
        (**self).send(peer, message)
    }

    fn broadcast(&self, peers: &[Peer], message: &OutboundMessage) {
        (**self).broadcast(peers, message)
    }
}
