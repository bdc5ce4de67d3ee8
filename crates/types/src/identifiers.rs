//! Domain-specific identifier types.

use sbor::prelude::*;
use std::fmt;

/// Shard group identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, BasicSbor)]
#[sbor(transparent)]
pub struct ShardGroupId(pub u64);

impl ShardGroupId {
    /// The neighbouring shard used as the second leg of cross-shard spends.
    ///
    /// Returns `self` when `num_shards` is 0 or 1.
    pub fn partner(self, num_shards: u64) -> Self {
        if num_shards <= 1 {
            return self;
        }
        ShardGroupId((self.0 + 1) % num_shards)
    }
}

impl fmt::Display for ShardGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shard({})", self.0)
    }
}

/// Block height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, BasicSbor)]
#[sbor(transparent)]
pub struct BlockHeight(pub u64);

impl BlockHeight {
    /// Genesis block height.
    pub const GENESIS: Self = BlockHeight(0);

    /// Get the next block height.
    pub fn next(self) -> Self {
        BlockHeight(self.0 + 1)
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({})", self.0)
    }
}

/// Owner address of a UTXO.
///
/// Synthetic load addresses are the decimal rendering of an id in `[0, N)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, BasicSbor)]
#[sbor(transparent)]
pub struct Address(pub String);

impl Address {
    /// Create an address from any string-like value.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Address of synthetic account `id`.
    pub fn synthetic(id: u64) -> Self {
        Self(id.to_string())
    }

    /// Parse the synthetic id back out, if this is a synthetic address.
    pub fn synthetic_id(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    /// Get the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Network location of a leader, validator or client process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, BasicSbor)]
pub struct Peer {
    /// Host name or IP address.
    pub ip: String,
    /// TCP port.
    pub port: u16,
}

impl Peer {
    /// Create a new peer.
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
        }
    }

    /// `host:port` form suitable for socket connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partner_wraps_around() {
        assert_eq!(ShardGroupId(0).partner(3), ShardGroupId(1));
        assert_eq!(ShardGroupId(2).partner(3), ShardGroupId(0));
        assert_eq!(ShardGroupId(0).partner(1), ShardGroupId(0));
        assert_eq!(ShardGroupId(5).partner(0), ShardGroupId(5));
    }

    #[test]
    fn test_synthetic_address() {
        let address = Address::synthetic(42);
        assert_eq!(address.as_str(), "42");
        assert_eq!(address.synthetic_id(), Some(42));
        assert_eq!(Address::from("alice").synthetic_id(), None);
    }

    #[test]
    fn test_peer_socket_addr() {
        let peer = Peer::new("127.0.0.1", 9000);
        assert_eq!(peer.socket_addr(), "127.0.0.1:9000");
        assert_eq!(peer.to_string(), "127.0.0.1:9000");
    }
}
