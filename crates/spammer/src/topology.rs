//! Network topology file.
//!
//! One process per line, space separated:
//!
//! ```text
//! 127.0.0.1 9000 leader 0
//! 127.0.0.1 9001 validator 0
//! 127.0.0.1 9010 leader 1
//! 127.0.0.1 9011 validator 1
//! 127.0.0.1 9999 client 0
//! ```
//!
//! Leaders carry the shard they lead. With `n` leaders the shard ids must be
//! exactly `0..n`, since cross-shard partners are found by `(id + 1) % n`.
//! The shard column is optional for validators and ignored for the client.
//! Blank lines and lines starting with `#` are skipped.

use crate::config::ConfigError;
use shardload_types::{Peer, ShardGroupId};
use std::path::Path;

/// A shard leader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderNode {
    pub peer: Peer,
    pub shard: ShardGroupId,
}

/// Parsed topology: leaders in file order, validators, and the client port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkLayout {
    leaders: Vec<LeaderNode>,
    validators: Vec<Peer>,
    client_port: Option<u16>,
}

impl NetworkLayout {
    /// Build a layout directly.
    pub fn new(leaders: Vec<LeaderNode>, validators: Vec<Peer>, client_port: Option<u16>) -> Self {
        Self {
            leaders,
            validators,
            client_port,
        }
    }

    /// Read and parse a topology file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse topology text.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut layout = Self::default();
        let mut leader_lines = Vec::new();

        for (index, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line_no = index + 1;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if !(3..=4).contains(&fields.len()) {
                return Err(ConfigError::topology(
                    line_no,
                    format!("expected `ip port role [shard]`, got {} fields", fields.len()),
                ));
            }

            let ip = fields[0];
            let port: u16 = fields[1]
                .parse()
                .map_err(|_| ConfigError::topology(line_no, format!("invalid port `{}`", fields[1])))?;
            let shard = fields
                .get(3)
                .map(|s| {
                    s.parse::<u64>()
                        .map(ShardGroupId)
                        .map_err(|_| ConfigError::topology(line_no, format!("invalid shard id `{}`", s)))
                })
                .transpose()?;

            match fields[2] {
                "leader" => {
                    let shard = shard
                        .ok_or_else(|| ConfigError::topology(line_no, "leader without shard id"))?;
                    if layout.leaders.iter().any(|leader| leader.shard == shard) {
                        return Err(ConfigError::topology(
                            line_no,
                            format!("second leader for {}", shard),
                        ));
                    }
                    layout.leaders.push(LeaderNode {
                        peer: Peer::new(ip, port),
                        shard,
                    });
                    leader_lines.push(line_no);
                }
                "validator" => layout.validators.push(Peer::new(ip, port)),
                "client" => layout.client_port = Some(port),
                other => {
                    return Err(ConfigError::topology(line_no, format!("unknown role `{}`", other)))
                }
            }
        }

        // Shard ids are unique, so they cover 0..n exactly when all are below n.
        let num_shards = layout.leaders.len() as u64;
        if let Some((leader, line_no)) = layout
            .leaders
            .iter()
            .zip(leader_lines)
            .find(|(leader, _)| leader.shard.0 >= num_shards)
        {
            return Err(ConfigError::topology(
                line_no,
                format!(
                    "{} out of range: {} leaders need shard ids 0..{}",
                    leader.shard, num_shards, num_shards
                ),
            ));
        }

        Ok(layout)
    }

    /// Whether the leaders' shard ids are exactly `0..n`.
    pub fn has_contiguous_shards(&self) -> bool {
        let mut ids: Vec<u64> = self.leaders.iter().map(|leader| leader.shard.0).collect();
        ids.sort_unstable();
        ids.into_iter().eq(0..self.leaders.len() as u64)
    }

    /// Leaders in file order.
    pub fn leaders(&self) -> &[LeaderNode] {
        &self.leaders
    }

    /// Leader peers in file order.
    pub fn leader_peers(&self) -> Vec<Peer> {
        self.leaders.iter().map(|leader| leader.peer.clone()).collect()
    }

    /// Shard ids in leader order.
    pub fn shard_ids(&self) -> Vec<ShardGroupId> {
        self.leaders.iter().map(|leader| leader.shard).collect()
    }

    /// Number of shards (one per leader).
    pub fn num_shards(&self) -> usize {
        self.leaders.len()
    }

    /// Validator peers.
    pub fn validators(&self) -> &[Peer] {
        &self.validators
    }

    /// Port the generator listens on for finalized blocks, if configured.
    pub fn client_port(&self) -> Option<u16> {
        self.client_port
    }

    /// Every peer that must receive the end-of-run stop message: validators
    /// followed by leaders.
    pub fn stop_targets(&self) -> Vec<Peer> {
        self.validators
            .iter()
            .cloned()
            .chain(self.leaders.iter().map(|leader| leader.peer.clone()))
            .collect()
    }
}
