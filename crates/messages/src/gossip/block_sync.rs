//! Finalized blocks pushed by leaders to the generator's client port.

use crate::NetworkMessage;
use shardload_types::Block;
use sbor::prelude::BasicSbor;

/// One or more finalized blocks, possibly from different shards.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct BlockSyncMessage {
    /// Blocks in the order the leader finalized them.
    pub blocks: Vec<Block>,
}

impl BlockSyncMessage {
    /// Create a new block sync message.
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Consume and return the blocks.
    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }
}

impl NetworkMessage for BlockSyncMessage {
    fn message_type_id() -> &'static str {
        "block.sync"
    }
}
