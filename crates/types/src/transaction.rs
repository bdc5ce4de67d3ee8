//! UTXO transactions.

use crate::{Address, Hash, ShardGroupId};
use sbor::prelude::*;

/// Reference to one spendable output of a finalized transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtxoRef {
    /// Shard holding the output.
    pub shard: ShardGroupId,
    /// Transaction that created the output.
    pub tx_id: Hash,
    /// Position of the output in that transaction.
    pub output_index: u32,
}

/// A transaction input spending one UTXO.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct TxInput {
    /// Transaction that created the spent output.
    pub tx_id: Hash,
    /// Index of the spent output.
    pub output_index: u32,
    /// Owner of the spent output.
    pub address: Address,
    /// Shard holding the spent output.
    pub shard: ShardGroupId,
}

impl TxInput {
    /// Reference to the UTXO this input spends.
    pub fn utxo_ref(&self) -> UtxoRef {
        UtxoRef {
            shard: self.shard,
            tx_id: self.tx_id,
            output_index: self.output_index,
        }
    }
}

/// A transaction output.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct TxOutput {
    /// Amount carried by the output.
    pub value: u64,
    /// Receiving address.
    pub address: Address,
    /// Shard the output lands on.
    pub shard: ShardGroupId,
}

/// A UTXO transaction.
///
/// The id is derived from the finalized inputs and outputs, so it can only be
/// computed once both are fully constructed. Use [`Transaction::new`].
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Transaction {
    id: Hash,
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
}

impl Transaction {
    /// Build a transaction and assign its content-derived id.
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        let id = Self::compute_id(&inputs, &outputs);
        Self {
            id,
            inputs,
            outputs,
        }
    }

    /// Coinbase transaction minting `value` to `address` on `shard`.
    pub fn coinbase(address: Address, value: u64, shard: ShardGroupId) -> Self {
        Self::new(
            Vec::new(),
            vec![TxOutput {
                value,
                address,
                shard,
            }],
        )
    }

    /// Blake3 over every field of every input and output, length-prefixed.
    fn compute_id(inputs: &[TxInput], outputs: &[TxOutput]) -> Hash {
        let mut bytes = Vec::with_capacity(16 + inputs.len() * 64 + outputs.len() * 32);
        bytes.extend_from_slice(&(inputs.len() as u32).to_le_bytes());
        for input in inputs {
            bytes.extend_from_slice(input.tx_id.as_bytes());
            bytes.extend_from_slice(&input.output_index.to_le_bytes());
            push_address(&mut bytes, &input.address);
            bytes.extend_from_slice(&input.shard.0.to_le_bytes());
        }
        bytes.extend_from_slice(&(outputs.len() as u32).to_le_bytes());
        for output in outputs {
            bytes.extend_from_slice(&output.value.to_le_bytes());
            push_address(&mut bytes, &output.address);
            bytes.extend_from_slice(&output.shard.0.to_le_bytes());
        }
        Hash::from_bytes(&bytes)
    }

    /// Transaction id.
    pub fn id(&self) -> Hash {
        self.id
    }

    /// Inputs in order.
    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    /// Outputs in order.
    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    /// Whether this transaction mints value without spending anything.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Whether inputs or outputs touch more than one shard.
    pub fn is_cross_shard(&self) -> bool {
        let mut shards = self
            .inputs
            .iter()
            .map(|i| i.shard)
            .chain(self.outputs.iter().map(|o| o.shard));
        match shards.next() {
            Some(first) => shards.any(|s| s != first),
            None => false,
        }
    }

    /// Sum of output values.
    pub fn total_output(&self) -> u64 {
        self.outputs.iter().map(|o| o.value).sum()
    }
}

fn push_address(bytes: &mut Vec<u8>, address: &Address) {
    bytes.extend_from_slice(&(address.as_str().len() as u32).to_le_bytes());
    bytes.extend_from_slice(address.as_str().as_bytes());
}
