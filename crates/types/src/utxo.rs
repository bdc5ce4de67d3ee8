//! Unspent transaction output pool for one shard.

use crate::{Address, Hash, ShardGroupId, Transaction};
use std::collections::HashMap;

/// Outputs of one transaction still unspent: output index -> value.
pub type OutputMap = HashMap<u32, u64>;

/// Unspent outputs of one shard.
///
/// Structure: address -> hex(transaction id) -> output index -> value.
///
/// Transaction ids are kept hex-encoded, the form leaders report them in, so
/// an entry may fail to decode; readers skip such entries. Iteration order is
/// unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoPool {
    shard: ShardGroupId,
    utxos: HashMap<Address, HashMap<String, OutputMap>>,
}

impl UtxoPool {
    /// Create an empty pool for a shard.
    pub fn new(shard: ShardGroupId) -> Self {
        Self {
            shard,
            utxos: HashMap::new(),
        }
    }

    /// Shard this pool belongs to.
    pub fn shard(&self) -> ShardGroupId {
        self.shard
    }

    /// Insert an unspent output. Overwrites an existing entry.
    pub fn insert(&mut self, address: Address, tx_id: &Hash, output_index: u32, value: u64) {
        self.insert_raw(address, tx_id.to_hex(), output_index, value);
    }

    /// Insert an unspent output under an already-encoded transaction id key.
    pub fn insert_raw(&mut self, address: Address, tx_id_key: String, output_index: u32, value: u64) {
        self.utxos
            .entry(address)
            .or_default()
            .entry(tx_id_key)
            .or_default()
            .insert(output_index, value);
    }

    /// Remove an unspent output, returning its value. Empty maps are pruned.
    pub fn remove(&mut self, address: &Address, tx_id: &Hash, output_index: u32) -> Option<u64> {
        let key = tx_id.to_hex();
        let by_tx = self.utxos.get_mut(address)?;
        let outputs = by_tx.get_mut(&key)?;
        let value = outputs.remove(&output_index)?;
        if outputs.is_empty() {
            by_tx.remove(&key);
        }
        if by_tx.is_empty() {
            self.utxos.remove(address);
        }
        Some(value)
    }

    /// Value of an unspent output, if present.
    pub fn get(&self, address: &Address, tx_id: &Hash, output_index: u32) -> Option<u64> {
        self.utxos
            .get(address)?
            .get(&tx_id.to_hex())?
            .get(&output_index)
            .copied()
    }

    /// Whether an unspent output is present.
    pub fn contains(&self, address: &Address, tx_id: &Hash, output_index: u32) -> bool {
        self.get(address, tx_id, output_index).is_some()
    }

    /// All transactions with unspent outputs owned by `address`.
    pub fn outputs_for(&self, address: &Address) -> Option<&HashMap<String, OutputMap>> {
        self.utxos.get(address)
    }

    /// Iterate over `(address, tx id key, outputs)` in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &String, &OutputMap)> + '_ {
        self.utxos.iter().flat_map(|(address, by_tx)| {
            by_tx
                .iter()
                .map(move |(tx_key, outputs)| (address, tx_key, outputs))
        })
    }

    /// Apply a finalized transaction: spend its local inputs, add its local outputs.
    ///
    /// Returns `false` without touching the pool if any input on this shard is
    /// not present (already spent or never seen).
    pub fn apply_transaction(&mut self, tx: &Transaction) -> bool {
        let local_inputs: Vec<_> = tx
            .inputs()
            .iter()
            .filter(|input| input.shard == self.shard)
            .collect();

        if local_inputs
            .iter()
            .any(|input| !self.contains(&input.address, &input.tx_id, input.output_index))
        {
            return false;
        }

        for input in local_inputs {
            self.remove(&input.address, &input.tx_id, input.output_index);
        }

        let id = tx.id();
        for (index, output) in tx.outputs().iter().enumerate() {
            if output.shard == self.shard {
                self.insert(output.address.clone(), &id, index as u32, output.value);
            }
        }
        true
    }

    /// Number of addresses holding at least one unspent output.
    pub fn address_count(&self) -> usize {
        self.utxos.len()
    }

    /// Number of unspent outputs with decodable transaction ids.
    pub fn utxo_count(&self) -> usize {
        self.iter()
            .filter(|(_, key, _)| Hash::from_hex(key).is_ok())
            .map(|(_, _, outputs)| outputs.len())
            .sum()
    }

    /// Sum of all decodable unspent output values.
    pub fn total_value(&self) -> u64 {
        self.iter()
            .filter(|(_, key, _)| Hash::from_hex(key).is_ok())
            .flat_map(|(_, _, outputs)| outputs.values())
            .sum()
    }

    /// Whether the pool holds no outputs at all.
    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TxInput, TxOutput};

    #[test]
    fn test_insert_get_remove() {
        let mut pool = UtxoPool::new(ShardGroupId(0));
        let tx_id = Hash::from_bytes(b"tx");
        let address = Address::from("A");

        pool.insert(address.clone(), &tx_id, 0, 50);
        pool.insert(address.clone(), &tx_id, 1, 25);
        assert_eq!(pool.get(&address, &tx_id, 0), Some(50));
        assert_eq!(pool.utxo_count(), 2);
        assert_eq!(pool.total_value(), 75);

        assert_eq!(pool.remove(&address, &tx_id, 0), Some(50));
        assert_eq!(pool.remove(&address, &tx_id, 0), None);
        assert_eq!(pool.remove(&address, &tx_id, 1), Some(25));
        assert!(pool.is_empty(), "empty maps should be pruned");
    }

    #[test]
    fn test_undecodable_keys_not_counted() {
        let mut pool = UtxoPool::new(ShardGroupId(0));
        pool.insert_raw(Address::from("A"), "not-hex".to_string(), 0, 10);
        pool.insert(Address::from("A"), &Hash::from_bytes(b"ok"), 0, 5);
        assert_eq!(pool.utxo_count(), 1);
        assert_eq!(pool.total_value(), 5);
    }

    #[test]
    fn test_apply_transaction_spends_and_creates_local_outputs() {
        let shard = ShardGroupId(0);
        let mut pool = UtxoPool::new(shard);
        let source = Hash::from_bytes(b"source");
        pool.insert(Address::from("A"), &source, 0, 50);

        let tx = Transaction::new(
            vec![TxInput {
                tx_id: source,
                output_index: 0,
                address: Address::from("A"),
                shard,
            }],
            vec![
                TxOutput {
                    value: 50,
                    address: Address::synthetic(9),
                    shard,
                },
                TxOutput {
                    value: 20,
                    address: Address::synthetic(4),
                    shard: ShardGroupId(1),
                },
            ],
        );

        assert!(pool.apply_transaction(&tx));
        assert!(!pool.contains(&Address::from("A"), &source, 0));
        assert_eq!(pool.get(&Address::synthetic(9), &tx.id(), 0), Some(50));
        assert!(pool.outputs_for(&Address::synthetic(4)).is_none());

        // Replaying the same spend fails and leaves the pool untouched.
        let before = pool.clone();
        assert!(!pool.apply_transaction(&tx));
        assert_eq!(pool, before);
    }
}
