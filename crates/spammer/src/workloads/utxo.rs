//! UTXO spend workload.

use crate::workloads::{SynthesizedBatch, TransactionSynthesizer};
use rand::{Rng, RngCore};
use shardload_ledger::ShardView;
use shardload_types::{Address, Hash, Transaction, TxInput, TxOutput, UtxoRef};
use std::collections::HashSet;
use tracing::debug;

/// Spends sampled UTXOs of a shard to random synthetic addresses.
///
/// Each UTXO of the origin shard gets one draw in `[0, 100)`. Below
/// `sample_percent` it is spent; below `cross_shard_percent` as well (and with
/// cross-shard enabled) the spend also pulls one UTXO of the same owner from
/// the partner shard `(origin + 1) % shards`.
///
/// Every output mirrors exactly one input: same value, same shard. There is no
/// change or fee.
#[derive(Debug, Clone)]
pub struct UtxoSpendWorkload {
    /// Outputs go to synthetic addresses in `[0, num_addresses)`.
    num_addresses: u64,

    /// Percent of scanned UTXOs selected for spending.
    sample_percent: u32,

    /// Percent of scanned UTXOs turned into cross-shard spends.
    cross_shard_percent: u32,
}

impl UtxoSpendWorkload {
    /// Create a workload spending to `num_addresses` synthetic addresses.
    pub fn new(num_addresses: u64) -> Self {
        Self {
            num_addresses: num_addresses.max(1),
            sample_percent: 30,
            cross_shard_percent: 10,
        }
    }

    /// Set the sample rate (0 to 100).
    pub fn with_sample_percent(mut self, percent: u32) -> Self {
        self.sample_percent = percent.min(100);
        self.cross_shard_percent = self.cross_shard_percent.min(self.sample_percent);
        self
    }

    /// Set the cross-shard rate (0 to the sample rate).
    pub fn with_cross_shard_percent(mut self, percent: u32) -> Self {
        self.cross_shard_percent = percent.min(self.sample_percent);
        self
    }

    /// Smallest unused `(tx id, output index)` owned by `address` in `view`.
    fn pick_partner_utxo(
        &self,
        view: &ShardView,
        address: &Address,
        used: &mut HashSet<UtxoRef>,
    ) -> Option<(TxInput, u64)> {
        let shard = view.shard();
        let (utxo, value) = view
            .pool()
            .outputs_for(address)?
            .iter()
            .filter_map(|(key, outputs)| Some((Hash::from_hex(key).ok()?, outputs)))
            .flat_map(|(tx_id, outputs)| {
                outputs.iter().map(move |(&output_index, &value)| {
                    (
                        UtxoRef {
                            shard,
                            tx_id,
                            output_index,
                        },
                        value,
                    )
                })
            })
            .filter(|(utxo, _)| !used.contains(utxo))
            .min_by_key(|(utxo, _)| (utxo.tx_id, utxo.output_index))?;

        used.insert(utxo);
        Some((
            TxInput {
                tx_id: utxo.tx_id,
                output_index: utxo.output_index,
                address: address.clone(),
                shard,
            },
            value,
        ))
    }

    /// One output per input, same value and shard, to a random address.
    fn spend(&self, legs: Vec<(TxInput, u64)>, rng: &mut dyn RngCore) -> Transaction {
        let outputs = legs
            .iter()
            .map(|(input, value)| TxOutput {
                value: *value,
                address: Address::synthetic(rng.gen_range(0..self.num_addresses)),
                shard: input.shard,
            })
            .collect();
        let inputs = legs.into_iter().map(|(input, _)| input).collect();
        Transaction::new(inputs, outputs)
    }
}

impl TransactionSynthesizer for UtxoSpendWorkload {
    fn synthesize(
        &self,
        origin: usize,
        views: &[ShardView],
        max_count: usize,
        cross_shard: bool,
        rng: &mut dyn RngCore,
    ) -> SynthesizedBatch {
        let mut batch = SynthesizedBatch::default();
        let Some(origin_view) = views.get(origin) else {
            return batch;
        };
        if max_count == 0 {
            return batch;
        }

        let origin_shard = origin_view.shard();
        let partner_shard = origin_shard.partner(views.len() as u64);
        let partner_view = if cross_shard && partner_shard != origin_shard {
            views.iter().find(|view| view.shard() == partner_shard)
        } else {
            None
        };
        let mut used_partner_utxos = HashSet::new();

        'scan: for (address, tx_key, outputs) in origin_view.pool().iter() {
            let tx_id = match Hash::from_hex(tx_key) {
                Ok(tx_id) => tx_id,
                Err(e) => {
                    debug!(shard = %origin_shard, key = %tx_key, error = %e, "Skipping undecodable transaction id");
                    continue;
                }
            };

            for (&output_index, &value) in outputs {
                if batch.len() >= max_count {
                    break 'scan;
                }

                let draw = rng.gen_range(0..100u32);
                if draw >= self.sample_percent {
                    continue;
                }

                let input = TxInput {
                    tx_id,
                    output_index,
                    address: address.clone(),
                    shard: origin_shard,
                };

                if cross_shard && draw < self.cross_shard_percent {
                    let mut legs = vec![(input, value)];
                    if let Some(view) = partner_view {
                        legs.extend(self.pick_partner_utxo(view, address, &mut used_partner_utxos));
                    }
                    batch.cross_shard.push(self.spend(legs, rng));
                } else {
                    batch.intra_shard.push(self.spend(vec![(input, value)], rng));
                }
            }
        }

        batch
    }
}
