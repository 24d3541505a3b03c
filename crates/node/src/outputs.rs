// Path: crates/node/src/outputs.rs

//! A concrete [`OutputResolver`]: this kernel's UTXO set is flow's
//! responsibility by design (see `OutputResolver`'s own doc comment), and
//! nothing in this workspace yet maintains one across applied blocks — the
//! orchestrator holds its `outputs: Arc<dyn OutputResolver>` privately with
//! no hook to update it after a block commits. What this binary can
//! honestly supply at startup is every output genesis blocks create (they
//! have no inputs, so they're unconditionally spendable); resolving a
//! UTXO created by a later, non-genesis block is a known gap, not silently
//! pretended to work.

use alephium_types::{Block, TxOutput, TxOutputRef};
use alephium_vm::OutputResolver;
use std::collections::HashMap;

/// Resolves only the outputs genesis blocks create.
pub struct GenesisOutputResolver {
    outputs: HashMap<TxOutputRef, TxOutput>,
}

impl GenesisOutputResolver {
    /// Indexes every fixed output of every genesis block by its
    /// `TxOutputRef`.
    pub fn new(genesis_blocks: &[Block]) -> Self {
        let mut outputs = HashMap::new();
        for block in genesis_blocks {
            for tx in &block.transactions {
                let tx_id = tx.id();
                for (index, output) in tx.unsigned.fixed_outputs.iter().enumerate() {
                    let key = TxOutputRef::key_for(tx_id, index as u32);
                    // scriptHint is opaque to resolution (nothing in this
                    // workspace derives it from the lockup script yet); 0
                    // matches the placeholder every caller of `asset()` uses.
                    let output_ref = TxOutputRef::asset(0, key);
                    outputs.insert(output_ref, output.clone());
                }
            }
        }
        GenesisOutputResolver { outputs }
    }
}

impl OutputResolver for GenesisOutputResolver {
    fn resolve(&self, output_ref: &TxOutputRef) -> Option<TxOutput> {
        self.outputs.get(output_ref).cloned()
    }
}
