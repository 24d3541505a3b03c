// Path: crates/test-utils/src/builders.rs

//! Deterministic transaction and header builders, generalizing the private
//! `sample_tx`/`child_header` helpers several crates' test modules hand-roll
//! independently, so new tests can build one from a shared place instead of
//! adding yet another copy.

use alephium_types::header::{BlockDeps, BlockHeader, GENESIS_TIMESTAMP};
use alephium_types::output::{Amount, AssetOutput, LockupScript, TxOutput};
use alephium_types::transaction::{Transaction, UnsignedTransaction};
use alephium_types::Hash;

/// A single-output transaction with no inputs, locked to a hash derived
/// from `seed` — enough to exercise admission/pool/DAG plumbing that
/// doesn't care about a real signature or spendable input.
pub fn sample_tx(seed: &[u8]) -> Transaction {
    Transaction {
        unsigned: UnsignedTransaction {
            inputs: vec![],
            fixed_outputs: vec![TxOutput::Asset(AssetOutput {
                amount: Amount::from_u64(1),
                lockup_script: LockupScript::P2PKH(Hash::hash(seed)),
                tokens: vec![],
                lock_time: 0,
                additional_data: vec![],
            })],
            gas_amount: 20_000,
            gas_price: Amount::from_u64(1),
            script: None,
        },
        contract_inputs: vec![],
        generated_outputs: vec![],
        input_signatures: vec![],
        contract_signatures: vec![],
    }
}

/// A header extending `parent` on chain `from` within a `num_groups`-group
/// DAG, with `salt` distinguishing otherwise-identical siblings by varying
/// both `txs_hash` and `nonce`.
pub fn child_header(parent: &BlockHeader, num_groups: u16, from: u16, salt: u8) -> BlockHeader {
    let mut deps = vec![Hash::ZERO; 2 * num_groups as usize - 1];
    deps[num_groups as usize - 1 + from as usize] = parent.hash();
    BlockHeader {
        block_deps: BlockDeps::new(deps, num_groups).unwrap(),
        txs_hash: Hash::hash(&[salt]),
        timestamp: GENESIS_TIMESTAMP + 1,
        target: parent.target,
        nonce: alephium_types::header::Nonce([salt; 32]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::genesis_block;

    #[test]
    fn sample_tx_has_single_output() {
        let tx = sample_tx(b"seed-a");
        assert_eq!(tx.unsigned.fixed_outputs.len(), 1);
    }

    #[test]
    fn distinct_seeds_produce_distinct_lockup_scripts() {
        let a = sample_tx(b"seed-a");
        let b = sample_tx(b"seed-b");
        assert_ne!(a.unsigned.fixed_outputs, b.unsigned.fixed_outputs);
    }

    #[test]
    fn child_header_points_back_at_parent() {
        let genesis = genesis_block(2, b"genesis-builders");
        let child = child_header(&genesis.header, 2, 0, 7);
        assert_eq!(child.parent_hash(0, 2), genesis.hash());
    }
}
