// Path: crates/types/src/block.rs

//! `Block`: a header plus its transaction list, with the coinbase-last
//! convention and the deterministic non-coinbase execution order.

use crate::codec::{Codec, CodecError, Reader, Writer};
use crate::hash::Hash;
use crate::header::BlockHeader;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// A header plus its full transaction list. The last transaction is always
/// the coinbase; `nonCoinbase = transactions[:-1]`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Block {
    /// The block's header.
    pub header: BlockHeader,
    /// The block's transactions, coinbase last.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Builds a block from a header and its transactions; does not itself
    /// verify `header.txs_hash` matches (callers validating an untrusted
    /// block should call [`Block::has_valid_txs_hash`]).
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Block { header, transactions }
    }

    /// The block's hash, i.e. its header's hash.
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    /// The coinbase transaction, the last in the list. Only absent for a
    /// malformed block (empty `transactions`), which block validation
    /// rejects before this is ever called on untrusted input.
    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.last()
    }

    /// All transactions but the coinbase, in their original (declared)
    /// order.
    pub fn non_coinbase(&self) -> &[Transaction] {
        if self.transactions.is_empty() {
            &[]
        } else {
            &self.transactions[..self.transactions.len() - 1]
        }
    }

    /// The canonical encoding of `transactions`, whose hash is
    /// `header.txs_hash`.
    pub fn txs_hash(&self) -> Hash {
        let mut w = Writer::new();
        w.write_seq(&self.transactions, |w, tx| tx.encode_to(w));
        Hash::hash(&w.into_bytes())
    }

    /// `true` iff `header.txs_hash` matches the actual encoded transaction
    /// list.
    pub fn has_valid_txs_hash(&self) -> bool {
        self.header.txs_hash == self.txs_hash()
    }

    /// The deterministic order non-coinbase transactions execute their
    /// scripts in (`getNonCoinbaseExecutionOrder`): every tx carrying a
    /// script is shuffled by a seed derived from `parentHash` and three
    /// sample tx hashes, then every script-less tx follows in its original
    /// order. Two nodes validating the same block under the same parent
    /// therefore always agree on execution order, regardless of how the
    /// miner originally listed the transactions.
    pub fn non_coinbase_execution_order(&self, parent_hash: &Hash) -> Vec<&Transaction> {
        let non_coinbase = self.non_coinbase();
        let (mut with_script, without_script): (Vec<&Transaction>, Vec<&Transaction>) =
            non_coinbase.iter().partition(|tx| tx.unsigned.script.is_some());

        let seed = execution_order_seed(parent_hash, non_coinbase);
        shuffle_by_seed(&mut with_script, seed);

        with_script.into_iter().chain(without_script).collect()
    }
}

/// Derives the shuffle seed from `parentHash` and up to three sample tx
/// hashes (the first, middle, and last non-coinbase tx ids, or fewer if the
/// block has fewer txs).
fn execution_order_seed(parent_hash: &Hash, non_coinbase: &[Transaction]) -> Hash {
    let mut w = Writer::new();
    w.write_hash(parent_hash);
    let n = non_coinbase.len();
    let sample_indexes: &[usize] = match n {
        0 => &[],
        1 => &[0],
        2 => &[0, 1],
        _ => &[0, n / 2, n - 1],
    };
    for &i in sample_indexes {
        w.write_hash(&non_coinbase[i].id().hash());
    }
    Hash::hash(&w.into_bytes())
}

/// A Fisher-Yates shuffle driven by a deterministic byte stream expanded
/// from `seed` (repeated re-hashing, consumed 8 bytes at a time), so the
/// same seed always produces the same permutation regardless of host
/// randomness.
fn shuffle_by_seed<T>(items: &mut [T], seed: Hash) {
    if items.len() < 2 {
        return;
    }
    let mut state = seed;
    let mut counter: u64 = 0;
    for i in (1..items.len()).rev() {
        let mut w = Writer::new();
        w.write_hash(&state);
        w.write_u64(counter);
        state = Hash::hash(&w.into_bytes());
        counter += 1;
        let r = u64::from_be_bytes(state.as_bytes()[0..8].try_into().unwrap());
        let j = (r % (i as u64 + 1)) as usize;
        items.swap(i, j);
    }
}

impl Codec for Block {
    fn encode_to(&self, w: &mut Writer) {
        self.header.encode_to(w);
        w.write_seq(&self.transactions, |w, tx| tx.encode_to(w));
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let header = BlockHeader::decode_from(r)?;
        let transactions = r.read_seq(|r| Transaction::decode_from(r))?;
        Ok(Block { header, transactions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{Target, GENESIS_TIMESTAMP};
    use crate::output::{AssetOutput, Amount, LockupScript, TxOutput, UnlockScript};
    use crate::transaction::{TxInput, TxOutputRef, UnsignedTransaction};
    use num_bigint::BigUint;

    fn plain_tx(seed: &[u8], with_script: bool) -> Transaction {
        Transaction {
            unsigned: UnsignedTransaction {
                inputs: vec![TxInput {
                    output_ref: TxOutputRef::asset(0, Hash::hash(seed)),
                    unlock_script: UnlockScript::P2PKH(vec![1]),
                }],
                fixed_outputs: vec![TxOutput::Asset(AssetOutput {
                    amount: Amount::from_u64(1),
                    lockup_script: LockupScript::P2PKH(Hash::hash(b"dest")),
                    tokens: vec![],
                    lock_time: 0,
                    additional_data: vec![],
                })],
                gas_amount: 20_000,
                gas_price: Amount::from_u64(1),
                script: if with_script { Some(vec![0]) } else { None },
            },
            contract_inputs: vec![],
            generated_outputs: vec![],
            input_signatures: vec![],
            contract_signatures: vec![],
        }
    }

    fn sample_block(txs: Vec<Transaction>) -> Block {
        let header = BlockHeader::genesis(2, Hash::ZERO, Target::from_biguint(&BigUint::from(1u32)));
        Block::new(header, txs)
    }

    #[test]
    fn coinbase_is_last_transaction() {
        let coinbase = plain_tx(b"coinbase", false);
        let normal = plain_tx(b"normal", false);
        let block = sample_block(vec![normal.clone(), coinbase.clone()]);
        assert_eq!(block.coinbase().unwrap().id(), coinbase.id());
        assert_eq!(block.non_coinbase().len(), 1);
        assert_eq!(block.non_coinbase()[0].id(), normal.id());
    }

    #[test]
    fn txs_hash_round_trips_through_codec() {
        let block = sample_block(vec![plain_tx(b"a", false), plain_tx(b"coinbase", false)]);
        let bytes = block.to_bytes();
        let decoded = Block::from_bytes(&bytes).unwrap();
        assert_eq!(block, decoded);
        assert!(block.has_valid_txs_hash());
    }

    #[test]
    fn execution_order_is_deterministic_for_same_parent() {
        let txs = vec![
            plain_tx(b"s1", true),
            plain_tx(b"n1", false),
            plain_tx(b"s2", true),
            plain_tx(b"coinbase", false),
        ];
        let block = sample_block(txs);
        let parent = Hash::hash(b"parent");
        let order_a: Vec<_> = block.non_coinbase_execution_order(&parent).iter().map(|t| t.id()).collect();
        let order_b: Vec<_> = block.non_coinbase_execution_order(&parent).iter().map(|t| t.id()).collect();
        assert_eq!(order_a, order_b);
    }

    #[test]
    fn scripted_txs_precede_scriptless_txs() {
        let scripted = plain_tx(b"s1", true);
        let plain = plain_tx(b"n1", false);
        let block = sample_block(vec![plain.clone(), scripted.clone(), plain_tx(b"coinbase", false)]);
        let order = block.non_coinbase_execution_order(&Hash::hash(b"parent"));
        assert_eq!(order[0].id(), scripted.id());
        assert_eq!(order[1].id(), plain.id());
    }

    #[test]
    fn different_parent_can_change_shuffle_of_scripted_txs() {
        let txs = vec![
            plain_tx(b"s1", true),
            plain_tx(b"s2", true),
            plain_tx(b"s3", true),
            plain_tx(b"coinbase", false),
        ];
        let block = sample_block(txs);
        let order_a: Vec<_> = block
            .non_coinbase_execution_order(&Hash::hash(b"parent-a"))
            .iter()
            .map(|t| t.id())
            .collect();
        let order_b: Vec<_> = block
            .non_coinbase_execution_order(&Hash::hash(b"parent-b"))
            .iter()
            .map(|t| t.id())
            .collect();
        // Not a hard guarantee for every seed pair, but overwhelmingly true
        // for these fixed samples; documents that the seed is parent-derived.
        assert!(order_a != order_b || order_a.len() < 2);
    }

    #[test]
    fn genesis_timestamp_constant_is_zero() {
        assert_eq!(GENESIS_TIMESTAMP, 0);
    }
}
