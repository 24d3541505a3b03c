// Path: crates/vm/src/context.rs

//! `Context`: the state threaded through one transaction's script
//! execution. The stateless context is what `runAssetScript` (P2SH
//! unlocking) runs against; the stateful context additionally carries
//! world-state staging, used for `CreateContract`/`DestroySelf` and asset
//! transfers between contracts.

use crate::gas::GasMeter;
use alephium_state::{ContractId, ContractPool, ContractState, StagingOverlay};
use alephium_types::hash::TxId;
use alephium_types::header::Target;
use alephium_types::output::TxOutput;
use alephium_types::transaction::{Signature, TxOutputRef};

/// The subset of a block's declared environment the VM's `Env` opcodes
/// read (`ChainId`, `BlockTimeStamp`, `BlockTarget`).
#[derive(Clone, Debug)]
pub struct BlockEnv {
    /// The network/chain id, as raw bytes (`ChainId` opcode).
    pub chain_id: Vec<u8>,
    /// The block's timestamp, in milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// The block's declared PoW target.
    pub target: Target,
}

/// A LIFO stack of signatures consumed by `VerifyTxSignature` and by
/// `alephium-tx`'s `checkWitnesses`. Any entries left unconsumed at tx end
/// cause `TooManySignatures`.
#[derive(Clone, Debug, Default)]
pub struct SignatureStack {
    signatures: Vec<Signature>,
}

impl SignatureStack {
    /// Builds a stack from a transaction's `contractSignatures`, consumed
    /// front-to-back (index 0 first).
    pub fn new(signatures: Vec<Signature>) -> Self {
        let mut signatures = signatures;
        signatures.reverse();
        SignatureStack { signatures }
    }

    /// Pops the next signature, or `None` if exhausted.
    pub fn pop(&mut self) -> Option<Signature> {
        self.signatures.pop()
    }

    /// `true` iff every signature has been consumed.
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

/// The context a `StatelessVM.runAssetScript` call executes against: no
/// world-state access, used for P2SH unlock-script execution.
pub struct StatelessContext {
    /// The transaction being validated.
    pub tx_id: TxId,
    /// Signatures consumed by `VerifyTxSignature`.
    pub signatures: SignatureStack,
    /// The gas meter, shared with the caller's remaining gas budget.
    pub gas: GasMeter,
    /// The block environment.
    pub block_env: BlockEnv,
}

/// Resolves a `TxOutputRef` to its `TxOutput`, so the VM can read
/// pre-approved asset amounts without depending on storage/flow directly.
pub trait OutputResolver {
    /// Looks up the output named by `output_ref`, or `None` if unknown.
    fn resolve(&self, output_ref: &TxOutputRef) -> Option<TxOutput>;
}

/// The context a full tx-script or contract-method execution runs
/// against: everything `StatelessContext` has, plus world-state staging,
/// the contract pool, and the accumulating effects of execution.
pub struct StatefulContext<'a> {
    /// The stateless fields (tx id, signatures, gas, block env).
    pub base: StatelessContext,
    /// The world-state staging overlay this execution mutates; folded into
    /// the parent trie only on successful block application.
    pub staging: &'a mut StagingOverlay,
    /// Contract objects loaded during this execution, LRU-bounded.
    pub contract_pool: &'a mut ContractPool,
    /// Contract-owned inputs consumed so far.
    pub contract_inputs: Vec<TxOutputRef>,
    /// Outputs produced so far (a contract's transfer, change, etc).
    pub generated_outputs: Vec<TxOutput>,
    /// Resolves pre-approved inputs' outputs.
    pub outputs: &'a dyn OutputResolver,
}

impl<'a> StatefulContext<'a> {
    /// Loads (or fetches from the pool) the state for `contract_id`,
    /// reading through the staging overlay if not already cached.
    pub async fn load_contract(
        &mut self,
        contract_id: &ContractId,
        trie_key: impl FnOnce(&ContractId) -> alephium_types::hash::Hash,
    ) -> Option<std::sync::Arc<ContractState>> {
        if let Some(existing) = self.contract_pool.get(contract_id) {
            return Some(existing);
        }
        let key = trie_key(contract_id);
        let bytes = self.staging.get(&key).await.ok().flatten()?;
        let state: ContractState = parity_scale_codec::Decode::decode(&mut &bytes[..]).ok()?;
        let state = std::sync::Arc::new(state);
        self.contract_pool.put(*contract_id, state.clone());
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_types::transaction::Signature;

    #[test]
    fn signature_stack_pops_in_declared_order() {
        let mut stack = SignatureStack::new(vec![Signature(vec![1]), Signature(vec![2])]);
        assert_eq!(stack.pop(), Some(Signature(vec![1])));
        assert_eq!(stack.pop(), Some(Signature(vec![2])));
        assert!(stack.is_empty());
    }
}
