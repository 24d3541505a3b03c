// Path: crates/flow/src/validation.rs

//! Block validation (§4.6): header well-formedness, dependency resolution,
//! the coinbase reward equation, per-tx validation run in the deterministic
//! script execution order, and the final inter-block conflict check.

use alephium_state::{ContractPool, StagingOverlay};
use alephium_tx::stateful::{self, BlockEnv as TxBlockEnv, ResolvedInputs};
use alephium_tx::stateless;
use alephium_types::config::{ConsensusConfig, VmConfig};
use alephium_types::error::{InvalidBlockError, TxKind};
use alephium_types::output::{Amount, TxOutput, UnlockScript};
use alephium_types::transaction::TxInput;
use alephium_types::{Block, BlockHeader, ChainIndex, Hash, Transaction, TxOutputRef};
use alephium_vm::{
    check_tx_script, BlockEnv as VmBlockEnv, ContractCodeResolver, EmptyResolver, OutputResolver, Program,
    StatefulContext, StatelessContext,
};
use std::collections::HashSet;

use crate::blockflow::BlockFlow;
use crate::chain::BlockHashChain;
use crate::error::FlowError;

/// Decodes a tx script's on-chain bytecode into an executable [`Program`].
/// The wire format for compiled bytecode is intentionally out of this
/// crate's scope (it lives wherever contracts are compiled/deployed);
/// `alephium-flow` only consumes the decoded result through this seam.
pub trait ScriptDecoder: Send + Sync {
    /// Decodes `bytes` (a `Transaction.unsigned.script`) into a `Program`,
    /// or `None` if malformed.
    fn decode(&self, bytes: &[u8]) -> Option<Program>;
}

/// Computes a block's base mining reward at `height`, independent of any
/// gas fees collected from its non-coinbase transactions (config-provided
/// per `SPEC_FULL.md` §9's resolution of the reward-schedule Open
/// Question).
pub trait RewardSchedule: Send + Sync {
    /// The base reward for a block at `height`.
    fn base_reward(&self, height: u64) -> Amount;
}

/// Everything block validation needs beyond the block itself: the parent
/// chain state, resolved pre-outputs for every non-coinbase input, and the
/// pluggable script-execution seams.
pub struct BlockValidationContext<'a> {
    /// The chain the block is being validated against.
    pub chain_index: ChainIndex,
    /// Total configured groups.
    pub num_groups: u16,
    /// Timestamp and PoW bounds.
    pub consensus_config: &'a ConsensusConfig,
    /// Gas, dust, and size limits.
    pub vm_config: &'a VmConfig,
    /// The configured base mining reward function.
    pub reward_schedule: &'a dyn RewardSchedule,
    /// Decodes on-chain script bytecode into an executable `Program`.
    pub script_decoder: &'a dyn ScriptDecoder,
    /// Resolves a spent `TxOutputRef` against the world-state as of the
    /// block's parent (UTXOs) — flow's job, not `alephium-state`'s.
    pub outputs: &'a dyn OutputResolver,
    /// The world-state staging overlay this block's script executions
    /// mutate.
    pub staging: &'a mut StagingOverlay,
    /// The LRU contract object cache shared across this block's txs.
    pub contract_pool: &'a mut ContractPool,
    /// The timestamp of the block under validation, used as the VM's block
    /// environment timestamp for every tx script it runs.
    pub block_timestamp: u64,
}

/// Runs every check in §4.6 against `block`, given its already-validated
/// parent header and the `BlockFlow` instance (for dependency existence
/// and the conflict check).
pub async fn validate_block(
    block: &Block,
    parent: &BlockHeader,
    flow: &BlockFlow,
    ctx: &mut BlockValidationContext<'_>,
) -> Result<(), FlowError> {
    validate_header_well_formed(&block.header, parent, ctx.chain_index, ctx.num_groups, ctx.consensus_config)?;
    validate_deps_exist(&block.header, flow, ctx.num_groups)?;

    if block.transactions.is_empty() {
        return Err(InvalidBlockError::EmptyTransactionList.into());
    }
    if !block.has_valid_txs_hash() {
        return Err(InvalidBlockError::InvalidMerkleRoot.into());
    }

    let non_coinbase = block.non_coinbase();
    validate_no_cross_tx_double_spend(non_coinbase)?;

    let height = parent_height(parent, flow, ctx.chain_index)?.saturating_add(1);
    let base_reward = ctx.reward_schedule.base_reward(height);

    ctx.block_timestamp = block.header.timestamp;
    let parent_hash = parent.hash();
    let mut total_gas_fee = Amount::zero();
    for tx in block.non_coinbase_execution_order(&parent_hash) {
        let fee = validate_one_tx(tx, ctx).await?;
        total_gas_fee = total_gas_fee
            .checked_add(&fee)
            .ok_or_else(|| InvalidBlockError::InvalidCoinbase("gas fee overflow".into()))?;
    }

    let expected_reward = base_reward
        .checked_add(&total_gas_fee)
        .ok_or_else(|| InvalidBlockError::InvalidCoinbase("reward overflow".into()))?;
    let coinbase = block.coinbase().expect("non-empty transactions checked above");
    validate_coinbase(coinbase, &expected_reward, ctx.chain_index, height)?;

    if flow.conflict_cache().conflicts_with_any_cached(non_coinbase).is_some() {
        return Err(InvalidBlockError::ConflictingBlock.into());
    }

    Ok(())
}

fn parent_height(parent: &BlockHeader, flow: &BlockFlow, index: ChainIndex) -> Result<u64, FlowError> {
    let chain = flow.chain(index)?;
    chain.height_of(&parent.hash())
}

fn validate_header_well_formed(
    header: &BlockHeader,
    parent: &BlockHeader,
    index: ChainIndex,
    num_groups: u16,
    consensus: &ConsensusConfig,
) -> Result<(), InvalidBlockError> {
    if !header.has_valid_deps_length(num_groups) {
        return Err(InvalidBlockError::MalformedHeader("wrong deps length".into()));
    }
    if header.parent_hash(index.from.value(), num_groups) != parent.hash() {
        return Err(InvalidBlockError::MalformedHeader("outDeps[from] does not match declared parent".into()));
    }
    if header.timestamp <= parent.timestamp {
        return Err(InvalidBlockError::InvalidTimeStamp(format!(
            "{} is not after parent timestamp {}",
            header.timestamp, parent.timestamp
        )));
    }
    // Difficulty is inherited unchanged from the parent chain's declared
    // target (`SPEC_FULL.md` §9: resolved Open Question — no retargeting
    // algorithm in scope).
    if header.target.value() != parent.target.value() {
        return Err(InvalidBlockError::InvalidTarget);
    }
    if !header.is_pow_valid() {
        return Err(InvalidBlockError::InvalidWorkAmount);
    }
    let _ = consensus;
    Ok(())
}

fn validate_deps_exist(header: &BlockHeader, flow: &BlockFlow, num_groups: u16) -> Result<(), FlowError> {
    let mut missing = Vec::new();
    for dep in header.block_deps.as_slice() {
        if *dep == Hash::ZERO {
            continue;
        }
        let mut found = false;
        for index in alephium_types::group::all_chain_indexes(num_groups) {
            if let Ok(chain) = flow.chain(index) {
                if chain.header(dep).is_ok() {
                    found = true;
                    break;
                }
            }
        }
        if !found {
            missing.push(*dep);
        }
    }
    if !missing.is_empty() {
        return Err(InvalidBlockError::MissingDeps(missing).into());
    }
    Ok(())
}

fn validate_no_cross_tx_double_spend(non_coinbase: &[Transaction]) -> Result<(), FlowError> {
    let mut seen: HashSet<&TxOutputRef> = HashSet::new();
    for tx in non_coinbase {
        for r in tx.spent_refs() {
            if !seen.insert(r) {
                return Err(InvalidBlockError::ExistInvalidTx(TxKind::TxDoubleSpending).into());
            }
        }
    }
    Ok(())
}

/// `gasUsed × gasPrice`, not the declared `gasAmount` — §8's testable
/// property `fee = gasUsed × gasPrice`.
fn gas_fee(gas_used: u64, gas_price: &Amount) -> Result<Amount, InvalidBlockError> {
    let gas_used = Amount::from_u64(gas_used);
    let product = &gas_used.0 * &gas_price.0;
    if product.bits() > 256 {
        Err(InvalidBlockError::InvalidCoinbase("gas fee overflow".into()))
    } else {
        Ok(Amount(product))
    }
}

/// The coinbase's single synthesized input, deterministically derived from
/// the chain and height it's mined at. It names no real pre-output — the
/// coinbase mints its reward rather than spending anything — but every
/// node must derive the identical input for the same `(chain_index,
/// height)` so coinbase transactions hash identically across the network.
fn synthesized_coinbase_input(chain_index: ChainIndex, height: u64) -> TxInput {
    let mut bytes = Vec::with_capacity(4 + 8);
    bytes.extend_from_slice(&chain_index.from.value().to_be_bytes());
    bytes.extend_from_slice(&chain_index.to.value().to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    TxInput {
        output_ref: TxOutputRef::asset(0, Hash::hash(&bytes)),
        unlock_script: UnlockScript::P2PKH(Vec::new()),
    }
}

fn validate_coinbase(
    coinbase: &Transaction,
    expected_reward: &Amount,
    chain_index: ChainIndex,
    height: u64,
) -> Result<(), InvalidBlockError> {
    if coinbase.unsigned.inputs != vec![synthesized_coinbase_input(chain_index, height)] {
        return Err(InvalidBlockError::InvalidCoinbase(
            "coinbase must carry exactly one synthesized input".into(),
        ));
    }
    if !coinbase.contract_inputs.is_empty() {
        return Err(InvalidBlockError::InvalidCoinbase("coinbase must spend no contract inputs".into()));
    }
    if !coinbase.generated_outputs.is_empty() || coinbase.unsigned.script.is_some() {
        return Err(InvalidBlockError::InvalidCoinbase("coinbase cannot run a script".into()));
    }
    if coinbase.unsigned.fixed_outputs.is_empty() {
        return Err(InvalidBlockError::InvalidCoinbase("coinbase must pay an output".into()));
    }
    let mut total = Amount::zero();
    for output in &coinbase.unsigned.fixed_outputs {
        if !output.tokens().is_empty() {
            return Err(InvalidBlockError::InvalidCoinbase("coinbase cannot mint tokens".into()));
        }
        total = total
            .checked_add(output.amount())
            .ok_or_else(|| InvalidBlockError::InvalidCoinbase("reward overflow".into()))?;
    }
    if total != *expected_reward {
        return Err(InvalidBlockError::InvalidCoinbase(format!(
            "paid {:?}, expected {:?}",
            total, expected_reward
        )));
    }
    Ok(())
}

/// Validates `tx` and returns the fee it owes (`gasUsed × gasPrice`, where
/// `gasUsed` is the declared `gasAmount` for an unscripted tx, or the
/// amount the VM actually spent running its script).
async fn validate_one_tx(tx: &Transaction, ctx: &mut BlockValidationContext<'_>) -> Result<Amount, FlowError> {
    stateless::validate_stateless(tx, ctx.chain_index, ctx.num_groups, ctx.vm_config)?;

    let mut pre_outputs = Vec::with_capacity(tx.unsigned.inputs.len());
    for input in &tx.unsigned.inputs {
        let out = ctx
            .outputs
            .resolve(&input.output_ref)
            .ok_or_else(|| InvalidBlockError::ExistInvalidTx(TxKind::NonExistInput))?;
        pre_outputs.push(out);
    }
    let resolved = ResolvedInputs { pre_outputs };
    let block_env = TxBlockEnv { timestamp: ctx.vm_env_timestamp() };

    let gas_used = if let Some(script_bytes) = &tx.unsigned.script {
        let program = ctx
            .script_decoder
            .decode(script_bytes)
            .ok_or_else(|| InvalidBlockError::ExistInvalidTx(TxKind::UnexpectedTxScript))?;
        run_script(tx, &program, ctx).await?
    } else {
        tx.unsigned.gas_amount
    };

    stateful::validate_stateful(tx, &resolved, &block_env, None, gas_used)?;

    Ok(gas_fee(gas_used, &tx.unsigned.gas_price)?)
}

impl<'a> BlockValidationContext<'a> {
    fn vm_env_timestamp(&self) -> u64 {
        self.block_timestamp
    }
}

/// Runs `tx`'s script to completion and returns the gas it actually used
/// (`gasAmount − gasRemaining`), not the declared `gasAmount`.
async fn run_script(tx: &Transaction, program: &Program, ctx: &mut BlockValidationContext<'_>) -> Result<u64, FlowError> {
    let gas_amount = tx.unsigned.gas_amount;
    let stateless = StatelessContext {
        tx_id: tx.id(),
        signatures: alephium_vm::SignatureStack::new(tx.contract_signatures.clone()),
        gas: alephium_vm::GasMeter::new(gas_amount),
        block_env: VmBlockEnv {
            chain_id: Vec::new(),
            timestamp: ctx.vm_env_timestamp(),
            target: alephium_types::header::Target::from_biguint(&num_bigint::BigUint::from(1u32)),
        },
    };
    let mut stateful_ctx = StatefulContext {
        base: stateless,
        staging: ctx.staging,
        contract_pool: ctx.contract_pool,
        contract_inputs: Vec::new(),
        generated_outputs: Vec::new(),
        outputs: ctx.outputs,
    };
    let no_contracts = EmptyResolver;
    let resolver: &dyn ContractCodeResolver = &no_contracts;
    check_tx_script(
        program,
        Vec::new(),
        &tx.contract_inputs,
        &tx.generated_outputs,
        None,
        &mut stateful_ctx,
        resolver,
    )
    .await
    .map_err(|_| InvalidBlockError::ExistInvalidTx(TxKind::UnexpectedTxScript))?;
    Ok(stateful_ctx.base.gas.used(gas_amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_types::header::{BlockDeps, Nonce, Target, GENESIS_TIMESTAMP};
    use num_bigint::BigUint;

    fn header_with(parent: &BlockHeader, num_groups: u16, salt: u8) -> BlockHeader {
        let mut deps = vec![Hash::ZERO; 2 * num_groups as usize - 1];
        deps[num_groups as usize - 1] = parent.hash();
        BlockHeader {
            block_deps: BlockDeps::new(deps, num_groups).unwrap(),
            txs_hash: Hash::hash(&[salt]),
            timestamp: GENESIS_TIMESTAMP + 1,
            target: parent.target,
            nonce: Nonce([salt; 32]),
        }
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let parent = BlockHeader::genesis(2, Hash::hash(b"g"), Target::from_biguint(&BigUint::from(1u32)));
        let mut child = header_with(&parent, 2, 1);
        child.timestamp = parent.timestamp;
        let index = ChainIndex::new(alephium_types::GroupIndex::from_raw(0), alephium_types::GroupIndex::from_raw(0));
        let consensus = ConsensusConfig::default();
        let err = validate_header_well_formed(&child, &parent, index, 2, &consensus).unwrap_err();
        matches!(err, InvalidBlockError::InvalidTimeStamp(_));
    }

    #[test]
    fn mismatched_target_is_rejected() {
        let parent = BlockHeader::genesis(2, Hash::hash(b"g"), Target::from_biguint(&BigUint::from(1u32)));
        let mut child = header_with(&parent, 2, 1);
        child.target = Target::from_biguint(&BigUint::from(2u32));
        let index = ChainIndex::new(alephium_types::GroupIndex::from_raw(0), alephium_types::GroupIndex::from_raw(0));
        let consensus = ConsensusConfig::default();
        let err = validate_header_well_formed(&child, &parent, index, 2, &consensus).unwrap_err();
        matches!(err, InvalidBlockError::InvalidTarget);
    }

    fn coinbase_tx(index: ChainIndex, height: u64, amount: u64) -> Transaction {
        use alephium_types::output::{AssetOutput, LockupScript};
        use alephium_types::transaction::UnsignedTransaction;
        Transaction {
            unsigned: UnsignedTransaction {
                inputs: vec![synthesized_coinbase_input(index, height)],
                fixed_outputs: vec![TxOutput::Asset(AssetOutput {
                    amount: Amount::from_u64(amount),
                    lockup_script: LockupScript::P2PKH(Hash::hash(b"miner")),
                    tokens: vec![],
                    lock_time: 0,
                    additional_data: vec![],
                })],
                gas_amount: 0,
                gas_price: Amount::zero(),
                script: None,
            },
            contract_inputs: vec![],
            generated_outputs: vec![],
            input_signatures: vec![],
            contract_signatures: vec![],
        }
    }

    #[test]
    fn coinbase_reward_mismatch_is_rejected() {
        let index = ChainIndex::new(alephium_types::GroupIndex::from_raw(0), alephium_types::GroupIndex::from_raw(0));
        let coinbase = coinbase_tx(index, 1, 1);
        let err = validate_coinbase(&coinbase, &Amount::from_u64(2), index, 1).unwrap_err();
        matches!(err, InvalidBlockError::InvalidCoinbase(_));
    }

    #[test]
    fn coinbase_with_matching_reward_and_input_is_accepted() {
        let index = ChainIndex::new(alephium_types::GroupIndex::from_raw(0), alephium_types::GroupIndex::from_raw(0));
        let coinbase = coinbase_tx(index, 1, 2);
        assert!(validate_coinbase(&coinbase, &Amount::from_u64(2), index, 1).is_ok());
    }

    #[test]
    fn coinbase_synthesized_for_wrong_height_is_rejected() {
        let index = ChainIndex::new(alephium_types::GroupIndex::from_raw(0), alephium_types::GroupIndex::from_raw(0));
        let coinbase = coinbase_tx(index, 1, 2);
        let err = validate_coinbase(&coinbase, &Amount::from_u64(2), index, 2).unwrap_err();
        matches!(err, InvalidBlockError::InvalidCoinbase(_));
    }
}
