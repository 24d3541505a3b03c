// Path: crates/tx/src/stateless.rs

//! Stateless transaction validation (spec §4.5): every check here needs
//! only the transaction itself and the kernel's `VmConfig`, no world-state
//! or chain lookups, except the output-group consistency check which also
//! needs the `ChainIndex` the transaction is being validated against.

use alephium_types::config::VmConfig;
use alephium_types::error::{InvalidTxError, TxKind};
use alephium_types::group::ChainIndex;
use alephium_types::output::{max_alf_value, Amount, TxOutput};
use alephium_types::transaction::Transaction;
use std::collections::HashSet;

/// Runs every stateless check against `tx`, returning the first violation
/// found. Checks run roughly in the order spec §4.5 lists them.
pub fn validate_stateless(
    tx: &Transaction,
    chain_index: ChainIndex,
    num_groups: u16,
    config: &VmConfig,
) -> Result<(), InvalidTxError> {
    let unsigned = &tx.unsigned;

    if unsigned.inputs.is_empty() {
        return Err(InvalidTxError::new(TxKind::NoInputs));
    }
    if unsigned.inputs.len() > config.max_tx_input_num {
        return Err(InvalidTxError::new(TxKind::TooManyInputs));
    }
    if unsigned.fixed_outputs.is_empty() {
        return Err(InvalidTxError::new(TxKind::NoOutputs));
    }
    if unsigned.fixed_outputs.len() > config.max_tx_output_num {
        return Err(InvalidTxError::new(TxKind::TooManyOutputs));
    }

    if unsigned.gas_amount < config.minimal_gas || unsigned.gas_amount > config.max_gas_per_tx {
        return Err(InvalidTxError::new(TxKind::InvalidGasBounds));
    }
    if unsigned.gas_price.is_zero() || unsigned.gas_price >= max_alf_value() {
        return Err(InvalidTxError::new(TxKind::InvalidGasBounds));
    }

    for output in &unsigned.fixed_outputs {
        if *output.amount() < config.dust_utxo_amount {
            return Err(InvalidTxError::new(TxKind::DustAmount));
        }
        for (_, amount) in output.tokens() {
            if amount.is_zero() {
                return Err(InvalidTxError::new(TxKind::ZeroTokenAmount));
            }
        }
        if let TxOutput::Asset(asset) = output {
            if asset.additional_data.len() > config.max_output_data_size {
                return Err(InvalidTxError::new(TxKind::OutputDataSizeExceeded));
            }
        }
    }

    let mut seen_refs = HashSet::new();
    for spent in tx.spent_refs() {
        if !seen_refs.insert(spent) {
            return Err(InvalidTxError::new(TxKind::TxDoubleSpending));
        }
    }

    check_output_group_consistency(tx, chain_index, num_groups)?;

    let mut alf_out = Amount::zero();
    for output in &unsigned.fixed_outputs {
        alf_out = alf_out
            .checked_add(output.amount())
            .ok_or_else(|| InvalidTxError::new(TxKind::BalanceOverFlow))?;
    }
    for output in &tx.generated_outputs {
        alf_out = alf_out
            .checked_add(output.amount())
            .ok_or_else(|| InvalidTxError::new(TxKind::BalanceOverFlow))?;
    }

    Ok(())
}

/// For an intra-group chain (`from == to`) nothing further is required: any
/// output group is consistent by definition once the input group check
/// (stateful, once pre-outputs are resolved) passes. For an inter-group
/// chain, at least one fixed output must target `to`, and generated
/// outputs (which only exist after script execution) are forbidden
/// entirely — an inter-group transaction cannot run a script.
fn check_output_group_consistency(
    tx: &Transaction,
    chain_index: ChainIndex,
    num_groups: u16,
) -> Result<(), InvalidTxError> {
    if chain_index.is_intra_group() {
        return Ok(());
    }
    if !tx.generated_outputs.is_empty() || tx.unsigned.script.is_some() {
        return Err(InvalidTxError::new(TxKind::InvalidOutputGroupIndex));
    }
    let to = chain_index.to.value();
    let targets_to_group = tx
        .unsigned
        .fixed_outputs
        .iter()
        .any(|o| o.lockup_script().group_index(num_groups) == to);
    if !targets_to_group {
        return Err(InvalidTxError::new(TxKind::InvalidOutputGroupIndex));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_types::group::GroupIndex;
    use alephium_types::hash::{Hash, TxId};
    use alephium_types::output::{AssetOutput, LockupScript, TxOutputRef, UnlockScript};
    use alephium_types::transaction::{TxInput, UnsignedTransaction};

    fn sample_config() -> VmConfig {
        VmConfig::default()
    }

    fn intra_group() -> ChainIndex {
        ChainIndex::new(GroupIndex::from_raw(0), GroupIndex::from_raw(0))
    }

    fn sample_output(amount: u64) -> TxOutput {
        TxOutput::Asset(AssetOutput {
            amount: Amount::from_u64(amount),
            lockup_script: LockupScript::P2PKH(Hash::hash(b"pk")),
            tokens: vec![],
            lock_time: 0,
            additional_data: vec![],
        })
    }

    fn sample_tx(amount: u64) -> Transaction {
        let tx_id = TxId::from(Hash::hash(b"prev"));
        let input = TxInput {
            output_ref: TxOutputRef::asset(0, TxOutputRef::key_for(tx_id, 0)),
            unlock_script: UnlockScript::P2PKH(vec![1, 2, 3]),
        };
        Transaction {
            unsigned: UnsignedTransaction {
                inputs: vec![input],
                fixed_outputs: vec![sample_output(amount)],
                gas_amount: 20_000,
                gas_price: Amount::from_u64(100),
                script: None,
            },
            contract_inputs: vec![],
            generated_outputs: vec![],
            input_signatures: vec![],
            contract_signatures: vec![],
        }
    }

    #[test]
    fn well_formed_tx_passes() {
        let tx = sample_tx(2_000_000_000);
        assert!(validate_stateless(&tx, intra_group(), 4, &sample_config()).is_ok());
    }

    #[test]
    fn dust_output_is_rejected() {
        let tx = sample_tx(1);
        let err = validate_stateless(&tx, intra_group(), 4, &sample_config()).unwrap_err();
        assert_eq!(err.kind, TxKind::DustAmount);
    }

    #[test]
    fn no_inputs_is_rejected() {
        let mut tx = sample_tx(2_000_000_000);
        tx.unsigned.inputs.clear();
        let err = validate_stateless(&tx, intra_group(), 4, &sample_config()).unwrap_err();
        assert_eq!(err.kind, TxKind::NoInputs);
    }

    #[test]
    fn duplicate_input_is_rejected() {
        let mut tx = sample_tx(2_000_000_000);
        let dup = tx.unsigned.inputs[0].clone();
        tx.unsigned.inputs.push(dup);
        let err = validate_stateless(&tx, intra_group(), 4, &sample_config()).unwrap_err();
        assert_eq!(err.kind, TxKind::TxDoubleSpending);
    }

    #[test]
    fn gas_amount_out_of_bounds_is_rejected() {
        let mut tx = sample_tx(2_000_000_000);
        tx.unsigned.gas_amount = 1;
        let err = validate_stateless(&tx, intra_group(), 4, &sample_config()).unwrap_err();
        assert_eq!(err.kind, TxKind::InvalidGasBounds);
    }

    #[test]
    fn inter_group_tx_without_matching_output_is_rejected() {
        let tx = sample_tx(2_000_000_000);
        let other_group = GroupIndex::from_raw((tx.unsigned.fixed_outputs[0].lockup_script().group_index(4) + 1) % 4);
        let chain_index = ChainIndex::new(GroupIndex::from_raw(0), other_group);
        let err = validate_stateless(&tx, chain_index, 4, &sample_config()).unwrap_err();
        assert_eq!(err.kind, TxKind::InvalidOutputGroupIndex);
    }

    #[test]
    fn inter_group_tx_with_script_is_rejected() {
        let mut tx = sample_tx(2_000_000_000);
        tx.unsigned.script = Some(vec![0x01]);
        let to = tx.unsigned.fixed_outputs[0].lockup_script().group_index(4);
        let other_group = GroupIndex::from_raw((to + 1) % 4);
        let chain_index = ChainIndex::new(GroupIndex::from_raw(0), other_group);
        let err = validate_stateless(&tx, chain_index, 4, &sample_config()).unwrap_err();
        assert_eq!(err.kind, TxKind::InvalidOutputGroupIndex);
    }
}
