// Path: crates/tx/src/stateful.rs

//! Stateful transaction validation (spec §4.5): balance equations,
//! lock-time, and witness checks against a resolved set of pre-outputs.
//!
//! Resolving a `TxOutputRef` to its `TxOutput` is a world-state concern
//! (`alephium-flow`'s per-chain store plus `alephium-state`'s trie), so
//! this crate only asks for the already-resolved outputs rather than
//! depending on either of those crates.

use crate::witness::check_witnesses;
use alephium_types::error::{InvalidTxError, TxKind};
use alephium_types::output::{Amount, TxOutput};
use alephium_types::transaction::Transaction;
use std::collections::HashMap;

/// The subset of a block's declared environment that stateful validation
/// needs: the timestamp used for lock-time checks.
#[derive(Clone, Copy, Debug)]
pub struct BlockEnv {
    /// The block's timestamp, in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// The result of resolving every one of `tx`'s declared inputs against a
/// world-state snapshot.
pub struct ResolvedInputs {
    /// One entry per `unsigned.inputs[i]`, in order.
    pub pre_outputs: Vec<TxOutput>,
}

/// Runs every stateful check: balance equations, lock-time, and witnesses.
/// `coinbase_reward` is `Some(reward)` only when validating the block's
/// coinbase transaction. `gas_used` is `gasAmount − gasRemaining` after the
/// tx's script (if any) has run — the fee owed is `gasUsed × gasPrice`, not
/// the declared `gasAmount`; callers with no script to run pass the full
/// declared `gas_amount` since nothing ran to leave gas unspent.
pub fn validate_stateful(
    tx: &Transaction,
    resolved: &ResolvedInputs,
    block_env: &BlockEnv,
    coinbase_reward: Option<&Amount>,
    gas_used: u64,
) -> Result<(), InvalidTxError> {
    if resolved.pre_outputs.len() != tx.unsigned.inputs.len() {
        return Err(InvalidTxError::new(TxKind::NonExistInput));
    }

    for pre_output in &resolved.pre_outputs {
        if let TxOutput::Asset(asset) = pre_output {
            if asset.lock_time > block_env.timestamp {
                return Err(InvalidTxError::new(TxKind::TimeLockedTx));
            }
        }
    }

    check_alf_balance(tx, &resolved.pre_outputs, coinbase_reward, gas_used)?;
    check_token_balance(tx, &resolved.pre_outputs)?;

    let lockup_scripts: Vec<_> = resolved
        .pre_outputs
        .iter()
        .map(|o| o.lockup_script().clone())
        .collect();
    check_witnesses(tx, &lockup_scripts)?;

    Ok(())
}

fn gas_fee(gas_used: u64, gas_price: &Amount) -> Result<Amount, InvalidTxError> {
    let gas_used = Amount::from_u64(gas_used);
    amount_checked_mul(&gas_used, gas_price).ok_or_else(|| InvalidTxError::new(TxKind::BalanceOverFlow))
}

fn amount_checked_mul(a: &Amount, b: &Amount) -> Option<Amount> {
    let product = &a.0 * &b.0;
    if product.bits() > 256 {
        None
    } else {
        Some(Amount(product))
    }
}

fn check_alf_balance(
    tx: &Transaction,
    pre_outputs: &[TxOutput],
    coinbase_reward: Option<&Amount>,
    gas_used: u64,
) -> Result<(), InvalidTxError> {
    let mut total_in = Amount::zero();
    for pre_output in pre_outputs {
        total_in = total_in
            .checked_add(pre_output.amount())
            .ok_or_else(|| InvalidTxError::new(TxKind::BalanceOverFlow))?;
    }
    if let Some(reward) = coinbase_reward {
        total_in = total_in
            .checked_add(reward)
            .ok_or_else(|| InvalidTxError::new(TxKind::BalanceOverFlow))?;
    }

    let mut total_out = Amount::zero();
    for output in tx.unsigned.fixed_outputs.iter().chain(tx.generated_outputs.iter()) {
        total_out = total_out
            .checked_add(output.amount())
            .ok_or_else(|| InvalidTxError::new(TxKind::BalanceOverFlow))?;
    }

    let fee = if coinbase_reward.is_some() {
        Amount::zero()
    } else {
        gas_fee(gas_used, &tx.unsigned.gas_price)?
    };
    total_out = total_out
        .checked_add(&fee)
        .ok_or_else(|| InvalidTxError::new(TxKind::BalanceOverFlow))?;

    if total_in != total_out {
        return Err(InvalidTxError::new(TxKind::InvalidAlfBalance));
    }
    Ok(())
}

fn check_token_balance(tx: &Transaction, pre_outputs: &[TxOutput]) -> Result<(), InvalidTxError> {
    let mut in_totals: HashMap<_, Amount> = HashMap::new();
    for pre_output in pre_outputs {
        for (id, amount) in pre_output.tokens() {
            let entry = in_totals.entry(*id).or_insert_with(Amount::zero);
            *entry = entry
                .checked_add(amount)
                .ok_or_else(|| InvalidTxError::new(TxKind::BalanceOverFlow))?;
        }
    }

    let mut out_totals: HashMap<_, Amount> = HashMap::new();
    for output in tx.unsigned.fixed_outputs.iter().chain(tx.generated_outputs.iter()) {
        for (id, amount) in output.tokens() {
            let entry = out_totals.entry(*id).or_insert_with(Amount::zero);
            *entry = entry
                .checked_add(amount)
                .ok_or_else(|| InvalidTxError::new(TxKind::BalanceOverFlow))?;
        }
    }

    // A payable script may issue a brand-new token whose id equals this
    // transaction's own id; such a token has no corresponding input total
    // and is exempt from the equality check below.
    let issued_token_id = tx.unsigned.script.as_ref().map(|_| tx.id());

    for (id, out_amount) in &out_totals {
        let is_issued = issued_token_id
            .as_ref()
            .map(|tid| tid.as_bytes() == id.0.as_bytes())
            .unwrap_or(false);
        match in_totals.get(id) {
            Some(in_amount) if in_amount == out_amount => {}
            None if is_issued => {}
            _ => return Err(InvalidTxError::new(TxKind::InvalidTokenBalance)),
        }
    }
    for (id, in_amount) in &in_totals {
        if !out_totals.contains_key(id) && !in_amount.is_zero() {
            return Err(InvalidTxError::new(TxKind::InvalidTokenBalance));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_types::hash::{Hash, TxId};
    use alephium_types::output::{AssetOutput, LockupScript, TxOutputRef, UnlockScript};
    use alephium_types::transaction::{TxInput, UnsignedTransaction};

    fn asset_output(amount: u64, lock_time: u64) -> TxOutput {
        TxOutput::Asset(AssetOutput {
            amount: Amount::from_u64(amount),
            lockup_script: LockupScript::P2PKH(Hash::hash(b"dest")),
            tokens: vec![],
            lock_time,
            additional_data: vec![],
        })
    }

    fn sample_tx(gas_amount: u64, gas_price: u64, out_amount: u64) -> Transaction {
        let tx_id = TxId::from(Hash::hash(b"prev"));
        let input = TxInput {
            output_ref: TxOutputRef::asset(0, TxOutputRef::key_for(tx_id, 0)),
            unlock_script: UnlockScript::P2PKH(vec![1, 2, 3]),
        };
        Transaction {
            unsigned: UnsignedTransaction {
                inputs: vec![input],
                fixed_outputs: vec![asset_output(out_amount, 0)],
                gas_amount,
                gas_price: Amount::from_u64(gas_price),
                script: None,
            },
            contract_inputs: vec![],
            generated_outputs: vec![],
            input_signatures: vec![],
            contract_signatures: vec![],
        }
    }

    #[test]
    fn balanced_tx_passes_alf_check() {
        let tx = sample_tx(20_000, 100, 2_000_000_000);
        let fee = 20_000u64 * 100;
        let pre_output = asset_output(2_000_000_000 + fee, 0);
        let err = check_alf_balance(&tx, &[pre_output], None, 20_000);
        assert!(err.is_ok());
    }

    #[test]
    fn leftover_gas_lowers_the_owed_fee() {
        let tx = sample_tx(20_000, 100, 2_000_000_000);
        let fee = 12_000u64 * 100;
        let pre_output = asset_output(2_000_000_000 + fee, 0);
        let err = check_alf_balance(&tx, &[pre_output], None, 12_000);
        assert!(err.is_ok());
    }

    #[test]
    fn unbalanced_tx_fails_alf_check() {
        let tx = sample_tx(20_000, 100, 2_000_000_000);
        let pre_output = asset_output(2_000_000_000, 0);
        let err = check_alf_balance(&tx, &[pre_output], None, 20_000).unwrap_err();
        assert_eq!(err.kind, TxKind::InvalidAlfBalance);
    }

    #[test]
    fn time_locked_pre_output_is_rejected() {
        let tx = sample_tx(20_000, 100, 2_000_000_000);
        let pre_output = asset_output(2_002_000_000, 9_999_999_999);
        let resolved = ResolvedInputs { pre_outputs: vec![pre_output] };
        let env = BlockEnv { timestamp: 1000 };
        let err = validate_stateful(&tx, &resolved, &env, None, 20_000).unwrap_err();
        assert_eq!(err.kind, TxKind::TimeLockedTx);
    }
}
