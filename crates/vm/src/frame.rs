// Path: crates/vm/src/frame.rs

//! `Frame`: one method activation. The operand stack is shared across the
//! whole call chain (each frame owns a disciplined prefix of it, tracked by
//! `stack_base`), while locals are private per frame.

use crate::value::Val;
use alephium_types::hash::Hash;
use alephium_types::output::{Amount, Token};
use std::collections::HashMap;

/// The asset balance a payable frame threads through its execution:
/// pre-approved inputs minus what has already been spent, plus anything
/// transferred back in.
#[derive(Clone, Debug, Default)]
pub struct BalanceState {
    /// Remaining approved ALF, keyed by the approving address's lockup-script
    /// hash.
    pub alf_approved: HashMap<Hash, Amount>,
    /// Remaining approved tokens, keyed by `(address hash, tokenId)`.
    pub token_approved: HashMap<(Hash, alephium_types::output::TokenId), Amount>,
}

impl BalanceState {
    /// An empty balance state (no assets approved).
    pub fn empty() -> Self {
        BalanceState::default()
    }

    /// Approves `amount` of ALF from `address`.
    pub fn approve_alf(&mut self, address: Hash, amount: Amount) {
        let entry = self.alf_approved.entry(address).or_insert_with(Amount::zero);
        if let Some(sum) = entry.checked_add(&amount) {
            *entry = sum;
        }
    }

    /// Approves `amount` of `token` from `address`.
    pub fn approve_token(&mut self, address: Hash, token: Token) {
        let (id, amount) = token;
        let entry = self
            .token_approved
            .entry((address, id))
            .or_insert_with(Amount::zero);
        if let Some(sum) = entry.checked_add(&amount) {
            *entry = sum;
        }
    }

    /// `true` iff nothing remains approved (safe to discard at frame exit).
    pub fn is_flushed(&self) -> bool {
        self.alf_approved.values().all(Amount::is_zero)
            && self.token_approved.values().all(Amount::is_zero)
    }
}

/// A single call frame on the VM's call stack.
#[derive(Clone, Debug)]
pub struct Frame {
    /// The program counter: an index into `method.instrs`.
    pub pc: usize,
    /// The index of the method this frame is executing, within its owning
    /// contract/script's method table.
    pub method_index: u8,
    /// The frame's private local-variable slots.
    pub locals: Vec<Val>,
    /// The asset balance available to this frame, `None` for a non-payable
    /// method.
    pub balance_state: Option<BalanceState>,
    /// The height of the shared operand stack when this frame was entered;
    /// this frame may only pop down to (never below) this height.
    pub stack_base: usize,
    /// The contract id this frame belongs to, or `None` for a bare tx
    /// script with no persisted identity.
    pub contract_id: Option<Hash>,
    /// `true` iff this frame was pushed directly by the top-level tx
    /// script (as opposed to a nested `CallExternal`).
    pub called_from_tx_script: bool,
}

impl Frame {
    /// Builds a fresh frame with `locals_length` zero-initialized locals
    /// (arguments are then written in over the first `arg_count` slots by
    /// the caller).
    pub fn new(
        method_index: u8,
        locals_length: u8,
        balance_state: Option<BalanceState>,
        stack_base: usize,
        contract_id: Option<Hash>,
        called_from_tx_script: bool,
    ) -> Self {
        Frame {
            pc: 0,
            method_index,
            locals: vec![Val::Bool(false); locals_length as usize],
            balance_state,
            stack_base,
            contract_id,
            called_from_tx_script,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_state_tracks_approvals() {
        let mut bs = BalanceState::empty();
        assert!(bs.is_flushed());
        bs.approve_alf(Hash::hash(b"addr"), Amount::from_u64(10));
        assert!(!bs.is_flushed());
    }

    #[test]
    fn frame_locals_are_zero_initialized() {
        let frame = Frame::new(0, 3, None, 0, None, true);
        assert_eq!(frame.locals.len(), 3);
    }
}
