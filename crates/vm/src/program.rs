// Path: crates/vm/src/program.rs

//! `Program`: a contract or tx script's compiled method table, and the
//! seam through which the VM resolves another contract's code for
//! `CallExternal`/`CopyCreateContract`.

use crate::instr::Method;
use alephium_state::ContractId;
use std::sync::Arc;

/// A deployed contract's or tx script's compiled methods.
#[derive(Clone, Debug)]
pub struct Program {
    /// The method table, indexed by `CallLocal`/`CallExternal`'s operand.
    pub methods: Arc<Vec<Method>>,
}

impl Program {
    /// Wraps a method table.
    pub fn new(methods: Vec<Method>) -> Self {
        Program {
            methods: Arc::new(methods),
        }
    }

    /// Looks up a method by index.
    pub fn method(&self, index: u8) -> Option<&Method> {
        self.methods.get(index as usize)
    }
}

/// Resolves a loaded contract's compiled code for `CallExternal`, keyed by
/// its `contractId`. Implemented by whatever maintains the mapping from
/// `codeHash` to decoded bytecode (out of scope for this crate — it only
/// consumes the seam).
pub trait ContractCodeResolver {
    /// Returns the compiled program for `contract_id`, or `None` if the
    /// contract is unknown.
    fn resolve(&self, contract_id: &ContractId) -> Option<Program>;
}

/// A resolver with no contracts, used by stateless execution and tests
/// that never issue `CallExternal`.
pub struct EmptyResolver;

impl ContractCodeResolver for EmptyResolver {
    fn resolve(&self, _contract_id: &ContractId) -> Option<Program> {
        None
    }
}
