// Path: crates/node/src/script.rs

//! A concrete [`ScriptDecoder`]: on-chain bytecode encoding is out of
//! scope (`alephium_vm::instr::Method` carries no `Encode`/`Decode`
//! derive), so the only honest adapter this binary can supply is one that
//! never decodes a script. Transactions carrying a script are rejected by
//! validation the same way a malformed one would be, rather than this
//! node silently pretending to execute unknown bytecode.

use alephium_flow::validation::ScriptDecoder;
use alephium_vm::Program;

/// Never decodes a script; `decode` always answers `None`.
#[derive(Default)]
pub struct NullScriptDecoder;

impl ScriptDecoder for NullScriptDecoder {
    fn decode(&self, _bytes: &[u8]) -> Option<Program> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_decodes() {
        let decoder = NullScriptDecoder;
        assert!(decoder.decode(&[1, 2, 3]).is_none());
    }
}
