// Path: crates/vm/src/instr.rs

//! The bytecode taxonomy (spec §4.4 "Bytecode taxonomy") and `Method`, the
//! unit of compiled contract/script code an `Instr` sequence belongs to.

/// A single VM instruction. Operands are resolved at decode time; `Jump`
/// deltas are already relative offsets into the enclosing method's `instrs`.
#[derive(Clone, PartialEq, Debug)]
pub enum Instr {
    // --- Constants ---
    /// Pushes `true`.
    ConstTrue,
    /// Pushes `false`.
    ConstFalse,
    /// Pushes a small signed integer literal inline (`I256` shortcut).
    I256Const(i64),
    /// Pushes a small unsigned integer literal inline (`U256` shortcut).
    U256Const(u64),
    /// Pushes an arbitrary-width `I256` constant.
    I256ConstBig(num_bigint::BigInt),
    /// Pushes an arbitrary-width `U256` constant.
    U256ConstBig(num_bigint::BigUint),
    /// Pushes a `ByteVec` constant.
    BytesConst(Vec<u8>),
    /// Pushes an `Address` constant.
    AddressConst(alephium_types::output::LockupScript),

    // --- Locals / fields ---
    /// Pushes `locals[i]`.
    LoadLocal(u8),
    /// Pops the top value into `locals[i]`.
    StoreLocal(u8),
    /// Pushes `fields[i]` (stateful context only).
    LoadField(u8),
    /// Pops the top value into `fields[i]` (stateful context only).
    StoreField(u8),

    // --- Arithmetic (pop two, push one) ---
    /// Checked `I256` addition.
    I256Add,
    /// Checked `I256` subtraction.
    I256Sub,
    /// Checked `I256` multiplication.
    I256Mul,
    /// Checked `I256` division.
    I256Div,
    /// Checked `I256` modulo.
    I256Mod,
    /// Checked `U256` addition.
    U256Add,
    /// Checked `U256` subtraction.
    U256Sub,
    /// Checked `U256` multiplication.
    U256Mul,
    /// Checked `U256` division.
    U256Div,
    /// Checked `U256` modulo.
    U256Mod,
    /// `U256` modular exponentiation-free bitwise AND.
    U256BitAnd,
    /// `U256` bitwise OR.
    U256BitOr,
    /// `U256` bitwise XOR.
    U256Xor,
    /// `U256` left shift.
    U256Shl,
    /// `U256` right shift.
    U256Shr,

    // --- Comparison / conversion ---
    /// Pops two, pushes `Bool` equality.
    Eq,
    /// Pops two, pushes `Bool` inequality.
    Neq,
    /// Pops two `U256`s, pushes `a < b`.
    U256Lt,
    /// Pops two `U256`s, pushes `a <= b`.
    U256Le,
    /// Pops two `U256`s, pushes `a > b`.
    U256Gt,
    /// Pops two `U256`s, pushes `a >= b`.
    U256Ge,
    /// Range-checked `I256 -> U256`.
    I256ToU256,
    /// Range-checked `U256 -> I256`.
    U256ToI256,
    /// `Bool -> ByteVec`.
    BoolToByteVec,
    /// `I256 -> ByteVec`.
    I256ToByteVec,
    /// `U256 -> ByteVec`.
    U256ToByteVec,

    // --- Control ---
    /// Unconditional relative jump.
    Jump(i32),
    /// Pops `Bool`; jumps if true.
    IfTrue(i32),
    /// Pops `Bool`; jumps if false.
    IfFalse(i32),
    /// Calls a method of the same contract/script by index.
    CallLocal(u8),
    /// Calls a method of another loaded contract by index.
    CallExternal(u8),
    /// Returns from the current frame.
    Return,
    /// Pops `Bool`; fails with `AssertionFailed` if false.
    Assert,

    // --- Crypto ---
    /// Pops `ByteVec`, pushes `Blake2b` digest as `ByteVec`.
    Blake2b,
    /// Pops `ByteVec`, pushes `Keccak256` digest as `ByteVec`.
    Keccak256,
    /// Pops `ByteVec`, pushes `Sha256` digest as `ByteVec`.
    Sha256,
    /// Pops `ByteVec`, pushes `Sha3` digest as `ByteVec`.
    Sha3,
    /// Pops a public key, consumes one signature from the signatures stack,
    /// verifies it against `txId`.
    VerifyTxSignature,
    /// Pops signature, public key, and 32-byte data; verifies a secp256k1
    /// signature.
    VerifySecP256K1,
    /// Pops signature, public key, and 32-byte data; verifies an Ed25519
    /// signature.
    VerifyED25519,

    // --- Env ---
    /// Pushes the network/chain id as `ByteVec`.
    ChainId,
    /// Pushes the block timestamp as `U256`.
    BlockTimeStamp,
    /// Pushes the block target as `U256`.
    BlockTarget,
    /// Pushes the current `txId` as `ByteVec`.
    TxId,
    /// Pushes the calling address.
    TxCaller,
    /// Pushes the number of addresses in the caller chain.
    TxCallerSize,
    /// Pops a `U256` lock time, asserts `blockTimeStamp >= lockTime`.
    VerifyAbsoluteLocktime,
    /// Pops a `U256` relative lock time against the spent input's block
    /// height; asserts it has elapsed.
    VerifyRelativeLocktime,

    // --- Assets ---
    /// Pops address and amount; approves ALF from that address's
    /// pre-approved inputs for this frame.
    ApproveAlf,
    /// Pops address, token id, and amount; approves a token similarly.
    ApproveToken,
    /// Pops address, pushes its remaining approved ALF.
    AlfRemaining,
    /// Pops address and token id, pushes its remaining approved token
    /// amount.
    TokenRemaining,
    /// Pushes whether the current frame has a `BalanceState` at all.
    IsPaying,
    /// Pops destination address and amount; transfers ALF from the current
    /// contract's own balance.
    TransferAlfFromSelf,
    /// Pops destination address and amount; transfers ALF into the current
    /// contract's own balance.
    TransferAlfToSelf,
    /// Pops destination address, token id, and amount; transfers token from
    /// self.
    TransferTokenFromSelf,
    /// Pops destination address, token id, and amount; transfers token to
    /// self.
    TransferTokenToSelf,

    // --- Contract lifecycle ---
    /// Pops fields vector and code bytes; allocates a deterministic
    /// `contractId` and records the initial state hash.
    CreateContract,
    /// Like `CreateContract`, but copies code from an existing contract by
    /// id instead of inline bytes.
    CopyCreateContract,
    /// Pops a destination address; moves the contract's remaining balance
    /// there and removes it from world-state. Must be called from a tx
    /// script.
    DestroySelf,
    /// Pushes the current contract/script's own address.
    SelfAddress,
    /// Pushes the current contract's id.
    SelfContractId,
    /// Pops amount, issues a new token whose id equals this tx's id.
    IssueToken,
    /// Pushes the address that invoked the current frame.
    CallerAddress,
    /// Pushes whether the current frame was invoked directly from a tx
    /// script.
    IsCalledFromTxScript,
    /// Pushes the caller's initial state hash.
    CallerInitialStateHash,
    /// Pushes the current contract's initial state hash.
    ContractInitialStateHash,

    // --- Logging ---
    /// Pops 1 value and forwards it to the event sink.
    Log1,
    /// Pops 2 values and forwards them to the event sink.
    Log2,
    /// Pops 3 values and forwards them to the event sink.
    Log3,
    /// Pops 4 values and forwards them to the event sink.
    Log4,
    /// Pops 5 values and forwards them to the event sink.
    Log5,
}

/// A compiled method: its calling convention plus its instruction sequence.
#[derive(Clone, PartialEq, Debug)]
pub struct Method {
    /// `true` iff externally callable via `CallExternal`.
    pub is_public: bool,
    /// `true` iff this method's frame may carry a `BalanceState`.
    pub uses_assets: bool,
    /// `true` iff the caller must pre-approve assets before invocation.
    pub use_preapproved_assets: bool,
    /// The number of arguments popped from the caller's stack into
    /// `locals[0..args_type.len()]`.
    pub args_type: Vec<()>,
    /// The total number of local slots (arguments plus declared locals).
    pub locals_length: u8,
    /// The number of values this method pushes onto the caller's stack on
    /// `Return`.
    pub return_type: Vec<()>,
    /// The instruction sequence.
    pub instrs: Vec<Instr>,
}

impl Method {
    /// Builds a method from its bytecode, inferring a permissive default
    /// calling convention; callers that need a stricter one construct the
    /// struct directly.
    pub fn new(instrs: Vec<Instr>) -> Self {
        Method {
            is_public: true,
            uses_assets: false,
            use_preapproved_assets: false,
            args_type: vec![],
            locals_length: 0,
            return_type: vec![],
            instrs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_new_is_public_by_default() {
        let m = Method::new(vec![Instr::Return]);
        assert!(m.is_public);
        assert_eq!(m.instrs.len(), 1);
    }
}
