// Path: crates/types/src/error.rs

//! The unified, three-tier error taxonomy used across the kernel.
//!
//! Every fallible operation returns one of these typed results rather than
//! panicking or using exceptional control flow. Panics are reserved for
//! violated internal invariants that should be unreachable and are
//! test-checked (see the teacher crate's `ErrorCode` convention, which this
//! mirrors).

use crate::hash::Hash;
use alephium_macros::ErrorCode;
use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error
/// variant, independent of the (possibly parameterized) `Display` message.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Tier 1: storage read/write failures. These bubble up to the caller, are
/// retried there, and must never corrupt in-memory state.
#[derive(Debug, Error, ErrorCode)]
pub enum IoError {
    /// The underlying key-value backend returned an error.
    #[error("storage backend error: {0}")]
    #[code("IO_BACKEND")]
    Backend(String),
    /// A column family or key was expected to exist but did not.
    #[error("missing storage entry: {0}")]
    #[code("IO_NOT_FOUND")]
    NotFound(String),
    /// A value failed to (de)serialize on its way to/from storage.
    #[error("storage codec error: {0}")]
    #[code("IO_CODEC")]
    Codec(String),
    /// A staged write could not be committed atomically.
    #[error("commit failed: {0}")]
    #[code("IO_COMMIT_FAILED")]
    CommitFailed(String),
}

/// The discriminated kinds of transaction-level consensus failure, carried
/// inside `InvalidBlockError::ExistInvalidTx`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxKind {
    /// The transaction declares no inputs.
    #[error("transaction has no inputs")]
    NoInputs,
    /// The transaction exceeds `MaxTxInputNum`.
    #[error("transaction has too many inputs")]
    TooManyInputs,
    /// The transaction declares no outputs.
    #[error("transaction has no outputs")]
    NoOutputs,
    /// The transaction exceeds `MaxTxOutputNum`.
    #[error("transaction has too many outputs")]
    TooManyOutputs,
    /// The same `TxOutputRef` is spent twice within one transaction.
    #[error("transaction double-spends one of its own inputs")]
    TxDoubleSpending,
    /// An input's resolved group does not match the declared `fromGroup`.
    #[error("invalid input group index")]
    InvalidInputGroupIndex,
    /// An output's group is inconsistent with the declared `ChainIndex`.
    #[error("invalid output group index")]
    InvalidOutputGroupIndex,
    /// A referenced input UTXO does not exist in the resolved state.
    #[error("input does not reference an existing output")]
    NonExistInput,
    /// The ALF balance equation does not hold.
    #[error("invalid ALF balance")]
    InvalidAlfBalance,
    /// A token's balance equation does not hold.
    #[error("invalid token balance")]
    InvalidTokenBalance,
    /// A sum of amounts overflowed its numeric range.
    #[error("balance overflow")]
    BalanceOverFlow,
    /// A P2PKH witness's public key does not hash to the locked hash.
    #[error("invalid public key hash")]
    InvalidPublicKeyHash,
    /// A P2SH witness's script does not hash to the locked hash.
    #[error("invalid script hash")]
    InvalidScriptHash,
    /// A signature failed cryptographic verification.
    #[error("invalid signature")]
    InvalidSignature,
    /// Fewer signatures were supplied than the lockup script requires.
    #[error("not enough signatures")]
    NotEnoughSignature,
    /// More signatures were supplied than were consumed.
    #[error("too many signatures")]
    TooManySignatures,
    /// The unlock script's variant does not match the lockup script's.
    #[error("unlock script type does not match lockup script")]
    InvalidUnlockScriptType,
    /// An input's pre-output is still time-locked.
    #[error("input is still time-locked")]
    TimeLockedTx,
    /// An output's `additionalData` exceeds `MaxOutputDataSize`.
    #[error("output data size exceeded")]
    OutputDataSizeExceeded,
    /// The declared `contractInputs` do not match script execution.
    #[error("invalid contract inputs")]
    InvalidContractInputs,
    /// The declared `generatedOutputs` do not match script execution.
    #[error("invalid generated outputs")]
    InvalidGeneratedOutputs,
    /// A tx script ran where none was expected (or vice versa).
    #[error("unexpected tx script")]
    UnexpectedTxScript,
    /// An output's amount is below `dustUtxoAmount`.
    #[error("output amount below dust threshold")]
    DustAmount,
    /// A token amount of zero was declared in an output.
    #[error("zero token amount")]
    ZeroTokenAmount,
    /// `gasAmount`/`gasPrice` fall outside their configured bounds.
    #[error("invalid gas bounds")]
    InvalidGasBounds,
}

/// Tier 2: consensus-level failures for an incoming block.
#[derive(Debug, Error, ErrorCode)]
pub enum InvalidBlockError {
    /// A dependency or output references a group outside `[0, G)`.
    #[error("invalid group")]
    #[code("BLOCK_INVALID_GROUP")]
    InvalidGroup,
    /// The header's timestamp violates the monotonicity rule.
    #[error("invalid timestamp: {0}")]
    #[code("BLOCK_INVALID_TIMESTAMP")]
    InvalidTimeStamp(String),
    /// `uint256(hash) > target`.
    #[error("invalid proof of work")]
    #[code("BLOCK_INVALID_WORK")]
    InvalidWorkAmount,
    /// The header's declared target is malformed or inconsistent.
    #[error("invalid target")]
    #[code("BLOCK_INVALID_TARGET")]
    InvalidTarget,
    /// One or more dependencies referenced by the header are unknown.
    #[error("missing dependencies")]
    #[code("BLOCK_MISSING_DEPS")]
    MissingDeps(Vec<Hash>),
    /// The block has no transactions at all (not even a coinbase).
    #[error("empty transaction list")]
    #[code("BLOCK_EMPTY_TX_LIST")]
    EmptyTransactionList,
    /// The coinbase transaction is malformed or pays the wrong reward.
    #[error("invalid coinbase: {0}")]
    #[code("BLOCK_INVALID_COINBASE")]
    InvalidCoinbase(String),
    /// `txsHash` does not match the hash of the transaction list.
    #[error("invalid merkle root")]
    #[code("BLOCK_INVALID_MERKLE_ROOT")]
    InvalidMerkleRoot,
    /// One of the block's non-coinbase transactions failed validation.
    #[error("invalid transaction: {0}")]
    #[code("BLOCK_INVALID_TX")]
    ExistInvalidTx(TxKind),
    /// The block's header shape does not match `blockDeps.length == 2G-1`
    /// or `outDeps[from] != parentHash`.
    #[error("malformed header: {0}")]
    #[code("BLOCK_MALFORMED_HEADER")]
    MalformedHeader(String),
    /// The merged flow tips including this block are conflicted.
    #[error("conflicting block")]
    #[code("BLOCK_CONFLICTING")]
    ConflictingBlock,
}

/// `InvalidTx` as its own top-level error, used by the stateless/stateful
/// transaction validation pipeline before a transaction is known to belong
/// to any particular block.
#[derive(Debug, Error)]
#[error("invalid transaction: {kind}")]
pub struct InvalidTxError {
    /// The specific validation failure.
    pub kind: TxKind,
}

impl InvalidTxError {
    /// Wraps a [`TxKind`] as an [`InvalidTxError`].
    pub fn new(kind: TxKind) -> Self {
        InvalidTxError { kind }
    }
}

/// Tier 3: VM execution failures (`ExeFailure`).
#[derive(Debug, Error, Clone, PartialEq, Eq, ErrorCode)]
pub enum ExeFailure {
    /// Gas reached zero mid-execution.
    #[error("out of gas")]
    #[code("VM_OUT_OF_GAS")]
    OutOfGas,
    /// A push exceeded the operand stack's configured capacity.
    #[error("stack overflow")]
    #[code("VM_STACK_OVERFLOW")]
    StackOverflow,
    /// A pop was attempted on an empty stack.
    #[error("stack underflow")]
    #[code("VM_STACK_UNDERFLOW")]
    StackUnderflow,
    /// A popped value's runtime variant did not match what the instruction
    /// required.
    #[error("invalid type on stack")]
    #[code("VM_INVALID_TYPE")]
    InvalidType,
    /// `LoadLocal`/`StoreLocal` referenced an out-of-range index.
    #[error("invalid local index")]
    #[code("VM_INVALID_LOCAL_INDEX")]
    InvalidLocalIndex,
    /// `LoadField`/`StoreField` referenced an out-of-range index.
    #[error("invalid field index")]
    #[code("VM_INVALID_FIELD_INDEX")]
    InvalidFieldIndex,
    /// `CallLocal`/`CallExternal` referenced an out-of-range method index.
    #[error("invalid method index")]
    #[code("VM_INVALID_METHOD_INDEX")]
    InvalidMethodIndex,
    /// `CallExternal` targeted a non-public method.
    #[error("private method called externally")]
    #[code("VM_PRIVATE_EXTERNAL_CALL")]
    PrivateExternalMethodCall,
    /// An `Assert` instruction's condition was false.
    #[error("assertion failed")]
    #[code("VM_ASSERTION_FAILED")]
    AssertionFailed,
    /// A transfer exceeded available approved/remaining balance.
    #[error("not enough balance")]
    #[code("VM_NOT_ENOUGH_BALANCE")]
    NotEnoughBalance,
    /// A balance computation overflowed.
    #[error("balance overflow")]
    #[code("VM_BALANCE_OVERFLOW")]
    BalanceOverflow,
    /// A token id referenced in an asset instruction is unknown.
    #[error("invalid token id")]
    #[code("VM_INVALID_TOKEN_ID")]
    InvalidTokenId,
    /// A public key failed to parse.
    #[error("invalid public key")]
    #[code("VM_INVALID_PUBLIC_KEY")]
    InvalidPublicKey,
    /// An asset instruction ran in a frame with no `BalanceState`.
    #[error("non-payable frame")]
    #[code("VM_NON_PAYABLE_FRAME")]
    NonPayableFrame,
    /// `DestroySelf` was not invoked from a tx script context.
    #[error("contract destruction must be called from a tx script")]
    #[code("VM_DESTROY_NOT_FROM_TX")]
    ContractDestructionShouldBeCalledFromTx,
    /// An asset instruction targeted a contract whose assets were not
    /// loaded into the current frame.
    #[error("contract asset not loaded")]
    #[code("VM_CONTRACT_ASSET_UNLOADED")]
    ContractAssetUnloaded,
    /// A lock-time computation overflowed.
    #[error("lock time overflow")]
    #[code("VM_LOCK_TIME_OVERFLOW")]
    LockTimeOverflow,
    /// More signatures remained on the stack than were consumed.
    #[error("too many signatures")]
    #[code("VM_TOO_MANY_SIGNATURES")]
    TooManySignatures,
    /// Fewer signatures were available than required.
    #[error("not enough signatures")]
    #[code("VM_NOT_ENOUGH_SIGNATURE")]
    NotEnoughSignature,
}

/// A top-level error that wraps every tier, used at boundaries (e.g. the
/// orchestrator) that must report exactly one outcome per operation.
#[derive(Debug, Error)]
pub enum KernelError {
    /// A storage failure.
    #[error(transparent)]
    Io(#[from] IoError),
    /// A block-level consensus failure.
    #[error(transparent)]
    Block(#[from] InvalidBlockError),
    /// A transaction-level consensus failure.
    #[error(transparent)]
    Tx(#[from] InvalidTxError),
    /// A VM execution failure.
    #[error(transparent)]
    Exe(#[from] ExeFailure),
}

impl ErrorCode for KernelError {
    fn code(&self) -> &'static str {
        match self {
            KernelError::Io(e) => e.code(),
            KernelError::Block(e) => e.code(),
            KernelError::Tx(_) => "TX_INVALID",
            KernelError::Exe(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable_strings() {
        assert_eq!(InvalidBlockError::InvalidGroup.code(), "BLOCK_INVALID_GROUP");
        assert_eq!(TxKind::NoInputs.to_string(), "transaction has no inputs");
        assert_eq!(ExeFailure::OutOfGas.code(), "VM_OUT_OF_GAS");
    }

    #[test]
    fn kernel_error_from_conversions() {
        let e: KernelError = ExeFailure::OutOfGas.into();
        assert_eq!(e.code(), "VM_OUT_OF_GAS");
    }
}
