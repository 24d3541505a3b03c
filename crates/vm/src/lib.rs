// Path: crates/vm/src/lib.rs

//! The stack-based contract virtual machine: runtime values, gas
//! accounting, the bytecode taxonomy, call frames, execution context, and
//! the `execute`/`checkTxScript` engine itself.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod context;
pub mod frame;
pub mod gas;
pub mod instr;
pub mod program;
pub mod value;
pub mod vm;

pub use context::{BlockEnv, OutputResolver, SignatureStack, StatefulContext, StatelessContext};
pub use frame::{BalanceState, Frame};
pub use gas::{GasClass, GasMeter, GAS_PER_BYTE};
pub use instr::{Instr, Method};
pub use program::{ContractCodeResolver, EmptyResolver, Program};
pub use value::Val;
pub use vm::{check_tx_script, run_stateful, run_stateless, ExecutionResult};
