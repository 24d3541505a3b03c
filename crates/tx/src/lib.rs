// Path: crates/tx/src/lib.rs

//! Transaction validation: stateless checks against a transaction alone,
//! stateful checks against a resolved world-state snapshot, and witness
//! verification.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod stateful;
pub mod stateless;
pub mod witness;

pub use stateful::{validate_stateful, BlockEnv, ResolvedInputs};
pub use stateless::validate_stateless;
pub use witness::check_witnesses;
