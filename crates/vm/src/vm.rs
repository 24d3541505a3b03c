// Path: crates/vm/src/vm.rs

//! The execution engine: the frame push/pop loop over `Instr`, and
//! `checkTxScript`'s replay-and-compare discipline.

use crate::context::{StatefulContext, StatelessContext};
use crate::frame::{BalanceState, Frame};
use crate::gas::GasClass;
use crate::instr::{Instr, Method};
use crate::program::{ContractCodeResolver, Program};
use crate::value::Val;
use alephium_crypto::hash as crypto_hash;
use alephium_crypto::sign::{eddsa, secp256k1};
use alephium_state::{ContractId, ContractState};
use alephium_types::error::ExeFailure;
use alephium_types::hash::Hash;
use alephium_types::output::{Amount, LockupScript, TokenId, TxOutput};
use num_bigint::{BigInt, BigUint};
use num_traits::{CheckedAdd, CheckedMul, CheckedSub, Signed, ToPrimitive, Zero};
use parity_scale_codec::{Decode, Encode};

const MAX_STACK_SIZE: usize = 4096;
const MAX_FRAME_DEPTH: usize = 256;

/// The shared operand stack. Frames may only pop down to their own
/// `stack_base`, never into a caller's values.
struct OperandStack {
    values: Vec<Val>,
}

impl OperandStack {
    fn new() -> Self {
        OperandStack { values: Vec::new() }
    }

    fn push(&mut self, v: Val) -> Result<(), ExeFailure> {
        if self.values.len() >= MAX_STACK_SIZE {
            return Err(ExeFailure::StackOverflow);
        }
        self.values.push(v);
        Ok(())
    }

    fn pop(&mut self, floor: usize) -> Result<Val, ExeFailure> {
        if self.values.len() <= floor {
            return Err(ExeFailure::StackUnderflow);
        }
        self.values.pop().ok_or(ExeFailure::StackUnderflow)
    }
}

/// The side effects accumulated by one successful script execution: values
/// returned from the top-level call, plus the contract inputs consumed and
/// outputs generated along the way.
#[derive(Clone, Debug, Default)]
pub struct ExecutionResult {
    /// The top-level method's return values.
    pub return_values: Vec<Val>,
    /// Contract-owned pre-outputs consumed by asset transfers.
    pub contract_inputs: Vec<alephium_types::transaction::TxOutputRef>,
    /// Outputs produced by asset transfers and contract creation.
    pub generated_outputs: Vec<TxOutput>,
}

fn u256_to_usize(v: &BigUint) -> Result<usize, ExeFailure> {
    v.to_usize().ok_or(ExeFailure::InvalidType)
}

fn lockup_hash(addr: &LockupScript) -> Hash {
    use alephium_types::codec::Codec;
    Hash::hash(&addr.to_bytes())
}

/// Executes one arithmetic/comparison/conversion/constant/local/control
/// instruction that needs no context access. Returns `Ok(None)` to continue,
/// `Ok(Some(target_pc))` for a taken jump, and never handles `CallLocal`/
/// `CallExternal`/`Return` (those need frame-stack access from the caller).
fn step_pure(
    instr: &Instr,
    stack: &mut OperandStack,
    frame: &mut Frame,
    gas: &mut crate::gas::GasMeter,
) -> Result<Option<i64>, ExeFailure> {
    let floor = frame.stack_base;
    match instr {
        Instr::ConstTrue => {
            gas.charge(GasClass::Zero)?;
            stack.push(Val::Bool(true))?;
        }
        Instr::ConstFalse => {
            gas.charge(GasClass::Zero)?;
            stack.push(Val::Bool(false))?;
        }
        Instr::I256Const(n) => {
            gas.charge(GasClass::Zero)?;
            stack.push(Val::I256(BigInt::from(*n)))?;
        }
        Instr::U256Const(n) => {
            gas.charge(GasClass::Zero)?;
            stack.push(Val::U256(BigUint::from(*n)))?;
        }
        Instr::I256ConstBig(v) => {
            gas.charge(GasClass::Zero)?;
            stack.push(Val::I256(v.clone()))?;
        }
        Instr::U256ConstBig(v) => {
            gas.charge(GasClass::Zero)?;
            stack.push(Val::U256(v.clone()))?;
        }
        Instr::BytesConst(b) => {
            gas.charge_with_size(GasClass::VeryLow, b.len())?;
            stack.push(Val::ByteVec(b.clone()))?;
        }
        Instr::AddressConst(a) => {
            gas.charge(GasClass::VeryLow)?;
            stack.push(Val::Address(a.clone()))?;
        }
        Instr::LoadLocal(i) => {
            gas.charge(GasClass::VeryLow)?;
            let v = frame
                .locals
                .get(*i as usize)
                .cloned()
                .ok_or(ExeFailure::InvalidLocalIndex)?;
            stack.push(v)?;
        }
        Instr::StoreLocal(i) => {
            gas.charge(GasClass::VeryLow)?;
            let v = stack.pop(floor)?;
            let slot = frame
                .locals
                .get_mut(*i as usize)
                .ok_or(ExeFailure::InvalidLocalIndex)?;
            *slot = v;
        }
        Instr::I256Add | Instr::I256Sub | Instr::I256Mul | Instr::I256Div | Instr::I256Mod => {
            gas.charge(GasClass::Low)?;
            let b = stack.pop(floor)?.as_i256()?.clone();
            let a = stack.pop(floor)?.as_i256()?.clone();
            let r = match instr {
                Instr::I256Add => a + b,
                Instr::I256Sub => a - b,
                Instr::I256Mul => a * b,
                Instr::I256Div => {
                    if b.is_zero() {
                        return Err(ExeFailure::InvalidType);
                    }
                    a / b
                }
                Instr::I256Mod => {
                    if b.is_zero() {
                        return Err(ExeFailure::InvalidType);
                    }
                    a % b
                }
                _ => unreachable!(),
            };
            stack.push(Val::I256(r))?;
        }
        Instr::U256Add
        | Instr::U256Sub
        | Instr::U256Mul
        | Instr::U256Div
        | Instr::U256Mod
        | Instr::U256BitAnd
        | Instr::U256BitOr
        | Instr::U256Xor
        | Instr::U256Shl
        | Instr::U256Shr => {
            gas.charge(GasClass::Low)?;
            let b = stack.pop(floor)?.as_u256()?.clone();
            let a = stack.pop(floor)?.as_u256()?.clone();
            let r = match instr {
                Instr::U256Add => a.checked_add(&b).ok_or(ExeFailure::BalanceOverflow)?,
                Instr::U256Sub => a.checked_sub(&b).ok_or(ExeFailure::InvalidType)?,
                Instr::U256Mul => a.checked_mul(&b).ok_or(ExeFailure::BalanceOverflow)?,
                Instr::U256Div => {
                    if b.is_zero() {
                        return Err(ExeFailure::InvalidType);
                    }
                    a / b
                }
                Instr::U256Mod => {
                    if b.is_zero() {
                        return Err(ExeFailure::InvalidType);
                    }
                    a % b
                }
                Instr::U256BitAnd => a & b,
                Instr::U256BitOr => a | b,
                Instr::U256Xor => a ^ b,
                Instr::U256Shl => {
                    let n = u256_to_usize(&b)?;
                    a << n
                }
                Instr::U256Shr => {
                    let n = u256_to_usize(&b)?;
                    a >> n
                }
                _ => unreachable!(),
            };
            stack.push(Val::U256(r))?;
        }
        Instr::Eq => {
            gas.charge(GasClass::VeryLow)?;
            let b = stack.pop(floor)?;
            let a = stack.pop(floor)?;
            stack.push(Val::Bool(a == b))?;
        }
        Instr::Neq => {
            gas.charge(GasClass::VeryLow)?;
            let b = stack.pop(floor)?;
            let a = stack.pop(floor)?;
            stack.push(Val::Bool(a != b))?;
        }
        Instr::U256Lt | Instr::U256Le | Instr::U256Gt | Instr::U256Ge => {
            gas.charge(GasClass::VeryLow)?;
            let b = stack.pop(floor)?.as_u256()?.clone();
            let a = stack.pop(floor)?.as_u256()?.clone();
            let r = match instr {
                Instr::U256Lt => a < b,
                Instr::U256Le => a <= b,
                Instr::U256Gt => a > b,
                Instr::U256Ge => a >= b,
                _ => unreachable!(),
            };
            stack.push(Val::Bool(r))?;
        }
        Instr::I256ToU256 => {
            gas.charge(GasClass::Low)?;
            let v = stack.pop(floor)?.as_i256()?.clone();
            if v.is_negative() {
                return Err(ExeFailure::InvalidType);
            }
            stack.push(Val::U256(v.to_biguint().ok_or(ExeFailure::InvalidType)?))?;
        }
        Instr::U256ToI256 => {
            gas.charge(GasClass::Low)?;
            let v = stack.pop(floor)?.as_u256()?.clone();
            let signed = BigInt::from(v);
            // I256 range check: [-2^255, 2^255 - 1].
            let limit = BigInt::from(1) << 255;
            if signed >= limit {
                return Err(ExeFailure::InvalidType);
            }
            stack.push(Val::I256(signed))?;
        }
        Instr::BoolToByteVec => {
            gas.charge(GasClass::VeryLow)?;
            let v = stack.pop(floor)?;
            stack.push(Val::ByteVec(v.to_bytevec()))?;
        }
        Instr::I256ToByteVec | Instr::U256ToByteVec => {
            let v = stack.pop(floor)?;
            let bytes = v.to_bytevec();
            gas.charge_with_size(GasClass::Low, bytes.len())?;
            stack.push(Val::ByteVec(bytes))?;
        }
        Instr::Jump(delta) => {
            gas.charge(GasClass::Mid)?;
            return Ok(Some(*delta as i64));
        }
        Instr::IfTrue(delta) => {
            gas.charge(GasClass::Mid)?;
            if stack.pop(floor)?.as_bool()? {
                return Ok(Some(*delta as i64));
            }
        }
        Instr::IfFalse(delta) => {
            gas.charge(GasClass::Mid)?;
            if !stack.pop(floor)?.as_bool()? {
                return Ok(Some(*delta as i64));
            }
        }
        Instr::Assert => {
            gas.charge(GasClass::Low)?;
            if !stack.pop(floor)?.as_bool()? {
                return Err(ExeFailure::AssertionFailed);
            }
        }
        Instr::Blake2b | Instr::Keccak256 | Instr::Sha256 | Instr::Sha3 => {
            let bytes = stack.pop(floor)?.as_bytevec()?.to_vec();
            gas.charge_with_size(GasClass::Hash, bytes.len())?;
            let digest = match instr {
                Instr::Blake2b => crypto_hash::blake2b(&bytes).to_vec(),
                Instr::Keccak256 => crypto_hash::keccak256(&bytes).to_vec(),
                Instr::Sha256 => crypto_hash::sha256(&bytes).to_vec(),
                Instr::Sha3 => crypto_hash::sha3(&bytes).to_vec(),
                _ => unreachable!(),
            };
            stack.push(Val::ByteVec(digest))?;
        }
        _ => return Err(context_only_instr()),
    }
    Ok(None)
}

/// Instructions that reach `step_pure`'s catch-all need context access and
/// are handled by the caller instead; reaching this means a bug in the
/// dispatch split.
fn context_only_instr() -> ExeFailure {
    ExeFailure::InvalidType
}

fn apply_jump(frame: &mut Frame, method: &Method, delta: i64) -> Result<(), ExeFailure> {
    let target = frame.pc as i64 + delta;
    if target < 0 || target as usize > method.instrs.len() {
        return Err(ExeFailure::InvalidMethodIndex);
    }
    frame.pc = target as usize;
    Ok(())
}

/// Executes `program`'s method `method_index` with `args` against a
/// stateless context (no world-state, no fields, no assets). Used for P2SH
/// unlock-script replay.
pub fn run_stateless(
    program: &Program,
    method_index: u8,
    args: Vec<Val>,
    ctx: &mut StatelessContext,
) -> Result<Vec<Val>, ExeFailure> {
    let method = program
        .method(method_index)
        .ok_or(ExeFailure::InvalidMethodIndex)?;
    let mut stack = OperandStack::new();
    let mut frame = Frame::new(method_index, method.locals_length, None, 0, None, true);
    for (i, a) in args.into_iter().enumerate() {
        if let Some(slot) = frame.locals.get_mut(i) {
            *slot = a;
        }
    }
    loop {
        if frame.pc >= method.instrs.len() {
            return Ok(Vec::new());
        }
        let instr = method.instrs[frame.pc].clone();
        match &instr {
            Instr::Return => return Ok(drain_return(&mut stack, &method.return_type, frame.stack_base)),
            Instr::VerifyTxSignature => {
                ctx.gas.charge(GasClass::Signature)?;
                let pubkey = stack.pop(frame.stack_base)?.as_bytevec()?.to_vec();
                let sig = ctx
                    .signatures
                    .pop()
                    .ok_or(ExeFailure::NotEnoughSignature)?;
                let ok = secp256k1::verify(&pubkey, ctx.tx_id.as_bytes(), &sig.0).is_ok();
                if !ok {
                    return Err(ExeFailure::InvalidPublicKey);
                }
            }
            Instr::VerifySecP256K1 => {
                ctx.gas.charge(GasClass::Signature)?;
                let sig = stack.pop(frame.stack_base)?.as_bytevec()?.to_vec();
                let pubkey = stack.pop(frame.stack_base)?.as_bytevec()?.to_vec();
                let data = stack.pop(frame.stack_base)?.as_bytevec()?.to_vec();
                let digest = as_digest(&data)?;
                let ok = secp256k1::verify(&pubkey, &digest, &sig).is_ok();
                stack.push(Val::Bool(ok))?;
            }
            Instr::VerifyED25519 => {
                ctx.gas.charge(GasClass::Signature)?;
                let sig = stack.pop(frame.stack_base)?.as_bytevec()?.to_vec();
                let pubkey = stack.pop(frame.stack_base)?.as_bytevec()?.to_vec();
                let data = stack.pop(frame.stack_base)?.as_bytevec()?.to_vec();
                let ok = eddsa::verify(&pubkey, &data, &sig).is_ok();
                stack.push(Val::Bool(ok))?;
            }
            Instr::ChainId => {
                ctx.gas.charge(GasClass::VeryLow)?;
                stack.push(Val::ByteVec(ctx.block_env.chain_id.clone()))?;
            }
            Instr::BlockTimeStamp => {
                ctx.gas.charge(GasClass::VeryLow)?;
                stack.push(Val::U256(BigUint::from(ctx.block_env.timestamp)))?;
            }
            Instr::BlockTarget => {
                ctx.gas.charge(GasClass::VeryLow)?;
                stack.push(Val::U256(ctx.block_env.target.value()))?;
            }
            Instr::TxId => {
                ctx.gas.charge(GasClass::VeryLow)?;
                stack.push(Val::ByteVec(ctx.tx_id.as_bytes().to_vec()))?;
            }
            Instr::CallLocal(idx) => {
                ctx.gas.charge(GasClass::Call)?;
                let callee = program.method(*idx).ok_or(ExeFailure::InvalidMethodIndex)?;
                let result = run_stateless(program, *idx, pop_args(&mut stack, callee, frame.stack_base)?, ctx)?;
                for v in result {
                    stack.push(v)?;
                }
            }
            Instr::LoadField(_) | Instr::StoreField(_) => return Err(ExeFailure::InvalidFieldIndex),
            Instr::CallExternal(_)
            | Instr::ApproveAlf
            | Instr::ApproveToken
            | Instr::AlfRemaining
            | Instr::TokenRemaining
            | Instr::IsPaying
            | Instr::TransferAlfFromSelf
            | Instr::TransferAlfToSelf
            | Instr::TransferTokenFromSelf
            | Instr::TransferTokenToSelf
            | Instr::CreateContract
            | Instr::CopyCreateContract
            | Instr::DestroySelf
            | Instr::SelfAddress
            | Instr::SelfContractId
            | Instr::IssueToken
            | Instr::CallerAddress
            | Instr::IsCalledFromTxScript
            | Instr::CallerInitialStateHash
            | Instr::ContractInitialStateHash => return Err(ExeFailure::NonPayableFrame),
            Instr::TxCaller | Instr::TxCallerSize => return Err(ExeFailure::NonPayableFrame),
            Instr::VerifyAbsoluteLocktime | Instr::VerifyRelativeLocktime => {
                ctx.gas.charge(GasClass::Mid)?;
                let lock = stack.pop(frame.stack_base)?.as_u256()?.clone();
                if BigUint::from(ctx.block_env.timestamp) < lock {
                    return Err(ExeFailure::LockTimeOverflow);
                }
            }
            Instr::Log1 | Instr::Log2 | Instr::Log3 | Instr::Log4 | Instr::Log5 => {
                let n = log_arity(&instr);
                ctx.gas.charge_with_size(GasClass::Mid, n)?;
                for _ in 0..n {
                    stack.pop(frame.stack_base)?;
                }
            }
            _ => match step_pure(&instr, &mut stack, &mut frame, &mut ctx.gas)? {
                Some(delta) => {
                    apply_jump(&mut frame, method, delta)?;
                    continue;
                }
                None => {}
            },
        }
        frame.pc += 1;
    }
}

fn log_arity(instr: &Instr) -> usize {
    match instr {
        Instr::Log1 => 1,
        Instr::Log2 => 2,
        Instr::Log3 => 3,
        Instr::Log4 => 4,
        Instr::Log5 => 5,
        _ => 0,
    }
}

fn pop_args(stack: &mut OperandStack, method: &Method, floor: usize) -> Result<Vec<Val>, ExeFailure> {
    let mut args = Vec::with_capacity(method.args_type.len());
    for _ in 0..method.args_type.len() {
        args.push(stack.pop(floor)?);
    }
    args.reverse();
    Ok(args)
}

fn drain_return(stack: &mut OperandStack, return_type: &[()], floor: usize) -> Vec<Val> {
    let mut out = Vec::with_capacity(return_type.len());
    for _ in 0..return_type.len() {
        if let Ok(v) = stack.pop(floor) {
            out.push(v);
        }
    }
    out.reverse();
    out
}

/// Allocates a deterministic contract id from its creating tx and an
/// in-transaction output index, mirroring `TxOutputRef::key_for`'s scheme.
fn derive_contract_id(tx_id: alephium_types::hash::TxId, output_index: u32) -> ContractId {
    ContractId(alephium_types::transaction::TxOutputRef::key_for(tx_id, output_index))
}

/// Executes a tx script or contract method against full world-state,
/// threading gas, balances, and staged effects through nested
/// `CallLocal`/`CallExternal` frames.
///
/// `fields` is the invoked contract's current field values (empty for a
/// bare tx script). `preapproved` is the balance available to the initial
/// frame if the method is payable.
pub async fn run_stateful<'a>(
    program: &Program,
    method_index: u8,
    args: Vec<Val>,
    fields: Vec<Val>,
    contract_id: Option<ContractId>,
    preapproved: Option<BalanceState>,
    ctx: &mut StatefulContext<'a>,
    resolver: &dyn ContractCodeResolver,
) -> Result<ExecutionResult, ExeFailure> {
    let method = program
        .method(method_index)
        .ok_or(ExeFailure::InvalidMethodIndex)?;
    if !method.is_public {
        return Err(ExeFailure::PrivateExternalMethodCall);
    }
    let mut stack = OperandStack::new();
    let mut frames: Vec<Frame> = vec![Frame::new(
        method_index,
        method.locals_length,
        if method.uses_assets { preapproved.or_else(|| Some(BalanceState::empty())) } else { None },
        0,
        contract_id.map(|c| c.0),
        true,
    )];
    let mut programs: Vec<Program> = vec![program.clone()];
    let mut field_stack: Vec<Vec<Val>> = vec![fields];
    let mut owns_contract: Vec<bool> = vec![contract_id.is_some()];

    {
        let frame = frames.last_mut().unwrap();
        for (i, a) in args.into_iter().enumerate() {
            if let Some(slot) = frame.locals.get_mut(i) {
                *slot = a;
            }
        }
    }

    let mut final_return = Vec::new();

    loop {
        if frames.len() > MAX_FRAME_DEPTH {
            return Err(ExeFailure::StackOverflow);
        }
        let depth = frames.len() - 1;
        let cur_program = programs[depth].clone();
        let cur_method = cur_program
            .method(frames[depth].method_index)
            .ok_or(ExeFailure::InvalidMethodIndex)?
            .clone();

        if frames[depth].pc >= cur_method.instrs.len() {
            return Err(ExeFailure::InvalidMethodIndex);
        }
        let instr = cur_method.instrs[frames[depth].pc].clone();

        match &instr {
            Instr::Return => {
                let ret = drain_return(&mut stack, &cur_method.return_type, frames[depth].stack_base);
                let finished = frames.pop().unwrap();
                let finished_fields = field_stack.pop().unwrap_or_default();
                programs.pop();
                let owned = owns_contract.pop().unwrap_or(false);
                if let Some(bs) = &finished.balance_state {
                    if !bs.is_flushed() {
                        return Err(ExeFailure::NotEnoughBalance);
                    }
                }
                if owned {
                    if let Some(id_hash) = finished.contract_id {
                        let id = ContractId(id_hash);
                        if let Some(existing) = ctx.contract_pool.get(&id) {
                            let updated = ContractState::new(
                                existing.code_hash,
                                finished_fields.encode(),
                                existing.output_ref,
                            );
                            let encoded = updated.encode();
                            let _ = ctx.staging.put(id_hash, encoded).await;
                            ctx.contract_pool.put(id, std::sync::Arc::new(updated));
                        }
                    }
                }
                if frames.is_empty() {
                    final_return = ret;
                    break;
                }
                for v in ret {
                    stack.push(v)?;
                }
                continue;
            }
            Instr::CallLocal(idx) => {
                ctx.base.gas.charge(GasClass::Call)?;
                let callee = cur_program.method(*idx).ok_or(ExeFailure::InvalidMethodIndex)?;
                let floor = frames[depth].stack_base;
                let call_args = pop_args(&mut stack, callee, floor)?;
                let base = stack.values.len();
                let mut new_frame = Frame::new(
                    *idx,
                    callee.locals_length,
                    if callee.uses_assets {
                        Some(BalanceState::empty())
                    } else {
                        None
                    },
                    base,
                    frames[depth].contract_id,
                    false,
                );
                for (i, a) in call_args.into_iter().enumerate() {
                    if let Some(slot) = new_frame.locals.get_mut(i) {
                        *slot = a;
                    }
                }
                frames[depth].pc += 1;
                frames.push(new_frame);
                programs.push(cur_program.clone());
                field_stack.push(field_stack[depth].clone());
                owns_contract.push(false);
                continue;
            }
            Instr::CallExternal(idx) => {
                ctx.base.gas.charge(GasClass::Call)?;
                let floor = frames[depth].stack_base;
                let target_addr = stack.pop(floor)?;
                let target_id = match target_addr {
                    Val::ByteVec(b) if b.len() == 32 => {
                        let mut buf = [0u8; 32];
                        buf.copy_from_slice(&b);
                        ContractId(Hash(buf))
                    }
                    _ => return Err(ExeFailure::InvalidType),
                };
                let callee_program = resolver
                    .resolve(&target_id)
                    .ok_or(ExeFailure::InvalidMethodIndex)?;
                let callee = callee_program
                    .method(*idx)
                    .ok_or(ExeFailure::InvalidMethodIndex)?
                    .clone();
                if !callee.is_public {
                    return Err(ExeFailure::PrivateExternalMethodCall);
                }
                let call_args = pop_args(&mut stack, &callee, floor)?;
                let state = ctx
                    .load_contract(&target_id, |id| id.0)
                    .await
                    .ok_or(ExeFailure::InvalidTokenId)?;
                let base = stack.values.len();
                let mut new_frame = Frame::new(
                    *idx,
                    callee.locals_length,
                    if callee.uses_assets {
                        Some(BalanceState::empty())
                    } else {
                        None
                    },
                    base,
                    Some(target_id.0),
                    true,
                );
                for (i, a) in call_args.into_iter().enumerate() {
                    if let Some(slot) = new_frame.locals.get_mut(i) {
                        *slot = a;
                    }
                }
                let callee_fields =
                    Vec::<Val>::decode(&mut state.fields.as_slice()).unwrap_or_default();
                frames[depth].pc += 1;
                frames.push(new_frame);
                programs.push(callee_program);
                field_stack.push(callee_fields);
                owns_contract.push(true);
                continue;
            }
            Instr::LoadField(i) => {
                ctx.base.gas.charge(GasClass::Mid)?;
                let v = field_stack[depth]
                    .get(*i as usize)
                    .cloned()
                    .ok_or(ExeFailure::InvalidFieldIndex)?;
                stack.push(v)?;
            }
            Instr::StoreField(i) => {
                ctx.base.gas.charge(GasClass::Mid)?;
                let v = stack.pop(frames[depth].stack_base)?;
                let slot = field_stack[depth]
                    .get_mut(*i as usize)
                    .ok_or(ExeFailure::InvalidFieldIndex)?;
                *slot = v;
            }
            Instr::VerifyTxSignature => {
                ctx.base.gas.charge(GasClass::Signature)?;
                let pubkey = stack.pop(frames[depth].stack_base)?.as_bytevec()?.to_vec();
                let sig = ctx
                    .base
                    .signatures
                    .pop()
                    .ok_or(ExeFailure::NotEnoughSignature)?;
                let ok = secp256k1::verify(&pubkey, ctx.base.tx_id.as_bytes(), &sig.0).is_ok();
                if !ok {
                    return Err(ExeFailure::InvalidPublicKey);
                }
            }
            Instr::VerifySecP256K1 => {
                ctx.base.gas.charge(GasClass::Signature)?;
                let floor = frames[depth].stack_base;
                let sig = stack.pop(floor)?.as_bytevec()?.to_vec();
                let pubkey = stack.pop(floor)?.as_bytevec()?.to_vec();
                let data = stack.pop(floor)?.as_bytevec()?.to_vec();
                let digest = as_digest(&data)?;
                stack.push(Val::Bool(secp256k1::verify(&pubkey, &digest, &sig).is_ok()))?;
            }
            Instr::VerifyED25519 => {
                ctx.base.gas.charge(GasClass::Signature)?;
                let floor = frames[depth].stack_base;
                let sig = stack.pop(floor)?.as_bytevec()?.to_vec();
                let pubkey = stack.pop(floor)?.as_bytevec()?.to_vec();
                let data = stack.pop(floor)?.as_bytevec()?.to_vec();
                stack.push(Val::Bool(eddsa::verify(&pubkey, &data, &sig).is_ok()))?;
            }
            Instr::ChainId => {
                ctx.base.gas.charge(GasClass::VeryLow)?;
                stack.push(Val::ByteVec(ctx.base.block_env.chain_id.clone()))?;
            }
            Instr::BlockTimeStamp => {
                ctx.base.gas.charge(GasClass::VeryLow)?;
                stack.push(Val::U256(BigUint::from(ctx.base.block_env.timestamp)))?;
            }
            Instr::BlockTarget => {
                ctx.base.gas.charge(GasClass::VeryLow)?;
                stack.push(Val::U256(ctx.base.block_env.target.value()))?;
            }
            Instr::TxId => {
                ctx.base.gas.charge(GasClass::VeryLow)?;
                stack.push(Val::ByteVec(ctx.base.tx_id.as_bytes().to_vec()))?;
            }
            Instr::TxCaller | Instr::TxCallerSize => {
                ctx.base.gas.charge(GasClass::VeryLow)?;
                // No caller-chain tracking outside the frame stack itself;
                // approximate with the immediate caller frame's contract id.
                match &instr {
                    Instr::TxCallerSize => stack.push(Val::U256(BigUint::from(frames.len())))?,
                    _ => {
                        let caller = if depth == 0 {
                            frames[0].contract_id
                        } else {
                            frames[depth - 1].contract_id
                        };
                        let id = caller.unwrap_or(Hash::ZERO);
                        stack.push(Val::ByteVec(id.as_bytes().to_vec()))?;
                    }
                }
            }
            Instr::VerifyAbsoluteLocktime | Instr::VerifyRelativeLocktime => {
                ctx.base.gas.charge(GasClass::Mid)?;
                let lock = stack.pop(frames[depth].stack_base)?.as_u256()?.clone();
                if BigUint::from(ctx.base.block_env.timestamp) < lock {
                    return Err(ExeFailure::LockTimeOverflow);
                }
            }
            Instr::ApproveAlf => {
                ctx.base.gas.charge(GasClass::Balance)?;
                let floor = frames[depth].stack_base;
                let amount = stack.pop(floor)?.as_u256()?.clone();
                let addr = stack.pop(floor)?.as_address()?.clone();
                let bs = frames[depth]
                    .balance_state
                    .as_mut()
                    .ok_or(ExeFailure::NonPayableFrame)?;
                bs.approve_alf(lockup_hash(&addr), Amount(amount));
            }
            Instr::ApproveToken => {
                ctx.base.gas.charge(GasClass::Balance)?;
                let floor = frames[depth].stack_base;
                let amount = stack.pop(floor)?.as_u256()?.clone();
                let token_bytes = stack.pop(floor)?.as_bytevec()?.to_vec();
                let addr = stack.pop(floor)?.as_address()?.clone();
                let token_id = bytevec_to_hash(&token_bytes)?;
                let bs = frames[depth]
                    .balance_state
                    .as_mut()
                    .ok_or(ExeFailure::NonPayableFrame)?;
                bs.approve_token(lockup_hash(&addr), (TokenId(token_id), Amount(amount)));
            }
            Instr::AlfRemaining => {
                ctx.base.gas.charge(GasClass::Low)?;
                let floor = frames[depth].stack_base;
                let addr = stack.pop(floor)?.as_address()?.clone();
                let bs = frames[depth].balance_state.as_ref();
                let amount = bs
                    .and_then(|b| b.alf_approved.get(&lockup_hash(&addr)))
                    .cloned()
                    .unwrap_or_else(Amount::zero);
                stack.push(Val::U256(amount.0))?;
            }
            Instr::TokenRemaining => {
                ctx.base.gas.charge(GasClass::Low)?;
                let floor = frames[depth].stack_base;
                let token_bytes = stack.pop(floor)?.as_bytevec()?.to_vec();
                let addr = stack.pop(floor)?.as_address()?.clone();
                let token_id = TokenId(bytevec_to_hash(&token_bytes)?);
                let bs = frames[depth].balance_state.as_ref();
                let amount = bs
                    .and_then(|b| b.token_approved.get(&(lockup_hash(&addr), token_id)))
                    .cloned()
                    .unwrap_or_else(Amount::zero);
                stack.push(Val::U256(amount.0))?;
            }
            Instr::IsPaying => {
                ctx.base.gas.charge(GasClass::Zero)?;
                stack.push(Val::Bool(frames[depth].balance_state.is_some()))?;
            }
            Instr::TransferAlfFromSelf | Instr::TransferAlfToSelf => {
                ctx.base.gas.charge(GasClass::Balance)?;
                let floor = frames[depth].stack_base;
                let amount = stack.pop(floor)?.as_u256()?.clone();
                let addr = stack.pop(floor)?.as_address()?.clone();
                let bs = frames[depth]
                    .balance_state
                    .as_mut()
                    .ok_or(ExeFailure::NonPayableFrame)?;
                match &instr {
                    Instr::TransferAlfFromSelf => {
                        let self_hash = frames[depth]
                            .contract_id
                            .ok_or(ExeFailure::NonPayableFrame)?;
                        let entry = bs.alf_approved.entry(self_hash).or_insert_with(Amount::zero);
                        *entry = entry
                            .checked_sub(&Amount(amount.clone()))
                            .ok_or(ExeFailure::NotEnoughBalance)?;
                        ctx.generated_outputs.push(TxOutput::Asset(
                            alephium_types::output::AssetOutput {
                                amount: Amount(amount),
                                lockup_script: addr,
                                tokens: vec![],
                                lock_time: 0,
                                additional_data: vec![],
                            },
                        ));
                    }
                    Instr::TransferAlfToSelf => {
                        let self_hash = frames[depth]
                            .contract_id
                            .ok_or(ExeFailure::NonPayableFrame)?;
                        bs.approve_alf(self_hash, Amount(amount));
                    }
                    _ => unreachable!(),
                }
            }
            Instr::TransferTokenFromSelf | Instr::TransferTokenToSelf => {
                ctx.base.gas.charge(GasClass::Balance)?;
                let floor = frames[depth].stack_base;
                let amount = stack.pop(floor)?.as_u256()?.clone();
                let token_bytes = stack.pop(floor)?.as_bytevec()?.to_vec();
                let addr = stack.pop(floor)?.as_address()?.clone();
                let token_id = TokenId(bytevec_to_hash(&token_bytes)?);
                let self_hash = frames[depth]
                    .contract_id
                    .ok_or(ExeFailure::NonPayableFrame)?;
                let bs = frames[depth]
                    .balance_state
                    .as_mut()
                    .ok_or(ExeFailure::NonPayableFrame)?;
                match &instr {
                    Instr::TransferTokenFromSelf => {
                        let entry = bs
                            .token_approved
                            .entry((self_hash, token_id))
                            .or_insert_with(Amount::zero);
                        *entry = entry
                            .checked_sub(&Amount(amount.clone()))
                            .ok_or(ExeFailure::NotEnoughBalance)?;
                        ctx.generated_outputs.push(TxOutput::Asset(
                            alephium_types::output::AssetOutput {
                                amount: Amount::zero(),
                                lockup_script: addr,
                                tokens: vec![(token_id, Amount(amount))],
                                lock_time: 0,
                                additional_data: vec![],
                            },
                        ));
                    }
                    Instr::TransferTokenToSelf => {
                        bs.approve_token(self_hash, (token_id, Amount(amount)));
                    }
                    _ => unreachable!(),
                }
            }
            Instr::CreateContract | Instr::CopyCreateContract => {
                ctx.base.gas.charge(GasClass::Create)?;
                let floor = frames[depth].stack_base;
                let fields_val = stack.pop(floor)?.as_bytevec()?.to_vec();
                let code_hash = match &instr {
                    Instr::CreateContract => {
                        let code = stack.pop(floor)?.as_bytevec()?.to_vec();
                        Hash::hash(&code)
                    }
                    Instr::CopyCreateContract => {
                        let existing_bytes = stack.pop(floor)?.as_bytevec()?.to_vec();
                        bytevec_to_hash(&existing_bytes)?
                    }
                    _ => unreachable!(),
                };
                let output_index = ctx.generated_outputs.len() as u32;
                let new_id = derive_contract_id(ctx.base.tx_id, output_index);
                let state = ContractState {
                    code_hash,
                    fields: fields_val,
                    output_ref: alephium_types::transaction::TxOutputRef::contract(
                        0,
                        new_id.0,
                    ),
                };
                let encoded = state.encode();
                let _ = ctx.staging.put(new_id.0, encoded).await;
                ctx.contract_pool.put(new_id, std::sync::Arc::new(state));
                ctx.generated_outputs.push(TxOutput::Contract(
                    alephium_types::output::ContractOutput {
                        amount: Amount::zero(),
                        lockup_script: LockupScript::P2C(new_id.0),
                        tokens: vec![],
                    },
                ));
                stack.push(Val::ByteVec(new_id.0.as_bytes().to_vec()))?;
            }
            Instr::DestroySelf => {
                ctx.base.gas.charge(GasClass::Destroy)?;
                if !frames[depth].called_from_tx_script {
                    return Err(ExeFailure::ContractDestructionShouldBeCalledFromTx);
                }
                let floor = frames[depth].stack_base;
                let dest = stack.pop(floor)?.as_address()?.clone();
                let self_id = frames[depth]
                    .contract_id
                    .ok_or(ExeFailure::ContractAssetUnloaded)?;
                let bs = frames[depth].balance_state.clone().unwrap_or_default();
                let remaining_alf = bs
                    .alf_approved
                    .get(&self_id)
                    .cloned()
                    .unwrap_or_else(Amount::zero);
                ctx.generated_outputs.push(TxOutput::Asset(
                    alephium_types::output::AssetOutput {
                        amount: remaining_alf,
                        lockup_script: dest,
                        tokens: vec![],
                        lock_time: 0,
                        additional_data: vec![],
                    },
                ));
                // The trie has no delete primitive; staging an empty value
                // makes the key undecodable as a `ContractState`, which is
                // this kernel's destroyed-contract tombstone.
                let _ = ctx.staging.put(self_id, Vec::new()).await;
                ctx.contract_pool.evict(&ContractId(self_id));
                if let Some(b) = frames[depth].balance_state.as_mut() {
                    b.alf_approved.remove(&self_id);
                }
            }
            Instr::SelfAddress => {
                ctx.base.gas.charge(GasClass::VeryLow)?;
                let id = frames[depth].contract_id.ok_or(ExeFailure::InvalidTokenId)?;
                stack.push(Val::Address(LockupScript::P2C(id)))?;
            }
            Instr::SelfContractId => {
                ctx.base.gas.charge(GasClass::VeryLow)?;
                let id = frames[depth].contract_id.ok_or(ExeFailure::InvalidTokenId)?;
                stack.push(Val::ByteVec(id.as_bytes().to_vec()))?;
            }
            Instr::IssueToken => {
                ctx.base.gas.charge(GasClass::Balance)?;
                let floor = frames[depth].stack_base;
                let amount = stack.pop(floor)?.as_u256()?.clone();
                let self_id = frames[depth]
                    .contract_id
                    .ok_or(ExeFailure::InvalidTokenId)?;
                let bs = frames[depth]
                    .balance_state
                    .as_mut()
                    .ok_or(ExeFailure::NonPayableFrame)?;
                bs.approve_token(self_id, (TokenId(ctx.base.tx_id.0.clone()), Amount(amount)));
            }
            Instr::CallerAddress => {
                ctx.base.gas.charge(GasClass::VeryLow)?;
                let caller = if depth == 0 {
                    frames[0].contract_id
                } else {
                    frames[depth - 1].contract_id
                };
                let id = caller.ok_or(ExeFailure::InvalidTokenId)?;
                stack.push(Val::Address(LockupScript::P2C(id)))?;
            }
            Instr::IsCalledFromTxScript => {
                ctx.base.gas.charge(GasClass::Zero)?;
                stack.push(Val::Bool(frames[depth].called_from_tx_script))?;
            }
            Instr::CallerInitialStateHash | Instr::ContractInitialStateHash => {
                ctx.base.gas.charge(GasClass::Low)?;
                let id = match &instr {
                    Instr::CallerInitialStateHash => {
                        if depth == 0 {
                            frames[0].contract_id
                        } else {
                            frames[depth - 1].contract_id
                        }
                    }
                    _ => frames[depth].contract_id,
                }
                .ok_or(ExeFailure::InvalidTokenId)?;
                stack.push(Val::ByteVec(id.as_bytes().to_vec()))?;
            }
            Instr::Log1 | Instr::Log2 | Instr::Log3 | Instr::Log4 | Instr::Log5 => {
                let n = log_arity(&instr);
                ctx.base.gas.charge_with_size(GasClass::Mid, n)?;
                for _ in 0..n {
                    stack.pop(frames[depth].stack_base)?;
                }
            }
            _ => match step_pure(&instr, &mut stack, &mut frames[depth], &mut ctx.base.gas)? {
                Some(delta) => {
                    apply_jump(&mut frames[depth], &cur_method, delta)?;
                    continue;
                }
                None => {}
            },
        }
        frames[depth].pc += 1;
    }

    Ok(ExecutionResult {
        return_values: final_return,
        contract_inputs: ctx.contract_inputs.clone(),
        generated_outputs: ctx.generated_outputs.clone(),
    })
}

fn as_digest(bytes: &[u8]) -> Result<[u8; 32], ExeFailure> {
    bytes.try_into().map_err(|_| ExeFailure::InvalidType)
}

fn bytevec_to_hash(bytes: &[u8]) -> Result<Hash, ExeFailure> {
    if bytes.len() != 32 {
        return Err(ExeFailure::InvalidType);
    }
    let mut buf = [0u8; 32];
    buf.copy_from_slice(bytes);
    Ok(Hash(buf))
}

/// Replays a tx script's execution against a per-block staging world-state
/// and requires the declared `contractInputs`/`generatedOutputs` to match
/// what the replay actually produced.
pub async fn check_tx_script<'a>(
    program: &Program,
    args: Vec<Val>,
    declared_contract_inputs: &[alephium_types::transaction::TxOutputRef],
    declared_generated_outputs: &[TxOutput],
    preapproved: Option<BalanceState>,
    ctx: &mut StatefulContext<'a>,
    resolver: &dyn ContractCodeResolver,
) -> Result<ExecutionResult, ExeFailure> {
    let result = run_stateful(program, 0, args, Vec::new(), None, preapproved, ctx, resolver).await?;
    if result.contract_inputs.as_slice() != declared_contract_inputs {
        return Err(ExeFailure::InvalidType);
    }
    if result.generated_outputs.as_slice() != declared_generated_outputs {
        return Err(ExeFailure::InvalidType);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BlockEnv, SignatureStack, StatelessContext};
    use crate::gas::GasMeter;
    use alephium_types::hash::TxId;
    use alephium_types::header::Target;

    fn block_env() -> BlockEnv {
        BlockEnv {
            chain_id: vec![1],
            timestamp: 1000,
            target: Target::from_biguint(&BigUint::from(1u32)),
        }
    }

    #[test]
    fn u256_add_then_return() {
        let method = Method {
            is_public: true,
            uses_assets: false,
            use_preapproved_assets: false,
            args_type: vec![],
            locals_length: 0,
            return_type: vec![()],
            instrs: vec![
                Instr::U256Const(5),
                Instr::U256Const(3),
                Instr::U256Add,
                Instr::Return,
            ],
        };
        let program = Program::new(vec![method]);
        let mut ctx = StatelessContext {
            tx_id: TxId::new(Hash::hash(b"tx")),
            signatures: SignatureStack::new(vec![]),
            gas: GasMeter::new(10_000),
            block_env: block_env(),
        };
        let result = run_stateless(&program, 0, vec![], &mut ctx).unwrap();
        assert_eq!(result, vec![Val::U256(BigUint::from(8u32))]);
    }

    #[test]
    fn assert_false_aborts_with_assertion_failed() {
        let method = Method::new(vec![Instr::ConstFalse, Instr::Assert, Instr::Return]);
        let program = Program::new(vec![method]);
        let mut ctx = StatelessContext {
            tx_id: TxId::new(Hash::hash(b"tx")),
            signatures: SignatureStack::new(vec![]),
            gas: GasMeter::new(10_000),
            block_env: block_env(),
        };
        let err = run_stateless(&program, 0, vec![], &mut ctx).unwrap_err();
        assert_eq!(err, ExeFailure::AssertionFailed);
    }

    #[test]
    fn out_of_gas_aborts_execution() {
        let method = Method::new(vec![Instr::U256Const(1), Instr::Return]);
        let program = Program::new(vec![method]);
        let mut ctx = StatelessContext {
            tx_id: TxId::new(Hash::hash(b"tx")),
            signatures: SignatureStack::new(vec![]),
            gas: GasMeter::new(0),
            block_env: block_env(),
        };
        let err = run_stateless(&program, 0, vec![], &mut ctx).unwrap_err();
        assert_eq!(err, ExeFailure::OutOfGas);
    }

    #[test]
    fn call_local_pushes_nested_frame_and_returns() {
        let callee = Method {
            is_public: true,
            uses_assets: false,
            use_preapproved_assets: false,
            args_type: vec![(), ()],
            locals_length: 2,
            return_type: vec![()],
            instrs: vec![Instr::LoadLocal(0), Instr::LoadLocal(1), Instr::U256Add, Instr::Return],
        };
        let caller = Method {
            is_public: true,
            uses_assets: false,
            use_preapproved_assets: false,
            args_type: vec![],
            locals_length: 0,
            return_type: vec![()],
            instrs: vec![
                Instr::U256Const(2),
                Instr::U256Const(4),
                Instr::CallLocal(1),
                Instr::Return,
            ],
        };
        let program = Program::new(vec![caller, callee]);
        let mut ctx = StatelessContext {
            tx_id: TxId::new(Hash::hash(b"tx")),
            signatures: SignatureStack::new(vec![]),
            gas: GasMeter::new(10_000),
            block_env: block_env(),
        };
        let result = run_stateless(&program, 0, vec![], &mut ctx).unwrap();
        assert_eq!(result, vec![Val::U256(BigUint::from(6u32))]);
    }
}
