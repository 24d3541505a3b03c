// Path: crates/vm/src/gas.rs

//! Gas classes and the monotone counter `chargeGas` decrements.

use alephium_types::error::ExeFailure;

/// The fixed-cost gas class every instruction belongs to. Hash/convert/
/// bytevec ops additionally charge a per-byte surcharge on top of their
/// class's base cost.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GasClass {
    /// No-op-level instructions (e.g. constants already resident).
    Zero,
    /// Cheapest stack/local/control operations.
    VeryLow,
    /// Arithmetic and comparison.
    Low,
    /// Field access and moderate control flow.
    Mid,
    /// External calls and contract lifecycle operations.
    High,
    /// `CallLocal`/`CallExternal` frame setup.
    Call,
    /// Hash functions, charged per input byte on top of the base cost.
    Hash,
    /// Signature verification.
    Signature,
    /// Asset transfer/balance instructions.
    Balance,
    /// Contract creation.
    Create,
    /// Contract destruction.
    Destroy,
}

impl GasClass {
    /// The fixed base cost for this class, in gas units.
    pub fn base_cost(self) -> u64 {
        match self {
            GasClass::Zero => 0,
            GasClass::VeryLow => 2,
            GasClass::Low => 3,
            GasClass::Mid => 8,
            GasClass::High => 20,
            GasClass::Call => 30,
            GasClass::Hash => 30,
            GasClass::Signature => 2_000,
            GasClass::Balance => 300,
            GasClass::Create => 32_000,
            GasClass::Destroy => 2_000,
        }
    }
}

/// The per-byte surcharge for hash, `*ToByteVec`, and similar size-sensitive
/// instructions.
pub const GAS_PER_BYTE: u64 = 1;

/// A monotone, never-replenished gas counter. `charge` decrements it and
/// fails with `OutOfGas` rather than underflowing.
#[derive(Clone, Copy, Debug)]
pub struct GasMeter {
    remaining: u64,
}

impl GasMeter {
    /// Starts a new meter with `gas_amount` available.
    pub fn new(gas_amount: u64) -> Self {
        GasMeter { remaining: gas_amount }
    }

    /// The gas remaining.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Charges `class`'s base cost.
    pub fn charge(&mut self, class: GasClass) -> Result<(), ExeFailure> {
        self.charge_amount(class.base_cost())
    }

    /// Charges `class`'s base cost plus `len * GAS_PER_BYTE`.
    pub fn charge_with_size(&mut self, class: GasClass, len: usize) -> Result<(), ExeFailure> {
        let size_cost = (len as u64).saturating_mul(GAS_PER_BYTE);
        self.charge_amount(class.base_cost().saturating_add(size_cost))
    }

    fn charge_amount(&mut self, amount: u64) -> Result<(), ExeFailure> {
        if amount > self.remaining {
            self.remaining = 0;
            return Err(ExeFailure::OutOfGas);
        }
        self.remaining -= amount;
        Ok(())
    }

    /// Gas consumed so far, relative to `gas_amount`.
    pub fn used(&self, gas_amount: u64) -> u64 {
        gas_amount - self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_decrements_remaining() {
        let mut meter = GasMeter::new(100);
        meter.charge(GasClass::VeryLow).unwrap();
        assert_eq!(meter.remaining(), 98);
    }

    #[test]
    fn exhausted_meter_reports_out_of_gas() {
        let mut meter = GasMeter::new(1);
        let err = meter.charge(GasClass::High).unwrap_err();
        assert_eq!(err, ExeFailure::OutOfGas);
        assert_eq!(meter.remaining(), 0);
    }

    #[test]
    fn hash_charges_per_byte_surcharge() {
        let mut meter = GasMeter::new(1000);
        meter.charge_with_size(GasClass::Hash, 100).unwrap();
        assert_eq!(meter.remaining(), 1000 - (30 + 100));
    }

    #[test]
    fn used_tracks_consumption_against_original_amount() {
        let mut meter = GasMeter::new(100);
        meter.charge(GasClass::Low).unwrap();
        assert_eq!(meter.used(100), 3);
    }
}
