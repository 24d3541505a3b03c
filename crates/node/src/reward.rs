// Path: crates/node/src/reward.rs

//! A concrete [`RewardSchedule`]: SPEC_FULL leaves the emission curve as a
//! config-provided function of height rather than naming a specific
//! halving schedule, so this binary supplies the simplest honest instance
//! — a constant base reward, independent of height.

use alephium_flow::validation::RewardSchedule;
use alephium_types::output::Amount;

/// Pays the same base reward at every height.
pub struct FixedRewardSchedule {
    amount: Amount,
}

impl FixedRewardSchedule {
    /// Builds a schedule paying `amount` at every height.
    pub fn new(amount: Amount) -> Self {
        FixedRewardSchedule { amount }
    }
}

impl RewardSchedule for FixedRewardSchedule {
    fn base_reward(&self, _height: u64) -> Amount {
        self.amount.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_is_independent_of_height() {
        let schedule = FixedRewardSchedule::new(Amount::from_u64(1_000));
        assert_eq!(schedule.base_reward(0), schedule.base_reward(1_000_000));
    }
}
