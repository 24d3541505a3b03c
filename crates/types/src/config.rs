// Path: crates/types/src/config.rs

//! `KernelConfig`: the single immutable configuration threaded through
//! every component, loaded once at startup from a TOML file and never
//! mutated afterwards.

use crate::output::Amount;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Proof-of-work / difficulty-adjustment parameters.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct ConsensusConfig {
    /// The target average time between blocks on a single chain, in
    /// milliseconds.
    pub block_target_time_millis: u64,
    /// The window, in milliseconds, within which a block's timestamp must
    /// fall relative to its parent and to wall-clock time.
    pub recent_block_timestamp_diff_millis: u64,
    /// The easiest allowed target (an all-ones 256-bit value by default),
    /// below which no block may be accepted regardless of declared
    /// difficulty.
    pub max_mining_target_bits: u32,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        ConsensusConfig {
            block_target_time_millis: 64_000,
            recent_block_timestamp_diff_millis: 7_200_000,
            max_mining_target_bits: 256,
        }
    }
}

/// Mempool admission and retention parameters.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct MempoolConfig {
    /// Maximum number of pending transactions held per chain.
    pub capacity_per_chain: usize,
    /// How long an admitted transaction may sit in the mempool before
    /// being evicted, in milliseconds.
    pub tx_ttl_millis: u64,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        MempoolConfig {
            capacity_per_chain: 10_000,
            tx_ttl_millis: 60 * 60 * 1000,
        }
    }
}

/// VM and transaction-shape limits.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct VmConfig {
    /// The maximum gas a single transaction may declare.
    pub max_gas_per_tx: u64,
    /// The minimum gas any transaction must declare, regardless of its
    /// actual execution cost.
    pub minimal_gas: u64,
    /// The minimum `Amount` an asset output may carry; outputs below this
    /// are rejected as dust.
    pub dust_utxo_amount: Amount,
    /// The maximum number of inputs a single transaction may declare.
    pub max_tx_input_num: usize,
    /// The maximum number of outputs (fixed + generated) a single
    /// transaction may produce.
    pub max_tx_output_num: usize,
    /// The maximum byte length of an asset output's `additionalData`.
    pub max_output_data_size: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            max_gas_per_tx: 5_000_000,
            minimal_gas: 20_000,
            dust_utxo_amount: Amount::from_u64(1_000_000_000_000_000_000),
            max_tx_input_num: 256,
            max_tx_output_num: 256,
            max_output_data_size: 256,
        }
    }
}

/// How long a spent `TxOutputRef` is retained in the cross-shard conflict
/// cache before being evicted, expressed as a duration rather than a block
/// count so it tracks wall-clock retention independent of per-chain block
/// rate.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct ConflictCacheConfig {
    /// The retention window.
    pub keep_duration_millis: u64,
}

impl ConflictCacheConfig {
    /// The retention window as a [`Duration`].
    pub fn keep_duration(&self) -> Duration {
        Duration::from_millis(self.keep_duration_millis)
    }
}

impl Default for ConflictCacheConfig {
    fn default() -> Self {
        ConflictCacheConfig {
            keep_duration_millis: 2 * 60 * 60 * 1000,
        }
    }
}

/// The full, immutable runtime configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct KernelConfig {
    /// The number of groups `G` the BlockFlow DAG is sharded into.
    pub num_groups: u16,
    /// The number of brokers this node's shard range is split across.
    pub broker_num: u16,
    /// This node's index among `broker_num` brokers, selecting which
    /// groups it is responsible for.
    pub broker_id: u16,
    pub consensus: ConsensusConfig,
    pub mempool: MempoolConfig,
    pub vm: VmConfig,
    pub conflict_cache: ConflictCacheConfig,
}

/// Errors loading or validating a [`KernelConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The TOML file could not be read from disk.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The TOML file's contents did not parse as a [`KernelConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The parsed configuration violated a structural invariant.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl KernelConfig {
    /// Loads and validates a [`KernelConfig`] from a TOML file on disk.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: KernelConfig = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the cross-field invariants a bare `Deserialize` cannot
    /// express: `brokerId < brokerNum` and `numGroups` divisible evenly
    /// among brokers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker_num == 0 {
            return Err(ConfigError::Invalid("brokerNum must be positive".into()));
        }
        if self.broker_id >= self.broker_num {
            return Err(ConfigError::Invalid(
                "brokerId must be less than brokerNum".into(),
            ));
        }
        if self.num_groups == 0 || self.num_groups % self.broker_num != 0 {
            return Err(ConfigError::Invalid(
                "numGroups must be a positive multiple of brokerNum".into(),
            ));
        }
        Ok(())
    }

    /// The inclusive range of group indices `[groupFrom, groupUntil)` this
    /// broker is responsible for.
    pub fn group_range(&self) -> (u16, u16) {
        let groups_per_broker = self.num_groups / self.broker_num;
        let from = self.broker_id * groups_per_broker;
        (from, from + groups_per_broker)
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        KernelConfig {
            num_groups: 4,
            broker_num: 1,
            broker_id: 0,
            consensus: ConsensusConfig::default(),
            mempool: MempoolConfig::default(),
            vm: VmConfig::default(),
            conflict_cache: ConflictCacheConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(KernelConfig::default().validate().is_ok());
    }

    #[test]
    fn broker_id_out_of_range_is_rejected() {
        let mut config = KernelConfig::default();
        config.broker_num = 2;
        config.broker_id = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn ungrouped_num_groups_is_rejected() {
        let mut config = KernelConfig::default();
        config.broker_num = 3;
        config.num_groups = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn group_range_splits_evenly() {
        let mut config = KernelConfig::default();
        config.num_groups = 4;
        config.broker_num = 2;
        config.broker_id = 1;
        assert_eq!(config.group_range(), (2, 4));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = KernelConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: KernelConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, parsed);
    }
}
