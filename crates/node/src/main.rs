// Path: crates/node/src/main.rs

//! The node binary: loads configuration, opens storage, builds genesis
//! chains, and runs the orchestrator's single-writer admission loop.
//! Mirrors the teacher's `guardian.rs`/`orchestration.rs` startup order —
//! tracing initialized first, then CLI parsing, then config/storage setup
//! — collapsed to this kernel's own, much smaller wiring surface (no RPC
//! server, no telemetry sink, no transport: this crate proves the pieces
//! assemble into a runnable process, not a deployable network node).

mod error;
mod genesis;
mod identity;
mod outputs;
mod reward;
mod script;

use std::path::PathBuf;
use std::sync::Arc;

use alephium_api::events::NullEventSink;
use alephium_orchestrator::{Orchestrator, OrchestratorHandle, OrchestratorInbound};
use alephium_state::Trie;
use alephium_storage::RedbStorage;
use alephium_types::config::KernelConfig;
use alephium_types::{ChainIndex, GroupIndex, Hash};
use clap::Parser;

use error::NodeError;
use outputs::GenesisOutputResolver;
use reward::FixedRewardSchedule;
use script::NullScriptDecoder;

/// CLI options for running a node.
#[derive(Parser, Debug)]
#[command(name = "alephium-node", about = "Runs a single BlockFlow shard")]
struct Opts {
    /// Path to a TOML `KernelConfig` file.
    #[arg(long, default_value = "kernel.toml")]
    config: PathBuf,
    /// Directory holding this node's persistent state (storage database,
    /// chain identity record).
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opts = Opts::parse();
    tracing::info!(target: "node", event = "startup", config = %opts.config.display(), data_dir = %opts.data_dir.display());

    let config = KernelConfig::load_from_file(&opts.config)
        .or_else(|_| {
            tracing::warn!(target: "node", "no config file at {}, using defaults", opts.config.display());
            Ok::<_, NodeError>(KernelConfig::default())
        })?;

    std::fs::create_dir_all(&opts.data_dir)?;
    identity::check_or_persist(&opts.data_dir.join("chain_identity.json"), genesis::identity_hash(config.num_groups, 0))?;

    let storage = Arc::new(RedbStorage::open(opts.data_dir.join("kernel.redb")).map_err(NodeError::from)?);
    let (flow, genesis_blocks) = genesis::open_genesis_flow(
        config.num_groups,
        storage.clone(),
        config.conflict_cache.keep_duration(),
    )
    .await
    .map_err(NodeError::from)?;

    let trie = Arc::new(Trie::new(storage.clone()));
    let events = Arc::new(NullEventSink);
    let reward_schedule = Arc::new(FixedRewardSchedule::new(alephium_types::output::Amount::from_u64(1_000_000_000_000_000_000)));
    let script_decoder = Arc::new(NullScriptDecoder);
    let outputs = Arc::new(GenesisOutputResolver::new(&genesis_blocks));

    let orchestrator = Orchestrator::new(
        flow,
        config.clone(),
        events,
        storage,
        trie,
        Hash::ZERO,
        reward_schedule,
        script_decoder,
        outputs,
    );

    let (tx, rx) = tokio::sync::mpsc::channel(256);
    let handle = OrchestratorHandle::new(tx);
    let orchestrator_task = tokio::spawn(orchestrator.run(rx));

    let (from, _) = config.group_range();
    let home_chain = ChainIndex::new(GroupIndex::new(from, config.num_groups), GroupIndex::new(from, config.num_groups));
    let network_identity = genesis::identity_hash(config.num_groups, 0);
    let _inbound = OrchestratorInbound::new(handle, home_chain, network_identity);
    tracing::info!(target: "node", event = "ready", home_chain = ?home_chain, "orchestrator loop running; no transport wired, awaiting shutdown");

    tokio::signal::ctrl_c().await?;
    tracing::info!(target: "node", event = "shutdown", "ctrl-c received, dropping orchestrator handle");
    drop(_inbound);
    orchestrator_task.abort();

    Ok(())
}
