// Path: crates/orchestrator/src/orchestrator.rs

//! The single-writer admission loop: the only place in this workspace that
//! calls `alephium_flow::validate_block` and mutates `BlockFlow`. Grounded
//! in the teacher's `orchestration::events::handle_network_event`
//! dispatch-by-match pattern and `orchestration::ingestion`'s
//! batching-consumer loop, collapsed here to a single `mpsc::Receiver` since
//! this kernel has one writer rather than the teacher's multi-stage
//! ingestion pipeline.

use std::sync::Arc;

use alephium_api::events::{BlockNotify, EventSink};
use alephium_api::storage::Storage;
use alephium_flow::error::FlowError;
use alephium_flow::validation::{BlockValidationContext, RewardSchedule, ScriptDecoder};
use alephium_flow::{validate_block, BlockFlow};
use alephium_state::{ContractPool, StagingOverlay, Trie};
use alephium_types::config::KernelConfig;
use alephium_types::{BlockHash, ChainIndex, Hash};
use alephium_vm::OutputResolver;
use tokio::sync::mpsc;

use crate::command::Command;
use crate::mempool::{AddResult, Mempool};
use crate::pending::PendingPool;

/// Everything the admission loop owns. Constructed once per node and moved
/// into [`Orchestrator::run`]; every other component talks to it only
/// through an [`crate::command::OrchestratorHandle`].
pub struct Orchestrator {
    flow: BlockFlow,
    mempool: Mempool,
    pending: PendingPool,
    config: KernelConfig,
    events: Arc<dyn EventSink>,
    storage: Arc<dyn Storage>,
    trie: Arc<Trie>,
    state_root: Hash,
    reward_schedule: Arc<dyn RewardSchedule>,
    script_decoder: Arc<dyn ScriptDecoder>,
    outputs: Arc<dyn OutputResolver + Send + Sync>,
}

impl Orchestrator {
    /// Assembles an orchestrator over an already-opened `BlockFlow` and the
    /// components block validation needs (reward schedule, script decoder,
    /// output resolver), starting from `state_root` as the current
    /// world-state trie root.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        flow: BlockFlow,
        config: KernelConfig,
        events: Arc<dyn EventSink>,
        storage: Arc<dyn Storage>,
        trie: Arc<Trie>,
        state_root: Hash,
        reward_schedule: Arc<dyn RewardSchedule>,
        script_decoder: Arc<dyn ScriptDecoder>,
        outputs: Arc<dyn OutputResolver + Send + Sync>,
    ) -> Self {
        Orchestrator {
            flow,
            mempool: Mempool::new(config.mempool.clone()),
            pending: PendingPool::new(),
            config,
            events,
            storage,
            trie,
            state_root,
            reward_schedule,
            script_decoder,
            outputs,
        }
    }

    /// The single-writer loop: consumes commands until the channel closes
    /// (every `OrchestratorHandle` dropped).
    pub async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                Command::AddBlock { chain_index, block, reply } => {
                    let result = self.handle_add_block(chain_index, block).await;
                    let _ = reply.send(result);
                }
                Command::AddTx { chain_index, tx, reply } => {
                    self.mempool.evict_expired(current_millis());
                    let result = self.mempool.add(chain_index, tx, current_millis());
                    let _ = reply.send(result);
                }
                Command::GetLocators { chain_index, reply } => {
                    let result = self.handle_get_locators(chain_index);
                    let _ = reply.send(result);
                }
                Command::GetInventory { chain_index, locator_hashes, reply } => {
                    let result = self.handle_get_inventory(chain_index, locator_hashes);
                    let _ = reply.send(result);
                }
                Command::GetHeaders { chain_index, locator_hashes, max_headers, reply } => {
                    let result = self.handle_get_headers(chain_index, locator_hashes, max_headers);
                    let _ = reply.send(result);
                }
                Command::GetBlocks { chain_index, locator_hashes, max_blocks, reply } => {
                    let result = self.handle_get_blocks(chain_index, locator_hashes, max_blocks).await;
                    let _ = reply.send(result);
                }
            }
        }
        tracing::info!("orchestrator loop stopped: all handles dropped");
    }

    async fn handle_add_block(
        &mut self,
        chain_index: ChainIndex,
        block: alephium_types::Block,
    ) -> Result<(), FlowError> {
        let parent_hash = block.header.parent_hash(chain_index.from.value(), self.config.num_groups);
        let parent = self.flow.chain(chain_index)?.header(&parent_hash)?.clone();

        let mut staging = StagingOverlay::new(self.trie.clone(), self.state_root);
        let mut contract_pool = ContractPool::new();
        let mut ctx = BlockValidationContext {
            chain_index,
            num_groups: self.config.num_groups,
            consensus_config: &self.config.consensus,
            vm_config: &self.config.vm,
            reward_schedule: self.reward_schedule.as_ref(),
            script_decoder: self.script_decoder.as_ref(),
            outputs: self.outputs.as_ref(),
            staging: &mut staging,
            contract_pool: &mut contract_pool,
            block_timestamp: 0,
        };

        match validate_block(&block, &parent, &self.flow, &mut ctx).await {
            Ok(()) => {}
            Err(FlowError::InvalidBlock(alephium_types::error::InvalidBlockError::MissingDeps(missing))) => {
                let first = *missing.first().expect("MissingDeps is never empty");
                self.pending.park(first, block);
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        let hash = block.hash();
        let height = self.flow.chain(chain_index)?.height_of(&parent_hash)?.saturating_add(1);
        self.flow.chain_mut(chain_index)?.add_header(block.header.clone()).await?;
        self.flow.chain_mut(chain_index)?.store_block(&block).await?;
        self.flow.conflict_cache_mut().add(BlockHash::from(hash), block.header.timestamp, block.non_coinbase());
        self.flow.update_best_deps(&[chain_index.from.value()])?;

        let (new_root, batch) = staging.into_batch();
        self.storage.commit(batch).await?;
        self.state_root = new_root;

        self.events.block_notify(BlockNotify { block_hash: BlockHash::from(hash), height }).await;

        for tx in block.non_coinbase() {
            self.mempool.remove(chain_index, &tx.id());
        }
        for ready in self.pending.take_ready(&hash) {
            let _ = Box::pin(self.handle_add_block(chain_index, ready)).await;
        }

        Ok(())
    }

    fn handle_get_locators(&self, chain_index: ChainIndex) -> Result<Vec<Hash>, FlowError> {
        let chain = self.flow.chain(chain_index)?;
        let height = chain.height();
        let heights = alephium_flow::sample_heights(height);
        Ok(heights.into_iter().filter_map(|h| chain.canonical_at(h)).collect())
    }

    fn handle_get_inventory(&self, chain_index: ChainIndex, locator_hashes: Vec<Hash>) -> Result<Vec<Hash>, FlowError> {
        let chain = self.flow.chain(chain_index)?;
        let ancestor = locator_hashes.into_iter().find(|h| chain.is_canonical(h));
        let ancestor = match ancestor {
            Some(a) => a,
            None => chain.genesis_hash(),
        };
        let tip = chain.canonical_tip();
        if ancestor == tip {
            return Ok(Vec::new());
        }
        let path = chain.hashes_between(&ancestor, &tip)?;
        Ok(path.into_iter().skip(1).collect())
    }

    /// `hashes_between` the common ancestor (resolved the same way as
    /// `handle_get_inventory`) and the chain's tip, capped at `limit`.
    fn hashes_past_locator(&self, chain_index: ChainIndex, locator_hashes: Vec<Hash>, limit: u32) -> Result<Vec<Hash>, FlowError> {
        let chain = self.flow.chain(chain_index)?;
        let ancestor = locator_hashes.into_iter().find(|h| chain.is_canonical(h)).unwrap_or_else(|| chain.genesis_hash());
        let tip = chain.canonical_tip();
        if ancestor == tip {
            return Ok(Vec::new());
        }
        let path = chain.hashes_between(&ancestor, &tip)?;
        Ok(path.into_iter().skip(1).take(limit as usize).collect())
    }

    fn handle_get_headers(
        &self,
        chain_index: ChainIndex,
        locator_hashes: Vec<Hash>,
        max_headers: u32,
    ) -> Result<Vec<alephium_types::BlockHeader>, FlowError> {
        let hashes = self.hashes_past_locator(chain_index, locator_hashes, max_headers)?;
        let chain = self.flow.chain(chain_index)?;
        hashes.iter().map(|h| chain.header(h).map(|header| header.clone())).collect()
    }

    async fn handle_get_blocks(
        &self,
        chain_index: ChainIndex,
        locator_hashes: Vec<Hash>,
        max_blocks: u32,
    ) -> Result<Vec<alephium_types::Block>, FlowError> {
        let hashes = self.hashes_past_locator(chain_index, locator_hashes, max_blocks)?;
        let mut blocks = Vec::with_capacity(hashes.len());
        for h in &hashes {
            let chain = self.flow.chain(chain_index)?;
            match chain.get_block(h).await? {
                Some(block) => blocks.push(block),
                None => return Err(FlowError::UnknownHash(*h)),
            }
        }
        Ok(blocks)
    }
}

fn current_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}
