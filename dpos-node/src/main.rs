// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! DPoS full node: wires storage, ledger, pool, consensus and the forging scheduler,
//! then runs until interrupted.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use dpos_consensus_exports::events::ConsensusEvent;
use dpos_consensus_exports::{
    ConsensusBroadcasts, ConsensusChannels, ConsensusController, ConsensusManager,
};
use dpos_consensus_worker::{start_consensus_controller, SharedSequences};
use dpos_factory_exports::{FactoryChannels, FactoryController, FactoryManager};
use dpos_factory_worker::start_factory;
use dpos_ledger::Ledger;
use dpos_pool_exports::PoolManager;
use dpos_pool_worker::start_pool_controller;
use dpos_protocol_exports::{OfflinePeerRpc, PeerRpc, PeerSet};
use dpos_sequence::{start_sequence, SequenceConfig, SequenceManager};
use dpos_storage::MemoryStorage;
use dpos_transactions::{TransactionConfig, TransactionEngine};
use settings::{Settings, OVERRIDE_CONFIG_PATH};
use std::path::{Path, PathBuf};
use std::thread;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "DPoS full node")]
struct Args {
    /// configuration file overlaid on the base configuration
    #[arg(short, long, default_value = OVERRIDE_CONFIG_PATH)]
    config: PathBuf,
    /// file holding the passphrases of the local delegates, one per line
    #[arg(short, long)]
    secrets: Option<PathBuf>,
}

/// Running components, stopped in dependency order
struct Node {
    consensus: Box<dyn ConsensusController>,
    factory: Box<dyn FactoryController>,
    factory_manager: Box<dyn FactoryManager>,
    consensus_manager: Box<dyn ConsensusManager>,
    pool_manager: Box<dyn PoolManager>,
    balances_manager: SequenceManager,
    storage_manager: SequenceManager,
}

fn read_secrets(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("could not read delegate secrets from {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

fn launch(settings: &Settings, secrets: Vec<String>) -> Result<Node> {
    let storage = MemoryStorage::new();
    let ledger = Ledger::new(Box::new(storage.clone()));
    let engine = TransactionEngine::new(
        TransactionConfig {
            address_version: settings.rounds.address_version,
            slot_clock: settings.consensus.slot_clock(),
            exceptions: settings.exceptions.clone(),
            ..Default::default()
        },
        Box::new(ledger.clone()),
        Box::new(storage.clone()),
    );

    let threshold = settings.sequences.warning_threshold;
    let (balances, balances_manager) = start_sequence(SequenceConfig::new("balances", threshold))?;
    let (storage_sequence, storage_manager) =
        start_sequence(SequenceConfig::new("storage", threshold))?;

    let (pool_manager, pool) =
        start_pool_controller(settings.pool.clone(), engine.clone(), balances.clone())?;

    // peer transport lives outside the node core
    let peer_rpc: Box<dyn PeerRpc> = Box::new(OfflinePeerRpc);
    let peer_set = PeerSet::new(&settings.protocol);
    let broadcasts = ConsensusBroadcasts::new(settings.consensus.event_channel_size);
    spawn_event_logger(broadcasts.subscribe())?;

    let (consensus_manager, consensus) = start_consensus_controller(
        settings.consensus.clone(),
        settings.rounds.clone(),
        ConsensusChannels {
            pool: pool.clone(),
            peer_rpc: peer_rpc.clone(),
            peer_set: peer_set.clone(),
            broadcasts: broadcasts.clone(),
        },
        engine,
        Box::new(ledger),
        Box::new(storage),
        SharedSequences {
            balances,
            storage: storage_sequence,
        },
    )?;

    let (factory_manager, factory) = start_factory(
        settings.factory_config(secrets),
        FactoryChannels {
            consensus: consensus.clone(),
            pool,
            peer_rpc,
            peer_set,
            broadcasts,
        },
    )?;

    Ok(Node {
        consensus,
        factory,
        factory_manager,
        consensus_manager,
        pool_manager,
        balances_manager,
        storage_manager,
    })
}

/// Logs the event bus until it closes
fn spawn_event_logger(mut events: broadcast::Receiver<ConsensusEvent>) -> Result<()> {
    thread::Builder::new()
        .name("event logger".into())
        .spawn(move || loop {
            match events.blocking_recv() {
                Ok(ConsensusEvent::Fork { block_id, cause }) => {
                    warn!("fork {:?} on block {:?}", cause, block_id)
                }
                Ok(event) => debug!("event: {:?}", event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("event logger skipped {} events", skipped)
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        })
        .context("could not spawn the event logger")?;
    Ok(())
}

impl Node {
    fn stop(&mut self) {
        self.factory_manager.stop();
        self.consensus_manager.stop();
        self.pool_manager.stop();
        // balances tasks write through the storage sequence
        self.balances_manager.stop();
        self.storage_manager.stop();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(&args.config).context("could not load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.level))
        .context("invalid logging level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let secrets = match &args.secrets {
        Some(path) => read_secrets(path)?,
        None => Vec::new(),
    };
    info!(
        "chain epoch {}, slots of {} s",
        settings.consensus.epoch.format_instant(),
        settings.consensus.block_time
    );
    let mut node = launch(&settings, secrets)?;

    let last = node.consensus.get_last_block();
    info!(
        "node started at height {} (block {}), {} local delegates, forging {}",
        last.height,
        last.id,
        node.factory.get_forging_delegates().len(),
        if node.factory.is_forging() { "enabled" } else { "disabled" }
    );

    let (stop_sender, stop_receiver) = crossbeam_channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = stop_sender.try_send(());
    })
    .context("could not install the interrupt handler")?;
    let _ = stop_receiver.recv();
    info!("interrupt signal received");

    node.stop();
    let stats = node.consensus.get_stats();
    info!("node stopped at height {}", stats.height);
    Ok(())
}
