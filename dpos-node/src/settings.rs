// Copyright (c) 2022 MASSA LABS <info@massa.net>

use dpos_consensus_exports::ConsensusConfig;
use dpos_factory_exports::FactoryConfig;
use dpos_models::{Address, ExceptionTable};
use dpos_pool_exports::PoolConfig;
use dpos_protocol_exports::ProtocolConfig;
use dpos_rounds::RoundsConfig;
use serde::Deserialize;
use std::path::Path;

pub const BASE_CONFIG_PATH: &str = "base_config/config.toml";
pub const OVERRIDE_CONFIG_PATH: &str = "config/config.toml";
const ENV_PREFIX: &str = "DPOS";

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SequenceSettings {
    /// queue depth above which the balances and storage sequences warn
    pub warning_threshold: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub sequences: SequenceSettings,
    #[serde(default)]
    pub exceptions: ExceptionTable,
    pub protocol: ProtocolConfig,
    pub rounds: RoundsConfig,
    pub pool: PoolConfig,
    pub consensus: ConsensusConfig,
    pub factory: FactoryConfig,
}

impl Settings {
    /// Base configuration, overlaid by `override_path` when it exists, then by `DPOS_`
    /// environment variables (`DPOS_CONSENSUS__BROADCAST_BLOCKS=false`)
    pub fn load(override_path: &Path) -> Result<Settings, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(BASE_CONFIG_PATH))
            .add_source(config::File::from(override_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?
            .checked()
    }

    /// Rejects values the wire formats cannot carry
    fn checked(self) -> Result<Settings, config::ConfigError> {
        Address::check_version(self.rounds.address_version)
            .map_err(|err| config::ConfigError::Message(format!("rounds.address_version: {}", err)))?;
        Ok(self)
    }

    /// Factory settings sharing the chain parameters of consensus
    pub fn factory_config(&self, extra_passphrases: Vec<String>) -> FactoryConfig {
        let mut delegate_passphrases = self.factory.delegate_passphrases.clone();
        delegate_passphrases.extend(extra_passphrases);
        FactoryConfig {
            delegate_passphrases,
            epoch: self.consensus.epoch,
            block_time: self.consensus.block_time,
            block_version: self.consensus.block_version,
            max_transactions_per_block: self.consensus.max_transactions_per_block,
            milestones: self.consensus.milestones.clone(),
            ..self.factory.clone()
        }
    }
}
