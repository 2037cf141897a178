use std::{path::PathBuf, time::Duration};

use minter_resolver::ResolverConfig;
use serde::Deserialize;

use crate::{args::Args, constants::*, errors::InitError};

fn default_rpc_host() -> String {
    DEFAULT_RPC_HOST.to_string()
}

fn default_rpc_port() -> u16 {
    DEFAULT_RPC_PORT
}

fn default_datadir() -> PathBuf {
    PathBuf::from(DEFAULT_DATADIR)
}

fn default_db_retry_count() -> u16 {
    ROCKSDB_RETRY_COUNT
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_FEED_POLL_INTERVAL_MS
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ClientConfig {
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,
    #[serde(default = "default_datadir")]
    pub datadir: PathBuf,
    #[serde(default = "default_db_retry_count")]
    pub db_retry_count: u16,
}

/// Depositor identity. The code verifier is a secret, so only its location is configured.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AccountsConfig {
    pub eth_address: String,
    pub mina_address: String,
    pub code_verifier_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WorkerConfig {
    pub rpc_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FeedsConfig {
    pub eth_finality_url: String,
    pub bridge_state_url: String,
    pub bridge_timings_url: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl FeedsConfig {
    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResolverSection {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for ResolverSection {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Config {
    pub client: ClientConfig,
    pub accounts: AccountsConfig,
    pub worker: WorkerConfig,
    pub feeds: FeedsConfig,
    #[serde(default)]
    pub resolver: ResolverSection,
}

impl Config {
    pub(crate) fn update_from_args(&mut self, args: &Args) {
        if let Some(datadir) = &args.datadir {
            self.client.datadir = datadir.clone();
        }
        if let Some(rpc_port) = args.rpc_port {
            self.client.rpc_port = rpc_port;
        }
    }

    /// Checks the values serde can't, intervals are used as timer periods.
    pub(crate) fn validate(&self) -> Result<(), InitError> {
        if self.feeds.poll_interval_ms == 0 {
            return Err(InitError::ZeroInterval("feeds.poll_interval_ms"));
        }
        if self.resolver.tick_interval_ms == 0 {
            return Err(InitError::ZeroInterval("resolver.tick_interval_ms"));
        }
        Ok(())
    }

    pub(crate) fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            tick_interval: Duration::from_millis(self.resolver.tick_interval_ms),
        }
    }

    pub(crate) fn rpc_addr(&self) -> String {
        format!("{}:{}", self.client.rpc_host, self.client.rpc_port)
    }
}
