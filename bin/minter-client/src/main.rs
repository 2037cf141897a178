use std::{sync::Arc, time::Duration};

use anyhow::Context;
use args::Args;
use minter_common::logging;
use minter_db::DepositStore;
use minter_orchestrator::spawn_orchestrator;
use minter_rocksdb::{DbOpsConfig, RocksKvStore};
use minter_status::FeedChannel;
use minter_tasks::TaskManager;
use minter_worker_client::RpcWorkerClient;
use tokio::runtime::Handle;
use tracing::*;

use crate::{
    constants::{FEED_REQUEST_TIMEOUT_SECS, SHUTDOWN_TIMEOUT_SECS},
    helpers::{build_orchestrator_config, load_configuration, open_rocksdb_database},
    rpc_server::MinterRpc,
};

mod args;
mod config;
mod constants;
mod errors;
mod feeds;
mod helpers;
mod rpc_server;

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();
    if let Err(e) = main_inner(args) {
        eprintln!("FATAL ERROR: {e:#}");

        return Err(e);
    }

    Ok(())
}

fn main_inner(args: Args) -> anyhow::Result<()> {
    // Start runtime for async IO tasks.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("minter-rt")
        .build()
        .context("init: build rt")?;

    // Init the logging before we do anything else.
    init_logging(runtime.handle())?;

    let mut config = load_configuration(&args.config)?;
    config.update_from_args(&args);
    let orch_config = build_orchestrator_config(&config)?;

    // Open and initialize the database.
    let rbdb = open_rocksdb_database(&config)?;
    let ops_config = DbOpsConfig::new(config.client.db_retry_count);
    let store = DepositStore::new(Arc::new(RocksKvStore::new(rbdb, ops_config)));

    let worker = Arc::new(
        RpcWorkerClient::new(&config.worker.rpc_url).context("creating worker rpc client")?,
    );
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(FEED_REQUEST_TIMEOUT_SECS))
        .build()
        .context("creating feed http client")?;

    let task_manager = TaskManager::new(runtime.handle().clone());
    let executor = task_manager.executor();

    info!("init finished, starting main tasks");

    let feeds = FeedChannel::new();
    feeds::spawn_feed_pollers(&executor, http_client, &config.feeds, feeds.clone());

    let orchestrator = spawn_orchestrator(&executor, orch_config, worker, store, feeds);

    let rpc = MinterRpc::new(orchestrator);
    let rpc_addr = config.rpc_addr();
    executor.spawn_critical_async_with_shutdown("main-rpc", |shutdown| async move {
        rpc_server::start(rpc, &rpc_addr, shutdown).await
    });

    task_manager.start_signal_listeners();
    let res = task_manager.monitor(Some(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS)));

    info!("exiting");
    logging::finalize();

    Ok(res?)
}

/// Sets up the logging system given a handle to a runtime context to possibly
/// start the OTLP output on.
fn init_logging(rt: &Handle) -> anyhow::Result<()> {
    let lconfig = logging::LoggerConfig::from_env("minter-client");

    // Need to set the runtime context because of nonsense.
    let _g = rt.enter();
    logging::init(lconfig).context("init: logging")?;

    Ok(())
}
