/// Default address the control RPC server listens on.
pub(crate) const DEFAULT_RPC_HOST: &str = "127.0.0.1";

pub(crate) const DEFAULT_RPC_PORT: u16 = 4782;

pub(crate) const DEFAULT_DATADIR: &str = "minter-data";

/// The default rocksdb database retry count, if not overridden by the user.
pub(crate) const ROCKSDB_RETRY_COUNT: u16 = 3;

pub(crate) const DEFAULT_FEED_POLL_INTERVAL_MS: u64 = 5_000;

/// A single feed request never takes longer than this.
pub(crate) const FEED_REQUEST_TIMEOUT_SECS: u64 = 10;

pub(crate) const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;

pub(crate) const SHUTDOWN_TIMEOUT_SECS: u64 = 5;
