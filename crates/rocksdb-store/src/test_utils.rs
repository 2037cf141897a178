use std::sync::Arc;

use rockbound::{rocksdb, OptimisticTransactionDB};
use tempfile::TempDir;

use crate::{DbOpsConfig, ROCKSDB_NAME, STORE_COLUMN_FAMILIES};

/// Opens a database in a fresh temporary directory.
///
/// The directory is removed once the returned [`TempDir`] is dropped, so keep it around for as
/// long as the database is used.
pub fn get_rocksdb_tmp_instance() -> anyhow::Result<(Arc<OptimisticTransactionDB>, DbOpsConfig, TempDir)> {
    let dbname = ROCKSDB_NAME;
    let cfs = STORE_COLUMN_FAMILIES;
    let mut opts = rocksdb::Options::default();
    opts.create_if_missing(true);
    opts.create_missing_column_families(true);

    let temp_dir = TempDir::new()?;
    let rbdb = OptimisticTransactionDB::open(
        temp_dir.path(),
        dbname,
        cfs.iter().map(|s| s.to_string()),
        &opts,
    )?;

    Ok((Arc::new(rbdb), DbOpsConfig::new(5), temp_dir))
}
