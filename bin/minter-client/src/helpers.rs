use std::{fs, path::Path, sync::Arc};

use anyhow::Context;
use format_serde_error::SerdeError;
use minter_orchestrator::OrchestratorConfig;
use minter_primitives::prelude::*;
use rockbound::rocksdb;

use crate::{config::Config, errors::InitError};

pub(crate) fn load_configuration(path: &Path) -> Result<Config, InitError> {
    let config_str = fs::read_to_string(path)?;
    let conf =
        toml::from_str::<Config>(&config_str).map_err(|err| SerdeError::new(config_str, err))?;
    conf.validate()?;
    Ok(conf)
}

/// Reads the code verifier secret, ignoring surrounding whitespace.
pub(crate) fn load_code_verifier(path: &Path) -> Result<CodeVerifier, InitError> {
    let raw = fs::read_to_string(path)?;
    let secret = raw.trim();
    if secret.is_empty() {
        return Err(InitError::EmptyCodeVerifier);
    }
    Ok(CodeVerifier::new(secret))
}

pub(crate) fn build_orchestrator_config(config: &Config) -> Result<OrchestratorConfig, InitError> {
    let eth_address = config.accounts.eth_address.parse::<EthAddress>()?;
    let mina_address = config.accounts.mina_address.parse::<MinaAddress>()?;
    let code_verifier = load_code_verifier(&config.accounts.code_verifier_path)?;

    Ok(
        OrchestratorConfig::new(eth_address, mina_address, code_verifier)
            .with_resolver(config.resolver_config()),
    )
}

pub(crate) fn open_rocksdb_database(
    config: &Config,
) -> anyhow::Result<Arc<rockbound::OptimisticTransactionDB>> {
    let mut database_dir = config.client.datadir.clone();
    database_dir.push("rocksdb");

    if !database_dir.exists() {
        fs::create_dir_all(&database_dir)?;
    }

    let dbname = minter_rocksdb::ROCKSDB_NAME;
    let cfs = minter_rocksdb::STORE_COLUMN_FAMILIES;
    let mut opts = rocksdb::Options::default();
    opts.create_if_missing(true);
    opts.create_missing_column_families(true);

    let rbdb = rockbound::OptimisticTransactionDB::open(
        &database_dir,
        dbname,
        cfs.iter().map(|s| s.to_string()),
        &opts,
    )
    .context("opening database")?;

    Ok(Arc::new(rbdb))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_load_code_verifier_trims() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "  s3cret  ").unwrap();

        let verifier = load_code_verifier(file.path()).unwrap();
        assert_eq!(verifier.expose(), "s3cret");
    }

    #[test]
    fn test_empty_code_verifier_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "   ").unwrap();

        let err = load_code_verifier(file.path()).unwrap_err();
        assert!(matches!(err, InitError::EmptyCodeVerifier));
    }

    const VALID_SECTIONS: &str = r#"
        [client]

        [accounts]
        eth_address = "0xdepositor"
        mina_address = "B62recipient"
        code_verifier_path = "verifier"

        [worker]
        rpc_url = "http://localhost:8550"
    "#;

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "{VALID_SECTIONS}\n[feeds]\neth_finality_url = \"http://a\"\nbridge_state_url = \"http://b\"\nbridge_timings_url = \"http://c\"\npoll_interval_ms = 0"
        )
        .unwrap();

        let err = load_configuration(file.path()).unwrap_err();
        assert!(matches!(
            err,
            InitError::ZeroInterval("feeds.poll_interval_ms")
        ));
    }

    #[test]
    fn test_zero_tick_interval_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "{VALID_SECTIONS}\n[feeds]\neth_finality_url = \"http://a\"\nbridge_state_url = \"http://b\"\nbridge_timings_url = \"http://c\"\n\n[resolver]\ntick_interval_ms = 0"
        )
        .unwrap();

        let err = load_configuration(file.path()).unwrap_err();
        assert!(matches!(
            err,
            InitError::ZeroInterval("resolver.tick_interval_ms")
        ));
    }

    #[test]
    fn test_malformed_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[client]\nrpc_port = \"not a port\"").unwrap();

        let err = load_configuration(file.path()).unwrap_err();
        assert!(matches!(err, InitError::MalformedConfig(_)));
    }
}
