use rockbound::CodecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("value stored under {key} is malformed: {reason}")]
    MalformedValue { key: &'static str, reason: String },

    #[error("failed to encode value for {key}: {reason}")]
    Encode { key: &'static str, reason: String },

    #[error("rocksdb: {0}")]
    Rocksdb(#[from] rockbound::rocksdb::Error),

    #[error("transaction error: {0}")]
    TransactionError(String),

    #[error("codec error {0}")]
    CodecError(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for DbError {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(value.to_string())
    }
}

impl From<CodecError> for DbError {
    fn from(value: CodecError) -> Self {
        Self::CodecError(value.to_string())
    }
}
