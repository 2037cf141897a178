use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("unknown bridge stage '{0}'")]
    UnknownStage(String),

    #[error("invalid last finalized job marker '{0}', expected 'unknown'")]
    InvalidJobMarker(String),

    #[error("empty address")]
    EmptyAddress,
}
