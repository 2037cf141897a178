pub use crate::{
    account::{EthAddress, MinaAddress},
    bridge::{BridgeJobState, BridgeStage, JobWindow, LastFinalizedJob, TimingsExtension},
    finality::EthFinalityState,
    mint::{CodeVerifier, EthDepositProof, MinaTransaction, TxHash},
    snapshot::DepositSnapshot,
    status::DepositProcessingStatus,
};
