use std::fmt;

use serde::{Deserialize, Serialize};

/// Processing status of a single deposit, as derived from the finality and bridge feeds.
///
/// The statuses are not a linear chain: a deposit can go from
/// [`WaitingForPreviousJobCompletion`](Self::WaitingForPreviousJobCompletion) straight to
/// [`MissedMintingOpportunity`](Self::MissedMintingOpportunity) if the bridge window moves past
/// it, but it never goes back to
/// [`WaitingForEthFinality`](Self::WaitingForEthFinality) once finality has covered it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum DepositProcessingStatus {
    /// The deposit block is not finalized on the source chain yet.
    WaitingForEthFinality,

    /// The running bridge job ends before the deposit block.
    WaitingForPreviousJobCompletion,

    /// The running bridge job covers the deposit block but has not finalized yet.
    WaitingForCurrentJobCompletion,

    /// The deposit is covered by a finalized bridge job and can be minted.
    ReadyToMint,

    /// The bridge window moved past the deposit before it could be minted.
    MissedMintingOpportunity,
}

impl DepositProcessingStatus {
    /// Whether the deposit attestation proof can be computed, i.e. a bridge job that is running or
    /// was last finalized covers the deposit.
    pub fn can_compute_eth_proof(&self) -> bool {
        matches!(
            self,
            Self::WaitingForCurrentJobCompletion | Self::ReadyToMint
        )
    }

    /// Whether the mint transaction can be built and submitted.
    pub fn can_mint(&self) -> bool {
        matches!(self, Self::ReadyToMint)
    }

    /// Terminal status, nothing will be emitted after it.
    pub fn is_missed(&self) -> bool {
        matches!(self, Self::MissedMintingOpportunity)
    }
}

impl fmt::Display for DepositProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::WaitingForEthFinality => "waiting-for-eth-finality",
            Self::WaitingForPreviousJobCompletion => "waiting-for-previous-job",
            Self::WaitingForCurrentJobCompletion => "waiting-for-current-job",
            Self::ReadyToMint => "ready-to-mint",
            Self::MissedMintingOpportunity => "missed-minting-opportunity",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligibility_flags() {
        use DepositProcessingStatus::*;

        let proof_ok: Vec<_> = [
            WaitingForEthFinality,
            WaitingForPreviousJobCompletion,
            WaitingForCurrentJobCompletion,
            ReadyToMint,
            MissedMintingOpportunity,
        ]
        .into_iter()
        .filter(|s| s.can_compute_eth_proof())
        .collect();

        assert_eq!(proof_ok, vec![WaitingForCurrentJobCompletion, ReadyToMint]);
        assert!(ReadyToMint.can_mint());
        assert!(!WaitingForCurrentJobCompletion.can_mint());
        assert!(MissedMintingOpportunity.is_missed());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&DepositProcessingStatus::ReadyToMint).unwrap();
        assert_eq!(json, "\"ReadyToMint\"");
    }
}
