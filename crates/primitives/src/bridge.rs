//! Types describing the state of the external bridge pipeline.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::ParseError;

/// A named phase of a bridge job, in pipeline order.
///
/// The derived ordering follows the declaration order, which is the order in which a job moves
/// through the stages.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum BridgeStage {
    BridgeHeadJobCreated,
    BridgeHeadJobSucceeded,
    ProofConversionJobReceived,
    ProofConversionJobSucceeded,
    EthProcessorProofRequest,
    EthProcessorProofSucceeded,
    EthProcessorTransactionSubmitting,
    /// The job's transaction was accepted on the destination chain. Once a job reaches this
    /// stage its window is about to be cemented.
    EthProcessorTransactionSubmitSucceeded,
    /// Terminal stage, the job's window is final on the destination chain.
    EthProcessorTransactionFinalizationSucceeded,
}

impl BridgeStage {
    pub const ALL: [BridgeStage; 9] = [
        BridgeStage::BridgeHeadJobCreated,
        BridgeStage::BridgeHeadJobSucceeded,
        BridgeStage::ProofConversionJobReceived,
        BridgeStage::ProofConversionJobSucceeded,
        BridgeStage::EthProcessorProofRequest,
        BridgeStage::EthProcessorProofSucceeded,
        BridgeStage::EthProcessorTransactionSubmitting,
        BridgeStage::EthProcessorTransactionSubmitSucceeded,
        BridgeStage::EthProcessorTransactionFinalizationSucceeded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BridgeStage::BridgeHeadJobCreated => "BridgeHeadJobCreated",
            BridgeStage::BridgeHeadJobSucceeded => "BridgeHeadJobSucceeded",
            BridgeStage::ProofConversionJobReceived => "ProofConversionJobReceived",
            BridgeStage::ProofConversionJobSucceeded => "ProofConversionJobSucceeded",
            BridgeStage::EthProcessorProofRequest => "EthProcessorProofRequest",
            BridgeStage::EthProcessorProofSucceeded => "EthProcessorProofSucceeded",
            BridgeStage::EthProcessorTransactionSubmitting => "EthProcessorTransactionSubmitting",
            BridgeStage::EthProcessorTransactionSubmitSucceeded => {
                "EthProcessorTransactionSubmitSucceeded"
            }
            BridgeStage::EthProcessorTransactionFinalizationSucceeded => {
                "EthProcessorTransactionFinalizationSucceeded"
            }
        }
    }

    pub fn is_finalization_succeeded(&self) -> bool {
        matches!(self, BridgeStage::EthProcessorTransactionFinalizationSucceeded)
    }
}

impl fmt::Display for BridgeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BridgeStage {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BridgeStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| ParseError::UnknownStage(s.to_string()))
    }
}

/// Inclusive range of deposit block numbers covered by a bridge job.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct JobWindow {
    pub input_block_number: u64,
    pub output_block_number: u64,
}

impl JobWindow {
    pub fn new(input_block_number: u64, output_block_number: u64) -> Self {
        Self {
            input_block_number,
            output_block_number,
        }
    }

    pub fn contains(&self, block_number: u64) -> bool {
        self.input_block_number <= block_number && block_number <= self.output_block_number
    }
}

/// Window of the most recently finalized bridge job.
///
/// The bridge reports `"unknown"` when it has no record of a finalized job, for example right
/// after a service restart.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLastFinalizedJob", into = "RawLastFinalizedJob")]
pub enum LastFinalizedJob {
    Unknown,
    Known(JobWindow),
}

impl LastFinalizedJob {
    pub fn window(&self) -> Option<&JobWindow> {
        match self {
            LastFinalizedJob::Unknown => None,
            LastFinalizedJob::Known(window) => Some(window),
        }
    }
}

const UNKNOWN_JOB_MARKER: &str = "unknown";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawLastFinalizedJob {
    Marker(String),
    Window(JobWindow),
}

impl TryFrom<RawLastFinalizedJob> for LastFinalizedJob {
    type Error = ParseError;

    fn try_from(raw: RawLastFinalizedJob) -> Result<Self, Self::Error> {
        match raw {
            RawLastFinalizedJob::Marker(m) if m == UNKNOWN_JOB_MARKER => {
                Ok(LastFinalizedJob::Unknown)
            }
            RawLastFinalizedJob::Marker(m) => Err(ParseError::InvalidJobMarker(m)),
            RawLastFinalizedJob::Window(w) => Ok(LastFinalizedJob::Known(w)),
        }
    }
}

impl From<LastFinalizedJob> for RawLastFinalizedJob {
    fn from(job: LastFinalizedJob) -> Self {
        match job {
            LastFinalizedJob::Unknown => RawLastFinalizedJob::Marker(UNKNOWN_JOB_MARKER.into()),
            LastFinalizedJob::Known(w) => RawLastFinalizedJob::Window(w),
        }
    }
}

/// State of the currently running bridge job, as published by the bridge.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BridgeJobState {
    /// Raw stage name, kept as a string so stages the client doesn't know about still flow
    /// through.
    pub stage_name: String,

    /// Seconds spent in the current stage.
    pub elapsed_sec: u64,

    pub input_block_number: u64,

    pub output_block_number: u64,

    pub last_finalized_job: LastFinalizedJob,
}

impl BridgeJobState {
    /// Parsed stage, `None` if the stage name isn't a known one.
    pub fn stage(&self) -> Option<BridgeStage> {
        self.stage_name.parse().ok()
    }

    pub fn window(&self) -> JobWindow {
        JobWindow::new(self.input_block_number, self.output_block_number)
    }
}

/// Dynamic per-stage expected durations (in seconds) published by the bridge.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimingsExtension(BTreeMap<String, u64>);

impl TimingsExtension {
    pub fn new(timings: BTreeMap<String, u64>) -> Self {
        Self(timings)
    }

    pub fn get(&self, stage_name: &str) -> Option<u64> {
        self.0.get(stage_name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, u64)> for TimingsExtension {
    fn from_iter<T: IntoIterator<Item = (String, u64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert!(
            BridgeStage::EthProcessorTransactionSubmitting
                < BridgeStage::EthProcessorTransactionSubmitSucceeded
        );
        assert!(
            BridgeStage::EthProcessorTransactionSubmitSucceeded
                < BridgeStage::EthProcessorTransactionFinalizationSucceeded
        );
    }

    #[test]
    fn test_stage_from_str() {
        for stage in BridgeStage::ALL {
            assert_eq!(stage.as_str().parse::<BridgeStage>().unwrap(), stage);
        }
        assert!("NotAStage".parse::<BridgeStage>().is_err());
    }

    #[test]
    fn test_bridge_state_json() {
        let json = r#"{
            "stage_name": "EthProcessorProofRequest",
            "elapsed_sec": 12,
            "input_block_number": 150,
            "output_block_number": 200,
            "last_finalized_job": { "input_block_number": 90, "output_block_number": 140 }
        }"#;
        let state: BridgeJobState = serde_json::from_str(json).unwrap();
        assert_eq!(state.stage(), Some(BridgeStage::EthProcessorProofRequest));
        assert_eq!(
            state.last_finalized_job,
            LastFinalizedJob::Known(JobWindow::new(90, 140))
        );

        let json = r#"{
            "stage_name": "SomethingNew",
            "elapsed_sec": 0,
            "input_block_number": 1,
            "output_block_number": 2,
            "last_finalized_job": "unknown"
        }"#;
        let state: BridgeJobState = serde_json::from_str(json).unwrap();
        assert_eq!(state.stage(), None);
        assert_eq!(state.last_finalized_job, LastFinalizedJob::Unknown);

        let back = serde_json::to_value(&state).unwrap();
        assert_eq!(back["last_finalized_job"], "unknown");
    }

    #[test]
    fn test_bad_job_marker() {
        let res = serde_json::from_str::<LastFinalizedJob>(r#""pending""#);
        assert!(res.is_err());
    }

    #[test]
    fn test_window_contains() {
        let w = JobWindow::new(150, 200);
        assert!(w.contains(150));
        assert!(w.contains(200));
        assert!(!w.contains(149));
        assert!(!w.contains(201));
    }
}
