//! Opaque artifacts produced and consumed by the mint workflow.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Deposit attestation proof computed by the worker.
///
/// The client never looks inside the proof, it only persists it and hands it back to the worker
/// when building the mint transaction.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EthDepositProof(serde_json::Value);

impl EthDepositProof {
    pub fn new(inner: serde_json::Value) -> Self {
        Self(inner)
    }

    pub fn inner(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Serialized destination chain transaction, ready to be signed and submitted.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinaTransaction(String);

impl MinaTransaction {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Hash of a submitted transaction.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Secret used by the worker to derive the deposit credential.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeVerifier(String);

impl CodeVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CodeVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CodeVerifier(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_verifier_redacted() {
        let cv = CodeVerifier::new("super-secret");
        assert!(!format!("{cv:?}").contains("super-secret"));
        assert_eq!(cv.expose(), "super-secret");
    }
}
