//! ff_io — the snapshot codec: parses untrusted JSON into a validated
//! [`ff_core::flagdef::ConfigurationView`] and serializes one back losslessly.
//!
//! Errors are values, not exceptions: every parse path returns
//! `Result<_, ParseError>` rather than panicking on malformed input.

pub mod canonical_json;
pub mod snapshot;
pub mod value_codec;

pub use snapshot::{load_snapshot, to_snapshot_value, LoadOptions, Snapshot, UnknownFeatureKeyStrategy};

use thiserror::Error;

/// The error taxonomy returned from parsing untrusted snapshot JSON.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid hex id: {0}")]
    InvalidHexId(String),
    #[error("invalid rollout: {0}")]
    InvalidRollout(String),
    #[error("invalid version: {0}")]
    InvalidVersion(String),
    #[error("feature not found: {0}")]
    FeatureNotFound(String),
    #[error("flag not found: {0}")]
    FlagNotFound(String),
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
    #[error("invalid json: {0}")]
    InvalidJson(String),
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        ParseError::InvalidJson(e.to_string())
    }
}

impl From<ff_core::errors::CoreError> for ParseError {
    fn from(e: ff_core::errors::CoreError) -> Self {
        use ff_core::errors::CoreError::*;
        match e {
            InvalidHexId => ParseError::InvalidHexId(e.to_string()),
            InvalidRollout => ParseError::InvalidRollout(e.to_string()),
            InvalidVersion => ParseError::InvalidVersion(e.to_string()),
            InvalidToken | EmptyChoiceSet | AxisTypeConflict => ParseError::InvalidSnapshot(e.to_string()),
        }
    }
}

/// A warning emitted by [`UnknownFeatureKeyStrategy::Skip`] for a dropped
/// feature, rather than failing the whole load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotWarning {
    pub feature: String,
    pub message: String,
}
