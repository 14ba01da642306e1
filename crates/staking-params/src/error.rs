//! Error types for staking parameter loading
//!
//! Any failure aborts the whole parse. Errors carry the declared version
//! number of the offending record and wrap the lower-level cause.

use crate::amount::Amount;
use crate::version::VersionError;
use std::fmt;

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Staking parameter errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Parameter file has no versions
    #[error("global params must have at least one version")]
    EmptyParameterSet,

    /// A single version failed validation
    #[error("invalid params with version {version}: {source}")]
    InvalidVersion {
        /// Declared version number
        version: u64,
        /// Cause
        source: VersionError,
    },

    /// Version does not follow its predecessor by exactly one
    #[error("invalid params with version {version}. versions should be monotonically increasing by 1")]
    NonSequentialVersion {
        /// Declared version number
        version: u64,
    },

    /// Fixed staking cap lower than an earlier fixed cap
    #[error("invalid params with version {version}. staking cap cannot be decreased in later versions, last non-zero staking cap: {}, got: {}", .last.to_sat(), .got.to_sat())]
    StakingCapDecreased {
        /// Declared version number
        version: u64,
        /// Most recent earlier fixed cap
        last: Amount,
        /// This version's cap
        got: Amount,
    },

    /// Activation height not above its predecessor
    #[error("invalid params with version {version}. activation height cannot be overlapping between earlier and later versions")]
    OverlappingActivation {
        /// Declared version number
        version: u64,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Declared version number of the offending record, if any
    pub fn version(&self) -> Option<u64> {
        match self {
            Error::InvalidVersion { version, .. }
            | Error::NonSequentialVersion { version }
            | Error::StakingCapDecreased { version, .. }
            | Error::OverlappingActivation { version } => Some(*version),
            Error::EmptyParameterSet | Error::Io(_) | Error::Json(_) => None,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Json(_) => ErrorCategory::Malformed,
            Error::InvalidVersion { source, .. } if source.is_malformed() => {
                ErrorCategory::Malformed
            }
            Error::InvalidVersion { source, .. } if source.is_field_range() => {
                ErrorCategory::FieldRange
            }
            Error::InvalidVersion {
                source: VersionError::StakingCapBelowMax { .. },
                ..
            } => ErrorCategory::CrossRecord,
            Error::InvalidVersion { .. } => ErrorCategory::RecordSemantic,
            Error::EmptyParameterSet
            | Error::NonSequentialVersion { .. }
            | Error::StakingCapDecreased { .. }
            | Error::OverlappingActivation { .. } => ErrorCategory::CrossRecord,
            Error::Io(_) => ErrorCategory::Io,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Unparseable JSON, hex or key encoding
    Malformed,
    /// A value is zero or exceeds its bit width
    FieldRange,
    /// Inconsistent values within one version
    RecordSemantic,
    /// Versions inconsistent with each other, or cap below max stake
    CrossRecord,
    /// Reading the parameter file failed
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Malformed => write!(f, "Malformed"),
            ErrorCategory::FieldRange => write!(f, "FieldRange"),
            ErrorCategory::RecordSemantic => write!(f, "RecordSemantic"),
            ErrorCategory::CrossRecord => write!(f, "CrossRecord"),
            ErrorCategory::Io => write!(f, "Io"),
        }
    }
}
