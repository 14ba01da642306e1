//! Versioned Bitcoin staking parameters
//!
//! This crate parses and validates the global parameter file of a Bitcoin
//! staking protocol and answers which parameter version is in effect at a
//! given Bitcoin block height.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod error;
pub mod field;
pub mod params;
pub mod shared;
pub mod version;

pub use amount::{Amount, MAX_AMOUNT_SAT, MIN_UNBONDING_OUTPUT_VALUE};
pub use error::{Error, ErrorCategory, Result};
pub use field::{CapMode, FieldError, ValueKind};
pub use params::{last_fixed_staking_cap, GlobalParams, ParameterSet};
pub use shared::SharedParameterSet;
pub use version::{RawParameterVersion, ValidatedParameterVersion, VersionError, TAG_LEN};
