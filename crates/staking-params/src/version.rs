//! A single version of the staking parameters
//!
//! [`RawParameterVersion`] is the wire form read from the parameter file.
//! [`RawParameterVersion::validate`] checks every field and the invariants
//! local to one record, producing a [`ValidatedParameterVersion`].

use crate::amount::{Amount, MIN_UNBONDING_OUTPUT_VALUE};
use crate::field::{
    parse_amount, parse_cap_mode, parse_confirmation_depth, parse_count, parse_positive,
    parse_public_key, parse_timelock, CapMode, FieldError,
};
use secp256k1::PublicKey;
use serde::{Deserialize, Deserializer, Serialize};

/// Length of the staking tag in bytes
pub const TAG_LEN: usize = 4;

/// Unvalidated parameter version as it appears in the parameter file
///
/// Missing and `null` fields decode as zero so that their absence is
/// reported by validation with the field name attached.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawParameterVersion {
    /// Version number
    #[serde(deserialize_with = "null_as_default")]
    pub version: u64,
    /// Bitcoin height at which this version takes effect
    #[serde(deserialize_with = "null_as_default")]
    pub activation_height: u64,
    /// Fixed staking cap in satoshis (0 = unset)
    #[serde(skip_serializing_if = "is_zero", deserialize_with = "null_as_default")]
    pub staking_cap: u64,
    /// Height-based staking cap (0 = unset)
    #[serde(skip_serializing_if = "is_zero", deserialize_with = "null_as_default")]
    pub cap_height: u64,
    /// Hex encoded staking tag
    #[serde(deserialize_with = "null_as_default")]
    pub tag: String,
    /// Hex encoded covenant public keys
    #[serde(deserialize_with = "null_as_default")]
    pub covenant_pks: Vec<String>,
    /// Covenant signatures required
    #[serde(deserialize_with = "null_as_default")]
    pub covenant_quorum: u64,
    /// Unbonding timelock in blocks
    #[serde(deserialize_with = "null_as_default")]
    pub unbonding_time: u64,
    /// Unbonding fee in satoshis
    #[serde(deserialize_with = "null_as_default")]
    pub unbonding_fee: u64,
    /// Maximum staking amount in satoshis
    #[serde(deserialize_with = "null_as_default")]
    pub max_staking_amount: u64,
    /// Minimum staking amount in satoshis
    #[serde(deserialize_with = "null_as_default")]
    pub min_staking_amount: u64,
    /// Maximum staking timelock in blocks
    #[serde(deserialize_with = "null_as_default")]
    pub max_staking_time: u64,
    /// Minimum staking timelock in blocks
    #[serde(deserialize_with = "null_as_default")]
    pub min_staking_time: u64,
    /// Confirmations required for a staking transaction
    #[serde(deserialize_with = "null_as_default")]
    pub confirmation_depth: u64,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

/// Decode an explicit JSON `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A parameter version that passed all record-local checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedParameterVersion {
    /// Version number
    pub version: u64,
    /// Bitcoin height at which this version takes effect
    pub activation_height: u64,
    /// Staking cap in effect
    pub cap: CapMode,
    /// Staking tag
    pub tag: [u8; TAG_LEN],
    /// Covenant public keys, in the order given by the parameter file
    pub covenant_pks: Vec<PublicKey>,
    /// Covenant signatures required
    pub covenant_quorum: u32,
    /// Unbonding timelock in blocks
    pub unbonding_time: u16,
    /// Unbonding fee
    pub unbonding_fee: Amount,
    /// Maximum staking amount
    pub max_staking_amount: Amount,
    /// Minimum staking amount
    pub min_staking_amount: Amount,
    /// Maximum staking timelock in blocks
    pub max_staking_time: u16,
    /// Minimum staking timelock in blocks
    pub min_staking_time: u16,
    /// Confirmations required for a staking transaction
    pub confirmation_depth: u16,
}

impl ValidatedParameterVersion {
    /// Fixed staking cap, zero when a cap height is used instead
    pub fn staking_cap(&self) -> Amount {
        self.cap.fixed_amount().unwrap_or(Amount::ZERO)
    }

    /// Cap height, zero when a fixed staking cap is used instead
    pub fn cap_height(&self) -> u64 {
        self.cap.height().unwrap_or(0)
    }

    /// Check whether this version's activation height has been reached
    pub fn is_active_at(&self, height: u64) -> bool {
        height >= self.activation_height
    }
}

/// Reasons a single parameter version is rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VersionError {
    /// Tag is not valid hex
    #[error("invalid tag: {0}")]
    InvalidTag(#[source] FieldError),

    /// Tag decodes to the wrong number of bytes
    #[error("invalid tag length, expected {expected}, got {got}")]
    InvalidTagLength {
        /// Required length
        expected: usize,
        /// Decoded length
        got: usize,
    },

    /// No covenant keys were given
    #[error("empty covenant public keys")]
    EmptyCovenantKeys,

    /// Quorum cannot be met by the covenant committee
    #[error("covenant quorum {quorum} cannot be more than the amount of covenants {covenants}")]
    QuorumExceedsCovenants {
        /// Declared quorum
        quorum: u64,
        /// Number of covenant keys
        covenants: usize,
    },

    /// A covenant key failed to parse
    #[error("invalid covenant public key {key}: {source}")]
    InvalidCovenantKey {
        /// Offending hex string
        key: String,
        /// Underlying parse error
        source: FieldError,
    },

    /// A numeric field failed to parse
    #[error("invalid {field}: {source}")]
    Field {
        /// Field name as it appears in the parameter file
        field: &'static str,
        /// Underlying parse error
        source: FieldError,
    },

    /// Activation height is zero
    #[error("activation_height: {0}")]
    ActivationHeight(#[source] FieldError),

    /// Maximum staking amount below the minimum
    #[error(
        "max-staking-amount {} must be larger than or equal to min-staking-amount {}",
        .max.to_sat(),
        .min.to_sat()
    )]
    StakingAmountRange {
        /// Maximum staking amount
        max: Amount,
        /// Minimum staking amount
        min: Amount,
    },

    /// Minimum stake would leave a dust unbonding output
    #[error(
        "min_staking_amount {} should not be less than unbonding fee {} plus {}",
        .min.to_sat(),
        .fee.to_sat(),
        .margin.to_sat()
    )]
    InsufficientUnbondingHeadroom {
        /// Minimum staking amount
        min: Amount,
        /// Unbonding fee
        fee: Amount,
        /// Required margin above the fee
        margin: Amount,
    },

    /// Maximum staking time below the minimum
    #[error("max-staking-time {max} must be larger than or equal to min-staking-time {min}")]
    StakingTimeRange {
        /// Maximum staking time
        max: u16,
        /// Minimum staking time
        min: u16,
    },

    /// Fixed staking cap below the maximum staking amount
    #[error(
        "invalid staking_cap, should be larger than max_staking_amount: {}, got: {}",
        .max.to_sat(),
        .cap.to_sat()
    )]
    StakingCapBelowMax {
        /// Maximum staking amount
        max: Amount,
        /// Staking cap
        cap: Amount,
    },
}

impl VersionError {
    /// Whether the failure is a malformed encoding rather than a bad value
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            VersionError::InvalidTag(_) | VersionError::InvalidCovenantKey { .. }
        )
    }

    /// Whether the failure is a single value out of range
    pub fn is_field_range(&self) -> bool {
        matches!(
            self,
            VersionError::Field { .. } | VersionError::ActivationHeight(_)
        )
    }
}

fn field<T>(name: &'static str, result: Result<T, FieldError>) -> Result<T, VersionError> {
    result.map_err(|source| VersionError::Field {
        field: name,
        source,
    })
}

impl RawParameterVersion {
    /// Validate this record in isolation
    pub fn validate(&self) -> Result<ValidatedParameterVersion, VersionError> {
        let tag_bytes =
            hex::decode(&self.tag).map_err(|e| VersionError::InvalidTag(FieldError::from(e)))?;
        let tag: [u8; TAG_LEN] =
            tag_bytes
                .as_slice()
                .try_into()
                .map_err(|_| VersionError::InvalidTagLength {
                    expected: TAG_LEN,
                    got: tag_bytes.len(),
                })?;

        if self.covenant_pks.is_empty() {
            return Err(VersionError::EmptyCovenantKeys);
        }
        if self.covenant_quorum > self.covenant_pks.len() as u64 {
            return Err(VersionError::QuorumExceedsCovenants {
                quorum: self.covenant_quorum,
                covenants: self.covenant_pks.len(),
            });
        }
        let covenant_quorum = field("covenant quorum", parse_count(self.covenant_quorum))?;

        let covenant_pks = self
            .covenant_pks
            .iter()
            .map(|key| {
                parse_public_key(key).map_err(|source| VersionError::InvalidCovenantKey {
                    key: key.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let max_staking_amount =
            field("max_staking_amount", parse_amount(self.max_staking_amount))?;
        let min_staking_amount =
            field("min_staking_amount", parse_amount(self.min_staking_amount))?;
        // Equal bounds configure a fixed staking amount
        if max_staking_amount < min_staking_amount {
            return Err(VersionError::StakingAmountRange {
                max: max_staking_amount,
                min: min_staking_amount,
            });
        }

        let unbonding_time = field("unbonding_time", parse_timelock(self.unbonding_time))?;
        let unbonding_fee = field("unbonding_fee", parse_amount(self.unbonding_fee))?;
        let headroom_ok = unbonding_fee
            .checked_add(MIN_UNBONDING_OUTPUT_VALUE)
            .is_some_and(|required| min_staking_amount >= required);
        if !headroom_ok {
            return Err(VersionError::InsufficientUnbondingHeadroom {
                min: min_staking_amount,
                fee: unbonding_fee,
                margin: MIN_UNBONDING_OUTPUT_VALUE,
            });
        }

        let max_staking_time = field("max_staking_time", parse_timelock(self.max_staking_time))?;
        let min_staking_time = field("min_staking_time", parse_timelock(self.min_staking_time))?;
        // Equal bounds configure a fixed staking time
        if max_staking_time < min_staking_time {
            return Err(VersionError::StakingTimeRange {
                max: max_staking_time,
                min: min_staking_time,
            });
        }

        let confirmation_depth = field(
            "confirmation_depth",
            parse_confirmation_depth(self.confirmation_depth),
        )?;

        let activation_height =
            parse_positive(self.activation_height).map_err(VersionError::ActivationHeight)?;

        let cap = field("cap", parse_cap_mode(self.staking_cap, self.cap_height))?;
        if let CapMode::Fixed(staking_cap) = cap {
            if staking_cap < max_staking_amount {
                return Err(VersionError::StakingCapBelowMax {
                    max: max_staking_amount,
                    cap: staking_cap,
                });
            }
        }

        Ok(ValidatedParameterVersion {
            version: self.version,
            activation_height,
            cap,
            tag,
            covenant_pks,
            covenant_quorum,
            unbonding_time,
            unbonding_fee,
            max_staking_amount,
            min_staking_amount,
            max_staking_time,
            min_staking_time,
            confirmation_depth,
        })
    }
}
