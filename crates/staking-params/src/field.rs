//! Field-level parsing of raw parameter values
//!
//! Every function here takes one untyped value from the wire form and either
//! returns a typed, range-checked value or a [`FieldError`] naming the bound
//! that was violated. Range checks run before positivity checks.

use crate::amount::{Amount, MAX_AMOUNT_SAT};
use secp256k1::PublicKey;

/// Minimum number of confirmations a staking transaction needs
pub const MIN_CONFIRMATION_DEPTH: u64 = 2;

/// Length of a compressed secp256k1 public key
pub const COMPRESSED_PUBLIC_KEY_LEN: usize = 33;

/// What a numeric value is parsed as, used to word range errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Plain positive integer
    Plain,
    /// Relative timelock or depth in blocks
    Timelock,
    /// Satoshi amount
    Btc,
    /// 32-bit count
    Count,
}

impl ValueKind {
    fn too_large_prefix(self) -> &'static str {
        match self {
            ValueKind::Timelock => "timelock ",
            ValueKind::Plain | ValueKind::Btc | ValueKind::Count => "",
        }
    }

    fn not_positive_prefix(self) -> &'static str {
        match self {
            ValueKind::Plain => "",
            ValueKind::Timelock => "invalid timelock value: ",
            ValueKind::Btc => "invalid btc value: ",
            ValueKind::Count => "invalid value: ",
        }
    }
}

/// Errors produced while parsing a single field
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    /// Value was zero where a positive value is required
    #[error("{}value must be positive", .kind.not_positive_prefix())]
    NotPositive {
        /// What the value was parsed as
        kind: ValueKind,
    },

    /// Value exceeds the width of its target type
    #[error("{}value {value} is too large. Max: {max}", .kind.too_large_prefix())]
    TooLarge {
        /// What the value was parsed as
        kind: ValueKind,
        /// Offending value
        value: u64,
        /// Largest accepted value
        max: u64,
    },

    /// Confirmation depth below the minimum
    #[error("confirmation depth value should be at least {min}, got {value}")]
    DepthTooSmall {
        /// Offending value
        value: u64,
        /// Smallest accepted value
        min: u64,
    },

    /// Malformed hex string
    #[error("{0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Bytes are not a compressed secp256k1 point
    #[error("{0}")]
    InvalidKeyEncoding(#[from] secp256k1::Error),

    /// Both cap fields are non-zero
    #[error("only either of staking cap and cap height can be set")]
    BothCapsSet,

    /// Neither cap field is set
    #[error("either of staking cap and cap height must be set")]
    NoCapSet,
}

/// How the staking cap of a parameter version is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapMode {
    /// Absolute ceiling on the total staked amount
    Fixed(Amount),
    /// Bitcoin height after which staking is no longer accepted
    Height(u64),
}

impl CapMode {
    /// Fixed cap amount, if this is a fixed cap
    pub fn fixed_amount(&self) -> Option<Amount> {
        match self {
            CapMode::Fixed(amount) => Some(*amount),
            CapMode::Height(_) => None,
        }
    }

    /// Cap height, if this is a height-based cap
    pub fn height(&self) -> Option<u64> {
        match self {
            CapMode::Fixed(_) => None,
            CapMode::Height(height) => Some(*height),
        }
    }
}

fn check_positive(kind: ValueKind, value: u64) -> Result<u64, FieldError> {
    if value == 0 {
        return Err(FieldError::NotPositive { kind });
    }
    Ok(value)
}

fn check_max(kind: ValueKind, value: u64, max: u64) -> Result<u64, FieldError> {
    if value > max {
        return Err(FieldError::TooLarge { kind, value, max });
    }
    Ok(value)
}

/// Require a non-zero value
pub fn parse_positive(value: u64) -> Result<u64, FieldError> {
    check_positive(ValueKind::Plain, value)
}

/// Parse a relative timelock in blocks
pub fn parse_timelock(value: u64) -> Result<u16, FieldError> {
    let timelock = narrow_u16(value)?;
    check_positive(ValueKind::Timelock, value)?;
    Ok(timelock)
}

/// Parse a confirmation depth, which must be at least [`MIN_CONFIRMATION_DEPTH`]
pub fn parse_confirmation_depth(value: u64) -> Result<u16, FieldError> {
    let depth = narrow_u16(value)?;
    if value < MIN_CONFIRMATION_DEPTH {
        return Err(FieldError::DepthTooSmall {
            value,
            min: MIN_CONFIRMATION_DEPTH,
        });
    }
    Ok(depth)
}

/// Parse a positive satoshi amount within the signed 64-bit range
pub fn parse_amount(value: u64) -> Result<Amount, FieldError> {
    check_max(ValueKind::Btc, value, MAX_AMOUNT_SAT)?;
    check_positive(ValueKind::Btc, value)?;
    Ok(Amount::from_sat(value))
}

/// Parse a positive count that fits in a `u32`
pub fn parse_count(value: u64) -> Result<u32, FieldError> {
    let count = u32::try_from(value).map_err(|_| FieldError::TooLarge {
        kind: ValueKind::Count,
        value,
        max: u64::from(u32::MAX),
    })?;
    check_positive(ValueKind::Count, value)?;
    Ok(count)
}

/// Parse a hex encoded 33-byte compressed secp256k1 public key
pub fn parse_public_key(hex_key: &str) -> Result<PublicKey, FieldError> {
    let bytes = hex::decode(hex_key)?;
    // from_slice also accepts 65-byte uncompressed keys
    if bytes.len() != COMPRESSED_PUBLIC_KEY_LEN {
        return Err(FieldError::InvalidKeyEncoding(
            secp256k1::Error::InvalidPublicKey,
        ));
    }
    Ok(PublicKey::from_slice(&bytes)?)
}

/// Resolve which of the two cap fields is in effect
pub fn parse_cap_mode(staking_cap: u64, cap_height: u64) -> Result<CapMode, FieldError> {
    match (staking_cap, cap_height) {
        (0, 0) => Err(FieldError::NoCapSet),
        (cap, 0) => Ok(CapMode::Fixed(parse_amount(cap)?)),
        (0, height) => Ok(CapMode::Height(height)),
        _ => Err(FieldError::BothCapsSet),
    }
}

// Confirmation depths share the timelock wording when too large
fn narrow_u16(value: u64) -> Result<u16, FieldError> {
    u16::try_from(value).map_err(|_| FieldError::TooLarge {
        kind: ValueKind::Timelock,
        value,
        max: u64::from(u16::MAX),
    })
}
