//! Bitcoin amount limits used by parameter validation

pub use bitcoin::Amount;

/// Minimum unbonding output value (in satoshis).
///
/// Keeps the unbonding output above the Bitcoin dust limit once the
/// unbonding fee has been paid.
pub const MIN_UNBONDING_OUTPUT_VALUE: Amount = Amount::from_sat(1_000);

/// Largest accepted amount in satoshis, the signed 64-bit range
pub const MAX_AMOUNT_SAT: u64 = i64::MAX as u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_in_satoshis() {
        assert_eq!(MIN_UNBONDING_OUTPUT_VALUE.to_sat(), 1_000);
    }

    #[test]
    fn test_checked_add_overflow() {
        assert_eq!(
            Amount::from_sat(1_000).checked_add(MIN_UNBONDING_OUTPUT_VALUE),
            Some(Amount::from_sat(2_000))
        );
        assert_eq!(Amount::max_value().checked_add(Amount::from_sat(1)), None);
    }
}
