//! Fixed-point money handling. Amounts never pass through binary floats.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Largest value a `NUMERIC(10,2)` column can hold.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount is not a decimal number")]
    NotANumber,
    #[error("amount must be positive")]
    NotPositive,
    #[error("amount is too large")]
    TooLarge,
}

/// Parse a user-typed amount into a two-digit fixed-point value.
///
/// Accepts a single token of ASCII digits with at most one `.`; signs,
/// exponents, separators and embedded whitespace are rejected. The value is
/// rounded half away from zero to cents before the positivity check, so
/// `0.001` is rejected rather than stored as `0.00`.
pub fn parse_amount(input: &str) -> Result<Decimal, AmountError> {
    let token = input.trim();
    if token.is_empty() {
        return Err(AmountError::Empty);
    }

    let digits = token.chars().filter(|c| c.is_ascii_digit()).count();
    let dots = token.chars().filter(|&c| c == '.').count();
    if digits == 0 || dots > 1 || digits + dots != token.chars().count() {
        return Err(AmountError::NotANumber);
    }

    let raw = Decimal::from_str(token).map_err(|_| AmountError::NotANumber)?;
    let amount = to_cents(raw);
    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }
    if amount > MAX_AMOUNT {
        return Err(AmountError::TooLarge);
    }
    Ok(amount)
}

/// Round to exactly two fractional digits.
pub fn to_cents(value: Decimal) -> Decimal {
    let mut out = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    out.rescale(2);
    out
}

/// Render as `$12.50`.
pub fn format_money(value: Decimal) -> String {
    format!("${}", to_cents(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn max_amount_matches_numeric_10_2() {
        assert_eq!(MAX_AMOUNT, dec("99999999.99"));
    }

    #[test]
    fn parses_and_pads_to_two_digits() {
        let amt = parse_amount("12.5").unwrap();
        assert_eq!(amt.to_string(), "12.50");
        assert_eq!(format_money(amt), "$12.50");

        assert_eq!(parse_amount(" 7 ").unwrap().to_string(), "7.00");
        assert_eq!(parse_amount("0.01").unwrap().to_string(), "0.01");
        assert_eq!(parse_amount("99999999.99").unwrap(), MAX_AMOUNT);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(parse_amount("1.005").unwrap().to_string(), "1.01");
        assert_eq!(parse_amount("1.004").unwrap().to_string(), "1.00");
    }

    #[test]
    fn rejects_zero_negative_and_garbage() {
        assert_eq!(parse_amount("0"), Err(AmountError::NotPositive));
        assert_eq!(parse_amount("0.00"), Err(AmountError::NotPositive));
        assert_eq!(parse_amount("0.004"), Err(AmountError::NotPositive));
        assert_eq!(parse_amount("-5"), Err(AmountError::NotANumber));
        assert_eq!(parse_amount("abc"), Err(AmountError::NotANumber));
        assert_eq!(parse_amount("1e3"), Err(AmountError::NotANumber));
        assert_eq!(parse_amount("1.2.3"), Err(AmountError::NotANumber));
        assert_eq!(parse_amount("12 50"), Err(AmountError::NotANumber));
        assert_eq!(parse_amount("."), Err(AmountError::NotANumber));
        assert_eq!(parse_amount("   "), Err(AmountError::Empty));
        assert_eq!(parse_amount("100000000"), Err(AmountError::TooLarge));
    }

    #[test]
    fn sums_are_exact() {
        let total: Decimal = ["10.00", "5.50", "2.00"]
            .iter()
            .map(|s| parse_amount(s).unwrap())
            .sum();
        assert_eq!(format_money(total), "$17.50");
        assert_eq!(format_money(dec("0.1") + dec("0.2")), "$0.30");
    }
}
