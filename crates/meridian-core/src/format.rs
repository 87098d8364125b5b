//! # Number Formatting
//!
//! Shared formatting helpers for grid cells and editor buffers.
//!
//! Every numeric cell in the order grid renders as a thousands-separated,
//! fixed-precision string (`1234.5` at precision 2 → `"1,234.50"`), and
//! every commit parses that representation back leniently (separators are
//! stripped, unparsable text collapses to zero). Keeping both directions
//! in one module guarantees the editors and the display path never
//! disagree about what a cell looks like.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// The separator inserted between thousands groups.
pub const GROUP_SEPARATOR: char = ',';

/// The decimal point character.
pub const DECIMAL_POINT: char = '.';

// =============================================================================
// Rendering
// =============================================================================

/// Formats a value with thousands separators and exactly `precision`
/// fractional digits.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
/// use meridian_core::format::format_grouped;
///
/// let v = Decimal::from_str("1234.5").unwrap();
/// assert_eq!(format_grouped(v, 2), "1,234.50");
/// ```
pub fn format_grouped(value: Decimal, precision: u32) -> String {
    let fixed = format_fixed(value, precision);
    group_fixed(&fixed)
}

/// Formats a value with exactly `precision` fractional digits and no
/// separators. Used by the discount editor, which commits plain decimals.
pub fn format_fixed(value: Decimal, precision: u32) -> String {
    let rounded = value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.prec$}", rounded, prec = precision as usize)
}

/// Inserts thousands separators into an already fixed-precision string.
fn group_fixed(fixed: &str) -> String {
    let (sign, rest) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed),
    };

    let (int_part, frac_part) = match rest.split_once(DECIMAL_POINT) {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };

    let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    grouped.push_str(sign);
    let digits: Vec<char> = int_part.chars().collect();
    for (i, d) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(*d);
    }

    if let Some(frac) = frac_part {
        grouped.push(DECIMAL_POINT);
        grouped.push_str(frac);
    }

    grouped
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a (possibly grouped) decimal string leniently.
///
/// Separators are stripped before parsing; anything that still fails to
/// parse collapses to zero. The editors guarantee their buffers only ever
/// contain digits, separators and a decimal point, so the zero fallback
/// covers degenerate buffers like `""` or `"."`.
pub fn parse_grouped(text: &str) -> Decimal {
    let stripped: String = text
        .trim()
        .chars()
        .filter(|c| *c != GROUP_SEPARATOR)
        .collect();
    Decimal::from_str(&stripped).unwrap_or(Decimal::ZERO)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_format_grouped() {
        assert_eq!(format_grouped(dec("0"), 2), "0.00");
        assert_eq!(format_grouped(dec("1234.5"), 2), "1,234.50");
        assert_eq!(format_grouped(dec("1234567.891"), 2), "1,234,567.89");
        assert_eq!(format_grouped(dec("999"), 2), "999.00");
        assert_eq!(format_grouped(dec("1000"), 0), "1,000");
    }

    #[test]
    fn test_format_grouped_negative() {
        assert_eq!(format_grouped(dec("-1234.5"), 2), "-1,234.50");
    }

    #[test]
    fn test_format_fixed() {
        assert_eq!(format_fixed(dec("100"), 2), "100.00");
        assert_eq!(format_fixed(dec("12.345"), 2), "12.35");
    }

    #[test]
    fn test_parse_grouped() {
        assert_eq!(parse_grouped("1,234.50"), dec("1234.50"));
        assert_eq!(parse_grouped("  42 "), dec("42"));
        assert_eq!(parse_grouped(""), Decimal::ZERO);
        assert_eq!(parse_grouped("."), Decimal::ZERO);
        assert_eq!(parse_grouped("garbage"), Decimal::ZERO);
    }

    #[test]
    fn test_round_trip() {
        let v = dec("9876543.21");
        assert_eq!(parse_grouped(&format_grouped(v, 2)), v);
    }
}
