//! Money helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal` in Brazilian reais (BRL).

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places stored for BRL amounts.
pub const CENTS_SCALE: u32 = 2;

/// Rounds an amount to cents using half-up rounding (away from zero at 0.005).
#[must_use]
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CENTS_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Floors negative values at zero; non-negative values pass through.
#[must_use]
pub fn floor_zero(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Formats an amount the way Brazilian users read it: `R$ 1.234,56`.
#[must_use]
pub fn format_brl(value: Decimal) -> String {
    let rounded = round_cents(value);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-R$ {grouped},{frac_part}")
    } else {
        format!("R$ {grouped},{frac_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_cents_half_up() {
        assert_eq!(round_cents(dec!(500.005)), dec!(500.01));
        assert_eq!(round_cents(dec!(500.004)), dec!(500.00));
        assert_eq!(round_cents(dec!(-0.005)), dec!(-0.01));
    }

    #[test]
    fn test_floor_zero() {
        assert_eq!(floor_zero(dec!(-10.50)), Decimal::ZERO);
        assert_eq!(floor_zero(dec!(10.50)), dec!(10.50));
        assert_eq!(floor_zero(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(dec!(0)), "R$ 0,00");
        assert_eq!(format_brl(dec!(12.5)), "R$ 12,50");
        assert_eq!(format_brl(dec!(1234.56)), "R$ 1.234,56");
        assert_eq!(format_brl(dec!(1234567.891)), "R$ 1.234.567,89");
        assert_eq!(format_brl(dec!(-950)), "-R$ 950,00");
    }
}
