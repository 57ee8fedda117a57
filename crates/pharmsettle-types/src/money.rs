//! Whole-unit rounding for currency amounts.

use rust_decimal::Decimal;

/// Round to the nearest whole currency unit, halves toward positive infinity.
///
/// `2.5 → 3`, `-2.5 → -2`, `333.33 → 333`.
#[must_use]
pub fn round_unit(amount: Decimal) -> Decimal {
    (amount + Decimal::new(5, 1)).floor()
}

/// Build a ratio from a whole percentage (`30 → 0.30`).
#[must_use]
pub fn pct(percent: u32) -> Decimal {
    Decimal::new(i64::from(percent), 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up() {
        assert_eq!(round_unit(Decimal::new(25, 1)), Decimal::new(3, 0));
        assert_eq!(round_unit(Decimal::new(-25, 1)), Decimal::new(-2, 0));
        assert_eq!(round_unit(Decimal::new(33333, 2)), Decimal::new(333, 0));
        assert_eq!(round_unit(Decimal::new(4999, 4)), Decimal::ZERO);
    }

    #[test]
    fn integers_unchanged() {
        assert_eq!(round_unit(Decimal::new(1000, 0)), Decimal::new(1000, 0));
        assert_eq!(round_unit(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn pct_scale() {
        assert_eq!(pct(30), Decimal::new(3, 1));
        assert_eq!(pct(100), Decimal::ONE);
    }
}
