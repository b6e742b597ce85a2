//! Order total calculation
//!
//! All arithmetic runs on `Decimal`; results go back to `f64` rounded
//! half-up to 2 decimal places for storage and serialization.

use rust_decimal::prelude::*;

/// Rounding precision for monetary values
const DECIMAL_PLACES: u32 = 2;

/// Anything that contributes `unit_price × quantity` to a total
pub trait PricedLine {
    fn unit_price(&self) -> f64;
    fn quantity(&self) -> i32;
}

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

fn line_decimal<L: PricedLine + ?Sized>(line: &L) -> Decimal {
    to_decimal(line.unit_price()) * Decimal::from(line.quantity())
}

/// `unit_price × quantity` for one line
pub fn line_total<L: PricedLine + ?Sized>(line: &L) -> f64 {
    to_f64(line_decimal(line))
}

/// Sum of `unit_price × quantity` over all lines; empty input yields 0
pub fn order_total<L: PricedLine>(lines: &[L]) -> f64 {
    let sum: Decimal = lines.iter().map(line_decimal).sum();
    to_f64(sum.max(Decimal::ZERO))
}

/// Two-decimal display formatting, e.g. `$45.00`
pub fn format_money(amount: f64) -> String {
    format!("${:.2}", to_f64(to_decimal(amount)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Line(f64, i32);

    impl PricedLine for Line {
        fn unit_price(&self) -> f64 {
            self.0
        }
        fn quantity(&self) -> i32 {
            self.1
        }
    }

    #[test]
    fn test_empty_total_is_zero() {
        let lines: Vec<Line> = vec![];
        assert_eq!(order_total(&lines), 0.0);
    }

    #[test]
    fn test_tacos_scenario() {
        assert_eq!(order_total(&[Line(15.0, 3)]), 45.0);
    }

    #[test]
    fn test_total_matches_sum_of_lines() {
        let lines = vec![Line(15.0, 3), Line(22.5, 2), Line(0.0, 4), Line(9.99, 1)];
        let expected: f64 = lines.iter().map(line_total).sum();
        assert_eq!(order_total(&lines), 99.99);
        assert!((order_total(&lines) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_no_float_drift() {
        // 0.1 × 3 stays 0.3
        assert_eq!(order_total(&[Line(0.1, 3)]), 0.3);
        let many: Vec<Line> = (0..1000).map(|_| Line(0.01, 1)).collect();
        assert_eq!(order_total(&many), 10.0);
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(45.0), "$45.00");
        assert_eq!(format_money(12.5), "$12.50");
        assert_eq!(format_money(0.0), "$0.00");
    }
}
