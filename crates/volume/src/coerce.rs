//! Default-on-parse-failure rule for numeric cells.
//!
//! Quantities and CBM values arrive as whatever the spreadsheet held. Anything
//! that is not a finite number becomes [`NUMERIC_DEFAULT`]; bad cells never
//! abort a run.

use crate::model::Cell;

/// Value substituted for empty, non-numeric, NaN or infinite cells.
pub const NUMERIC_DEFAULT: f64 = 0.0;

/// Parse trimmed text as a finite `f64`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numeric value of a cell, or [`NUMERIC_DEFAULT`].
pub fn coerce_number(cell: &Cell) -> f64 {
    match cell {
        Cell::Number(n) if n.is_finite() => *n,
        Cell::Number(_) | Cell::Empty => NUMERIC_DEFAULT,
        Cell::Text(s) => parse_number(s).unwrap_or(NUMERIC_DEFAULT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_pass_through() {
        assert_eq!(coerce_number(&Cell::Number(4.5)), 4.5);
        assert_eq!(coerce_number(&Cell::Number(-2.0)), -2.0);
    }

    #[test]
    fn numeric_text_is_parsed() {
        assert_eq!(coerce_number(&Cell::text(" 12 ")), 12.0);
        assert_eq!(coerce_number(&Cell::text("0.034")), 0.034);
        assert_eq!(coerce_number(&Cell::text("1e2")), 100.0);
    }

    #[test]
    fn garbage_defaults_to_zero() {
        assert_eq!(coerce_number(&Cell::Empty), NUMERIC_DEFAULT);
        assert_eq!(coerce_number(&Cell::text("n/a")), NUMERIC_DEFAULT);
        assert_eq!(coerce_number(&Cell::text("1,200")), NUMERIC_DEFAULT);
        assert_eq!(coerce_number(&Cell::text("NaN")), NUMERIC_DEFAULT);
        assert_eq!(coerce_number(&Cell::text("inf")), NUMERIC_DEFAULT);
        assert_eq!(coerce_number(&Cell::Number(f64::NAN)), NUMERIC_DEFAULT);
    }

    #[test]
    fn parse_rejects_blank() {
        assert_eq!(parse_number("   "), None);
        assert_eq!(parse_number("+3"), Some(3.0));
    }
}
