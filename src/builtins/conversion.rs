//! `to_number`, `to_string`, `to_bool`.

use crate::error::RuntimeError;
use crate::value::format_number;

pub fn to_number(s: &str) -> Result<f64, RuntimeError> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| RuntimeError::conversion(s, "number"))
}

pub fn to_string(n: f64) -> String {
    format_number(n)
}

pub fn to_bool(s: &str) -> Result<bool, RuntimeError> {
    match s.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(RuntimeError::conversion(s, "bool")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_number_parses_integers_and_decimals() {
        assert_eq!(to_number("7").unwrap(), 7.0);
        assert_eq!(to_number("3.5").unwrap(), 3.5);
    }

    #[test]
    fn to_number_rejects_malformed_input() {
        assert!(to_number("seven").is_err());
    }

    #[test]
    fn to_string_matches_canonical_number_format() {
        assert_eq!(to_string(7.0), "7");
        assert_eq!(to_string(7.5), "7.5");
    }

    #[test]
    fn to_bool_accepts_exact_literals() {
        assert_eq!(to_bool("true").unwrap(), true);
        assert_eq!(to_bool("false").unwrap(), false);
    }

    #[test]
    fn to_bool_rejects_anything_else() {
        assert!(to_bool("yes").is_err());
        assert!(to_bool("1").is_err());
    }
}
