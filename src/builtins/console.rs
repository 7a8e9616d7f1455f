//! `print` / `output`: both write the canonical string form of each
//! argument to standard output, space-separated, followed by a newline.
//! Actual writing goes through the evaluator's output sink so callers can
//! capture it; this module only formats the line.

use crate::value::Value;

pub fn format_line(args: &[Value]) -> String {
    args.iter()
        .map(Value::display_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_argument() {
        assert_eq!(format_line(&[Value::Number(7.0)]), "7");
    }

    #[test]
    fn multiple_arguments_space_separated() {
        assert_eq!(
            format_line(&[Value::Str("val=".to_string()), Value::Number(7.0)]),
            "val= 7"
        );
    }
}
