//! Lenient parsing of loosely typed request fields.
//!
//! Intake forms send optional patient metadata without a fixed type: a severity may arrive as
//! `7`, `7.0` or `"7"`, and occasionally as free text. These helpers turn whatever arrived into
//! the typed value the stores expect, or `None` when nothing usable was supplied. They never
//! fail.

use serde::Deserialize;

/// Any JSON scalar supplied for an optional field.
///
/// Arrays and objects deserialize to [`LooseValue::Other`] and are treated as not provided.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LooseValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Flag(bool),
    Other(serde::de::IgnoredAny),
}

impl LooseValue {
    /// Integer view. Floats and numeric text are truncated toward zero.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            LooseValue::Integer(n) => Some(*n),
            LooseValue::Float(f) => float_to_integer(*f),
            LooseValue::Text(s) => parse_truncated(s),
            LooseValue::Flag(_) | LooseValue::Other(_) => None,
        }
    }

    /// Real-number view.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            LooseValue::Integer(n) => Some(*n as f64),
            LooseValue::Float(f) if f.is_finite() => Some(*f),
            LooseValue::Float(_) => None,
            LooseValue::Text(s) => parse_number(s),
            LooseValue::Flag(_) | LooseValue::Other(_) => None,
        }
    }

    /// Text view. Blank strings count as not provided; numbers are rendered.
    pub fn as_text(&self) -> Option<String> {
        match self {
            LooseValue::Text(s) if s.trim().is_empty() => None,
            LooseValue::Text(s) => Some(s.clone()),
            LooseValue::Integer(n) => Some(n.to_string()),
            LooseValue::Float(f) => Some(f.to_string()),
            LooseValue::Flag(_) | LooseValue::Other(_) => None,
        }
    }
}

/// Parses an integer from free text, ignoring surrounding whitespace.
pub fn parse_integer(input: &str) -> Option<i64> {
    input.trim().parse::<i64>().ok()
}

/// Parses a whole number from free text. Real-valued text such as `"8.5"` or `"1e1"` is
/// truncated toward zero, the same way a JSON float is.
pub fn parse_truncated(input: &str) -> Option<i64> {
    parse_integer(input).or_else(|| parse_number(input).and_then(float_to_integer))
}

/// Parses a finite real number from free text, ignoring surrounding whitespace.
pub fn parse_number(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn float_to_integer(value: f64) -> Option<i64> {
    if !value.is_finite() || value.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(value.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loose(json: &str) -> LooseValue {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn integer_view_accepts_numbers_and_numeric_text() {
        assert_eq!(loose("7").as_integer(), Some(7));
        assert_eq!(loose("7.9").as_integer(), Some(7));
        assert_eq!(loose("\" 8 \"").as_integer(), Some(8));
    }

    #[test]
    fn integer_view_truncates_real_valued_text() {
        assert_eq!(loose("\"8.5\"").as_integer(), Some(8));
        assert_eq!(loose("\"9.0\"").as_integer(), Some(9));
        assert_eq!(loose("\"1e1\"").as_integer(), Some(10));
        assert_eq!(loose("\"7.5\"").as_integer(), Some(7));
        assert_eq!(loose("\"-2.7\"").as_integer(), Some(-2));
        assert_eq!(parse_truncated("NaN"), None);
    }

    #[test]
    fn integer_view_rejects_everything_else() {
        assert_eq!(loose("\"not-a-number\"").as_integer(), None);
        assert_eq!(loose("true").as_integer(), None);
        assert_eq!(loose("[1, 2]").as_integer(), None);
        assert_eq!(loose("{\"a\": 1}").as_integer(), None);
    }

    #[test]
    fn number_view() {
        assert_eq!(loose("150").as_number(), Some(150.0));
        assert_eq!(loose("\"65.5\"").as_number(), Some(65.5));
        assert_eq!(loose("\"tall\"").as_number(), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn text_view() {
        assert_eq!(loose("\"female\"").as_text(), Some("female".into()));
        assert_eq!(loose("\"  \"").as_text(), None);
        assert_eq!(loose("3").as_text(), Some("3".into()));
        assert_eq!(loose("false").as_text(), None);
    }

    #[test]
    fn missing_field_is_none() {
        #[derive(Deserialize)]
        struct Form {
            severity: Option<LooseValue>,
        }

        let form: Form = serde_json::from_str("{}").unwrap();
        assert!(form.severity.is_none());

        let form: Form = serde_json::from_str("{\"severity\": null}").unwrap();
        assert!(form.severity.is_none());
    }
}
