use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::domain::error::DomainError;
use crate::domain::literal;
use crate::domain::value::InlistValue;

const QUOTE_MARKERS: &[&str] = &["'", "\""];
const BOOL_MARKERS: &[&str] = &["False", "FALSE", "True", "TRUE"];
const FALSE_MARKERS: &[&str] = &["False", "FALSE"];
const LIST_MARKERS: &[&str] = &["[", "]"];
const TUPLE_MARKERS: &[&str] = &["(", ")"];
const NONE_MARKERS: &[&str] = &["None"];
const FLOAT_MARKERS: &[&str] = &["."];

fn scientific_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d+[eE][+-]?\d+").expect("valid scientific regex"))
}

fn integer_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d+(_\d+)*$").expect("valid integer regex"))
}

fn contains_any(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| text.contains(m))
}

fn contains_all(text: &str, markers: &[&str]) -> bool {
    markers.iter().all(|m| text.contains(m))
}

/// Infer the type of a raw value token and convert it.
///
/// Checks run in a fixed order and are substring based: anything holding a
/// quote is a string (or a list of strings), then booleans, `None`, lists,
/// tuples, floats, and finally integers.
pub fn type_value(key: &str, raw: &str) -> Result<InlistValue, DomainError> {
    let wrap = |e: DomainError| match e {
        DomainError::InvalidLiteral { message, .. } => DomainError::typing(key, raw, message),
        other => other,
    };

    if contains_any(raw, QUOTE_MARKERS) {
        if contains_all(raw, LIST_MARKERS) {
            debug!(key, raw, "value is a list of strings");
            return literal::evaluate(raw).map_err(wrap);
        }
        let unquoted = raw.trim_matches('"').trim_matches('\'');
        debug!(key, raw, unquoted, "value is a string");
        return Ok(InlistValue::Str(unquoted.to_string()));
    }

    if contains_any(raw, BOOL_MARKERS) {
        debug!(key, raw, "value is a boolean");
        return Ok(InlistValue::Bool(!contains_any(raw, FALSE_MARKERS)));
    }

    if contains_all(raw, NONE_MARKERS) {
        debug!(key, raw, "value is None");
        return Ok(InlistValue::None);
    }

    if contains_all(raw, LIST_MARKERS) {
        debug!(key, raw, "value is a list");
        return literal::evaluate(raw).map_err(wrap);
    }

    if contains_all(raw, TUPLE_MARKERS) {
        debug!(key, raw, "value is a tuple");
        return literal::evaluate(raw).map_err(wrap);
    }

    if contains_all(raw, FLOAT_MARKERS) || scientific_regex().is_match(raw) {
        debug!(key, raw, "value is a float");
        return literal::evaluate(raw).map_err(wrap);
    }

    debug!(key, raw, "value is an integer");
    if !integer_regex().is_match(raw) {
        return Err(DomainError::typing(key, raw, "not an integer"));
    }
    raw.replace('_', "")
        .parse::<i64>()
        .map(InlistValue::Int)
        .map_err(|e| DomainError::typing(key, raw, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(raw: &str) -> InlistValue {
        type_value("k", raw).unwrap_or_else(|e| panic!("{raw}: {e}"))
    }

    #[test]
    fn strings_are_unquoted() {
        assert_eq!(ty("'this is a string'"), InlistValue::from("this is a string"));
        assert_eq!(ty("\"/path/to/somewhere\""), InlistValue::from("/path/to/somewhere"));
        assert_eq!(ty("''"), InlistValue::from(""));
        // double quotes go first, then single quotes
        assert_eq!(ty("\"'mixed'\""), InlistValue::from("mixed"));
    }

    #[test]
    fn quoted_lists_are_evaluated() {
        assert_eq!(ty("['a','b']"), InlistValue::from(vec!["a", "b"]));
    }

    #[test]
    fn booleans_match_by_substring() {
        assert_eq!(ty("True"), InlistValue::Bool(true));
        assert_eq!(ty("TRUE"), InlistValue::Bool(true));
        assert_eq!(ty("False"), InlistValue::Bool(false));
        assert_eq!(ty("FALSE"), InlistValue::Bool(false));
        assert_eq!(ty("[True,False]"), InlistValue::Bool(false));
        assert_eq!(ty("TrueColor"), InlistValue::Bool(true));
    }

    #[test]
    fn none_and_containers() {
        assert_eq!(ty("None"), InlistValue::None);
        assert_eq!(ty("[2,1,1,1,2]"), InlistValue::from(vec![2i64, 1, 1, 1, 2]));
        assert_eq!(ty("(1,2.5)"), InlistValue::Tuple(vec![1i64.into(), 2.5.into()]));
    }

    #[test]
    fn numbers() {
        assert_eq!(ty("8"), InlistValue::Int(8));
        assert_eq!(ty("-8"), InlistValue::Int(-8));
        assert_eq!(ty("+8"), InlistValue::Int(8));
        assert_eq!(ty("1_000"), InlistValue::Int(1000));
        assert_eq!(ty("8.0"), InlistValue::Float(8.0));
        assert_eq!(ty("-0.5"), InlistValue::Float(-0.5));
        assert_eq!(ty("1e5"), InlistValue::Float(100000.0));
        assert_eq!(ty("-1e-5"), InlistValue::Float(-0.00001));
    }

    #[test]
    fn bare_words_are_typing_errors() {
        let err = type_value("my_key", "hello").unwrap_err();
        assert!(matches!(
            err,
            DomainError::Typing { ref key, ref value, .. } if key == "my_key" && value == "hello"
        ));
        assert!(matches!(type_value("k", "1.2.3"), Err(DomainError::Typing { .. })));
        assert!(matches!(type_value("k", "[1,"), Err(DomainError::Typing { .. })));
    }
}
