use std::sync::OnceLock;

use bson::Bson;
use regex::Regex;

static NUMERIC_RE: OnceLock<Regex> = OnceLock::new();

/// Returns true for numeric literals: `12`, `-3`, `50.2`, `.5`, `1e3`.
pub fn is_numeric(text: &str) -> bool {
    let re = NUMERIC_RE.get_or_init(|| {
        Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$")
            .expect("valid numeric literal regex")
    });
    re.is_match(text)
}

/// Converts a numeric literal to BSON.
///
/// Literals with a decimal point become `Double`; integers become `Int32`
/// when they fit and `Int64` otherwise.
///
/// # Examples
///
/// ```
/// use bson::Bson;
/// use sql_to_mongodb_query::value::numeric_bson;
///
/// assert_eq!(numeric_bson("12"), Some(Bson::Int32(12)));
/// assert_eq!(numeric_bson("50.2"), Some(Bson::Double(50.2)));
/// assert_eq!(numeric_bson("5000000000"), Some(Bson::Int64(5_000_000_000)));
/// assert_eq!(numeric_bson("age"), None);
/// ```
pub fn numeric_bson(text: &str) -> Option<Bson> {
    if !is_numeric(text) {
        return None;
    }

    let text = text.trim();
    if !text.contains('.')
        && let Ok(integer) = text.parse::<i64>()
    {
        return Some(match i32::try_from(integer) {
            Ok(small) => Bson::Int32(small),
            Err(_) => Bson::Int64(integer),
        });
    }

    text.parse::<f64>().ok().map(Bson::Double)
}

/// Returns true when `text` starts with a quote or back-quote.
pub fn is_string_literal(text: &str) -> bool {
    text.starts_with(['\'', '"', '`'])
}

/// Strips the surrounding quotes of a string literal; other text is returned
/// unchanged.
pub fn string_literal_value(text: &str) -> &str {
    if !is_string_literal(text) {
        return text;
    }
    let mut chars = text.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}

/// Returns true for an unquoted token holding a quoted payload, such as
/// `date('2020-12-12')` or `ObjectId("5d39...")`.
pub fn is_inline_function(text: &str) -> bool {
    !is_string_literal(text) && text.contains(['\'', '"'])
}

/// Coerces a literal token in filter position.
///
/// Quoted strings lose their quotes, `true`/`false` and `null` are matched
/// case-insensitively and numbers are converted with [`numeric_bson`].
/// Anything else is not a literal and yields `None`.
pub fn scalar_bson(text: &str) -> Option<Bson> {
    if is_string_literal(text) {
        return Some(Bson::String(string_literal_value(text).to_string()));
    }

    match text.to_ascii_lowercase().as_str() {
        "true" => Some(Bson::Boolean(true)),
        "false" => Some(Bson::Boolean(false)),
        "null" => Some(Bson::Null),
        _ => numeric_bson(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_detection() {
        assert!(is_numeric("12"));
        assert!(is_numeric("-3.5"));
        assert!(is_numeric(".5"));
        assert!(is_numeric("1e3"));
        assert!(!is_numeric("1000a"));
        assert!(!is_numeric("inf"));
        assert!(!is_numeric(""));
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(string_literal_value("'nddcoder'"), "nddcoder");
        assert_eq!(string_literal_value("\"a b\""), "a b");
        assert_eq!(string_literal_value("`user name`"), "user name");
        assert_eq!(string_literal_value("name"), "name");
    }

    #[test]
    fn test_inline_function_detection() {
        assert!(is_inline_function("date('2020-12-12')"));
        assert!(is_inline_function("ObjectId(\"5d3937af498831003e9f6f2a\")"));
        assert!(!is_inline_function("'date(x)'"));
        assert!(!is_inline_function("created_at"));
    }

    #[test]
    fn test_scalar_coercion() {
        assert_eq!(scalar_bson("'1'"), Some(Bson::String("1".to_string())));
        assert_eq!(scalar_bson("TRUE"), Some(Bson::Boolean(true)));
        assert_eq!(scalar_bson("Null"), Some(Bson::Null));
        assert_eq!(scalar_bson("3.2"), Some(Bson::Double(3.2)));
        assert_eq!(scalar_bson("status"), None);
    }
}
