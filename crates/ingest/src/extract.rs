//! Lenient field extraction over loosely-typed JSON.
//!
//! Every extractor returns `None` for absent, empty, or wrongly-typed values.
//! Malformed upstream payloads degrade to "not present" instead of failing.

use serde_json::Value;

/// First key whose value is a non-blank string.
pub fn text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    })
}

/// First key holding a boolean, or a "true"/"false" string.
pub fn flag(value: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| match value.get(*key) {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// First key holding an integer, or a string that parses as one.
pub fn integer(value: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| match value.get(*key) {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// First key holding a JSON object.
pub fn object<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| value.get(*key).filter(|v| v.is_object()))
}

/// First key present at all, whatever its type.
pub fn any<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| value.get(*key).filter(|v| !v.is_null()))
}

/// First candidate that is present.
pub fn first_present<I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    candidates.into_iter().flatten().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_skips_blank_and_non_strings() {
        let v = json!({"a": 5, "b": "  ", "c": "hit", "d": "later"});
        assert_eq!(text(&v, &["a", "b", "c", "d"]), Some("hit".to_string()));
        assert_eq!(text(&v, &["a", "b"]), None);
        assert_eq!(text(&json!("not an object"), &["a"]), None);
    }

    #[test]
    fn test_flag_accepts_strings() {
        let v = json!({"x": "TRUE", "y": false, "z": 1});
        assert_eq!(flag(&v, &["x"]), Some(true));
        assert_eq!(flag(&v, &["y"]), Some(false));
        assert_eq!(flag(&v, &["z"]), None);
    }

    #[test]
    fn test_integer_accepts_numeric_strings() {
        let v = json!({"a": "1700000000", "b": 1700000000123_i64, "c": "soon"});
        assert_eq!(integer(&v, &["a"]), Some(1_700_000_000));
        assert_eq!(integer(&v, &["b"]), Some(1_700_000_000_123));
        assert_eq!(integer(&v, &["c"]), None);
    }

    #[test]
    fn test_first_present() {
        assert_eq!(
            first_present([None, Some("b".to_string()), Some("c".to_string())]),
            Some("b".to_string())
        );
        assert_eq!(first_present::<[Option<String>; 0]>([]), None);
    }
}
