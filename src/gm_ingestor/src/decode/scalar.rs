use serde_json::{Number, Value};

/// Type a raw text cell: `i64`, then finite `f64`, then bool, else the string itself.
///
/// Bools are `true`/`false` in any case. Short spellings like `"t"` stay text.
pub fn parse_scalar(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inference_order() {
        assert_eq!(parse_scalar("42"), json!(42));
        assert_eq!(parse_scalar("-7"), json!(-7));
        assert_eq!(parse_scalar("10.25"), json!(10.25));
        assert_eq!(parse_scalar("TRUE"), json!(true));
        assert_eq!(parse_scalar("False"), json!(false));
        assert_eq!(parse_scalar("1"), json!(1));
        assert_eq!(parse_scalar("SHSE.600000"), json!("SHSE.600000"));
        assert_eq!(
            parse_scalar("2024-03-11 09:31:00"),
            json!("2024-03-11 09:31:00")
        );
    }

    #[test]
    fn short_bool_spellings_stay_text() {
        assert_eq!(parse_scalar("t"), json!("t"));
        assert_eq!(parse_scalar("F"), json!("F"));
        assert_eq!(parse_scalar("yes"), json!("yes"));
    }

    #[test]
    fn non_finite_floats_stay_text() {
        assert_eq!(parse_scalar("NaN"), json!("NaN"));
        assert_eq!(parse_scalar("inf"), json!("inf"));
        assert_eq!(parse_scalar(""), json!(""));
    }
}
