use serde_json::Value;

/// Reduction for the answer channel: any JSON value is coerced to a
/// string.
///
/// Strings pass through unquoted; every other value is rendered as
/// compact JSON. `null` is the degenerate unknown-shape case and leaves
/// the existing answer untouched.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use ragloom::reducers::coerce_answer;
///
/// assert_eq!(coerce_answer("", &json!("plain text")), "plain text");
/// assert_eq!(coerce_answer("", &json!({"a": 1})), r#"{"a":1}"#);
/// assert_eq!(coerce_answer("kept", &json!(null)), "kept");
/// ```
#[must_use]
pub fn coerce_answer(existing: &str, update: &Value) -> String {
    match update {
        Value::Null => existing.to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
