use serde_json::Value;

const ERROR_FIELDS: [&str; 3] = ["message", "error", "msg"];

/// What a response body turned out to be once parsed as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyShape {
    Array { length: usize },
    Object(serde_json::Map<String, Value>),
    Scalar,
    Unparseable,
}

impl BodyShape {
    pub fn of(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => BodyShape::Array { length: items.len() },
            Ok(Value::Object(map)) => BodyShape::Object(map),
            Ok(_) => BodyShape::Scalar,
            Err(_) => BodyShape::Unparseable,
        }
    }

    /// Rows represented by the body: array length, 1 for an object.
    pub fn row_count(&self) -> Option<usize> {
        match self {
            BodyShape::Array { length } => Some(*length),
            BodyShape::Object(_) => Some(1),
            BodyShape::Scalar | BodyShape::Unparseable => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Introspection {
    pub row_count: Option<usize>,
    pub error: Option<String>,
    pub error_code: Option<String>,
}

/// Reads row count and, for failed calls, the backend's error message/code.
///
/// When a failed call's body yields no message, `error` stays `None` and the
/// caller falls back to `HTTP <status>`.
pub fn introspect(success: bool, response_body: Option<&str>) -> Introspection {
    let shape = match response_body {
        Some(text) => BodyShape::of(text),
        None => BodyShape::Unparseable,
    };

    let mut result = Introspection {
        row_count: shape.row_count(),
        ..Default::default()
    };

    if success {
        return result;
    }

    if let BodyShape::Object(map) = &shape {
        result.error = ERROR_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(render_field));
        result.error_code = map.get("code").and_then(render_field);
    }

    result
}

fn render_field(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_count_from_shape() {
        assert_eq!(introspect(true, Some("[1,2,3]")).row_count, Some(3));
        assert_eq!(introspect(true, Some(r#"{"a":1}"#)).row_count, Some(1));
        assert_eq!(introspect(true, Some("not json")).row_count, None);
        assert_eq!(introspect(true, Some("42")).row_count, None);
        assert_eq!(introspect(true, None).row_count, None);
    }

    #[test]
    fn success_never_reports_errors() {
        let result = introspect(true, Some(r#"{"message":"ignored","code":"1"}"#));
        assert_eq!(result.error, None);
        assert_eq!(result.error_code, None);
    }

    #[test]
    fn failure_reads_message_and_code() {
        assert_eq!(
            introspect(false, Some(r#"{"message":"conflict","code":"409"}"#)),
            Introspection {
                row_count: Some(1),
                error: Some("conflict".to_string()),
                error_code: Some("409".to_string()),
            }
        );
    }

    #[test]
    fn failure_field_precedence_and_numeric_code() {
        let result = introspect(false, Some(r#"{"msg":"third","error":"second","code":23505}"#));
        assert_eq!(result.error.as_deref(), Some("second"));
        assert_eq!(result.error_code.as_deref(), Some("23505"));

        let result = introspect(false, Some(r#"{"msg":"only msg"}"#));
        assert_eq!(result.error.as_deref(), Some("only msg"));
        assert_eq!(result.error_code, None);
    }

    #[test]
    fn empty_message_does_not_hide_error() {
        let result = introspect(false, Some(r#"{"message":"","error":"real","code":""}"#));
        assert_eq!(result.error.as_deref(), Some("real"));
        assert_eq!(result.error_code, None);
    }

    #[test]
    fn unparsable_failure_leaves_fallback_to_caller() {
        let result = introspect(false, Some("<html>Bad Gateway</html>"));
        assert_eq!(result, Introspection::default());
    }
}
