use serde_json::{Map, Value};

use crate::error::ApiError;

/// Unwrap a `{ "<key>": { ... } }` request body. A missing or non-object
/// envelope is a validation failure on the key itself.
pub fn envelope_body(key: &str, body: Value) -> Result<Map<String, Value>, ApiError> {
    let Value::Object(mut outer) = body else {
        return Err(ApiError::invalid_field(key, "is required"));
    };

    match outer.remove(key) {
        Some(Value::Object(inner)) => Ok(inner),
        Some(_) => Err(ApiError::invalid_field(key, "must be an object")),
        None => Err(ApiError::invalid_field(key, "is required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_the_named_envelope() {
        let inner = envelope_body("book", json!({ "book": { "title": "Dune" } })).unwrap();
        assert_eq!(inner["title"], "Dune");
    }

    #[test]
    fn missing_or_malformed_envelopes_fail_validation() {
        for body in [json!({}), json!({ "author": {} }), json!({ "book": "Dune" }), json!([1, 2])] {
            let err = envelope_body("book", body).unwrap_err();
            match err {
                ApiError::ValidationFailed { field_errors, .. } => assert!(field_errors.contains_key("book")),
                other => panic!("expected validation failure, got {other:?}"),
            }
        }
    }
}
