use serde_json::{Map, Value};

/// Client-submitted partial update, before any cleaning.
#[derive(Debug, Clone, Default)]
pub struct PatchRequest(Map<String, Value>);

impl PatchRequest {
    pub fn new(body: Map<String, Value>) -> Self {
        Self(body)
    }

    /// The keys that should actually be written. `owner` is always dropped,
    /// and so is every key submitted as `""`, which means "leave unchanged".
    pub fn into_changes(self) -> Map<String, Value> {
        self.0
            .into_iter()
            .filter(|(key, _)| key != "owner")
            .filter(|(_, value)| value.as_str() != Some(""))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(value: Value) -> Map<String, Value> {
        PatchRequest::new(value.as_object().cloned().unwrap()).into_changes()
    }

    #[test]
    fn drops_owner_even_when_valid() {
        let changes = patch(json!({ "owner": "8d2f0e57-6c4b-4a0e-9f4a-0b8f7c0f3a11", "title": "t" }));
        assert_eq!(Value::Object(changes), json!({ "title": "t" }));
    }

    #[test]
    fn empty_strings_mean_no_change() {
        let changes = patch(json!({ "dob": "", "title": "kept", "text": " " }));
        assert_eq!(Value::Object(changes), json!({ "title": "kept", "text": " " }));
    }

    #[test]
    fn other_falsy_values_are_kept() {
        let changes = patch(json!({ "a": null, "b": 0, "c": false, "d": {} }));
        assert_eq!(changes.len(), 4);
    }
}
