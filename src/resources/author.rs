use serde_json::{Map, Value};

use crate::schema::{FieldSpec, ResourceSchema};

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(
        "author",
        "authors",
        vec![
            FieldSpec::object(
                "name",
                vec![
                    FieldSpec::string("firstName").required(),
                    FieldSpec::string("lastName").required(),
                ],
            )
            .required(),
            FieldSpec::string("dob").required(),
        ],
    )
    .with_derived("name.full", full_name)
}

/// `name.full`: first and last name joined by a space
fn full_name(fields: &Map<String, Value>) -> Option<Value> {
    let name = fields.get("name")?.as_object()?;
    let first = name.get("firstName")?.as_str()?;
    let last = name.get("lastName")?.as_str()?;
    Some(Value::String(format!("{} {}", first, last)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_name_needs_both_parts() {
        let fields = json!({ "name": { "firstName": "A", "lastName": "B" } });
        assert_eq!(full_name(fields.as_object().unwrap()), Some(json!("A B")));

        let partial = json!({ "name": { "firstName": "A" } });
        assert_eq!(full_name(partial.as_object().unwrap()), None);
    }
}
