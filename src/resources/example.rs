use crate::schema::{FieldSpec, ResourceSchema};

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(
        "example",
        "examples",
        vec![
            FieldSpec::string("title").required(),
            FieldSpec::string("text").required(),
        ],
    )
}
