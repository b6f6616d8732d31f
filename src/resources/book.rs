use crate::schema::{FieldSpec, ResourceSchema};

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(
        "book",
        "books",
        vec![
            FieldSpec::string("title").required(),
            FieldSpec::reference("author", "authors").required(),
        ],
    )
}
