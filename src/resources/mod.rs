//! The four resource types served by the API.

pub mod author;
pub mod book;
pub mod example;
pub mod user;

use serde::{Deserialize, Serialize};

use crate::schema::ResourceSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Author,
    Book,
    Example,
    User,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Author,
        ResourceKind::Book,
        ResourceKind::Example,
        ResourceKind::User,
    ];

    pub fn schema(self) -> ResourceSchema {
        match self {
            ResourceKind::Author => author::schema(),
            ResourceKind::Book => book::schema(),
            ResourceKind::Example => example::schema(),
            ResourceKind::User => user::schema(),
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.schema().singular)
    }
}
