pub mod collection;
pub mod manager;
pub mod memory;
pub mod postgres;
pub mod store;

pub use collection::Collection;
pub use manager::DatabaseManager;
pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;
pub use store::{Document, DocumentStore, Owner, StoreError, StoreResult};
