mod memory_store;
mod sqlite_store;

pub use memory_store::InMemoryOverlayStore;
pub use sqlite_store::SqliteOverlayStore;
