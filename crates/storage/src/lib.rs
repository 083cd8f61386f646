pub mod store;

pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StorageError};
