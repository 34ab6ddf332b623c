#![forbid(unsafe_code)]

pub mod kv;
pub mod local;
pub mod repository;
pub mod seed;
pub mod sqlite;

pub use kv::{CollectionKey, InMemoryKv, KeyValueStore};
pub use local::LocalStore;
pub use repository::{Storage, StorageError};
