#![forbid(unsafe_code)]

pub mod bank;
pub mod codec;
pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryStore, KeyValueProgressRepository, KeyValueStore, ProgressRepository, Storage,
    StorageError,
};
