//! Document storage used by the built-in campaign tools.
//!
//! Tools reach persistent state only through [`DocumentStore`]: JSON
//! documents addressed by collection and id. The crate ships an in-memory
//! implementation; hosts plug in their own for durable storage.

mod error;
mod memory;

pub use error::{StoreError, StoreErrorKind};
pub use memory::InMemoryDocumentStore;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

/// A key-value store of JSON documents grouped into collections.
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// Fetches one document.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// Inserts or replaces one document.
    async fn put(&self, collection: &str, id: &str, document: Value) -> Result<(), StoreError>;

    /// Removes one document; returns whether it existed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    /// Lists a collection as `(id, document)` pairs.
    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError>;
}
