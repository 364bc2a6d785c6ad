//! Shared document store: the interface the sync layer talks to, plus an
//! in-process backend and a Supabase/PostgREST backend

pub mod document;
pub mod memory;
pub mod supabase;

pub use document::{apply_field_ops, FieldOp, StoreError};
pub use memory::InMemoryStore;
pub use supabase::SupabaseStore;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

/// Closure run against the current document inside a transaction.
/// Returning `None` leaves the document untouched.
pub type TransactionFn = dyn Fn(Option<Value>) -> Option<Value> + Send + Sync;

/// Path-addressed JSON documents with field edits and change subscriptions
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the whole document, creating it if needed
    async fn set(&self, path: &str, doc: Value) -> Result<(), StoreError>;

    /// Apply field edits to an existing document
    async fn update(&self, path: &str, ops: Vec<(String, FieldOp)>) -> Result<(), StoreError>;

    /// Watch the document; the receiver holds `None` while it does not exist
    async fn subscribe(&self, path: &str) -> Result<watch::Receiver<Option<Value>>, StoreError>;

    /// Read-modify-write without interleaving writers. Returns whether a
    /// write happened.
    async fn transaction(&self, path: &str, f: &TransactionFn) -> Result<bool, StoreError>;
}
