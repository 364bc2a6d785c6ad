//! In-process document store, shared between sessions in one process

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

use super::document::{apply_field_ops, FieldOp, StoreError};
use super::{DocumentStore, TransactionFn};

/// Every document is a watch channel; writers replace the value and
/// subscribers see the latest one
#[derive(Clone, Default)]
pub struct InMemoryStore {
    docs: Arc<DashMap<String, watch::Sender<Option<Value>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.docs.get(path).and_then(|tx| tx.borrow().clone()))
    }

    async fn set(&self, path: &str, doc: Value) -> Result<(), StoreError> {
        self.docs
            .entry(path.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .send_replace(Some(doc));
        Ok(())
    }

    async fn update(&self, path: &str, ops: Vec<(String, FieldOp)>) -> Result<(), StoreError> {
        let tx = self
            .docs
            .get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;

        let mut found = false;
        tx.send_if_modified(|doc| match doc {
            Some(current) => {
                apply_field_ops(current, &ops);
                found = true;
                true
            }
            None => false,
        });

        if found {
            Ok(())
        } else {
            Err(StoreError::NotFound(path.to_string()))
        }
    }

    async fn subscribe(&self, path: &str) -> Result<watch::Receiver<Option<Value>>, StoreError> {
        Ok(self
            .docs
            .entry(path.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .subscribe())
    }

    async fn transaction(&self, path: &str, f: &TransactionFn) -> Result<bool, StoreError> {
        let tx = self
            .docs
            .entry(path.to_string())
            .or_insert_with(|| watch::channel(None).0);

        let mut wrote = false;
        tx.send_if_modified(|doc| match f(doc.clone()) {
            Some(next) => {
                *doc = Some(next);
                wrote = true;
                true
            }
            None => false,
        });
        Ok(wrote)
    }
}
