//! Supabase REST backend for room documents
//!
//! Documents live in a `rooms` table (`path text primary key, doc jsonb,
//! updated_at timestamptz`). Field edits and transactions are optimistic:
//! the write is conditioned on the `updated_at` that was read and retried
//! on conflict. Subscriptions poll.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::document::{apply_field_ops, FieldOp, StoreError};
use super::{DocumentStore, TransactionFn};

const TABLE: &str = "rooms";
const MAX_WRITE_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Deserialize)]
struct RoomRow {
    doc: Value,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct RoomUpsert<'a> {
    path: &'a str,
    doc: &'a Value,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct RoomPatch<'a> {
    doc: &'a Value,
    updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
    poll_interval: Duration,
}

impl SupabaseStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            poll_interval,
        }
    }

    fn rest_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, TABLE)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api { status: status.as_u16(), body });
        }
        Ok(response)
    }

    async fn fetch_row(&self, path: &str) -> Result<Option<RoomRow>, StoreError> {
        let response = self
            .authed(self.client.get(self.rest_url()))
            .query(&[("path", format!("eq.{path}")), ("select", "doc,updated_at".to_string())])
            .send()
            .await?;
        let body = Self::check(response).await?.text().await?;
        let rows: Vec<RoomRow> = serde_json::from_str(&body)?;
        Ok(rows.into_iter().next())
    }

    /// PATCH conditioned on the version that was read; `false` when another
    /// writer got there first
    async fn write_if_unchanged(&self, path: &str, doc: &Value, seen: DateTime<Utc>) -> Result<bool, StoreError> {
        let patch = RoomPatch {
            doc,
            updated_at: Utc::now(),
        };
        let response = self
            .authed(self.client.patch(self.rest_url()))
            .header("Prefer", "return=representation")
            .query(&[
                ("path", format!("eq.{path}")),
                ("updated_at", format!("eq.{}", seen.to_rfc3339())),
            ])
            .json(&patch)
            .send()
            .await?;
        let body = Self::check(response).await?.text().await?;
        let rows: Vec<Value> = serde_json::from_str(&body)?;
        Ok(!rows.is_empty())
    }

    /// Insert only if no row exists yet
    async fn insert_new(&self, path: &str, doc: &Value) -> Result<bool, StoreError> {
        let row = RoomUpsert {
            path,
            doc,
            updated_at: Utc::now(),
        };
        let response = self
            .authed(self.client.post(self.rest_url()))
            .header("Prefer", "resolution=ignore-duplicates,return=representation")
            .json(&row)
            .send()
            .await?;
        let body = Self::check(response).await?.text().await?;
        let rows: Vec<Value> = serde_json::from_str(&body)?;
        Ok(!rows.is_empty())
    }
}

#[async_trait]
impl DocumentStore for SupabaseStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.fetch_row(path).await?.map(|row| row.doc))
    }

    async fn set(&self, path: &str, doc: Value) -> Result<(), StoreError> {
        let row = RoomUpsert {
            path,
            doc: &doc,
            updated_at: Utc::now(),
        };
        let response = self
            .authed(self.client.post(self.rest_url()))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .query(&[("on_conflict", "path")])
            .json(&row)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update(&self, path: &str, ops: Vec<(String, FieldOp)>) -> Result<(), StoreError> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let row = self
                .fetch_row(path)
                .await?
                .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
            let mut doc = row.doc;
            apply_field_ops(&mut doc, &ops);
            if self.write_if_unchanged(path, &doc, row.updated_at).await? {
                return Ok(());
            }
            debug!(path, attempt, "Room changed underneath update, retrying");
        }
        Err(StoreError::Conflict(path.to_string()))
    }

    async fn subscribe(&self, path: &str) -> Result<watch::Receiver<Option<Value>>, StoreError> {
        let initial = self.get(path).await?;
        let (tx, rx) = watch::channel(initial);
        let store = self.clone();
        let path = path.to_string();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(store.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    debug!(path = %path, "Room poller stopped, no subscribers left");
                    break;
                }
                match store.get(&path).await {
                    Ok(doc) => {
                        tx.send_if_modified(|current| {
                            if *current == doc {
                                false
                            } else {
                                *current = doc;
                                true
                            }
                        });
                    }
                    Err(e) => warn!(path = %path, error = %e, "Room poll failed"),
                }
            }
        });

        Ok(rx)
    }

    async fn transaction(&self, path: &str, f: &TransactionFn) -> Result<bool, StoreError> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let row = self.fetch_row(path).await?;
            let seen = row.as_ref().map(|r| r.updated_at);
            let Some(next) = f(row.map(|r| r.doc)) else {
                return Ok(false);
            };
            let written = match seen {
                Some(seen) => self.write_if_unchanged(path, &next, seen).await?,
                None => self.insert_new(path, &next).await?,
            };
            if written {
                return Ok(true);
            }
            debug!(path, attempt, "Room changed underneath transaction, retrying");
        }
        Err(StoreError::Conflict(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_url_trims_trailing_slash() {
        let store = SupabaseStore::new("https://x.supabase.co/", "key", Duration::from_millis(250));
        assert_eq!(store.rest_url(), "https://x.supabase.co/rest/v1/rooms");
    }

    #[test]
    fn room_row_parses_postgrest_timestamps() {
        let row: RoomRow = serde_json::from_str(
            r#"{"doc":{"hostId":"a"},"updated_at":"2024-03-01T10:00:00.123456+00:00"}"#,
        )
        .unwrap();
        assert_eq!(row.doc["hostId"], "a");
    }
}
