//! Sync driver: outbound local-state writes, inbound snapshot listener and
//! item-list requests
//!
//! Every write is spawned and never awaited by the tick loop. Failures are
//! logged and dropped; the next tick's state supersedes a lost write.

use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::protocol::{ItemState, PlayerState, RoomDoc};
use super::reconcile::SnapshotReconciler;
use crate::game::world::{DroppedItem, RemoteWorld, WorldRequest};
use crate::store::{DocumentStore, FieldOp, StoreError};
use crate::util::rate_limit::WriteLimiter;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to encode room state: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Sync already started")]
    AlreadyStarted,
}

/// Document path of a room
pub fn room_path(app_id: &str, room_code: &str) -> String {
    format!("artifacts/{app_id}/public/data/rooms/{room_code}")
}

pub struct GameSync {
    store: Arc<dyn DocumentStore>,
    path: String,
    room_code: String,
    local_id: Uuid,
    limiter: WriteLimiter,
    listener: Option<JoinHandle<()>>,
}

impl GameSync {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        app_id: &str,
        room_code: &str,
        local_id: Uuid,
        limiter: WriteLimiter,
    ) -> Self {
        Self {
            store,
            path: room_path(app_id, room_code),
            room_code: room_code.to_string(),
            local_id,
            limiter,
            listener: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn slot(&self) -> String {
        format!("players.{}", self.local_id)
    }

    /// Create the room with the local actor as host if it does not exist.
    /// Returns whether this call created it.
    pub async fn ensure_room(&self, local: &PlayerState) -> Result<bool, SyncError> {
        let mut room = RoomDoc::hosted_by(&local.id);
        room.players.insert(local.id.clone(), local.clone());
        let fresh = serde_json::to_value(&room)?;

        let created = self
            .store
            .transaction(&self.path, &move |current: Option<Value>| match current {
                None => Some(fresh.clone()),
                Some(_) => None,
            })
            .await?;
        if created {
            info!(room = %self.room_code, host = %local.id, "Room created");
        }
        Ok(created)
    }

    /// Subscribe to the room and apply every snapshot to `world`
    pub async fn start(
        &mut self,
        world: Arc<RwLock<RemoteWorld>>,
        reconciler: Arc<dyn SnapshotReconciler>,
    ) -> Result<(), SyncError> {
        if self.listener.is_some() {
            return Err(SyncError::AlreadyStarted);
        }
        let mut rx = self.store.subscribe(&self.path).await?;
        let local_id = self.local_id;
        let room_code = self.room_code.clone();

        self.listener = Some(tokio::spawn(async move {
            loop {
                let snapshot = rx.borrow_and_update().clone();
                let doc = match snapshot.map(serde_json::from_value::<RoomDoc>) {
                    None => None,
                    Some(Ok(doc)) => Some(doc),
                    Some(Err(e)) => {
                        warn!(room = %room_code, error = %e, "Unreadable room snapshot, ignored");
                        if rx.changed().await.is_err() {
                            break;
                        }
                        continue;
                    }
                };
                reconciler.reconcile(&mut world.write(), doc.as_ref(), local_id);

                if rx.changed().await.is_err() {
                    debug!(room = %room_code, "Room subscription closed");
                    break;
                }
            }
        }));

        info!(room = %self.room_code, actor_id = %self.local_id, "Sync started");
        Ok(())
    }

    /// Rate-limited write of the local actor's slot. Returns false when the
    /// write was skipped.
    pub fn push_local(&self, state: &PlayerState) -> bool {
        if !self.limiter.check() {
            debug!(actor_id = %self.local_id, "Local state write rate limited");
            return false;
        }
        self.force_push(state);
        true
    }

    /// Write the local actor's slot regardless of the rate limit
    pub fn force_push(&self, state: &PlayerState) {
        let value = match serde_json::to_value(state) {
            Ok(value) => value,
            Err(e) => {
                error!(actor_id = %self.local_id, error = %e, "Failed to encode local state");
                return;
            }
        };
        let ops = vec![(self.slot(), FieldOp::Set(value))];
        self.spawn_update(ops, "local state write");
    }

    pub fn add_item(&self, item: &DroppedItem) {
        let value = match serde_json::to_value(ItemState::from(item)) {
            Ok(value) => value,
            Err(e) => {
                error!(item_id = %item.id, error = %e, "Failed to encode item");
                return;
            }
        };
        let ops = vec![("droppedItems".to_string(), FieldOp::ArrayUnion(vec![value]))];
        self.spawn_update(ops, "item add");
    }

    /// Read the item list, filter the id out and write it back. Not guarded
    /// against a concurrent writer.
    pub fn remove_item(&self, id: Uuid) -> JoinHandle<()> {
        let store = self.store.clone();
        let path = self.path.clone();
        tokio::spawn(async move {
            if let Err(e) = remove_item_from(store.as_ref(), &path, id).await {
                warn!(path = %path, item_id = %id, error = %e, "Item removal failed");
            }
        })
    }

    /// Forward the requests a tick produced
    pub fn apply_requests(&self, requests: Vec<WorldRequest>) {
        for request in requests {
            match request {
                WorldRequest::AddItem(item) => self.add_item(&item),
                WorldRequest::RemoveItem(id) => {
                    self.remove_item(id);
                }
            }
        }
    }

    /// Stop listening and remove the local slot. The removal is returned
    /// as a handle; callers may drop it.
    pub fn stop(mut self) -> JoinHandle<()> {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        info!(room = %self.room_code, actor_id = %self.local_id, "Sync stopped");
        let ops = vec![(self.slot(), FieldOp::Delete)];
        self.spawn_update(ops, "slot removal")
    }

    fn spawn_update(&self, ops: Vec<(String, FieldOp)>, what: &'static str) -> JoinHandle<()> {
        let store = self.store.clone();
        let path = self.path.clone();
        tokio::spawn(async move {
            if let Err(e) = store.update(&path, ops).await {
                warn!(path = %path, error = %e, "Room {what} failed");
            }
        })
    }
}

async fn remove_item_from(store: &dyn DocumentStore, path: &str, id: Uuid) -> Result<(), SyncError> {
    let Some(doc) = store.get(path).await? else {
        return Err(StoreError::NotFound(path.to_string()).into());
    };
    let room: RoomDoc = serde_json::from_value(doc)?;
    let id = id.to_string();
    let remaining: Vec<ItemState> = room.dropped_items.into_iter().filter(|item| item.id != id).collect();
    let value = serde_json::to_value(remaining)?;
    store
        .update(path, vec![("droppedItems".to_string(), FieldOp::Set(value))])
        .await?;
    Ok(())
}
