//! Inbound snapshot application
//!
//! Remote state is rebuilt from each room snapshot. The trait is the seam
//! where a merging strategy would go; the only implementation replaces
//! everything.

use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use super::protocol::RoomDoc;
use crate::game::world::RemoteWorld;

/// Folds a room snapshot into the remote world
pub trait SnapshotReconciler: Send + Sync {
    /// `doc` is `None` when the room does not exist (yet or anymore)
    fn reconcile(&self, world: &mut RemoteWorld, doc: Option<&RoomDoc>, local_id: Uuid);
}

/// Throw away prior remote state and rebuild it from the snapshot
#[derive(Debug, Default, Clone, Copy)]
pub struct LastSnapshotWins;

impl SnapshotReconciler for LastSnapshotWins {
    fn reconcile(&self, world: &mut RemoteWorld, doc: Option<&RoomDoc>, local_id: Uuid) {
        let Some(doc) = doc else {
            warn!("Room document missing, clearing remote state");
            *world = RemoteWorld::default();
            return;
        };

        let local_key = local_id.to_string();
        if !doc.players.contains_key(&local_key) {
            warn!(actor_id = %local_id, "Local player slot missing from room");
        }

        let actors: HashMap<Uuid, _> = doc
            .players
            .iter()
            .filter(|(key, _)| **key != local_key)
            .filter_map(|(_, state)| state.to_character())
            .filter(|actor| actor.id != local_id)
            .map(|actor| (actor.id, actor))
            .collect();
        let items: Vec<_> = doc.dropped_items.iter().filter_map(|item| item.to_item()).collect();

        debug!(remote_actors = actors.len(), items = items.len(), "Snapshot applied");
        *world = RemoteWorld {
            actors,
            items,
            host_id: doc.host_id.clone(),
            game_started: doc.game_started,
        };
    }
}
