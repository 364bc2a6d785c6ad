//! Synchronization layer: room wire format, snapshot reconciliation and the
//! sync driver

pub mod layer;
pub mod protocol;
pub mod reconcile;

pub use layer::{room_path, GameSync, SyncError};
pub use protocol::{ItemState, PlayerState, RoomDoc};
pub use reconcile::{LastSnapshotWins, SnapshotReconciler};
