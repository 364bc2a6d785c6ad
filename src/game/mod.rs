//! Game simulation modules

pub mod bot;
pub mod character;
pub mod combat;
pub mod constants;
pub mod engine;
pub mod physics;
pub mod projectile;
pub mod snapshot;
pub mod weapons;
pub mod world;

pub use character::{ActorKind, ActorState, Character};
pub use engine::{ChargeIndicator, ChargeKind, Engine, SimContext};
pub use snapshot::{ActorView, FrameSnapshot};
pub use weapons::{ClassKey, ItemKind, WeaponKey};
pub use world::{Arena, DroppedItem, RemoteWorld, WorldGen, WorldRequest};
