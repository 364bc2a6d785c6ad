//! Session wiring

pub mod session;

pub use session::{ControlCommand, GameSession, SessionCommand, SessionHandle};
