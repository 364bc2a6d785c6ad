//! Arena Sync - client-side combat simulation for a top-down multiplayer arena
//!
//! Each client simulates its own actor, its bots and every projectile
//! locally, then shares its actor state and the dropped-item list through a
//! room document in a shared store. Remote actors are rebuilt from the
//! latest room snapshot.

pub mod app;
pub mod config;
pub mod game;
pub mod input;
pub mod store;
pub mod sync;
pub mod util;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
pub fn init_tracing(log_level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().compact().with_target(true))
            .init();
    }
}
