//! Headless arena client
//!
//! Reads newline-delimited JSON events from stdin (device input such as
//! `{"type":"key_down","code":"KeyQ"}` or controls such as
//! `{"type":"respawn"}`), runs the simulation at `SIM_TPS` and logs a
//! periodic frame summary. Stops on Ctrl+C or end of input.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use arena_sync::app::{ControlCommand, GameSession, SessionCommand};
use arena_sync::config::{Config, StoreBackend};
use arena_sync::input::InputEvent;
use arena_sync::init_tracing;
use arena_sync::store::{DocumentStore, InMemoryStore, SupabaseStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_level, config.log_json);

    info!(
        actor_id = %config.player_id,
        room = ?config.room_code,
        class = %config.player_class,
        seed = config.world_seed,
        "Starting arena client"
    );

    let store: Option<Arc<dyn DocumentStore>> = config.room_code.as_ref().map(|_| match &config.store_backend {
        StoreBackend::Memory => {
            warn!("In-memory store selected, room is only shared within this process");
            Arc::new(InMemoryStore::new()) as Arc<dyn DocumentStore>
        }
        StoreBackend::Supabase { url, key } => {
            Arc::new(SupabaseStore::new(url.clone(), key.clone(), config.store_poll_interval)) as Arc<dyn DocumentStore>
        }
    });

    let (mut session, handle) = GameSession::new(&config, store);
    session.connect().await?;
    let session_task = tokio::spawn(session.run());

    let commands = handle.commands.clone();
    tokio::spawn(read_stdin(commands));

    tokio::select! {
        _ = shutdown_signal() => {
            let _ = handle.commands.send(SessionCommand::Stop).await;
        }
        _ = handle.commands.closed() => {}
    }

    session_task.await?;
    info!("Client shutdown complete");
    Ok(())
}

/// Forward stdin lines to the session; end of input stops it
async fn read_stdin(commands: mpsc::Sender<SessionCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let Some(command) = parse_line(line) else {
                    warn!(line, "Unrecognised input line");
                    continue;
                };
                if commands.send(command).await.is_err() {
                    return;
                }
            }
            Ok(None) => {
                info!("End of input");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        }
    }
    let _ = commands.send(SessionCommand::Stop).await;
}

fn parse_line(line: &str) -> Option<SessionCommand> {
    if let Ok(event) = serde_json::from_str::<InputEvent>(line) {
        return Some(SessionCommand::Input(event));
    }
    serde_json::from_str::<ControlCommand>(line)
        .ok()
        .map(SessionCommand::Control)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
