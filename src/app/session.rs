//! Game session: owns the engine and drives it from an interval tick loop
//!
//! Inputs and control commands arrive over an mpsc channel and are drained
//! at the start of each tick. Every tick publishes one [`FrameSnapshot`] on a
//! watch channel; readers always see the latest frame.

use parking_lot::RwLock;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::game::character::{ActorKind, Character};
use crate::game::combat::FeedbackKind;
use crate::game::constants::SPAWN_POINTS;
use crate::game::engine::Engine;
use crate::game::physics::{Obstacle, PhysicsSystem};
use crate::game::snapshot::{FrameSnapshot, SnapshotStats};
use crate::game::weapons::ClassKey;
use crate::game::world::{Arena, RemoteWorld, WorldGen};
use crate::input::{InputEvent, InputLayer};
use crate::store::DocumentStore;
use crate::sync::{GameSync, LastSnapshotWins, PlayerState, SyncError};
use crate::util::rate_limit::WriteLimiter;
use crate::util::time::{tick_duration, FrameClock, SUMMARY_INTERVAL_SECS};

/// Non-input requests a front end can make
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlCommand {
    /// Come back at the home position, optionally as another class
    Respawn {
        #[serde(default)]
        class_key: Option<ClassKey>,
    },
    ChangeClass { class_key: ClassKey },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Input(InputEvent),
    Control(ControlCommand),
    Stop,
}

/// Handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub commands: mpsc::Sender<SessionCommand>,
    pub frames: watch::Receiver<Option<Arc<FrameSnapshot>>>,
}

pub struct GameSession {
    engine: Engine,
    input: InputLayer,
    remote: Arc<RwLock<RemoteWorld>>,
    sync: Option<GameSync>,
    commands: mpsc::Receiver<SessionCommand>,
    frames: watch::Sender<Option<Arc<FrameSnapshot>>>,
    clock: FrameClock,
    tick_duration: Duration,
    summary_every: u64,
    stats: SnapshotStats,
}

impl GameSession {
    /// Build the arena and, when a room code and store are given, the sync
    /// driver. Call [`GameSession::connect`] before [`GameSession::run`] to
    /// join the room.
    pub fn new(config: &Config, store: Option<Arc<dyn DocumentStore>>) -> (Self, SessionHandle) {
        let mut rng = ChaCha8Rng::seed_from_u64(config.world_seed);
        let obstacles = WorldGen::obstacles(&mut rng, config.obstacle_count);

        let (home_x, home_y) = pick_home(&mut rng, &obstacles);
        let local = Character::new(
            config.player_id,
            ActorKind::Player,
            config.player_name.clone(),
            config.player_class,
            config.player_color.clone(),
            home_x,
            home_y,
        );
        let mut arena = Arena::new(local, obstacles);
        arena.dummy = Some(WorldGen::place_dummy(&mut rng, &arena.obstacles, &arena.local));

        let remote = Arc::new(RwLock::new(RemoteWorld::default()));
        for _ in 0..config.bot_count {
            arena.spawn_bot(&mut rng, &remote.read());
        }

        let sync = match (&config.room_code, store) {
            (Some(room), Some(store)) => Some(GameSync::new(
                store,
                &config.app_id,
                room,
                config.player_id,
                WriteLimiter::new(config.sync_writes_per_sec),
            )),
            _ => None,
        };

        let (command_tx, command_rx) = mpsc::channel(256);
        let (frame_tx, frame_rx) = watch::channel(None);

        let session = Self {
            engine: Engine::new(arena),
            input: InputLayer::default(),
            remote,
            sync,
            commands: command_rx,
            frames: frame_tx,
            clock: FrameClock::new(config.sim_tps),
            tick_duration: tick_duration(config.sim_tps),
            summary_every: u64::from(config.sim_tps.max(1) * SUMMARY_INTERVAL_SECS),
            stats: SnapshotStats::default(),
        };
        let handle = SessionHandle {
            commands: command_tx,
            frames: frame_rx,
        };
        (session, handle)
    }

    pub fn is_online(&self) -> bool {
        self.sync.is_some()
    }

    pub fn remote(&self) -> Arc<RwLock<RemoteWorld>> {
        self.remote.clone()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Join the room: create it if needed, start listening and publish the
    /// local slot. No-op offline.
    pub async fn connect(&mut self) -> Result<(), SyncError> {
        let Some(sync) = self.sync.as_mut() else {
            info!(actor_id = %self.engine.local().id, "No room code, running offline");
            return Ok(());
        };
        let state = PlayerState::from(self.engine.local());
        sync.ensure_room(&state).await?;
        sync.start(self.remote.clone(), Arc::new(LastSnapshotWins)).await?;
        sync.force_push(&state);
        Ok(())
    }

    /// Run the tick loop until a stop command arrives or every handle is
    /// dropped
    pub async fn run(mut self) {
        info!(
            actor_id = %self.engine.local().id,
            online = self.is_online(),
            "Session started"
        );

        let mut ticker = interval(self.tick_duration);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if !self.process_commands() {
                break;
            }
            let dt = self.clock.delta();
            self.step(dt);
        }

        self.shutdown();
    }

    /// Drain pending commands; false once the session should stop
    fn process_commands(&mut self) -> bool {
        loop {
            match self.commands.try_recv() {
                Ok(SessionCommand::Input(event)) => self.handle_input(&event),
                Ok(SessionCommand::Control(command)) => self.handle_control(command),
                Ok(SessionCommand::Stop) => return false,
                Err(mpsc::error::TryRecvError::Empty) => return true,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    debug!("All session handles dropped");
                    return false;
                }
            }
        }
    }

    fn handle_input(&mut self, event: &InputEvent) {
        let local = &self.engine.arena.local;
        if let Some(notice) = self.input.apply(event, local) {
            let (x, y) = (local.x, local.y);
            self.engine.ctx.feedback.push(notice.text, x, y, FeedbackKind::Warning);
        }
    }

    fn handle_control(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::Respawn { class_key } => {
                let class_key = class_key.unwrap_or(self.engine.local().class_key);
                self.engine.respawn_local(class_key, &mut self.remote.write());
            }
            ControlCommand::ChangeClass { class_key } => {
                self.engine.change_class(class_key);
                info!(actor_id = %self.engine.local().id, class = %class_key, "Class changed");
            }
        }
        if let Some(sync) = &self.sync {
            sync.force_push(&PlayerState::from(self.engine.local()));
        }
    }

    /// One simulation step: tick, publish the frame, forward world changes
    pub fn step(&mut self, dt: f32) {
        let frame = {
            let mut remote = self.remote.write();
            self.engine.tick(dt, &mut self.input.intents, &mut remote);
            self.input.camera.follow(self.engine.local());
            let camera = (self.input.camera.x, self.input.camera.y);
            FrameSnapshot::build(&self.engine, &remote, camera)
        };

        let requests = self.engine.drain_requests();
        if let Some(sync) = &self.sync {
            sync.push_local(&PlayerState::from(self.engine.local()));
            sync.apply_requests(requests);
        }

        self.stats.record(&frame);
        if self.summary_every > 0 && frame.tick % self.summary_every == 0 {
            info!(
                tick = frame.tick,
                health = frame.local.health,
                x = frame.local.x,
                y = frame.local.y,
                remote_actors = frame.remote.len(),
                items = frame.items.len(),
                projectiles = frame.projectiles.len(),
                avg_actors = self.stats.avg_actors_per_frame,
                "Frame summary"
            );
        }
        self.frames.send_replace(Some(Arc::new(frame)));
    }

    fn shutdown(self) {
        if let Some(sync) = self.sync {
            // Slot removal is best effort and not awaited
            drop(sync.stop());
        }
        info!(
            actor_id = %self.engine.local().id,
            frames = self.stats.total_frames,
            "Session stopped"
        );
    }
}

/// First spawn point the local actor fits on, starting from a random one
fn pick_home(rng: &mut ChaCha8Rng, obstacles: &[Obstacle]) -> (f32, f32) {
    let start = rng.gen_range(0..SPAWN_POINTS.len());
    (0..SPAWN_POINTS.len())
        .map(|offset| SPAWN_POINTS[(start + offset) % SPAWN_POINTS.len()])
        .find(|&(x, y)| !PhysicsSystem::actor_blocked(x, y, obstacles, &[]))
        .unwrap_or_else(|| {
            warn!("No free spawn point for local player, using the first one");
            SPAWN_POINTS[0]
        })
}
