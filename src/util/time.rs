//! Time utilities for the simulation loop

use std::time::{Duration, Instant};

/// Tick rate configuration
pub const DEFAULT_SIM_TPS: u32 = 60;

/// Longest step a single tick may simulate; a stalled frame is not replayed
pub const MAX_FRAME_DELTA: f32 = 0.1;

/// Seconds between frame summary log lines
pub const SUMMARY_INTERVAL_SECS: u32 = 5;

pub fn tick_duration(tps: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(tps.max(1)))
}

/// Measures the real time between consecutive ticks
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
    nominal: f32,
}

impl FrameClock {
    pub fn new(tps: u32) -> Self {
        Self {
            last: None,
            nominal: 1.0 / tps.max(1) as f32,
        }
    }

    /// Seconds since the previous call, clamped to `MAX_FRAME_DELTA`. The
    /// first call returns the nominal tick length.
    pub fn delta(&mut self) -> f32 {
        self.delta_at(Instant::now())
    }

    fn delta_at(&mut self, now: Instant) -> f32 {
        let dt = match self.last {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => self.nominal,
        };
        self.last = Some(now);
        dt.min(MAX_FRAME_DELTA)
    }
}
