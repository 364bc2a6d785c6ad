//! Configuration module - environment variable parsing

use std::env;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::game::constants::DEFAULT_OBSTACLE_COUNT;
use crate::game::weapons::ClassKey;
use crate::util::rate_limit::SYNC_WRITE_RATE_LIMIT;
use crate::util::time::DEFAULT_SIM_TPS;

/// Which shared store backs the room document
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process store; only sessions in this process share rooms
    Memory,
    Supabase { url: String, key: String },
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of compact text
    pub log_json: bool,

    /// Namespace segment of room document paths
    pub app_id: String,
    /// Room to join; `None` runs offline
    pub room_code: Option<String>,
    pub player_id: Uuid,
    pub player_name: String,
    pub player_class: ClassKey,
    pub player_color: String,

    pub store_backend: StoreBackend,
    pub store_poll_interval: Duration,

    pub sim_tps: u32,
    pub sync_writes_per_sec: u32,
    pub bot_count: usize,
    pub obstacle_count: usize,
    /// Seed for obstacle and bot placement
    pub world_seed: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store_backend = match get("STORE_BACKEND").as_deref().unwrap_or("memory") {
            "memory" => StoreBackend::Memory,
            "supabase" => StoreBackend::Supabase {
                url: get("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?,
                key: get("SUPABASE_KEY").ok_or(ConfigError::Missing("SUPABASE_KEY"))?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    key: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let player_id = match get("PLAYER_ID") {
            Some(raw) => Uuid::parse_str(&raw).map_err(|_| ConfigError::Invalid {
                key: "PLAYER_ID",
                value: raw.clone(),
            })?,
            None => Uuid::new_v4(),
        };

        Ok(Self {
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json: get("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),

            app_id: get("APP_ID").unwrap_or_else(|| "default-app-id".to_string()),
            room_code: get("ROOM_CODE"),
            player_id,
            player_name: get("PLAYER_NAME").unwrap_or_else(|| "Player".to_string()),
            player_class: get("PLAYER_CLASS")
                .map(|raw| ClassKey::parse_or_default(&raw))
                .unwrap_or_default(),
            player_color: get("PLAYER_COLOR").unwrap_or_else(|| "#4299e1".to_string()),

            store_backend,
            store_poll_interval: Duration::from_millis(parse_or(&get, "STORE_POLL_MS", 250)?),

            sim_tps: parse_or(&get, "SIM_TPS", DEFAULT_SIM_TPS)?,
            sync_writes_per_sec: parse_or(&get, "SYNC_WRITES_PER_SEC", SYNC_WRITE_RATE_LIMIT)?,
            bot_count: parse_or(&get, "BOT_COUNT", 0)?,
            obstacle_count: parse_or(&get, "OBSTACLE_COUNT", DEFAULT_OBSTACLE_COUNT)?,
            world_seed: parse_or(&get, "WORLD_SEED", rand::random::<u64>())?,
        })
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_run_offline_in_memory() {
        let defaults = config(&[]).unwrap();
        assert_eq!(defaults.room_code, None);
        assert_eq!(defaults.store_backend, StoreBackend::Memory);
        assert_eq!(defaults.player_class, ClassKey::Swordsman);
        assert_eq!(defaults.sim_tps, 60);
        assert_eq!(defaults.obstacle_count, 15);
        assert_eq!(defaults.app_id, "default-app-id");
        assert!(!defaults.log_json);
    }

    #[test]
    fn unknown_class_falls_back() {
        let unknown = config(&[("PLAYER_CLASS", "necromancer")]).unwrap();
        assert_eq!(unknown.player_class, ClassKey::Swordsman);
        let known = config(&[("PLAYER_CLASS", "hoplita")]).unwrap();
        assert_eq!(known.player_class, ClassKey::Hoplite);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = config(&[("SIM_TPS", "fast")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SIM_TPS", .. }));
    }

    #[test]
    fn supabase_backend_requires_credentials() {
        let err = config(&[("STORE_BACKEND", "supabase")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SUPABASE_URL")));

        let remote = config(&[
            ("STORE_BACKEND", "supabase"),
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_KEY", "k"),
        ])
        .unwrap();
        assert!(matches!(remote.store_backend, StoreBackend::Supabase { .. }));
    }
}
