//! Tunable parameters for the simulation and the session gateway.

use crate::map::MapStyle;
use shared::{CELL_SIZE, GRID_SIZE, MAX_TOWER_LEVEL};
use std::time::Duration;

pub const STARTING_MONEY: u32 = 500;
pub const STARTING_LIVES: u32 = 20;
pub const WAVE_COOLDOWN_SECS: f32 = 10.0;
pub const SPAWN_INTERVAL_SECS: f32 = 1.5;
pub const UPGRADE_GROWTH: f32 = 1.3;
pub const WAVE_BONUS_BASE: u32 = 50;
pub const WAVE_BONUS_PER_WAVE: u32 = 10;
pub const WAVE_BONUS_SCORE: u32 = 100;

/// Everything the engine needs to build and run one game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub grid_size: usize,
    pub cell_size: u32,
    pub map_style: MapStyle,
    /// Map seed; a fresh random seed is drawn when absent.
    pub seed: Option<u64>,
    pub starting_money: u32,
    pub starting_lives: u32,
    pub wave_cooldown: f32,
    pub spawn_interval: f32,
    pub max_tower_level: u32,
    pub upgrade_growth: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            cell_size: CELL_SIZE,
            map_style: MapStyle::EdgeToEdge,
            seed: None,
            starting_money: STARTING_MONEY,
            starting_lives: STARTING_LIVES,
            wave_cooldown: WAVE_COOLDOWN_SECS,
            spawn_interval: SPAWN_INTERVAL_SECS,
            max_tower_level: MAX_TOWER_LEVEL,
            upgrade_growth: UPGRADE_GROWTH,
        }
    }
}

/// Gateway settings: tick pacing and connection limits.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub tick_duration: Duration,
    /// Upper bound on the simulated time advanced by a single tick.
    pub max_delta: f32,
    pub max_clients: usize,
    pub client_timeout: Duration,
}

impl ServerConfig {
    pub fn from_tick_rate(tick_rate: u32) -> Self {
        Self {
            tick_duration: Duration::from_secs_f32(1.0 / tick_rate.max(1) as f32),
            ..Self::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_duration: Duration::from_millis(100),
            max_delta: 0.25,
            max_clients: 16,
            client_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_game_config() {
        let config = GameConfig::default();
        assert_eq!(config.grid_size, 20);
        assert_eq!(config.starting_money, 500);
        assert_eq!(config.starting_lives, 20);
        assert_eq!(config.max_tower_level, 5);
        assert_eq!(config.map_style, MapStyle::EdgeToEdge);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_tick_rate_conversion() {
        let config = ServerConfig::from_tick_rate(10);
        assert_eq!(config.tick_duration.as_millis(), 100);

        // A zero tick rate is clamped instead of dividing by zero
        let config = ServerConfig::from_tick_rate(0);
        assert_eq!(config.tick_duration.as_secs(), 1);
    }
}
