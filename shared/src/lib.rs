use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PROTOCOL_VERSION: u32 = 1;
pub const GRID_SIZE: usize = 20;
pub const CELL_SIZE: u32 = 30;
pub const MAX_TOWER_LEVEL: u32 = 5;

pub type PlayerId = u32;
pub type TowerId = u32;
pub type EnemyId = u32;

/// Terrain of a single grid cell.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terrain {
    Plains,
    /// Elevated ground, buildable, extends tower range.
    Mountain,
    /// Water, never buildable.
    Lake,
    /// The enemy route, never buildable.
    Road,
    Forest,
}

impl Terrain {
    pub fn is_buildable(&self) -> bool {
        !matches!(self, Terrain::Road | Terrain::Lake)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Terrain::Plains => "plains",
            Terrain::Mountain => "mountain",
            Terrain::Lake => "lake",
            Terrain::Road => "road",
            Terrain::Forest => "forest",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TowerKind {
    Basic,
    Fast,
    Heavy,
    Sniper,
    Splash,
    Slow,
}

impl TowerKind {
    pub const ALL: [TowerKind; 6] = [
        TowerKind::Basic,
        TowerKind::Fast,
        TowerKind::Heavy,
        TowerKind::Sniper,
        TowerKind::Splash,
        TowerKind::Slow,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TowerKind::Basic => "basic",
            TowerKind::Fast => "fast",
            TowerKind::Heavy => "heavy",
            TowerKind::Sniper => "sniper",
            TowerKind::Splash => "splash",
            TowerKind::Slow => "slow",
        }
    }

    /// Parses a wire name, accepting the older `cannon`/`aoe`/`freeze` aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "basic" => Some(TowerKind::Basic),
            "fast" => Some(TowerKind::Fast),
            "heavy" | "cannon" => Some(TowerKind::Heavy),
            "sniper" => Some(TowerKind::Sniper),
            "splash" | "aoe" => Some(TowerKind::Splash),
            "slow" | "freeze" => Some(TowerKind::Slow),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    Grunt,
    Fast,
    Tank,
    Flying,
}

impl EnemyKind {
    pub fn name(&self) -> &'static str {
        match self {
            EnemyKind::Grunt => "grunt",
            EnemyKind::Fast => "fast",
            EnemyKind::Tank => "tank",
            EnemyKind::Flying => "flying",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpgradePath {
    Damage,
    Range,
    Speed,
}

impl UpgradePath {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "damage" => Some(UpgradePath::Damage),
            "range" => Some(UpgradePath::Range),
            "speed" => Some(UpgradePath::Speed),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Continuous coordinate of the cell centre.
    pub fn center(&self) -> (f32, f32) {
        (self.x as f32 + 0.5, self.y as f32 + 0.5)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MapView {
    pub grid_size: usize,
    pub cell_size: u32,
    /// Row-major: `terrain[y][x]`.
    pub terrain: Vec<Vec<Terrain>>,
    pub path: Vec<GridPos>,
    pub start: GridPos,
    pub end: GridPos,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerView {
    pub id: PlayerId,
    pub color: String,
    pub money: u32,
    pub score: u32,
    pub lives: u32,
    pub towers_built: u32,
    pub enemies_defeated: u32,
    pub active: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TowerView {
    pub id: TowerId,
    pub owner: PlayerId,
    pub kind: TowerKind,
    pub position: GridPos,
    pub terrain: Terrain,
    pub level: u32,
    pub damage: f32,
    pub range: f32,
    pub attack_speed: f32,
    pub upgrades: Vec<UpgradePath>,
    pub cost: u32,
    /// `None` once the tower is at the level cap.
    pub upgrade_cost: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EnemyView {
    pub id: EnemyId,
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    pub distance_traveled: f32,
    pub slowed: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AttackTarget {
    pub enemy_id: EnemyId,
    pub x: f32,
    pub y: f32,
}

/// One tower shot fired during the last tick.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AttackEvent {
    pub tower_id: TowerId,
    pub kind: TowerKind,
    pub damage: f32,
    pub targets: Vec<AttackTarget>,
    pub radius: Option<f32>,
    pub slow_duration: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Snapshot {
    pub map: MapView,
    pub players: BTreeMap<PlayerId, PlayerView>,
    pub towers: BTreeMap<TowerId, TowerView>,
    pub enemies: BTreeMap<EnemyId, EnemyView>,
    pub current_wave: u32,
    pub wave_in_progress: bool,
    pub time_to_next_wave: f32,
    pub game_started: bool,
    pub game_over: bool,
    /// Attacks fired during the most recent tick only.
    pub recent_attacks: Vec<AttackEvent>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    // Client -> server
    Connect {
        client_version: u32,
    },
    PlaceTower {
        x: i32,
        y: i32,
        tower_type: String,
    },
    UpgradeTower {
        tower_id: TowerId,
        upgrade_path: String,
    },
    StartWave,
    GetState,
    Heartbeat,
    Disconnect,

    // Server -> client
    Connected {
        client_id: PlayerId,
    },
    Disconnected {
        reason: String,
    },
    TowerPlaced {
        success: bool,
        message: String,
        tower: Option<TowerView>,
    },
    TowerUpgraded {
        success: bool,
        message: String,
        tower: Option<TowerView>,
    },
    WaveStarted {
        success: bool,
        message: String,
        wave: u32,
    },
    State {
        snapshot: Box<Snapshot>,
    },
    StateUpdate {
        snapshot: Box<Snapshot>,
    },
    PlayerLeft {
        player_id: PlayerId,
    },
    CommandRejected {
        reason: String,
    },
}
