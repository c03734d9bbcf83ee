//! Hostile units: archetype stats, damage/resistance rules and path movement.

use shared::{EnemyId, EnemyKind, EnemyView, PlayerId, TowerKind};

/// Speed multiplier while a slow effect is active.
pub const SLOW_FACTOR: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub max_health: f32,
    /// Grid cells per second.
    pub speed: f32,
    pub reward: u32,
    /// Lives taken from each active player on reaching the end.
    pub damage: u32,
}

impl EnemyStats {
    pub fn for_kind(kind: EnemyKind) -> Self {
        let (max_health, speed, reward, damage) = match kind {
            EnemyKind::Grunt => (100.0, 1.0, 10, 1),
            EnemyKind::Fast => (50.0, 2.5, 8, 1),
            EnemyKind::Tank => (300.0, 0.6, 25, 3),
            EnemyKind::Flying => (80.0, 1.8, 15, 2),
        };
        Self {
            max_health,
            speed,
            reward,
            damage,
        }
    }
}

/// Fraction of incoming damage an enemy ignores from a given tower kind.
/// Negative values mean the enemy takes extra damage.
pub fn resistance(enemy: EnemyKind, tower: TowerKind) -> f32 {
    use TowerKind::*;
    match (enemy, tower) {
        (EnemyKind::Grunt, _) => 0.0,

        (EnemyKind::Fast, Sniper) => 0.3,
        (EnemyKind::Fast, Splash) => -0.2,
        (EnemyKind::Fast, _) => 0.0,

        (EnemyKind::Tank, Heavy) => -0.3,
        (EnemyKind::Tank, Sniper) => 0.1,
        (EnemyKind::Tank, Splash) => 0.2,
        (EnemyKind::Tank, Basic | Fast | Slow) => 0.3,

        (EnemyKind::Flying, Sniper) => 0.0,
        (EnemyKind::Flying, Heavy) => 0.6,
        (EnemyKind::Flying, Splash) => 0.4,
        (EnemyKind::Flying, Basic | Fast | Slow) => 0.5,
    }
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EnemyId,
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub stats: EnemyStats,
    health: f32,
    next_waypoint: usize,
    distance_traveled: f32,
    slowed_until: Option<f64>,
    alive: bool,
    reached_end: bool,
    killed_by: Option<PlayerId>,
}

impl Enemy {
    /// Places a new enemy on the first waypoint of `path`.
    pub fn spawn(id: EnemyId, kind: EnemyKind, path: &[(f32, f32)]) -> Self {
        let stats = EnemyStats::for_kind(kind);
        let (x, y) = path.first().copied().unwrap_or((0.0, 0.0));
        Self {
            id,
            kind,
            x,
            y,
            stats,
            health: stats.max_health,
            next_waypoint: 0,
            distance_traveled: 0.0,
            slowed_until: None,
            alive: true,
            reached_end: false,
            killed_by: None,
        }
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn distance_traveled(&self) -> f32 {
        self.distance_traveled
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn has_reached_end(&self) -> bool {
        self.reached_end
    }

    /// Owner of the tower that landed the killing blow.
    pub fn killed_by(&self) -> Option<PlayerId> {
        self.killed_by
    }

    /// Alive and still on the road.
    pub fn is_targetable(&self) -> bool {
        self.alive && !self.reached_end
    }

    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }

    /// Applies damage after resistance and returns true exactly once, on the
    /// hit that takes health to zero.
    pub fn take_damage(&mut self, amount: f32, source: TowerKind, attacker: PlayerId) -> bool {
        if !self.alive {
            return false;
        }

        let applied = (amount * (1.0 - resistance(self.kind, source))).max(0.0);
        self.health = (self.health - applied).max(0.0);

        if self.health <= 0.0 {
            self.alive = false;
            self.killed_by = Some(attacker);
            return true;
        }
        false
    }

    pub fn apply_slow(&mut self, now: f64, duration: f32) {
        let until = now + f64::from(duration);
        self.slowed_until = Some(self.slowed_until.map_or(until, |current| current.max(until)));
    }

    pub fn speed_modifier(&self, now: f64) -> f32 {
        match self.slowed_until {
            Some(until) if now < until => SLOW_FACTOR,
            _ => 1.0,
        }
    }

    pub fn effective_speed(&self, now: f64) -> f32 {
        self.stats.speed * self.speed_modifier(now)
    }

    /// Moves along `path` for `dt` seconds, consuming as many waypoints as
    /// the step covers. Returns true on the tick the final waypoint is reached.
    pub fn advance(&mut self, dt: f32, now: f64, path: &[(f32, f32)]) -> bool {
        if !self.alive || self.reached_end {
            return false;
        }

        if matches!(self.slowed_until, Some(until) if now >= until) {
            self.slowed_until = None;
        }

        let mut remaining = (self.effective_speed(now) * dt).max(0.0);

        while let Some(&(wx, wy)) = path.get(self.next_waypoint) {
            let to_waypoint = self.distance_to(wx, wy);
            if to_waypoint <= remaining {
                self.x = wx;
                self.y = wy;
                remaining -= to_waypoint;
                self.distance_traveled += to_waypoint;
                self.next_waypoint += 1;
            } else {
                let ratio = remaining / to_waypoint;
                self.x += (wx - self.x) * ratio;
                self.y += (wy - self.y) * ratio;
                self.distance_traveled += remaining;
                break;
            }
        }

        if self.next_waypoint >= path.len() {
            self.reached_end = true;
            return true;
        }
        false
    }

    pub fn to_view(&self) -> EnemyView {
        EnemyView {
            id: self.id,
            kind: self.kind,
            x: self.x,
            y: self.y,
            health: self.health,
            max_health: self.stats.max_health,
            speed: self.stats.speed,
            distance_traveled: self.distance_traveled,
            slowed: self.slowed_until.is_some(),
        }
    }
}
