//! Defensive structures: archetype stat tables, terrain modifiers, upgrades
//! and per-archetype targeting.

use crate::enemy::Enemy;
use shared::{
    AttackEvent, AttackTarget, EnemyId, GridPos, PlayerId, Terrain, TowerId, TowerKind,
    TowerView, UpgradePath,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Blast radius around the primary splash target, in grid cells.
pub const SPLASH_RADIUS: f32 = 1.5;
pub const SPLASH_MAX_TARGETS: usize = 5;
pub const SLOW_DURATION: f32 = 2.0;

const MOUNTAIN_RANGE_BONUS: f32 = 1.5;
const MOUNTAIN_DAMAGE_PENALTY: f32 = 0.7;
const WATER_DAMAGE_BONUS: f32 = 1.5;
const WATER_SPEED_PENALTY: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TowerStats {
    pub damage: f32,
    /// Radius in grid cells.
    pub range: f32,
    /// Attacks per second.
    pub attack_speed: f32,
    pub cost: u32,
}

impl TowerStats {
    pub fn base(kind: TowerKind) -> Self {
        let (damage, range, attack_speed, cost) = match kind {
            TowerKind::Basic => (10.0, 3.0, 1.0, 100),
            TowerKind::Fast => (5.0, 2.5, 2.0, 150),
            TowerKind::Heavy => (25.0, 2.5, 0.4, 200),
            TowerKind::Sniper => (8.0, 5.0, 0.5, 150),
            TowerKind::Splash => (6.0, 2.5, 0.8, 250),
            TowerKind::Slow => (3.0, 3.0, 0.8, 200),
        };
        Self {
            damage,
            range,
            attack_speed,
            cost,
        }
    }

    /// Base stats adjusted once for the ground the tower stands on.
    pub fn on_terrain(kind: TowerKind, terrain: Terrain, lake_adjacent: bool) -> Self {
        let mut stats = Self::base(kind);
        if terrain == Terrain::Mountain {
            stats.range *= MOUNTAIN_RANGE_BONUS;
            stats.damage *= MOUNTAIN_DAMAGE_PENALTY;
        }
        if lake_adjacent {
            stats.damage *= WATER_DAMAGE_BONUS;
            stats.attack_speed *= WATER_SPEED_PENALTY;
        }
        stats
    }
}

#[derive(Debug, Clone)]
pub struct Tower {
    pub id: TowerId,
    pub owner: PlayerId,
    pub kind: TowerKind,
    pub position: GridPos,
    pub terrain: Terrain,
    stats: TowerStats,
    level: u32,
    damage_multiplier: f32,
    range_multiplier: f32,
    speed_multiplier: f32,
    upgrades: Vec<UpgradePath>,
    last_attack: Option<f64>,
}

impl Tower {
    pub fn new(
        id: TowerId,
        owner: PlayerId,
        kind: TowerKind,
        position: GridPos,
        terrain: Terrain,
        lake_adjacent: bool,
    ) -> Self {
        Self {
            id,
            owner,
            kind,
            position,
            terrain,
            stats: TowerStats::on_terrain(kind, terrain, lake_adjacent),
            level: 1,
            damage_multiplier: 1.0,
            range_multiplier: 1.0,
            speed_multiplier: 1.0,
            upgrades: Vec::new(),
            last_attack: None,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn cost(&self) -> u32 {
        self.stats.cost
    }

    pub fn damage(&self) -> f32 {
        self.stats.damage * self.damage_multiplier
    }

    pub fn range(&self) -> f32 {
        self.stats.range * self.range_multiplier
    }

    pub fn attack_speed(&self) -> f32 {
        self.stats.attack_speed * self.speed_multiplier
    }

    /// Seconds between shots.
    pub fn cooldown(&self) -> f32 {
        1.0 / self.attack_speed()
    }

    pub fn can_attack(&self, now: f64) -> bool {
        self.last_attack
            .map_or(true, |last| now - last >= f64::from(self.cooldown()))
    }

    /// Cost of the next upgrade: half the build cost per current level.
    pub fn upgrade_cost(&self) -> u32 {
        self.stats.cost * self.level / 2
    }

    /// Multiplies the stat named by `path` by `growth`. Fails at `max_level`.
    pub fn upgrade(&mut self, path: UpgradePath, growth: f32, max_level: u32) -> bool {
        if self.level >= max_level {
            return false;
        }
        match path {
            UpgradePath::Damage => self.damage_multiplier *= growth,
            UpgradePath::Range => self.range_multiplier *= growth,
            UpgradePath::Speed => self.speed_multiplier *= growth,
        }
        self.level += 1;
        self.upgrades.push(path);
        true
    }

    /// Fires at the enemies this archetype picks, if the cooldown allows and
    /// anything is in range.
    pub fn attack(&mut self, enemies: &mut BTreeMap<EnemyId, Enemy>, now: f64) -> Option<AttackEvent> {
        if !self.can_attack(now) {
            return None;
        }

        let (cx, cy) = self.position.center();
        let range = self.range();
        let in_range: Vec<&Enemy> = enemies
            .values()
            .filter(|e| e.is_targetable() && e.distance_to(cx, cy) <= range)
            .collect();

        let target_ids = select_targets(self.kind, &in_range, (cx, cy));
        if target_ids.is_empty() {
            return None;
        }

        let damage = self.damage();
        let mut targets = Vec::with_capacity(target_ids.len());
        for id in target_ids {
            if let Some(enemy) = enemies.get_mut(&id) {
                targets.push(AttackTarget {
                    enemy_id: enemy.id,
                    x: enemy.x,
                    y: enemy.y,
                });
                enemy.take_damage(damage, self.kind, self.owner);
                if self.kind == TowerKind::Slow {
                    enemy.apply_slow(now, SLOW_DURATION);
                }
            }
        }

        self.last_attack = Some(now);

        Some(AttackEvent {
            tower_id: self.id,
            kind: self.kind,
            damage,
            targets,
            radius: (self.kind == TowerKind::Splash).then_some(SPLASH_RADIUS),
            slow_duration: (self.kind == TowerKind::Slow).then_some(SLOW_DURATION),
        })
    }

    pub fn to_view(&self, max_level: u32) -> TowerView {
        TowerView {
            id: self.id,
            owner: self.owner,
            kind: self.kind,
            position: self.position,
            terrain: self.terrain,
            level: self.level,
            damage: self.damage(),
            range: self.range(),
            attack_speed: self.attack_speed(),
            upgrades: self.upgrades.clone(),
            cost: self.stats.cost,
            upgrade_cost: (self.level < max_level).then(|| self.upgrade_cost()),
        }
    }
}

/// Picks target ids among enemies already known to be in range.
pub fn select_targets(kind: TowerKind, in_range: &[&Enemy], origin: (f32, f32)) -> Vec<EnemyId> {
    match kind {
        TowerKind::Sniper => in_range
            .iter()
            .max_by(|a, b| compare(a.distance_traveled(), b.distance_traveled()))
            .map(|e| vec![e.id])
            .unwrap_or_default(),
        TowerKind::Splash => {
            let Some(center) = nearest(in_range, origin) else {
                return Vec::new();
            };
            std::iter::once(center.id)
                .chain(
                    in_range
                        .iter()
                        .filter(|e| e.id != center.id)
                        .filter(|e| e.distance_to(center.x, center.y) <= SPLASH_RADIUS)
                        .map(|e| e.id),
                )
                .take(SPLASH_MAX_TARGETS)
                .collect()
        }
        TowerKind::Basic | TowerKind::Fast | TowerKind::Heavy | TowerKind::Slow => {
            nearest(in_range, origin).map(|e| vec![e.id]).unwrap_or_default()
        }
    }
}

fn nearest<'a>(in_range: &[&'a Enemy], origin: (f32, f32)) -> Option<&'a Enemy> {
    in_range.iter().copied().min_by(|a, b| {
        compare(
            a.distance_to(origin.0, origin.1),
            b.distance_to(origin.0, origin.1),
        )
    })
}

fn compare(a: f32, b: f32) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
