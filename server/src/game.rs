//! Authoritative simulation
//!
//! [`GameState`] owns every player, tower and enemy and advances them with a
//! fixed per-tick pipeline:
//!
//! 1. spawn enemies whose scheduled offset has elapsed
//! 2. move enemies along the road
//! 3. let every tower attack
//! 4. reap dead enemies (killer is paid) and enemies that reached the end
//!    (every active player loses lives)
//! 5. close the wave when it is cleared, or auto-start the next one once
//!    the cooldown has run out
//! 6. end the game when every player is out of lives
//!
//! Player commands run between ticks and are either fully applied or
//! rejected with a [`CommandError`] without touching state.
//!
//! All timestamps live on the engine's own clock, the sum of the `dt`
//! values passed to [`GameState::update`].

use crate::config::{GameConfig, WAVE_BONUS_BASE, WAVE_BONUS_PER_WAVE, WAVE_BONUS_SCORE};
use crate::enemy::Enemy;
use crate::error::CommandError;
use crate::map::GameMap;
use crate::player::{ColorPalette, Player};
use crate::tower::{Tower, TowerStats};
use crate::wave::{self, SpawnEntry};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{
    AttackEvent, EnemyId, EnemyKind, GridPos, PlayerId, Snapshot, TowerId, TowerKind, TowerView,
    UpgradePath,
};
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    NotStarted,
    Running,
    GameOver,
}

#[derive(Debug)]
pub struct GameState {
    pub tick: u32,
    config: GameConfig,
    map: GameMap,
    waypoints: Vec<(f32, f32)>,
    players: BTreeMap<PlayerId, Player>,
    towers: BTreeMap<TowerId, Tower>,
    enemies: BTreeMap<EnemyId, Enemy>,
    palette: ColorPalette,
    rng: StdRng,
    next_tower_id: TowerId,
    next_enemy_id: EnemyId,
    clock: f64,
    phase: GamePhase,
    current_wave: u32,
    wave_in_progress: bool,
    wave_started_at: f64,
    wave_ended_at: f64,
    spawn_queue: VecDeque<SpawnEntry>,
    recent_attacks: Vec<AttackEvent>,
}

impl GameState {
    /// Generates a fresh map from the configured seed, or a random one.
    pub fn new(config: GameConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let map = GameMap::generate(config.grid_size, config.cell_size, config.map_style, &mut rng);
        info!("Created game with {:?} map (seed {})", config.map_style, seed);
        Self::build(config, map, rng)
    }

    /// Runs the game on a prepared map.
    pub fn with_map(config: GameConfig, map: GameMap) -> Self {
        let rng = StdRng::seed_from_u64(config.seed.unwrap_or_default());
        Self::build(config, map, rng)
    }

    fn build(config: GameConfig, map: GameMap, rng: StdRng) -> Self {
        Self {
            tick: 0,
            waypoints: map.waypoints(),
            config,
            map,
            players: BTreeMap::new(),
            towers: BTreeMap::new(),
            enemies: BTreeMap::new(),
            palette: ColorPalette::new(),
            rng,
            next_tower_id: 1,
            next_enemy_id: 1,
            clock: 0.0,
            phase: GamePhase::NotStarted,
            current_wave: 0,
            wave_in_progress: false,
            wave_started_at: 0.0,
            wave_ended_at: 0.0,
            spawn_queue: VecDeque::new(),
            recent_attacks: Vec::new(),
        }
    }

    pub fn map(&self) -> &GameMap {
        &self.map
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn current_wave(&self) -> u32 {
        self.current_wave
    }

    pub fn wave_in_progress(&self) -> bool {
        self.wave_in_progress
    }

    pub fn pending_spawns(&self) -> usize {
        self.spawn_queue.len()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn players(&self) -> &BTreeMap<PlayerId, Player> {
        &self.players
    }

    pub fn towers(&self) -> &BTreeMap<TowerId, Tower> {
        &self.towers
    }

    pub fn enemies(&self) -> &BTreeMap<EnemyId, Enemy> {
        &self.enemies
    }

    pub fn recent_attacks(&self) -> &[AttackEvent] {
        &self.recent_attacks
    }

    pub fn add_player(&mut self, id: PlayerId) {
        if self.players.contains_key(&id) {
            return;
        }
        let color = self.palette.assign(&mut self.rng);
        let player = Player::new(id, color, self.config.starting_money, self.config.starting_lives);
        info!("Added player {} with color {}", id, player.color);
        self.players.insert(id, player);
    }

    /// Drops the player, their towers and their colour. Returns false if unknown.
    pub fn remove_player(&mut self, id: &PlayerId) -> bool {
        let Some(player) = self.players.remove(id) else {
            return false;
        };
        self.palette.release(&player.color);

        let before = self.towers.len();
        self.towers.retain(|_, tower| tower.owner != *id);
        info!(
            "Removed player {} and {} of their towers",
            id,
            before - self.towers.len()
        );
        true
    }

    pub fn place_tower(
        &mut self,
        player_id: PlayerId,
        x: i32,
        y: i32,
        tower_type: &str,
    ) -> Result<TowerView, CommandError> {
        self.ensure_not_over()?;
        if !self.players.contains_key(&player_id) {
            return Err(CommandError::UnknownPlayer(player_id));
        }

        let pos = GridPos::new(x, y);
        let terrain = self
            .map
            .terrain_at(pos)
            .ok_or(CommandError::OutOfBounds { x, y })?;
        if !terrain.is_buildable() {
            return Err(CommandError::NotBuildable);
        }
        if self.towers.values().any(|t| t.position == pos) {
            return Err(CommandError::CellOccupied);
        }

        let kind = TowerKind::from_name(tower_type)
            .ok_or_else(|| CommandError::UnknownTowerType(tower_type.to_string()))?;
        let cost = TowerStats::base(kind).cost;

        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(CommandError::UnknownPlayer(player_id))?;
        if !player.spend(cost) {
            return Err(CommandError::InsufficientFunds { needed: cost });
        }
        player.towers_built += 1;

        let id = self.next_tower_id;
        self.next_tower_id += 1;
        let tower = Tower::new(id, player_id, kind, pos, terrain, self.map.is_lake_adjacent(pos));
        let view = tower.to_view(self.config.max_tower_level);
        self.towers.insert(id, tower);

        info!(
            "Player {} placed {} tower {} at ({}, {}) on {}",
            player_id,
            kind.name(),
            id,
            x,
            y,
            terrain.name()
        );
        Ok(view)
    }

    pub fn upgrade_tower(
        &mut self,
        player_id: PlayerId,
        tower_id: TowerId,
        upgrade_path: &str,
    ) -> Result<TowerView, CommandError> {
        self.ensure_not_over()?;
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(CommandError::UnknownPlayer(player_id))?;
        let tower = self
            .towers
            .get_mut(&tower_id)
            .ok_or(CommandError::UnknownTower(tower_id))?;

        if tower.owner != player_id {
            return Err(CommandError::NotOwner);
        }
        let path = UpgradePath::from_name(upgrade_path)
            .ok_or_else(|| CommandError::UnknownUpgradePath(upgrade_path.to_string()))?;
        if tower.level() >= self.config.max_tower_level {
            return Err(CommandError::MaxLevel);
        }

        let cost = tower.upgrade_cost();
        if !player.spend(cost) {
            return Err(CommandError::InsufficientFunds { needed: cost });
        }
        tower.upgrade(path, self.config.upgrade_growth, self.config.max_tower_level);

        info!(
            "Player {} upgraded tower {} ({:?}) to level {}",
            player_id,
            tower_id,
            path,
            tower.level()
        );
        Ok(tower.to_view(self.config.max_tower_level))
    }

    /// First call starts the game with wave 1; later calls skip the cooldown.
    pub fn start_wave(&mut self) -> Result<u32, CommandError> {
        match self.phase {
            GamePhase::GameOver => Err(CommandError::GameOver),
            GamePhase::NotStarted => {
                self.phase = GamePhase::Running;
                info!("Game started");
                self.start_next_wave();
                Ok(self.current_wave)
            }
            GamePhase::Running if self.wave_in_progress => Err(CommandError::WaveInProgress),
            GamePhase::Running => {
                self.start_next_wave();
                Ok(self.current_wave)
            }
        }
    }

    /// Spawns one enemy at the start of the road.
    pub fn spawn_enemy(&mut self, kind: EnemyKind) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id += 1;
        self.enemies.insert(id, Enemy::spawn(id, kind, &self.waypoints));
        id
    }

    /// Advances the simulation by `dt` seconds. Does nothing unless running.
    pub fn update(&mut self, dt: f32) {
        if self.phase != GamePhase::Running {
            return;
        }

        let dt = dt.max(0.0);
        self.tick += 1;
        self.clock += f64::from(dt);
        self.recent_attacks.clear();

        self.spawn_due_enemies();
        self.move_enemies(dt);
        self.resolve_attacks();
        self.reap_enemies();
        self.advance_waves();
        self.check_game_over();
    }

    pub fn time_to_next_wave(&self) -> f32 {
        if self.phase != GamePhase::Running || self.wave_in_progress {
            return 0.0;
        }
        let elapsed = self.clock - self.wave_ended_at;
        (f64::from(self.config.wave_cooldown) - elapsed).max(0.0) as f32
    }

    pub fn snapshot(&self) -> Snapshot {
        let max_level = self.config.max_tower_level;
        Snapshot {
            map: self.map.to_view(),
            players: self.players.iter().map(|(id, p)| (*id, p.to_view())).collect(),
            towers: self
                .towers
                .iter()
                .map(|(id, t)| (*id, t.to_view(max_level)))
                .collect(),
            enemies: self.enemies.iter().map(|(id, e)| (*id, e.to_view())).collect(),
            current_wave: self.current_wave,
            wave_in_progress: self.wave_in_progress,
            time_to_next_wave: self.time_to_next_wave(),
            game_started: self.phase != GamePhase::NotStarted,
            game_over: self.phase == GamePhase::GameOver,
            recent_attacks: self.recent_attacks.clone(),
        }
    }

    fn ensure_not_over(&self) -> Result<(), CommandError> {
        if self.phase == GamePhase::GameOver {
            return Err(CommandError::GameOver);
        }
        Ok(())
    }

    fn start_next_wave(&mut self) {
        self.current_wave += 1;
        self.wave_in_progress = true;
        self.wave_started_at = self.clock;
        self.spawn_queue = wave::composition(self.current_wave, self.config.spawn_interval).into();
        info!(
            "Wave {} started with {} enemies",
            self.current_wave,
            self.spawn_queue.len()
        );
    }

    fn spawn_due_enemies(&mut self) {
        if !self.wave_in_progress {
            return;
        }
        let elapsed = self.clock - self.wave_started_at;
        while let Some(entry) = self.spawn_queue.front().copied() {
            if f64::from(entry.offset) > elapsed {
                break;
            }
            self.spawn_queue.pop_front();
            self.spawn_enemy(entry.kind);
        }
    }

    fn move_enemies(&mut self, dt: f32) {
        for enemy in self.enemies.values_mut() {
            enemy.advance(dt, self.clock, &self.waypoints);
        }
    }

    fn resolve_attacks(&mut self) {
        for tower in self.towers.values_mut() {
            if let Some(event) = tower.attack(&mut self.enemies, self.clock) {
                self.recent_attacks.push(event);
            }
        }
    }

    fn reap_enemies(&mut self) {
        let finished: Vec<EnemyId> = self
            .enemies
            .values()
            .filter(|e| !e.is_alive() || e.has_reached_end())
            .map(|e| e.id)
            .collect();

        for id in finished {
            let Some(enemy) = self.enemies.remove(&id) else {
                continue;
            };

            if !enemy.is_alive() {
                if let Some(killer) = enemy.killed_by().and_then(|pid| self.players.get_mut(&pid)) {
                    killer.defeat_enemy(enemy.stats.reward);
                }
                debug!("Enemy {} ({}) defeated", id, enemy.kind.name());
            } else {
                for player in self.players.values_mut().filter(|p| p.is_active()) {
                    if player.lose_lives(enemy.stats.damage) {
                        info!("Player {} is out of lives", player.id);
                    }
                }
                debug!("Enemy {} ({}) reached the end", id, enemy.kind.name());
            }
        }
    }

    fn advance_waves(&mut self) {
        if self.wave_in_progress {
            if self.spawn_queue.is_empty() && self.enemies.is_empty() {
                self.end_wave();
            }
        } else if self.clock - self.wave_ended_at >= f64::from(self.config.wave_cooldown) {
            self.start_next_wave();
        }
    }

    fn end_wave(&mut self) {
        self.wave_in_progress = false;
        self.wave_ended_at = self.clock;

        let bonus = WAVE_BONUS_BASE + WAVE_BONUS_PER_WAVE * self.current_wave;
        for player in self.players.values_mut().filter(|p| p.is_active()) {
            player.earn(bonus);
            player.add_score(WAVE_BONUS_SCORE);
        }
        info!("Wave {} cleared, paid {} to each active player", self.current_wave, bonus);
    }

    fn check_game_over(&mut self) {
        if !self.players.is_empty() && self.players.values().all(|p| !p.is_active()) {
            self.phase = GamePhase::GameOver;
            self.spawn_queue.clear();
            info!("Game over after wave {}", self.current_wave);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Terrain;

    const ROAD_ROW: i32 = 10;

    /// 20x20 plains with a straight road along row 10 and a lake at (3, 3).
    fn straight_map() -> GameMap {
        let mut terrain = vec![vec![Terrain::Plains; 20]; 20];
        terrain[3][3] = Terrain::Lake;
        terrain[2][8] = Terrain::Mountain;
        let path = (0..20).map(|x| GridPos::new(x, ROAD_ROW)).collect();
        GameMap::from_parts(30, terrain, path)
    }

    fn test_game(config: GameConfig) -> GameState {
        let mut game = GameState::with_map(config, straight_map());
        game.add_player(1);
        game.add_player(2);
        game
    }

    fn run_until_wave_clears(game: &mut GameState, max_ticks: u32) {
        for _ in 0..max_ticks {
            game.update(0.1);
            if !game.wave_in_progress() || game.phase() == GamePhase::GameOver {
                return;
            }
        }
        panic!("wave did not clear within {} ticks", max_ticks);
    }

    #[test]
    fn test_place_basic_tower_debits_cost() {
        let mut game = test_game(GameConfig::default());
        let view = game.place_tower(1, 5, 9, "basic").unwrap();

        assert_eq!(view.position, GridPos::new(5, 9));
        assert_eq!(view.owner, 1);
        assert_eq!(game.player(1).unwrap().money(), 400);
        assert_eq!(game.player(1).unwrap().towers_built, 1);
        assert_eq!(game.towers().len(), 1);
    }

    #[test]
    fn test_invalid_placements_leave_state_unchanged() {
        let mut game = test_game(GameConfig::default());
        game.place_tower(1, 5, 9, "basic").unwrap();

        let cases = [
            (99, 4, 4, "basic", CommandError::UnknownPlayer(99)),
            (1, 5, ROAD_ROW, "basic", CommandError::NotBuildable),
            (1, 3, 3, "basic", CommandError::NotBuildable),
            (1, 5, 9, "basic", CommandError::CellOccupied),
            (1, -1, 4, "basic", CommandError::OutOfBounds { x: -1, y: 4 }),
            (1, 4, 4, "laser", CommandError::UnknownTowerType("laser".to_string())),
        ];

        for (player, x, y, kind, expected) in cases {
            let result = game.place_tower(player, x, y, kind);
            assert_eq!(result.unwrap_err(), expected);
            assert_eq!(game.player(1).unwrap().money(), 400);
            assert_eq!(game.towers().len(), 1);
        }
    }

    #[test]
    fn test_placement_rejected_when_unaffordable() {
        let mut game = test_game(GameConfig::default());
        game.place_tower(1, 4, 4, "splash").unwrap();
        assert_eq!(game.player(1).unwrap().money(), 250);

        game.place_tower(1, 6, 4, "heavy").unwrap();
        assert_eq!(game.player(1).unwrap().money(), 50);

        let result = game.place_tower(1, 8, 4, "basic");
        assert_eq!(result.unwrap_err(), CommandError::InsufficientFunds { needed: 100 });
        assert_eq!(game.player(1).unwrap().money(), 50);
        assert_eq!(game.towers().len(), 2);
    }

    #[test]
    fn test_terrain_applies_at_placement() {
        let mut game = test_game(GameConfig::default());
        let on_mountain = game.place_tower(1, 8, 2, "basic").unwrap();
        assert_eq!(on_mountain.terrain, Terrain::Mountain);
        assert!((on_mountain.range - 4.5).abs() < 1e-4);

        let by_lake = game.place_tower(2, 4, 4, "basic").unwrap();
        assert!((by_lake.damage - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_upgrade_validation() {
        let mut game = test_game(GameConfig::default());
        let tower = game.place_tower(1, 5, 9, "basic").unwrap();

        assert_eq!(
            game.upgrade_tower(2, tower.id, "damage").unwrap_err(),
            CommandError::NotOwner
        );
        assert_eq!(
            game.upgrade_tower(1, 42, "damage").unwrap_err(),
            CommandError::UnknownTower(42)
        );
        assert_eq!(
            game.upgrade_tower(1, tower.id, "armor").unwrap_err(),
            CommandError::UnknownUpgradePath("armor".to_string())
        );

        // Level 1 -> 2 costs 50, 2 -> 3 costs 100, 3 -> 4 costs 150
        let upgraded = game.upgrade_tower(1, tower.id, "damage").unwrap();
        assert_eq!(upgraded.level, 2);
        assert!((upgraded.damage - 13.0).abs() < 1e-4);
        game.upgrade_tower(1, tower.id, "range").unwrap();
        game.upgrade_tower(1, tower.id, "speed").unwrap();
        assert_eq!(game.player(1).unwrap().money(), 100);

        assert_eq!(
            game.upgrade_tower(1, tower.id, "damage").unwrap_err(),
            CommandError::InsufficientFunds { needed: 200 }
        );
        assert_eq!(game.player(1).unwrap().money(), 100);
        assert_eq!(game.towers()[&tower.id].level(), 4);
    }

    #[test]
    fn test_upgrade_stops_at_level_cap() {
        let config = GameConfig {
            starting_money: 10_000,
            ..GameConfig::default()
        };
        let mut game = test_game(config);
        let tower = game.place_tower(1, 5, 9, "basic").unwrap();
        for _ in 0..4 {
            game.upgrade_tower(1, tower.id, "damage").unwrap();
        }

        let money = game.player(1).unwrap().money();
        assert_eq!(
            game.upgrade_tower(1, tower.id, "damage").unwrap_err(),
            CommandError::MaxLevel
        );
        assert_eq!(game.player(1).unwrap().money(), money);
    }

    #[test]
    fn test_start_wave_transitions() {
        let mut game = test_game(GameConfig::default());
        assert_eq!(game.phase(), GamePhase::NotStarted);

        assert_eq!(game.start_wave(), Ok(1));
        assert_eq!(game.phase(), GamePhase::Running);
        assert!(game.wave_in_progress());
        assert_eq!(game.pending_spawns(), 7);

        assert_eq!(game.start_wave(), Err(CommandError::WaveInProgress));
        assert_eq!(game.current_wave(), 1);
    }

    #[test]
    fn test_update_is_inert_before_start() {
        let mut game = test_game(GameConfig::default());
        game.update(1.0);
        assert_eq!(game.tick, 0);
        assert_eq!(game.clock(), 0.0);
        assert!(game.enemies().is_empty());
    }

    #[test]
    fn test_enemies_spawn_on_schedule() {
        let mut game = test_game(GameConfig::default());
        game.start_wave().unwrap();

        game.update(0.25);
        assert_eq!(game.enemies().len(), 1);
        assert_eq!(game.pending_spawns(), 6);

        // Next spawn is due 1.5s after the wave started
        for _ in 0..4 {
            game.update(0.25);
        }
        assert_eq!(game.enemies().len(), 1);
        game.update(0.25);
        assert_eq!(game.enemies().len(), 2);
    }

    #[test]
    fn test_waves_progress_after_long_uptime() {
        let mut game = test_game(GameConfig::default());
        game.start_wave().unwrap();
        // Roughly 24 days of uptime
        game.clock = 2_097_152.0;
        game.wave_started_at = game.clock;

        let before = game.clock();
        for _ in 0..100 {
            game.update(0.1);
        }
        assert!(game.clock() - before > 9.9);
        assert_eq!(game.pending_spawns(), 0);

        run_until_wave_clears(&mut game, 1000);
        assert!(!game.wave_in_progress());
        assert!(game.time_to_next_wave() > 9.0);
    }

    #[test]
    fn test_leaked_enemies_cost_every_player_lives() {
        let mut game = test_game(GameConfig::default());
        game.start_wave().unwrap();
        run_until_wave_clears(&mut game, 1000);

        // Wave 1 is three tanks (3 lives each) and four fast enemies (1 each)
        for id in [1, 2] {
            let player = game.player(id).unwrap();
            assert_eq!(player.lives(), 7);
            assert_eq!(player.money(), 500 + 60);
            assert_eq!(player.score(), 100);
            assert!(player.is_active());
        }
        assert!(game.time_to_next_wave() > 9.0);
    }

    #[test]
    fn test_next_wave_starts_after_cooldown() {
        let mut game = test_game(GameConfig::default());
        game.start_wave().unwrap();
        run_until_wave_clears(&mut game, 1000);
        assert_eq!(game.current_wave(), 1);

        for _ in 0..105 {
            game.update(0.1);
        }
        assert_eq!(game.current_wave(), 2);
        assert!(game.wave_in_progress());
    }

    #[test]
    fn test_manual_start_skips_cooldown() {
        let mut game = test_game(GameConfig::default());
        game.start_wave().unwrap();
        run_until_wave_clears(&mut game, 1000);

        assert_eq!(game.start_wave(), Ok(2));
        assert_eq!(game.pending_spawns(), 9);
    }

    #[test]
    fn test_kill_reward_goes_to_tower_owner() {
        let config = GameConfig {
            starting_money: 2000,
            ..GameConfig::default()
        };
        let mut game = test_game(config);
        for x in (2..=16).step_by(2) {
            game.place_tower(1, x, ROAD_ROW - 1, "basic").unwrap();
        }
        game.start_wave().unwrap();
        run_until_wave_clears(&mut game, 1000);

        let owner = game.player(1).unwrap();
        let other = game.player(2).unwrap();
        assert!(owner.enemies_defeated > 0);
        assert!(owner.score() > 100);
        assert_eq!(other.enemies_defeated, 0);
        assert_eq!(other.score(), 100);
        assert_eq!(other.money(), 2000 + 60);
    }

    #[test]
    fn test_recent_attacks_reset_each_tick() {
        let mut game = test_game(GameConfig::default());
        game.place_tower(1, 0, ROAD_ROW - 1, "basic").unwrap();
        game.start_wave().unwrap();

        game.update(0.1);
        assert_eq!(game.recent_attacks().len(), 1);
        assert_eq!(game.snapshot().recent_attacks.len(), 1);

        game.update(0.1);
        assert!(game.recent_attacks().is_empty());
    }

    #[test]
    fn test_game_over_when_all_players_out_of_lives() {
        let config = GameConfig {
            starting_lives: 1,
            ..GameConfig::default()
        };
        let mut game = test_game(config);
        game.start_wave().unwrap();
        run_until_wave_clears(&mut game, 1000);

        assert_eq!(game.phase(), GamePhase::GameOver);
        assert!(game.snapshot().game_over);
        assert!(game.players().values().all(|p| !p.is_active()));

        let clock = game.clock();
        let wave = game.current_wave();
        for _ in 0..200 {
            game.update(0.1);
        }
        assert_eq!(game.clock(), clock);
        assert_eq!(game.current_wave(), wave);
        assert_eq!(game.start_wave(), Err(CommandError::GameOver));
        assert_eq!(game.place_tower(1, 4, 4, "basic").unwrap_err(), CommandError::GameOver);
    }

    #[test]
    fn test_empty_server_is_not_game_over() {
        let mut game = GameState::with_map(GameConfig::default(), straight_map());
        game.start_wave().unwrap();
        for _ in 0..100 {
            game.update(0.1);
        }
        assert_eq!(game.phase(), GamePhase::Running);
    }

    #[test]
    fn test_remove_player_drops_towers_and_color() {
        let mut game = test_game(GameConfig::default());
        game.place_tower(1, 4, 4, "basic").unwrap();
        game.place_tower(2, 6, 4, "basic").unwrap();
        let color = game.player(1).unwrap().color.clone();

        assert!(game.remove_player(&1));
        assert!(!game.remove_player(&1));
        assert_eq!(game.towers().len(), 1);
        assert!(game.towers().values().all(|t| t.owner == 2));

        game.add_player(3);
        assert_eq!(game.player(3).unwrap().color, color);
    }

    #[test]
    fn test_players_get_distinct_colors() {
        let game = test_game(GameConfig::default());
        assert_ne!(game.player(1).unwrap().color, game.player(2).unwrap().color);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut game = test_game(GameConfig::default());
        game.place_tower(1, 4, 4, "sniper").unwrap();
        game.start_wave().unwrap();
        game.update(0.1);

        let snapshot = game.snapshot();
        assert_eq!(snapshot.players.len(), 2);
        assert_eq!(snapshot.towers.len(), 1);
        assert_eq!(snapshot.enemies.len(), 1);
        assert_eq!(snapshot.current_wave, 1);
        assert!(snapshot.wave_in_progress);
        assert!(snapshot.game_started);
        assert!(!snapshot.game_over);
        assert_eq!(snapshot.time_to_next_wave, 0.0);
        assert_eq!(snapshot.map.path.len(), 20);
    }

    #[test]
    fn test_generated_game_is_reproducible() {
        let config = GameConfig {
            seed: Some(1234),
            ..GameConfig::default()
        };
        let a = GameState::new(config.clone());
        let b = GameState::new(config);
        assert_eq!(a.snapshot().map, b.snapshot().map);
    }
}
