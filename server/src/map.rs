//! Procedural map generation
//!
//! A map is a square grid of [`Terrain`] cells plus one ordered road that
//! enemies follow. Generation happens once per game and is a pure function
//! of the random source handed in, so a seed reproduces the same map.
//!
//! Two layouts are supported:
//! - [`MapStyle::EdgeToEdge`]: the road joins two different random edges via
//!   a goal-biased random walk, then mountain and lake clusters are grown
//!   around random seed cells.
//! - [`MapStyle::Winding`]: the road crosses from the left edge to the right
//!   edge with vertical jitter and short detours, then rivers, mountain
//!   blocks and forest are painted around it.
//!
//! Terrain painting never overwrites a road cell.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{GridPos, MapView, Terrain};
use std::collections::HashSet;

/// Smallest grid the generators can lay out sensibly.
pub const MIN_GRID_SIZE: usize = 8;

/// Probability that a random-walk step heads straight for the goal.
const GOAL_BIAS: f64 = 0.7;
/// Probability that a neighbour joins a growing terrain cluster.
const CLUSTER_SPREAD: f64 = 0.4;
/// Largest offset of the road endpoints from the middle of an edge.
const EDGE_JITTER: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MapStyle {
    #[default]
    EdgeToEdge,
    Winding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

const SIDES: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

#[derive(Debug, Clone)]
pub struct GameMap {
    grid_size: usize,
    cell_size: u32,
    terrain: Vec<Vec<Terrain>>,
    path: Vec<GridPos>,
}

impl GameMap {
    pub fn from_seed(grid_size: usize, cell_size: u32, style: MapStyle, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::generate(grid_size, cell_size, style, &mut rng)
    }

    pub fn generate<R: Rng>(grid_size: usize, cell_size: u32, style: MapStyle, rng: &mut R) -> Self {
        let grid_size = grid_size.max(MIN_GRID_SIZE);
        let mut map = Self {
            grid_size,
            cell_size,
            terrain: vec![vec![Terrain::Plains; grid_size]; grid_size],
            path: Vec::new(),
        };

        map.path = match style {
            MapStyle::EdgeToEdge => map.edge_to_edge_path(rng),
            MapStyle::Winding => map.winding_path(rng),
        };
        for pos in map.path.clone() {
            map.set(pos, Terrain::Road);
        }

        match style {
            MapStyle::EdgeToEdge => {
                for _ in 0..rng.gen_range(3..=5) {
                    map.grow_cluster(Terrain::Mountain, 3, rng);
                }
                for _ in 0..rng.gen_range(2..=4) {
                    map.grow_cluster(Terrain::Lake, 2, rng);
                }
            }
            MapStyle::Winding => {
                map.add_rivers(rng);
                map.add_mountain_blocks(rng);
                map.add_forest(rng);
            }
        }

        debug!(
            "Generated {:?} map: {}x{} grid, road of {} cells",
            style,
            grid_size,
            grid_size,
            map.path.len()
        );
        map
    }

    /// Builds a map from explicit parts; road cells are forced onto the grid.
    pub fn from_parts(cell_size: u32, terrain: Vec<Vec<Terrain>>, path: Vec<GridPos>) -> Self {
        let grid_size = terrain.len();
        let mut map = Self {
            grid_size,
            cell_size,
            terrain,
            path,
        };
        for pos in map.path.clone() {
            map.set(pos, Terrain::Road);
        }
        map
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn path(&self) -> &[GridPos] {
        &self.path
    }

    pub fn start(&self) -> GridPos {
        self.path.first().copied().unwrap_or_default()
    }

    pub fn end(&self) -> GridPos {
        self.path.last().copied().unwrap_or_default()
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.grid_size && (pos.y as usize) < self.grid_size
    }

    pub fn terrain_at(&self, pos: GridPos) -> Option<Terrain> {
        if self.in_bounds(pos) {
            Some(self.terrain[pos.y as usize][pos.x as usize])
        } else {
            None
        }
    }

    /// A tower may stand anywhere on the grid except road and water.
    pub fn can_place_tower(&self, pos: GridPos) -> bool {
        self.terrain_at(pos).is_some_and(|t| t.is_buildable())
    }

    /// True when any of the eight surrounding cells is water.
    pub fn is_lake_adjacent(&self, pos: GridPos) -> bool {
        neighbours(pos).any(|n| self.terrain_at(n) == Some(Terrain::Lake))
    }

    /// Road cells as continuous cell-centre waypoints.
    pub fn waypoints(&self) -> Vec<(f32, f32)> {
        self.path.iter().map(|p| p.center()).collect()
    }

    pub fn to_view(&self) -> MapView {
        MapView {
            grid_size: self.grid_size,
            cell_size: self.cell_size,
            terrain: self.terrain.clone(),
            path: self.path.clone(),
            start: self.start(),
            end: self.end(),
        }
    }

    fn set(&mut self, pos: GridPos, terrain: Terrain) {
        if self.in_bounds(pos) {
            self.terrain[pos.y as usize][pos.x as usize] = terrain;
        }
    }

    /// Paints `terrain` unless the cell is road.
    fn paint(&mut self, pos: GridPos, terrain: Terrain) {
        if matches!(self.terrain_at(pos), Some(t) if t != Terrain::Road) {
            self.set(pos, terrain);
        }
    }

    fn edge_position<R: Rng>(&self, side: Side, rng: &mut R) -> GridPos {
        let last = self.grid_size as i32 - 1;
        let along = (self.grid_size as i32 / 2 + rng.gen_range(-EDGE_JITTER..=EDGE_JITTER)).clamp(0, last);
        match side {
            Side::Top => GridPos::new(along, 0),
            Side::Bottom => GridPos::new(along, last),
            Side::Left => GridPos::new(0, along),
            Side::Right => GridPos::new(last, along),
        }
    }

    fn edge_to_edge_path<R: Rng>(&self, rng: &mut R) -> Vec<GridPos> {
        let start_side = SIDES[rng.gen_range(0..SIDES.len())];
        let end_choices: Vec<Side> = SIDES.iter().copied().filter(|s| *s != start_side).collect();
        let end_side = end_choices[rng.gen_range(0..end_choices.len())];

        let start = self.edge_position(start_side, rng);
        let end = self.edge_position(end_side, rng);

        let mut path = vec![start];
        let mut visited: HashSet<GridPos> = HashSet::from([start]);
        let mut current = start;

        // Bounded so a walk that keeps boxing itself in still terminates
        let max_attempts = self.grid_size * 10;
        let mut attempts = 0;

        while current != end && attempts < max_attempts {
            attempts += 1;
            let dx = (end.x - current.x).signum();
            let dy = (end.y - current.y).signum();

            let next = if rng.gen_bool(GOAL_BIAS) {
                if (end.x - current.x).abs() > (end.y - current.y).abs() {
                    GridPos::new(current.x + dx, current.y)
                } else if dy != 0 {
                    GridPos::new(current.x, current.y + dy)
                } else {
                    GridPos::new(current.x + dx, current.y)
                }
            } else if dx != 0 {
                GridPos::new(current.x + dx, current.y + rng.gen_range(-1..=1))
            } else {
                GridPos::new(current.x + rng.gen_range(-1..=1), current.y + dy)
            };

            if self.in_bounds(next) && (next == end || !visited.contains(&next)) {
                path.push(next);
                visited.insert(next);
                current = next;
            }
        }

        // Walk straight to the goal when the attempt budget ran out
        while current != end {
            current = if current.x != end.x {
                GridPos::new(current.x + (end.x - current.x).signum(), current.y)
            } else {
                GridPos::new(current.x, current.y + (end.y - current.y).signum())
            };
            path.push(current);
        }

        path
    }

    fn winding_path<R: Rng>(&self, rng: &mut R) -> Vec<GridPos> {
        let last = self.grid_size as i32 - 1;
        let clamp_row = |y: i32| y.clamp(1, last - 1);

        let mut x = 0;
        let mut y = clamp_row(self.grid_size as i32 / 2 + rng.gen_range(-EDGE_JITTER..=EDGE_JITTER));
        let mut path = vec![GridPos::new(x, y)];
        let mut visited: HashSet<GridPos> = HashSet::from([path[0]]);

        while x < last {
            x += 1;
            if rng.gen_bool(0.3) {
                y = clamp_row(y + rng.gen_range(-1..=1));
            }
            path.push(GridPos::new(x, y));
            visited.insert(GridPos::new(x, y));

            // Short vertical detour within the same column, one direction only
            if x < last && rng.gen_bool(0.2) {
                let dir = if rng.gen_bool(0.5) { 1 } else { -1 };
                for _ in 0..rng.gen_range(1..=2) {
                    let next = GridPos::new(x, clamp_row(y + dir));
                    if !visited.insert(next) {
                        break;
                    }
                    y = next.y;
                    path.push(next);
                }
            }
        }

        path
    }

    fn grow_cluster<R: Rng>(&mut self, terrain: Terrain, rounds: usize, rng: &mut R) {
        let candidates: Vec<GridPos> = self
            .cells()
            .filter(|p| self.terrain_at(*p) != Some(Terrain::Road))
            .collect();
        if candidates.is_empty() {
            return;
        }

        let center = candidates[rng.gen_range(0..candidates.len())];
        self.paint(center, terrain);

        for _ in 0..rounds {
            for n in neighbours(center) {
                if rng.gen_bool(CLUSTER_SPREAD) {
                    self.paint(n, terrain);
                }
            }
        }
    }

    fn add_rivers<R: Rng>(&mut self, rng: &mut R) {
        let n = self.grid_size as i32;
        for _ in 0..rng.gen_range(2..=4) {
            if rng.gen_bool(0.5) {
                let x = rng.gen_range(3..=n - 4);
                for y in 0..n {
                    self.paint(GridPos::new(x, y), Terrain::Lake);
                    self.paint(GridPos::new(x + 1, y), Terrain::Lake);
                }
            } else {
                let y = rng.gen_range(3..=n - 4);
                for x in 0..n {
                    self.paint(GridPos::new(x, y), Terrain::Lake);
                }
            }
        }
    }

    fn add_mountain_blocks<R: Rng>(&mut self, rng: &mut R) {
        let n = self.grid_size as i32;
        for _ in 0..rng.gen_range(3..=6) {
            let cx = rng.gen_range(2..=n - 3);
            let cy = rng.gen_range(2..=n - 3);
            let half = rng.gen_range(2..=4) / 2;
            for dx in -half..=half {
                for dy in -half..=half {
                    let pos = GridPos::new(cx + dx, cy + dy);
                    if self.terrain_at(pos) == Some(Terrain::Plains) && rng.gen_bool(0.7) {
                        self.set(pos, Terrain::Mountain);
                    }
                }
            }
        }
    }

    fn add_forest<R: Rng>(&mut self, rng: &mut R) {
        let n = self.grid_size as i32;
        for _ in 0..rng.gen_range(10..=20) {
            let pos = GridPos::new(rng.gen_range(0..n), rng.gen_range(0..n));
            if self.terrain_at(pos) == Some(Terrain::Plains) {
                self.set(pos, Terrain::Forest);
            }
        }
    }

    fn cells(&self) -> impl Iterator<Item = GridPos> + '_ {
        let n = self.grid_size as i32;
        (0..n).flat_map(move |y| (0..n).map(move |x| GridPos::new(x, y)))
    }
}

fn neighbours(pos: GridPos) -> impl Iterator<Item = GridPos> {
    const OFFSETS: [(i32, i32); 8] = [
        (-1, 0),
        (1, 0),
        (0, -1),
        (0, 1),
        (-1, -1),
        (1, 1),
        (-1, 1),
        (1, -1),
    ];
    OFFSETS
        .into_iter()
        .map(move |(dx, dy)| GridPos::new(pos.x + dx, pos.y + dy))
}
