//! Performance benchmarks for critical game systems

use bincode::{deserialize, serialize};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use server::config::GameConfig;
use server::game::GameState;
use server::map::{GameMap, MapStyle};
use shared::{EnemyKind, Packet, TowerKind, CELL_SIZE, GRID_SIZE};
use std::time::Instant;

/// Busy game: four players, a ring of towers and a crowd of enemies
fn busy_game() -> GameState {
    let config = GameConfig {
        seed: Some(99),
        starting_money: 1_000_000,
        starting_lives: 1_000_000,
        ..GameConfig::default()
    };
    let mut game = GameState::new(config);
    for id in 1..=4 {
        game.add_player(id);
    }

    let mut rng = StdRng::seed_from_u64(1);
    let mut placed = 0;
    while placed < 40 {
        let x = rng.gen_range(0..GRID_SIZE as i32);
        let y = rng.gen_range(0..GRID_SIZE as i32);
        let kind = TowerKind::ALL[placed % TowerKind::ALL.len()];
        if game.place_tower(1 + (placed % 4) as u32, x, y, kind.name()).is_ok() {
            placed += 1;
        }
    }

    game.start_wave().unwrap();
    for i in 0..100 {
        let kind = [EnemyKind::Grunt, EnemyKind::Fast, EnemyKind::Tank, EnemyKind::Flying][i % 4];
        game.spawn_enemy(kind);
    }
    game
}

/// Benchmarks simulation ticks with many towers and enemies
#[test]
fn benchmark_tick_throughput() {
    let mut game = busy_game();

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        game.update(0.1);
    }

    let duration = start.elapsed();
    println!(
        "Simulation tick: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // 1000 ticks is 100 simulated seconds; must run far faster than real time
    assert!(duration.as_millis() < 5_000);
}

/// Benchmarks snapshot encoding and decoding for a full state update
#[test]
fn benchmark_snapshot_serialization() {
    let mut game = busy_game();
    for _ in 0..10 {
        game.update(0.1);
    }

    let iterations = 200;
    let start = Instant::now();
    let mut bytes = 0;

    for _ in 0..iterations {
        let packet = Packet::StateUpdate {
            snapshot: Box::new(game.snapshot()),
        };
        let data = serialize(&packet).unwrap();
        bytes = data.len();
        let _: Packet = deserialize(&data).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Snapshot roundtrip: {} iterations of {} bytes in {:?} ({:.2} μs/iter)",
        iterations,
        bytes,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // A snapshot must fit in a single UDP datagram
    assert!(bytes < 65_507);
    assert!(duration.as_millis() < 5_000);
}

/// Benchmarks map generation for both layouts
#[test]
fn benchmark_map_generation() {
    let iterations = 200;
    let start = Instant::now();

    for seed in 0..iterations {
        let style = if seed % 2 == 0 {
            MapStyle::EdgeToEdge
        } else {
            MapStyle::Winding
        };
        let map = GameMap::from_seed(GRID_SIZE, CELL_SIZE, style, seed);
        assert!(map.path().len() >= 2);
    }

    let duration = start.elapsed();
    println!(
        "Map generation: {} maps in {:?} ({:.2} μs/map)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2_000);
}
