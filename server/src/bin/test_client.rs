use bincode::{deserialize, serialize};
use clap::Parser;
use shared::{GridPos, Packet, Snapshot, Terrain, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, timeout, Instant};

/// Scripted bot that joins a game, builds one tower and starts the waves
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server address
    #[clap(short, long, default_value = "127.0.0.1:8080")]
    server: SocketAddr,
    /// How long to watch the game, in seconds
    #[clap(short, long, default_value = "30")]
    duration: u64,
    /// Tower type to build
    #[clap(short, long, default_value = "basic")]
    tower: String,
}

// Snapshots carry the whole map, so leave room for a full datagram
const RECV_BUFFER: usize = 65_536;

async fn send(socket: &UdpSocket, packet: &Packet, addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    socket.send_to(&serialize(packet)?, addr).await?;
    Ok(())
}

async fn recv(socket: &UdpSocket, buf: &mut [u8]) -> Result<Packet, Box<dyn std::error::Error>> {
    let (len, _) = socket.recv_from(buf).await?;
    Ok(deserialize::<Packet>(&buf[0..len])?)
}

/// First buildable cell orthogonally next to the road
fn cell_beside_road(snapshot: &Snapshot) -> Option<GridPos> {
    let map = &snapshot.map;
    let buildable = |p: GridPos| {
        p.x >= 0
            && p.y >= 0
            && (p.x as usize) < map.grid_size
            && (p.y as usize) < map.grid_size
            && map.terrain[p.y as usize][p.x as usize].is_buildable()
    };

    map.path
        .iter()
        .flat_map(|p| {
            [
                GridPos::new(p.x + 1, p.y),
                GridPos::new(p.x - 1, p.y),
                GridPos::new(p.x, p.y + 1),
                GridPos::new(p.x, p.y - 1),
            ]
        })
        .find(|&p| buildable(p))
}

fn print_summary(snapshot: &Snapshot) {
    println!(
        "wave {} ({}), {} enemies, {} towers, {} attacks, next wave in {:.1}s{}",
        snapshot.current_wave,
        if snapshot.wave_in_progress { "running" } else { "cooldown" },
        snapshot.enemies.len(),
        snapshot.towers.len(),
        snapshot.recent_attacks.len(),
        snapshot.time_to_next_wave,
        if snapshot.game_over { ", GAME OVER" } else { "" }
    );
    for player in snapshot.players.values() {
        println!(
            "  player {} {}: money={} score={} lives={} kills={}",
            player.id, player.color, player.money, player.score, player.lives, player.enemies_defeated
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Client socket bound to {}", socket.local_addr()?);

    let mut buf = vec![0u8; RECV_BUFFER];

    println!("Sending connection request to {}", args.server);
    send(&socket, &Packet::Connect { client_version: PROTOCOL_VERSION }, args.server).await?;

    let client_id = loop {
        match timeout(Duration::from_secs(5), recv(&socket, &mut buf)).await?? {
            Packet::Connected { client_id } => break client_id,
            Packet::Disconnected { reason } => {
                println!("Connection refused: {}", reason);
                return Ok(());
            }
            _ => continue,
        }
    };
    println!("Connected with client ID: {}", client_id);

    send(&socket, &Packet::GetState, args.server).await?;
    let snapshot = loop {
        if let Packet::State { snapshot } = timeout(Duration::from_secs(5), recv(&socket, &mut buf)).await?? {
            break snapshot;
        }
    };
    println!(
        "Map {}x{}, road of {} cells, {} mountain cells",
        snapshot.map.grid_size,
        snapshot.map.grid_size,
        snapshot.map.path.len(),
        snapshot
            .map
            .terrain
            .iter()
            .flatten()
            .filter(|t| **t == Terrain::Mountain)
            .count()
    );

    if let Some(cell) = cell_beside_road(&snapshot) {
        let place = Packet::PlaceTower {
            x: cell.x,
            y: cell.y,
            tower_type: args.tower.clone(),
        };
        println!("Placing {} tower at ({}, {})", args.tower, cell.x, cell.y);
        send(&socket, &place, args.server).await?;
    }
    send(&socket, &Packet::StartWave, args.server).await?;

    let deadline = Instant::now() + Duration::from_secs(args.duration);
    let mut heartbeat = interval(Duration::from_secs(2));
    let mut updates = 0u32;

    while Instant::now() < deadline {
        tokio::select! {
            _ = heartbeat.tick() => {
                send(&socket, &Packet::Heartbeat, args.server).await?;
            }
            received = recv(&socket, &mut buf) => match received {
                Ok(Packet::TowerPlaced { success, message, .. }) => {
                    println!("Tower placement: {} ({})", success, message);
                }
                Ok(Packet::WaveStarted { success, message, wave }) => {
                    println!("Start wave {}: {} ({})", wave, success, message);
                }
                Ok(Packet::StateUpdate { snapshot }) => {
                    updates += 1;
                    // Print roughly once a second at the default tick rate
                    if updates % 10 == 0 {
                        print_summary(&snapshot);
                    }
                    if snapshot.game_over {
                        print_summary(&snapshot);
                        break;
                    }
                }
                Ok(Packet::PlayerLeft { player_id }) => println!("Player {} left", player_id),
                Ok(Packet::Disconnected { reason }) => {
                    println!("Disconnected by server: {}", reason);
                    return Ok(());
                }
                Ok(other) => println!("Unexpected packet: {:?}", other),
                Err(e) => println!("Failed to receive packet: {}", e),
            },
        }
    }

    println!("Sending disconnect request");
    send(&socket, &Packet::Disconnect, args.server).await?;
    println!("Test client finished after {} state updates", updates);

    Ok(())
}
