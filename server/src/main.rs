use clap::Parser;
use log::info;
use server::config::{GameConfig, ServerConfig};
use server::map::MapStyle;
use server::network::Server;
use std::time::Duration;

/// Authoritative tower defense server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Tick rate (updates per second)
    #[clap(short, long, default_value = "10")]
    tick_rate: u32,
    /// Maximum number of connected players
    #[clap(short, long, default_value = "16")]
    max_clients: usize,
    /// Map seed; random when omitted
    #[clap(short, long)]
    seed: Option<u64>,
    /// Map layout
    #[clap(long, value_enum, default_value = "edge-to-edge")]
    map_style: MapStyle,
    /// Seconds between a cleared wave and the next one
    #[clap(long, default_value = "10")]
    wave_cooldown: f32,
    /// Money each player starts with
    #[clap(long, default_value = "500")]
    starting_money: u32,
    /// Lives each player starts with
    #[clap(long, default_value = "20")]
    starting_lives: u32,
    /// Seconds of silence before a client is dropped
    #[clap(long, default_value = "10")]
    client_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let server_config = ServerConfig {
        max_clients: args.max_clients,
        client_timeout: Duration::from_secs(args.client_timeout),
        ..ServerConfig::from_tick_rate(args.tick_rate)
    };
    let game_config = GameConfig {
        seed: args.seed,
        map_style: args.map_style,
        wave_cooldown: args.wave_cooldown.max(0.0),
        starting_money: args.starting_money,
        starting_lives: args.starting_lives,
        ..GameConfig::default()
    };

    let addr = format!("{}:{}", args.host, args.port);
    info!(
        "Starting server on {} at {}Hz (max {} players)",
        addr, args.tick_rate, args.max_clients
    );

    let mut server = Server::new(&addr, server_config, game_config).await?;
    server.run().await?;

    Ok(())
}
