//! Session gateway: UDP transport, command routing and the tick loop
//!
//! The [`Server`] owns the one [`GameState`] of the process. Background tasks
//! only move bytes: a receiver decodes datagrams, a sender encodes and ships
//! outgoing packets, and a timeout checker drops silent clients. Everything
//! that touches the simulation runs inside the `tokio::select!` loop in
//! [`Server::run`], so player commands and ticks never interleave mid-step.

use crate::client_manager::ClientManager;
use crate::config::{GameConfig, ServerConfig};
use crate::error::CommandError;
use crate::game::{GamePhase, GameState};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, PlayerId, TowerView, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

/// Ticks between periodic diagnostics
const DIAGNOSTIC_INTERVAL: u32 = 50;

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: PlayerId },
    SendFailed { client_id: PlayerId },
    Shutdown,
}

/// Messages sent from game loop to network tasks
#[derive(Debug)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
        exclude: Option<PlayerId>,
    },
}

/// Main server coordinating networking and game simulation
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    game_state: GameState,
    config: ServerConfig,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        config: ServerConfig,
        game_config: GameConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(
                config.max_clients,
                config.client_timeout,
            ))),
            game_state: GameState::new(game_config),
            config,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Handle for feeding messages into the main loop, e.g. `Shutdown`.
    pub fn message_sender(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    /// Spawns task that continuously listens for incoming packets
    async fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize {} byte packet from {}", len, addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes outgoing packet queue
    ///
    /// A failed send to a broadcast target is reported back to the main
    /// loop so that one client can be dropped; the rest still get the packet.
    async fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { packet, exclude } => {
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        for (client_id, addr) in client_addrs {
                            if Some(client_id) == exclude {
                                continue;
                            }

                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to client {}: {}", client_id, e);
                                let _ = server_tx.send(ServerMessage::SendFailed { client_id });
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    async fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client_id in timed_out {
                    info!("Client {} timed out", client_id);
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn broadcast_packet(&self, packet: Packet, exclude: Option<PlayerId>) {
        if let Err(e) = self.game_tx.send(GameMessage::BroadcastPacket { packet, exclude }) {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Broadcasts current game state to all connected clients
    async fn broadcast_game_state(&self) {
        if self.clients.read().await.is_empty() {
            return;
        }
        let snapshot = Box::new(self.game_state.snapshot());
        self.broadcast_packet(Packet::StateUpdate { snapshot }, None);
    }

    /// Client id for `addr`, refreshing its activity timestamp
    async fn identify(&self, addr: SocketAddr) -> Option<PlayerId> {
        let mut clients = self.clients.write().await;
        let client_id = clients.find_client_by_addr(addr)?;
        clients.touch(&client_id);
        Some(client_id)
    }

    /// Drops a client and its player, and tells everyone else.
    async fn drop_client(&mut self, client_id: PlayerId) {
        let removed = self.clients.write().await.remove_client(&client_id);
        let had_player = self.game_state.remove_player(&client_id);

        if removed || had_player {
            self.broadcast_packet(Packet::PlayerLeft { player_id: client_id }, None);
            self.broadcast_game_state().await;
        }
    }

    async fn handle_connect(&mut self, client_version: u32, addr: SocketAddr) {
        info!("Client connecting from {} (version: {})", addr, client_version);

        if client_version != PROTOCOL_VERSION {
            warn!("Rejecting {}: protocol version {} unsupported", addr, client_version);
            let reason = format!("Unsupported protocol version {}", client_version);
            self.send_packet(Packet::Disconnected { reason }, addr);
            return;
        }

        // Remove existing connection if present
        let existing_client_id = self.clients.read().await.find_client_by_addr(addr);
        if let Some(existing_id) = existing_client_id {
            info!("Removing existing client {} from {}", existing_id, addr);
            self.drop_client(existing_id).await;
        }

        let client_id = self.clients.write().await.add_client(addr);
        match client_id {
            Some(client_id) => {
                self.game_state.add_player(client_id);
                self.send_packet(Packet::Connected { client_id }, addr);
                self.broadcast_game_state().await;
            }
            None => {
                warn!("Rejecting {}: server full", addr);
                let reason = "Server full".to_string();
                self.send_packet(Packet::Disconnected { reason }, addr);
            }
        }
    }

    /// Processes incoming packets and routes commands into the game
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        if let Packet::Connect { client_version } = packet {
            self.handle_connect(client_version, addr).await;
            return;
        }

        let Some(client_id) = self.identify(addr).await else {
            debug!("Ignoring {:?} from unknown address {}", packet, addr);
            let reason = "Not connected".to_string();
            self.send_packet(Packet::CommandRejected { reason }, addr);
            return;
        };

        match packet {
            Packet::PlaceTower { x, y, tower_type } => {
                let result = self.game_state.place_tower(client_id, x, y, &tower_type);
                let accepted = result.is_ok();
                let (success, message, tower) = command_outcome(result, "Tower placed");
                self.send_packet(Packet::TowerPlaced { success, message, tower }, addr);
                if accepted {
                    self.broadcast_game_state().await;
                }
            }

            Packet::UpgradeTower { tower_id, upgrade_path } => {
                let result = self.game_state.upgrade_tower(client_id, tower_id, &upgrade_path);
                let accepted = result.is_ok();
                let (success, message, tower) = command_outcome(result, "Tower upgraded");
                self.send_packet(Packet::TowerUpgraded { success, message, tower }, addr);
                if accepted {
                    self.broadcast_game_state().await;
                }
            }

            Packet::StartWave => match self.game_state.start_wave() {
                Ok(wave) => {
                    let message = format!("Wave {} started", wave);
                    self.send_packet(Packet::WaveStarted { success: true, message, wave }, addr);
                    self.broadcast_game_state().await;
                }
                Err(e) => {
                    let wave = self.game_state.current_wave();
                    let message = e.to_string();
                    self.send_packet(Packet::WaveStarted { success: false, message, wave }, addr);
                }
            },

            Packet::GetState => {
                let snapshot = Box::new(self.game_state.snapshot());
                self.send_packet(Packet::State { snapshot }, addr);
            }

            Packet::Heartbeat => {}

            Packet::Disconnect => {
                self.drop_client(client_id).await;
            }

            other => {
                warn!("Unexpected packet type from client {}: {:?}", client_id, other);
                let reason = "Unexpected packet".to_string();
                self.send_packet(Packet::CommandRejected { reason }, addr);
            }
        }
    }

    /// Advances the simulation by one tick and publishes the result
    ///
    /// The final tick that ends the game is still broadcast so clients see
    /// the game-over state.
    async fn tick(&mut self, dt: f32) {
        let was_running = self.game_state.phase() == GamePhase::Running;
        self.game_state.update(dt.min(self.config.max_delta));

        if was_running {
            self.broadcast_game_state().await;
        }

        if was_running && self.game_state.tick % DIAGNOSTIC_INTERVAL == 0 {
            let client_count = self.clients.read().await.len();
            debug!(
                "Tick {}: {} clients, wave {}, {} enemies, {} towers, {:.1}Hz",
                self.game_state.tick,
                client_count,
                self.game_state.current_wave(),
                self.game_state.enemies().len(),
                self.game_state.towers().len(),
                1.0 / dt.max(f32::EPSILON)
            );
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        // Initialize concurrent tasks
        self.spawn_network_receiver().await;
        self.spawn_network_sender().await;
        self.spawn_timeout_checker().await;

        let mut tick_interval = interval(self.config.tick_duration);
        let mut last_tick = Instant::now();

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            self.drop_client(client_id).await;
                        },
                        Some(ServerMessage::SendFailed { client_id }) => {
                            warn!("Dropping client {} after send failure", client_id);
                            self.drop_client(client_id).await;
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;

                    self.tick(dt).await;
                },
            }
        }

        Ok(())
    }
}

/// Flattens a command result into the `(success, message, tower)` reply fields.
fn command_outcome(
    result: Result<TowerView, CommandError>,
    success_message: &str,
) -> (bool, String, Option<TowerView>) {
    match result {
        Ok(tower) => (true, success_message.to_string(), Some(tower)),
        Err(e) => (false, e.to_string(), None),
    }
}
