//! Server network layer handling UDP communications and game loop coordination

use crate::client_manager::ClientManager;
use crate::config::ServerConfig;
use crate::game::GameState;
use log::{debug, error, info, warn};
use shared::{
    decode_packet, encode_packet, timestamp_millis, EntityId, InputState, Outgoing, Packet,
    SequencedSender, MAX_PACKET_SIZE, PROTOCOL_VERSION,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, MissedTickBehavior};

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: EntityId },
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
        exclude: Option<EntityId>,
    },
}

/// Main server coordinating networking and game simulation
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    game_state: GameState,
    tick_rate: u32,
    tick_duration: Duration,
    /// Sequence numbers for the event channel, shared by every recipient
    events: SequencedSender,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(config: &ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(config.address()).await?);
        info!(
            "Server listening on {} at {}Hz",
            socket.local_addr()?,
            config.tick_rate
        );

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(
                config.max_clients,
                config.client_timeout(),
            ))),
            game_state: GameState::new(),
            tick_rate: config.tick_rate,
            tick_duration: config.tick_duration(),
            events: SequencedSender::new(),
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Handle for stopping a running server from another task
    pub fn shutdown_handle(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; MAX_PACKET_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => match decode_packet(&buffer[..len]) {
                        Ok(packet) => {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        }
                        Err(e) => warn!("Dropping datagram from {}: {}", addr, e),
                    },
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
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
                        let client_addrs = clients.read().await.get_client_addrs();

                        let data = match encode_packet(&packet) {
                            Ok(data) => data,
                            Err(e) => {
                                error!("Failed to encode broadcast: {}", e);
                                continue;
                            }
                        };

                        for (client_id, addr) in client_addrs {
                            if Some(client_id) == exclude {
                                continue;
                            }
                            if let Err(e) = socket.send_to(&data, addr).await {
                                error!("Failed to send to client {}: {}", client_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = clients.write().await.check_timeouts();

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        return;
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
        let data = encode_packet(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn broadcast_packet(&self, packet: Packet, exclude: Option<EntityId>) {
        if let Err(e) = self
            .game_tx
            .send(GameMessage::BroadcastPacket { packet, exclude })
        {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Processes incoming packets and updates game state
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                info!(
                    "Client connecting from {} (version: {})",
                    addr, client_version
                );

                if client_version != PROTOCOL_VERSION {
                    self.send_packet(
                        Packet::Disconnected {
                            reason: "Protocol version mismatch".to_string(),
                        },
                        addr,
                    );
                    return;
                }

                // Reconnects from the same address replace the old session
                let existing_client_id = self.clients.read().await.find_client_by_addr(addr);
                if let Some(existing_id) = existing_client_id {
                    info!("Removing existing client {} from {}", existing_id, addr);
                    self.clients.write().await.remove_client(&existing_id);
                    self.game_state.remove_player(&existing_id);
                }

                let client_id = self.clients.write().await.add_client(addr);

                let response = match client_id {
                    Some(client_id) => {
                        self.game_state.add_player(client_id);
                        Packet::Connected {
                            client_id,
                            tick_rate: self.tick_rate,
                        }
                    }
                    None => Packet::Disconnected {
                        reason: "Server full".to_string(),
                    },
                };
                self.send_packet(response, addr);
            }

            Packet::Input {
                sequence,
                timestamp,
                intent,
            } => {
                let mut clients = self.clients.write().await;
                if let Some(client_id) = clients.find_client_by_addr(addr) {
                    clients.add_input(
                        client_id,
                        InputState {
                            sequence,
                            timestamp,
                            intent,
                        },
                    );
                }
            }

            Packet::Command { sequence, request } => {
                let client_id = {
                    let mut clients = self.clients.write().await;
                    clients
                        .find_client_by_addr(addr)
                        .filter(|id| clients.accept_command(*id, sequence))
                };

                match client_id {
                    Some(client_id) => {
                        self.game_state.handle_request(client_id, request);
                    }
                    None => debug!("Dropped command {} from {}", sequence, addr),
                }
            }

            Packet::Disconnect => {
                let mut clients = self.clients.write().await;
                if let Some(client_id) = clients.find_client_by_addr(addr) {
                    clients.remove_client(&client_id);
                    self.game_state.remove_player(&client_id);
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Applies queued movement inputs in the order they were produced
    async fn process_inputs(&mut self, dt: f32) {
        let mut clients = self.clients.write().await;

        for (client_id, input) in clients.get_chronological_inputs() {
            self.game_state.apply_input(client_id, &input, dt);
            clients.mark_input_processed(client_id, input.sequence);
        }

        clients.cleanup_processed_inputs();
    }

    /// Routes replication traffic produced by a tick onto the event channel
    async fn dispatch_outgoing(&mut self, outgoing: Vec<Outgoing>) {
        for message in outgoing {
            match message {
                Outgoing::Broadcast(event) => {
                    let packet = Packet::Event {
                        sequence: self.events.next_sequence(),
                        event,
                    };
                    self.broadcast_packet(packet, None);
                }
                Outgoing::Target { peer, event } => {
                    let Some(addr) = self.clients.read().await.client_addr(peer) else {
                        continue;
                    };
                    let packet = Packet::Event {
                        sequence: self.events.next_sequence(),
                        event,
                    };
                    self.send_packet(packet, addr);
                }
                Outgoing::Request(request) => {
                    warn!("Authority produced a request: {:?}", request);
                }
            }
        }
    }

    /// Broadcasts current game state to all connected clients
    async fn broadcast_game_state(&mut self) {
        let last_processed_input = {
            let clients = self.clients.read().await;
            if clients.is_empty() {
                return;
            }
            clients.get_last_processed_inputs()
        };

        let packet = Packet::GameState {
            tick: self.game_state.tick,
            timestamp: timestamp_millis(),
            last_processed_input,
            players: self.game_state.snapshot(),
        };

        self.broadcast_packet(packet, None);
    }

    /// Runs one fixed simulation tick
    async fn tick(&mut self, dt: f32) {
        self.process_inputs(dt).await;
        let outgoing = self.game_state.step(dt);
        self.dispatch_outgoing(outgoing).await;
        self.broadcast_game_state().await;
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let dt = self.tick_duration.as_secs_f32();

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            self.game_state.remove_player(&client_id);
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    self.tick(dt).await;

                    if self.game_state.tick % (self.tick_rate.max(1) * 10) == 0 {
                        let client_count = self.clients.read().await.len();
                        if client_count > 0 {
                            debug!("Tick {}: {} clients", self.game_state.tick, client_count);
                        }
                    }
                },
            }
        }

        Ok(())
    }
}
