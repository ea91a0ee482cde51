use crate::config::ClientConfig;
use crate::game::ClientGameState;
use crate::input::{InputManager, InputSource, ScriptedInput};
use log::{debug, error, info, warn};
use shared::{
    decode_packet, encode_packet, timestamp_millis, Hud, InputState, Packet, Request,
    DEFAULT_TICK_RATE, MAX_PACKET_SIZE, PROTOCOL_VERSION,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, sleep, MissedTickBehavior};

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    config: ClientConfig,
    tick_rate: u32,

    game_state: Option<ClientGameState>,
    input_manager: InputManager,
    input_source: Box<dyn InputSource + Send>,

    ping_ms: u64,
    ticks: u64,
}

impl Client {
    pub async fn new(config: ClientConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = config.server.parse()?;

        Ok(Client {
            socket,
            server_addr,
            tick_rate: DEFAULT_TICK_RATE,
            game_state: None,
            input_manager: InputManager::new(config.look_sensitivity),
            input_source: Box::new(ScriptedInput::new(config.seed)),
            ping_ms: 0,
            ticks: 0,
            config,
        })
    }

    /// Replaces the scripted bot with another input source.
    pub fn with_input_source(mut self, source: Box<dyn InputSource + Send>) -> Self {
        self.input_source = source;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.game_state.is_some()
    }

    pub fn hud(&self) -> Option<Hud> {
        self.game_state.as_ref().map(|game| game.hud())
    }

    async fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to {}...", self.server_addr);
        self.send_packet(&Packet::Connect {
            client_version: PROTOCOL_VERSION,
        })
        .await
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        if self.config.fake_ping > 0 {
            sleep(Duration::from_millis(self.config.fake_ping / 2)).await;
        }

        let data = encode_packet(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    fn handle_packet(&mut self, packet: Packet) {
        match packet {
            Packet::Connected {
                client_id,
                tick_rate,
            } => {
                info!("Connected! Client ID: {} ({}Hz)", client_id, tick_rate);
                self.tick_rate = tick_rate;
                self.game_state = Some(ClientGameState::new(client_id, tick_rate));
            }

            Packet::Event { sequence, event } => {
                if let Some(game) = self.game_state.as_mut() {
                    game.apply_event(sequence, &event);
                }
            }

            Packet::GameState {
                tick,
                timestamp,
                last_processed_input,
                players,
            } => {
                if timestamp > 0 {
                    self.ping_ms = timestamp_millis().saturating_sub(timestamp);
                }

                if let Some(game) = self.game_state.as_mut() {
                    game.apply_server_state(tick, &players, &last_processed_input);
                }
            }

            Packet::Disconnected { reason } => {
                warn!("Disconnected: {}", reason);
                self.game_state = None;
            }

            _ => {
                warn!("Unexpected packet type");
            }
        }
    }

    /// Samples input, predicts it and sends it along with any attack request
    async fn tick(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let sample = self.input_source.sample();
        let (input, request) = self.input_manager.update(&sample);

        if self.game_state.is_none() {
            return Ok(());
        }

        self.send_input(input).await?;
        if let Some(request) = request {
            self.send_request(request).await?;
        }

        if let Some(game) = self.game_state.as_mut() {
            game.tick();
        }
        self.ticks += 1;

        if self.config.hud_interval > 0 && self.ticks % self.config.hud_interval as u64 == 0 {
            self.log_hud();
        }
        Ok(())
    }

    async fn send_input(&mut self, input: InputState) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(game) = self.game_state.as_mut() {
            game.apply_prediction(&input);
        }

        self.send_packet(&Packet::Input {
            sequence: input.sequence,
            timestamp: input.timestamp,
            intent: input.intent,
        })
        .await
    }

    async fn send_request(&mut self, request: Request) -> Result<(), Box<dyn std::error::Error>> {
        let packet = match (self.game_state.as_mut(), request) {
            (Some(game), Request::Attack { attack }) => game.request_attack(attack),
            (None, _) => None,
        };

        if let Some(packet) = packet {
            debug!("Requesting {:?}", request);
            self.send_packet(&packet).await?;
        }
        Ok(())
    }

    fn log_hud(&self) {
        if let Some(game) = &self.game_state {
            let hud = game.hud();
            info!(
                "HP {} | attack ready in {:.2}s | ping {}ms | rollbacks {}",
                hud.health,
                hud.attack_cooldown,
                self.ping_ms,
                game.rollbacks()
            );
        }
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.connect().await?;

        let mut tick_interval = interval(Duration::from_nanos(
            1_000_000_000 / self.tick_rate.max(1) as u64,
        ));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut current_rate = self.tick_rate;

        let mut buffer = [0u8; MAX_PACKET_SIZE];

        loop {
            if self
                .config
                .max_ticks
                .is_some_and(|max_ticks| self.ticks >= max_ticks)
            {
                info!("Reached {} ticks, stopping", self.ticks);
                break;
            }

            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, _)) => {
                            if self.config.fake_ping > 0 {
                                sleep(Duration::from_millis(self.config.fake_ping / 2)).await;
                            }

                            match decode_packet(&buffer[..len]) {
                                Ok(packet) => self.handle_packet(packet),
                                Err(e) => warn!("Dropping datagram: {}", e),
                            }

                            // Follow the server's tick rate once it is known
                            if self.tick_rate != current_rate {
                                current_rate = self.tick_rate;
                                tick_interval = interval(Duration::from_nanos(
                                    1_000_000_000 / current_rate.max(1) as u64,
                                ));
                                tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                            }
                        },
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                _ = tick_interval.tick() => {
                    if let Err(e) = self.tick().await {
                        error!("Error sending input: {}", e);
                    }
                },

                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl+C, shutting down");
                    break;
                },
            }
        }

        if self.is_connected() {
            if let Err(e) = self.send_packet(&Packet::Disconnect).await {
                warn!("Failed to send disconnect: {}", e);
            }
        }

        Ok(())
    }
}
