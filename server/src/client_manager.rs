//! Client connection management and input queuing for the arena server
//!
//! This module handles the server-side bookkeeping for connected clients:
//! - Connection lifecycle (connect, disconnect, timeout)
//! - Movement input buffering in chronological order
//! - Per-client sequenced command channel for attack requests
//!
//! Gameplay state lives in [`crate::game::GameState`]; this module only
//! decides which client a datagram belongs to and when its inputs run.

use log::{info, warn};
use shared::{EntityId, InputState, SequencedReceiver, MAX_LOBBY_SIZE};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Inputs buffered per client before the oldest are discarded.
pub const MAX_PENDING_INPUTS: usize = 64;

/// A connected client and its queued inputs
#[derive(Debug)]
pub struct Client {
    /// Server-assigned id, also the id of the client's player entity
    pub id: EntityId,
    pub addr: SocketAddr,
    /// Last time any packet arrived from this client
    pub last_seen: Instant,
    /// Highest movement input sequence applied to the simulation
    pub last_processed_input: u32,
    /// Movement inputs waiting for the next tick, sorted by sequence
    pub pending_inputs: Vec<InputState>,
    /// Drops stale or duplicated attack requests
    pub commands: SequencedReceiver,
}

impl Client {
    pub fn new(id: EntityId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
            last_processed_input: 0,
            pending_inputs: Vec::new(),
            commands: SequencedReceiver::new(),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Queues a movement input in sequence order
    ///
    /// Inputs that were already processed or are already queued are ignored,
    /// so duplicated datagrams never run twice.
    pub fn add_input(&mut self, input: InputState) -> bool {
        self.touch();

        if input.sequence <= self.last_processed_input
            || self
                .pending_inputs
                .iter()
                .any(|queued| queued.sequence == input.sequence)
        {
            return false;
        }

        self.pending_inputs.push(input);
        // Packets may arrive out of order
        self.pending_inputs.sort_by_key(|i| i.sequence);

        if self.pending_inputs.len() > MAX_PENDING_INPUTS {
            let excess = self.pending_inputs.len() - MAX_PENDING_INPUTS;
            warn!("Client {} input queue full, dropping {} inputs", self.id, excess);
            self.pending_inputs.drain(..excess);
        }
        true
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Tracks connected clients and orders their inputs for the simulation
///
/// Capacity is enforced on connect. Inputs from all clients are merged by
/// timestamp so the authoritative simulation processes them in the order
/// they were produced.
pub struct ClientManager {
    clients: HashMap<EntityId, Client>,
    next_client_id: EntityId,
    max_clients: usize,
    timeout: Duration,
}

impl ClientManager {
    /// Capacity is capped at [`MAX_LOBBY_SIZE`] so snapshots always fit in
    /// one datagram.
    pub fn new(max_clients: usize, timeout: Duration) -> Self {
        if max_clients > MAX_LOBBY_SIZE {
            warn!(
                "Capping max clients at {} (requested {})",
                MAX_LOBBY_SIZE, max_clients
            );
        }

        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients: max_clients.min(MAX_LOBBY_SIZE),
            timeout,
        }
    }

    /// Registers a new client, or returns None when the server is full.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<EntityId> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, Client::new(client_id, addr));

        Some(client_id)
    }

    pub fn remove_client(&mut self, client_id: &EntityId) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!("Client {} disconnected", client.id);
            true
        } else {
            false
        }
    }

    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<EntityId> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Queues a movement input. Returns false for unknown clients and for
    /// inputs that were already seen.
    pub fn add_input(&mut self, client_id: EntityId, input: InputState) -> bool {
        match self.clients.get_mut(&client_id) {
            Some(client) => client.add_input(input),
            None => false,
        }
    }

    /// Checks a command's sequence on the client's command channel.
    ///
    /// Returns true if the command is newer than every command accepted so far.
    pub fn accept_command(&mut self, client_id: EntityId, sequence: u16) -> bool {
        match self.clients.get_mut(&client_id) {
            Some(client) => {
                client.touch();
                client.commands.accept(sequence)
            }
            None => false,
        }
    }

    /// Every unprocessed input across all clients, oldest first
    pub fn get_chronological_inputs(&self) -> Vec<(EntityId, InputState)> {
        let mut all_inputs: Vec<(EntityId, InputState)> = self
            .clients
            .iter()
            .flat_map(|(client_id, client)| {
                client
                    .pending_inputs
                    .iter()
                    .filter(|input| input.sequence > client.last_processed_input)
                    .map(|input| (*client_id, *input))
            })
            .collect();

        // Ties broken by client id, then sequence, so the order is deterministic
        all_inputs.sort_by_key(|(client_id, input)| (input.timestamp, *client_id, input.sequence));
        all_inputs
    }

    pub fn mark_input_processed(&mut self, client_id: EntityId, sequence: u32) {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.last_processed_input = client.last_processed_input.max(sequence);
        }
    }

    pub fn cleanup_processed_inputs(&mut self) {
        for client in self.clients.values_mut() {
            let last = client.last_processed_input;
            client.pending_inputs.retain(|input| input.sequence > last);
        }
    }

    pub fn get_last_processed_inputs(&self) -> HashMap<EntityId, u32> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.last_processed_input))
            .collect()
    }

    /// Removes clients that went quiet for longer than the configured timeout
    /// and returns their ids.
    pub fn check_timeouts(&mut self) -> Vec<EntityId> {
        let timeout = self.timeout;
        let timed_out: Vec<EntityId> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect();

        for client_id in &timed_out {
            warn!("Client {} timed out", client_id);
            self.remove_client(client_id);
        }

        timed_out
    }

    pub fn get_client_addrs(&self) -> Vec<(EntityId, SocketAddr)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.addr))
            .collect()
    }

    pub fn client_addr(&self, client_id: EntityId) -> Option<SocketAddr> {
        self.clients.get(&client_id).map(|client| client.addr)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::MoveIntent;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    fn input(sequence: u32, timestamp: u64) -> InputState {
        InputState {
            sequence,
            timestamp,
            intent: MoveIntent::default(),
        }
    }

    fn manager(max_clients: usize) -> ClientManager {
        ClientManager::new(max_clients, Duration::from_secs(5))
    }

    #[test]
    fn test_client_creation() {
        let addr = test_addr();
        let client = Client::new(1, addr);

        assert_eq!(client.id, 1);
        assert_eq!(client.addr, addr);
        assert_eq!(client.last_processed_input, 0);
        assert!(client.pending_inputs.is_empty());
        assert_eq!(client.commands.last_accepted(), None);
    }

    #[test]
    fn test_client_orders_inputs_by_sequence() {
        let mut client = Client::new(1, test_addr());

        assert!(client.add_input(input(2, 100)));
        assert!(client.add_input(input(1, 50)));

        assert_eq!(client.pending_inputs.len(), 2);
        assert_eq!(client.pending_inputs[0].sequence, 1);
        assert_eq!(client.pending_inputs[1].sequence, 2);
    }

    #[test]
    fn test_client_ignores_duplicate_and_processed_inputs() {
        let mut client = Client::new(1, test_addr());
        client.last_processed_input = 4;

        assert!(!client.add_input(input(3, 10)));
        assert!(client.add_input(input(5, 20)));
        assert!(!client.add_input(input(5, 20)));
        assert_eq!(client.pending_inputs.len(), 1);
    }

    #[test]
    fn test_client_input_queue_is_bounded() {
        let mut client = Client::new(1, test_addr());
        for sequence in 1..=(MAX_PENDING_INPUTS as u32 + 10) {
            client.add_input(input(sequence, sequence as u64));
        }

        assert_eq!(client.pending_inputs.len(), MAX_PENDING_INPUTS);
        assert_eq!(client.pending_inputs[0].sequence, 11);
    }

    #[test]
    fn test_client_timeout() {
        let mut client = Client::new(1, test_addr());
        assert!(!client.is_timed_out(Duration::from_secs(1)));

        client.last_seen = Instant::now() - Duration::from_secs(2);
        assert!(client.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_add_client_max_capacity() {
        let mut manager = manager(1);

        assert_eq!(manager.add_client(test_addr()), Some(1));
        assert_eq!(manager.add_client(test_addr2()), None);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_capacity_capped_at_lobby_size() {
        let mut manager = manager(MAX_LOBBY_SIZE + 10);

        for port in 0..(MAX_LOBBY_SIZE as u16 + 5) {
            manager.add_client(SocketAddr::from(([127, 0, 0, 1], 20000 + port)));
        }
        assert_eq!(manager.len(), MAX_LOBBY_SIZE);
    }

    #[test]
    fn test_remove_client() {
        let mut manager = manager(2);
        let client_id = manager.add_client(test_addr()).unwrap();

        assert!(manager.remove_client(&client_id));
        assert!(!manager.remove_client(&client_id));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_find_client_by_addr() {
        let mut manager = manager(2);
        let client_id1 = manager.add_client(test_addr()).unwrap();
        let client_id2 = manager.add_client(test_addr2()).unwrap();

        assert_eq!(manager.find_client_by_addr(test_addr()), Some(client_id1));
        assert_eq!(manager.client_addr(client_id2), Some(test_addr2()));

        let unknown_addr: SocketAddr = "192.168.1.1:9999".parse().unwrap();
        assert_eq!(manager.find_client_by_addr(unknown_addr), None);
    }

    #[test]
    fn test_add_input_to_nonexistent_client() {
        let mut manager = manager(2);
        assert!(!manager.add_input(999, input(1, 100)));
    }

    #[test]
    fn test_get_chronological_inputs() {
        let mut manager = manager(3);
        let client_id1 = manager.add_client(test_addr()).unwrap();
        let client_id2 = manager.add_client(test_addr2()).unwrap();

        manager.add_input(client_id1, input(1, 100));
        manager.add_input(client_id2, input(1, 50));
        manager.add_input(client_id1, input(2, 200));

        let inputs = manager.get_chronological_inputs();
        let timestamps: Vec<u64> = inputs.iter().map(|(_, i)| i.timestamp).collect();
        assert_eq!(timestamps, vec![50, 100, 200]);
        assert_eq!(inputs[0].0, client_id2);
    }

    #[test]
    fn test_processed_inputs_are_cleaned_up() {
        let mut manager = manager(1);
        let client_id = manager.add_client(test_addr()).unwrap();
        for sequence in 1..=3 {
            manager.add_input(client_id, input(sequence, sequence as u64));
        }

        manager.mark_input_processed(client_id, 2);
        manager.cleanup_processed_inputs();

        let inputs = manager.get_chronological_inputs();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].1.sequence, 3);
        assert_eq!(manager.get_last_processed_inputs().get(&client_id), Some(&2));
    }

    #[test]
    fn test_command_channel_drops_stale_requests() {
        let mut manager = manager(1);
        let client_id = manager.add_client(test_addr()).unwrap();

        assert!(manager.accept_command(client_id, 0));
        assert!(manager.accept_command(client_id, 2));
        assert!(!manager.accept_command(client_id, 1));
        assert!(!manager.accept_command(client_id, 2));
        assert!(!manager.accept_command(99, 5));
    }

    #[test]
    fn test_check_timeouts_uses_configured_timeout() {
        let mut manager = ClientManager::new(2, Duration::from_millis(10));
        let client_id = manager.add_client(test_addr()).unwrap();
        manager.clients.get_mut(&client_id).unwrap().last_seen =
            Instant::now() - Duration::from_secs(1);

        assert_eq!(manager.check_timeouts(), vec![client_id]);
        assert!(manager.is_empty());
    }
}
