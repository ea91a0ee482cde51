//! Datagram format shared by client and server.

use crate::movement::MoveIntent;
use crate::replication::{PlayerSnapshot, ReplicationEvent, Request};
use crate::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Largest datagram either side will send or accept.
pub const MAX_PACKET_SIZE: usize = 4096;

/// Most players a lobby may hold. A snapshot of this many players, every one
/// mid-attack with every other player in its victim set, still fits in
/// [`MAX_PACKET_SIZE`].
pub const MAX_LOBBY_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("failed to encode packet: {0}")]
    Encode(String),
    #[error("failed to decode packet: {0}")]
    Decode(String),
    #[error("packet of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    // Client to server
    Connect {
        client_version: u32,
    },
    Input {
        sequence: u32,
        timestamp: u64,
        intent: MoveIntent,
    },
    Command {
        sequence: u16,
        request: Request,
    },
    Disconnect,

    // Server to client
    Connected {
        client_id: EntityId,
        tick_rate: u32,
    },
    Event {
        sequence: u16,
        event: ReplicationEvent,
    },
    GameState {
        tick: u32,
        timestamp: u64,
        last_processed_input: HashMap<EntityId, u32>,
        players: Vec<PlayerSnapshot>,
    },
    Disconnected {
        reason: String,
    },
}

/// One tick of movement input, as buffered by both peers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputState {
    pub sequence: u32,
    pub timestamp: u64,
    pub intent: MoveIntent,
}

pub fn encode_packet(packet: &Packet) -> Result<Vec<u8>, ProtocolError> {
    let data = bincode::serialize(packet).map_err(|e| ProtocolError::Encode(e.to_string()))?;
    if data.len() > MAX_PACKET_SIZE {
        return Err(ProtocolError::TooLarge {
            size: data.len(),
            max: MAX_PACKET_SIZE,
        });
    }
    Ok(data)
}

pub fn decode_packet(data: &[u8]) -> Result<Packet, ProtocolError> {
    if data.len() > MAX_PACKET_SIZE {
        return Err(ProtocolError::TooLarge {
            size: data.len(),
            max: MAX_PACKET_SIZE,
        });
    }
    bincode::deserialize(data).map_err(|e| ProtocolError::Decode(e.to_string()))
}
