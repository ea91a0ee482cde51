//! Gameplay state shared by the arena server and client.
//!
//! Everything here is deterministic and driven by an explicit `tick(dt)`; the
//! networking crates decide when to tick and what to send.

pub mod attack;
pub mod channel;
pub mod cooldown;
pub mod entity;
pub mod health;
pub mod math;
pub mod movement;
pub mod physics;
pub mod protocol;
pub mod replication;

pub type EntityId = u32;

pub const PROTOCOL_VERSION: u32 = 1;
pub const DEFAULT_TICK_RATE: u32 = 50;

pub use attack::{
    Arsenal, AttackDefinition, AttackKind, AttackPhase, AttackStateMachine, AttackTransition,
    HitboxShape, Hit, TargetTag, VictimSet,
};
pub use channel::{SequencedReceiver, SequencedSender};
pub use cooldown::{CooldownRegistry, TimerKind};
pub use entity::{
    Attacker, AuthoritativeEntity, Damageable, Hud, Movable, ObserverEntity, PlayerEntity,
};
pub use health::{HealthPool, MAX_HEALTH};
pub use math::Vec3;
pub use movement::{ContactPhase, LocomotionController, MotionState, MoveIntent, MovementConfig, SurfaceTag};
pub use physics::Arena;
pub use protocol::{
    decode_packet, encode_packet, InputState, Packet, ProtocolError, MAX_LOBBY_SIZE, MAX_PACKET_SIZE,
};
pub use replication::{Outgoing, PlayerSnapshot, ReplicationEvent, Request};

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
pub fn timestamp_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Fixed simulation step for a tick rate.
pub fn tick_duration_secs(tick_rate: u32) -> f32 {
    1.0 / tick_rate.max(1) as f32
}
