//! Messages exchanged between the authority and the observers.
//!
//! Observers only ever send [`Request`]s. The authority answers with
//! [`ReplicationEvent`]s that carry committed outcomes, which observers replay
//! verbatim without re-running any validation, hit detection or damage maths.

use crate::attack::{AttackKind, AttackPhase};
use crate::movement::MotionState;
use crate::EntityId;
use serde::{Deserialize, Serialize};

/// Observer-initiated request. Never carries state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    Attack { attack: AttackKind },
}

/// A state mutation committed by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicationEvent {
    /// Sent to the controlling peer only.
    AttackScheduled { entity: EntityId, attack: AttackKind },
    AttackCommitted { entity: EntityId, attack: AttackKind },
    /// Sent to the controlling peer only, which predicts the timers locally.
    CooldownsStarted { entity: EntityId, attack: AttackKind },
    HitboxActivated { entity: EntityId },
    HitboxDeactivated { entity: EntityId },
    VictimAdded { entity: EntityId, victim: EntityId },
    VictimsCleared { entity: EntityId },
    /// `health` is the victim's remaining health after the hit.
    DamageApplied {
        attacker: EntityId,
        victim: EntityId,
        amount: i32,
        health: i32,
    },
}

impl ReplicationEvent {
    /// The entity whose replica this event mutates.
    pub fn subject(&self) -> EntityId {
        match *self {
            ReplicationEvent::AttackScheduled { entity, .. }
            | ReplicationEvent::AttackCommitted { entity, .. }
            | ReplicationEvent::CooldownsStarted { entity, .. }
            | ReplicationEvent::HitboxActivated { entity }
            | ReplicationEvent::HitboxDeactivated { entity }
            | ReplicationEvent::VictimAdded { entity, .. }
            | ReplicationEvent::VictimsCleared { entity } => entity,
            ReplicationEvent::DamageApplied { victim, .. } => victim,
        }
    }
}

/// A message leaving an entity, tagged with where it must go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outgoing {
    /// Authority to every observer.
    Broadcast(ReplicationEvent),
    /// Authority to one observer (the entity's controlling peer).
    Target {
        peer: EntityId,
        event: ReplicationEvent,
    },
    /// Observer to authority.
    Request(Request),
}

/// Authoritative per-player state carried by every snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: EntityId,
    pub motion: MotionState,
    pub health: i32,
    pub hitbox_active: bool,
    /// Entities struck by the current activation, in ascending order.
    pub victims: Vec<EntityId>,
    pub attack: Option<AttackKind>,
    pub attack_phase: AttackPhase,
    pub attack_cooldown: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_of_damage_is_victim() {
        let event = ReplicationEvent::DamageApplied {
            attacker: 1,
            victim: 2,
            amount: 10,
            health: 90,
        };
        assert_eq!(event.subject(), 2);
    }

    #[test]
    fn test_subject_of_attack_events_is_attacker() {
        let events = [
            ReplicationEvent::AttackScheduled {
                entity: 7,
                attack: AttackKind::Base,
            },
            ReplicationEvent::HitboxActivated { entity: 7 },
            ReplicationEvent::VictimAdded {
                entity: 7,
                victim: 3,
            },
            ReplicationEvent::VictimsCleared { entity: 7 },
        ];

        for event in events {
            assert_eq!(event.subject(), 7);
        }
    }
}
