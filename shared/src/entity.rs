//! The player aggregate and its two peer-side implementations.
//!
//! A peer picks its implementation once, when the player is created:
//! the server builds [`AuthoritativeEntity`]s and every client builds
//! [`ObserverEntity`]s. Both expose the same capability traits, so callers
//! never branch on who has authority.

use crate::attack::{
    Arsenal, AttackKind, AttackPhase, AttackStateMachine, AttackTransition, Hit, TargetTag,
    VictimSet,
};
use crate::cooldown::{CooldownRegistry, TimerKind};
use crate::health::HealthPool;
use crate::math::Vec3;
use crate::movement::{LocomotionController, MotionState, MoveIntent, MovementConfig};
use crate::physics::Arena;
use crate::replication::{Outgoing, PlayerSnapshot, ReplicationEvent, Request};
use crate::EntityId;
use log::debug;

/// Values the UI polls once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hud {
    pub health: i32,
    /// Seconds until the next attack may be requested.
    pub attack_cooldown: f32,
}

pub trait Movable {
    fn locomotion(&self) -> &LocomotionController;

    fn locomotion_mut(&mut self) -> &mut LocomotionController;

    fn motion(&self) -> &MotionState {
        self.locomotion().state()
    }

    /// Applies one tick of movement input followed by the physics step.
    fn simulate(&mut self, arena: &Arena, intent: &MoveIntent, dt: f32) {
        arena.step(self.locomotion_mut(), intent, dt);
    }

    fn launch(&mut self, velocity: Vec3) {
        self.locomotion_mut().launch(velocity);
    }
}

pub trait Attacker {
    /// Asks for an attack. Returns false when the request was dropped.
    fn request_attack(&mut self, attack: AttackKind) -> bool;

    fn hitbox_active(&self) -> bool;

    fn current_attack(&self) -> Option<AttackKind>;

    fn attack_cooldown(&self) -> f32;

    fn victims(&self) -> &VictimSet;
}

pub trait Damageable {
    fn health(&self) -> &HealthPool;
}

pub trait PlayerEntity: Movable + Attacker + Damageable {
    fn id(&self) -> EntityId;

    /// Advances per-tick state (timers, attack lifecycle) by `dt`.
    fn tick(&mut self, dt: f32);

    /// Takes every message produced since the last call.
    fn drain_outbox(&mut self) -> Vec<Outgoing>;

    fn hud(&self) -> Hud {
        Hud {
            health: self.health().current(),
            attack_cooldown: self.attack_cooldown(),
        }
    }
}

/// The server's copy of a player. Sole writer of combat and health state.
#[derive(Debug, Clone)]
pub struct AuthoritativeEntity {
    id: EntityId,
    locomotion: LocomotionController,
    attack: AttackStateMachine,
    health: HealthPool,
    outbox: Vec<Outgoing>,
}

impl AuthoritativeEntity {
    pub fn new(id: EntityId, position: Vec3) -> Self {
        Self::with_config(id, position, MovementConfig::default(), Arsenal::default())
    }

    pub fn with_config(
        id: EntityId,
        position: Vec3,
        movement: MovementConfig,
        arsenal: Arsenal,
    ) -> Self {
        Self {
            id,
            locomotion: LocomotionController::new(movement, position),
            attack: AttackStateMachine::new(arsenal),
            health: HealthPool::default(),
            outbox: Vec::new(),
        }
    }

    /// Checks an overlap between this entity's hitbox and another volume.
    ///
    /// A successful hit records the victim and replicates the addition. The
    /// caller applies the damage to the victim.
    pub fn resolve_overlap(&mut self, target: EntityId, tag: TargetTag) -> Option<Hit> {
        let hit = self.attack.resolve_overlap(self.id, target, tag)?;

        debug!("Entity {} struck entity {}", self.id, hit.victim);
        self.outbox
            .push(Outgoing::Broadcast(ReplicationEvent::VictimAdded {
                entity: self.id,
                victim: hit.victim,
            }));
        Some(hit)
    }

    /// Applies a hit resolved by `attacker` and returns the remaining health.
    pub fn receive_hit(&mut self, attacker: EntityId, hit: Hit) -> i32 {
        let health = self.health.apply_damage(hit.damage);

        debug!(
            "Entity {} took {} damage from {} ({} left)",
            self.id, hit.damage, attacker, health
        );
        self.outbox
            .push(Outgoing::Broadcast(ReplicationEvent::DamageApplied {
                attacker,
                victim: self.id,
                amount: hit.damage,
                health,
            }));
        health
    }

    pub fn attack(&self) -> &AttackStateMachine {
        &self.attack
    }

    pub fn attack_phase(&self) -> AttackPhase {
        self.attack.phase()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            motion: *self.locomotion.state(),
            health: self.health.current(),
            hitbox_active: self.attack.hitbox_active(),
            victims: self.attack.victims().iter().collect(),
            attack: self.attack.current(),
            attack_phase: self.attack.phase(),
            attack_cooldown: self.attack_cooldown(),
        }
    }

    fn on_transition(&mut self, transition: AttackTransition) {
        let entity = self.id;

        match transition {
            AttackTransition::Committed(attack) => {
                debug!("Entity {} committed {:?}", entity, attack);
                self.outbox.extend([
                    Outgoing::Broadcast(ReplicationEvent::VictimsCleared { entity }),
                    Outgoing::Broadcast(ReplicationEvent::AttackCommitted { entity, attack }),
                    Outgoing::Target {
                        peer: entity,
                        event: ReplicationEvent::CooldownsStarted { entity, attack },
                    },
                    Outgoing::Broadcast(ReplicationEvent::HitboxActivated { entity }),
                ]);
            }
            AttackTransition::HitboxDeactivated => {
                self.outbox
                    .push(Outgoing::Broadcast(ReplicationEvent::HitboxDeactivated {
                        entity,
                    }));
            }
            AttackTransition::Ready => {
                debug!("Entity {} can attack again", entity);
            }
        }
    }
}

impl Movable for AuthoritativeEntity {
    fn locomotion(&self) -> &LocomotionController {
        &self.locomotion
    }

    fn locomotion_mut(&mut self) -> &mut LocomotionController {
        &mut self.locomotion
    }
}

impl Attacker for AuthoritativeEntity {
    fn request_attack(&mut self, attack: AttackKind) -> bool {
        if !self.attack.request(attack) {
            return false;
        }

        self.outbox.push(Outgoing::Target {
            peer: self.id,
            event: ReplicationEvent::AttackScheduled {
                entity: self.id,
                attack,
            },
        });
        true
    }

    fn hitbox_active(&self) -> bool {
        self.attack.hitbox_active()
    }

    fn current_attack(&self) -> Option<AttackKind> {
        self.attack.current()
    }

    fn attack_cooldown(&self) -> f32 {
        self.attack.cooldowns().remaining(TimerKind::AttackCooldown)
    }

    fn victims(&self) -> &VictimSet {
        self.attack.victims()
    }
}

impl Damageable for AuthoritativeEntity {
    fn health(&self) -> &HealthPool {
        &self.health
    }
}

impl PlayerEntity for AuthoritativeEntity {
    fn id(&self) -> EntityId {
        self.id
    }

    fn tick(&mut self, dt: f32) {
        for transition in self.attack.tick(dt) {
            self.on_transition(transition);
        }
    }

    fn drain_outbox(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.outbox)
    }
}

/// A client's replica of a player.
///
/// Authority-only state (health, hitbox, victims) changes only through
/// [`ObserverEntity::apply_replication`] and [`ObserverEntity::apply_snapshot`].
/// The replica of the local player additionally predicts its attack timers so
/// the HUD counts down without waiting for the server.
#[derive(Debug, Clone)]
pub struct ObserverEntity {
    id: EntityId,
    controlled: bool,
    locomotion: LocomotionController,
    arsenal: Arsenal,
    cooldowns: CooldownRegistry,
    attack_pending: bool,
    current: Option<AttackKind>,
    hitbox_active: bool,
    victims: VictimSet,
    health: HealthPool,
    outbox: Vec<Outgoing>,
}

impl ObserverEntity {
    /// Replica of the player driven by this peer.
    pub fn controlled(id: EntityId, position: Vec3) -> Self {
        Self::with_config(id, true, position, MovementConfig::default(), Arsenal::default())
    }

    /// Replica of a player driven by another peer.
    pub fn remote(id: EntityId, position: Vec3) -> Self {
        Self::with_config(id, false, position, MovementConfig::default(), Arsenal::default())
    }

    pub fn with_config(
        id: EntityId,
        controlled: bool,
        position: Vec3,
        movement: MovementConfig,
        arsenal: Arsenal,
    ) -> Self {
        Self {
            id,
            controlled,
            locomotion: LocomotionController::new(movement, position),
            arsenal,
            cooldowns: CooldownRegistry::new(),
            attack_pending: false,
            current: None,
            hitbox_active: false,
            victims: VictimSet::new(),
            health: HealthPool::default(),
            outbox: Vec::new(),
        }
    }

    pub fn is_controlled(&self) -> bool {
        self.controlled
    }

    /// True between the authority's scheduling confirmation and the commit.
    pub fn attack_pending(&self) -> bool {
        self.attack_pending
    }

    /// Mirrors one authoritative event. Returns false if it is not about this
    /// entity.
    pub fn apply_replication(&mut self, event: &ReplicationEvent) -> bool {
        if event.subject() != self.id {
            return false;
        }

        match *event {
            ReplicationEvent::AttackScheduled { .. } => {
                if self.controlled {
                    self.attack_pending = true;
                }
            }
            ReplicationEvent::AttackCommitted { attack, .. } => {
                self.current = Some(attack);
                self.attack_pending = false;
            }
            ReplicationEvent::CooldownsStarted { attack, .. } => {
                let definition = *self.arsenal.get(attack);
                self.cooldowns
                    .start(TimerKind::AttackCooldown, definition.cooldown);
                self.cooldowns
                    .start(TimerKind::AttackDuration, definition.duration);
            }
            ReplicationEvent::HitboxActivated { .. } => self.hitbox_active = true,
            ReplicationEvent::HitboxDeactivated { .. } => self.hitbox_active = false,
            ReplicationEvent::VictimAdded { victim, .. } => {
                self.victims.add(victim);
            }
            ReplicationEvent::VictimsCleared { .. } => self.victims.clear(),
            ReplicationEvent::DamageApplied { health, .. } => self.health.mirror(health),
        }

        true
    }

    /// Overwrites authority-only state from a snapshot, repairing anything
    /// lost on the event channel.
    ///
    /// Remote replicas also adopt the authoritative motion. The local replica
    /// keeps its predicted motion; reconciling it is up to the caller.
    pub fn apply_snapshot(&mut self, snapshot: &PlayerSnapshot) {
        self.health.mirror(snapshot.health);
        self.hitbox_active = snapshot.hitbox_active;
        self.victims.mirror(snapshot.victims.iter().copied());
        self.current = snapshot.attack;

        if self.controlled {
            self.cooldowns
                .reconcile(TimerKind::AttackCooldown, snapshot.attack_cooldown);
            if !matches!(snapshot.attack_phase, AttackPhase::Scheduled { .. }) {
                self.attack_pending = false;
            }
        } else {
            self.locomotion.reset_to(snapshot.motion);
        }
    }

    pub fn cooldowns(&self) -> &CooldownRegistry {
        &self.cooldowns
    }
}

impl Movable for ObserverEntity {
    fn locomotion(&self) -> &LocomotionController {
        &self.locomotion
    }

    fn locomotion_mut(&mut self) -> &mut LocomotionController {
        &mut self.locomotion
    }
}

impl Attacker for ObserverEntity {
    /// Forwards the request to the authority; nothing changes locally.
    fn request_attack(&mut self, attack: AttackKind) -> bool {
        if !self.controlled {
            return false;
        }

        self.outbox
            .push(Outgoing::Request(Request::Attack { attack }));
        true
    }

    fn hitbox_active(&self) -> bool {
        self.hitbox_active
    }

    fn current_attack(&self) -> Option<AttackKind> {
        self.current
    }

    fn attack_cooldown(&self) -> f32 {
        self.cooldowns.remaining(TimerKind::AttackCooldown)
    }

    fn victims(&self) -> &VictimSet {
        &self.victims
    }
}

impl Damageable for ObserverEntity {
    fn health(&self) -> &HealthPool {
        &self.health
    }
}

impl PlayerEntity for ObserverEntity {
    fn id(&self) -> EntityId {
        self.id
    }

    fn tick(&mut self, dt: f32) {
        if self.controlled {
            // Prediction only; expiry has no side effects on a replica.
            self.cooldowns.tick(dt);
        }
    }

    fn drain_outbox(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.outbox)
    }
}
