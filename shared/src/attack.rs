//! Attack definitions and the per-entity attack lifecycle.
//!
//! The state machine runs `Idle -> Scheduled -> Active -> Recovering -> Idle`.
//! Only the authoritative peer drives it; observers mirror the outcome through
//! replication events (see [`crate::replication`]).

use crate::cooldown::{CooldownRegistry, TimerKind};
use crate::math::Vec3;
use crate::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Keys of the arsenal. Only the base attack exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    Base,
}

impl AttackKind {
    pub const ALL: [AttackKind; 1] = [AttackKind::Base];

    fn index(self) -> usize {
        match self {
            AttackKind::Base => 0,
        }
    }
}

/// Sphere placed relative to the attacker's facing.
///
/// `offset.z` points along the facing direction, `offset.x` to its right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitboxShape {
    pub offset: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackDefinition {
    /// Damage dealt per victim.
    pub strength: i32,
    pub knockback: Vec3,
    /// Seconds the hitbox stays enabled.
    pub duration: f32,
    /// Seconds before another attack may be scheduled.
    pub cooldown: f32,
    pub hitstun: f32,
    pub hitbox: HitboxShape,
}

impl AttackDefinition {
    pub fn base() -> Self {
        Self {
            strength: 10,
            knockback: Vec3::new(0.0, 1.0, 2.0),
            duration: 0.2,
            cooldown: 1.0,
            hitstun: 0.5,
            hitbox: HitboxShape {
                offset: Vec3::new(0.0, 0.0, 1.0),
                radius: 0.75,
            },
        }
    }
}

/// Immutable table of attack definitions keyed by [`AttackKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct Arsenal {
    definitions: [AttackDefinition; AttackKind::ALL.len()],
}

impl Arsenal {
    pub fn new(base: AttackDefinition) -> Self {
        Self {
            definitions: [base],
        }
    }

    pub fn get(&self, kind: AttackKind) -> &AttackDefinition {
        &self.definitions[kind.index()]
    }
}

impl Default for Arsenal {
    fn default() -> Self {
        Self::new(AttackDefinition::base())
    }
}

/// What an overlapping collision volume belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetTag {
    Player,
    Scenery,
}

/// Entities already struck by the current activation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VictimSet {
    victims: BTreeSet<EntityId>,
}

impl VictimSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, victim: EntityId) -> bool {
        self.victims.contains(&victim)
    }

    /// Returns false if the victim was already present.
    pub fn add(&mut self, victim: EntityId) -> bool {
        self.victims.insert(victim)
    }

    pub fn clear(&mut self) {
        self.victims.clear();
    }

    /// Replaces the contents with an authoritative list.
    pub fn mirror(&mut self, victims: impl IntoIterator<Item = EntityId>) {
        self.victims = victims.into_iter().collect();
    }

    pub fn len(&self) -> usize {
        self.victims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.victims.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.victims.iter().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackPhase {
    Idle,
    /// Accepted by the authority, committed on the next tick.
    Scheduled { attack: AttackKind },
    /// Hitbox enabled.
    Active,
    /// Hitbox disabled, recharge still running.
    Recovering,
}

/// Changes produced by [`AttackStateMachine::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackTransition {
    /// Victims cleared, timers started and hitbox enabled.
    Committed(AttackKind),
    HitboxDeactivated,
    /// Back to idle; a new attack may be requested.
    Ready,
}

/// A successful strike resolved by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub victim: EntityId,
    pub damage: i32,
}

#[derive(Debug, Clone)]
pub struct AttackStateMachine {
    phase: AttackPhase,
    current: Option<AttackKind>,
    hitbox_active: bool,
    victims: VictimSet,
    cooldowns: CooldownRegistry,
    arsenal: Arsenal,
}

impl AttackStateMachine {
    pub fn new(arsenal: Arsenal) -> Self {
        Self {
            phase: AttackPhase::Idle,
            current: None,
            hitbox_active: false,
            victims: VictimSet::new(),
            cooldowns: CooldownRegistry::new(),
            arsenal,
        }
    }

    /// Schedules an attack if the recharge timer has run out.
    ///
    /// Requests arriving while an attack is already scheduled or while the
    /// recharge is still running are dropped without any state change.
    pub fn request(&mut self, attack: AttackKind) -> bool {
        if matches!(self.phase, AttackPhase::Scheduled { .. })
            || self.cooldowns.remaining(TimerKind::AttackCooldown) > 0.0
        {
            return false;
        }

        self.phase = AttackPhase::Scheduled { attack };
        true
    }

    /// Commits a scheduled attack, then advances the timers by `dt`.
    pub fn tick(&mut self, dt: f32) -> Vec<AttackTransition> {
        let mut transitions = Vec::new();

        if let AttackPhase::Scheduled { attack } = self.phase {
            self.commit(attack);
            transitions.push(AttackTransition::Committed(attack));
        }

        for expired in self.cooldowns.tick(dt) {
            match expired {
                TimerKind::AttackDuration => {
                    if self.hitbox_active {
                        self.hitbox_active = false;
                        transitions.push(AttackTransition::HitboxDeactivated);
                    }
                    if self.phase == AttackPhase::Active {
                        if self.cooldowns.remaining(TimerKind::AttackCooldown) > 0.0 {
                            self.phase = AttackPhase::Recovering;
                        } else {
                            self.phase = AttackPhase::Idle;
                            transitions.push(AttackTransition::Ready);
                        }
                    }
                }
                TimerKind::AttackCooldown => {
                    if self.phase == AttackPhase::Recovering {
                        self.phase = AttackPhase::Idle;
                        transitions.push(AttackTransition::Ready);
                    }
                }
            }
        }

        transitions
    }

    fn commit(&mut self, attack: AttackKind) {
        let definition = *self.arsenal.get(attack);

        self.victims.clear();
        self.current = Some(attack);
        self.hitbox_active = true;
        self.cooldowns
            .start(TimerKind::AttackCooldown, definition.cooldown);
        self.cooldowns
            .start(TimerKind::AttackDuration, definition.duration);
        self.phase = AttackPhase::Active;
    }

    /// Resolves an overlap between the active hitbox and another volume.
    pub fn resolve_overlap(
        &mut self,
        attacker: EntityId,
        target: EntityId,
        tag: TargetTag,
    ) -> Option<Hit> {
        if !self.hitbox_active
            || tag != TargetTag::Player
            || target == attacker
            || self.victims.contains(target)
        {
            return None;
        }

        let damage = self.current_definition()?.strength;
        self.victims.add(target);

        Some(Hit {
            victim: target,
            damage,
        })
    }

    pub fn phase(&self) -> AttackPhase {
        self.phase
    }

    pub fn current(&self) -> Option<AttackKind> {
        self.current
    }

    pub fn current_definition(&self) -> Option<&AttackDefinition> {
        self.current.map(|kind| self.arsenal.get(kind))
    }

    pub fn hitbox_active(&self) -> bool {
        self.hitbox_active
    }

    pub fn victims(&self) -> &VictimSet {
        &self.victims
    }

    pub fn cooldowns(&self) -> &CooldownRegistry {
        &self.cooldowns
    }

    pub fn arsenal(&self) -> &Arsenal {
        &self.arsenal
    }
}

impl Default for AttackStateMachine {
    fn default() -> Self {
        Self::new(Arsenal::default())
    }
}
