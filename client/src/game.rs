//! Client-side view of the arena: the predicted local player plus replicas of
//! everyone else, kept in line with the server by events and snapshots.

use log::{debug, warn};
use shared::{
    Arena, Attacker, AttackKind, EntityId, Hud, InputState, Movable, MotionState,
    ObserverEntity, Outgoing, Packet, PlayerEntity, PlayerSnapshot, ReplicationEvent,
    SequencedReceiver, SequencedSender, Vec3,
};
use std::collections::{BTreeMap, HashMap};

/// Distance between predicted and authoritative position that triggers a
/// rollback and replay.
pub const RECONCILE_THRESHOLD: f32 = 2.0;

/// Unacknowledged inputs kept for replay.
pub const MAX_INPUT_HISTORY: usize = 256;

pub struct ClientGameState {
    client_id: EntityId,
    dt: f32,
    arena: Arena,
    local: ObserverEntity,
    remotes: BTreeMap<EntityId, ObserverEntity>,
    pub input_history: Vec<InputState>,
    events: SequencedReceiver,
    commands: SequencedSender,
    last_snapshot_tick: Option<u32>,
    rollbacks: u64,
}

impl ClientGameState {
    pub fn new(client_id: EntityId, tick_rate: u32) -> Self {
        Self {
            client_id,
            dt: shared::tick_duration_secs(tick_rate),
            arena: Arena::default(),
            local: ObserverEntity::controlled(client_id, Vec3::ZERO),
            remotes: BTreeMap::new(),
            input_history: Vec::new(),
            events: SequencedReceiver::new(),
            commands: SequencedSender::new(),
            last_snapshot_tick: None,
            rollbacks: 0,
        }
    }

    /// Predicts one movement input locally and keeps it for replay.
    pub fn apply_prediction(&mut self, input: &InputState) {
        self.input_history.push(*input);
        if self.input_history.len() > MAX_INPUT_HISTORY {
            let excess = self.input_history.len() - MAX_INPUT_HISTORY;
            self.input_history.drain(..excess);
        }

        self.local.simulate(&self.arena, &input.intent, self.dt);
    }

    /// Forwards an attack request. Returns the packet to send, if any.
    pub fn request_attack(&mut self, attack: AttackKind) -> Option<Packet> {
        if !self.local.request_attack(attack) {
            return None;
        }

        self.local
            .drain_outbox()
            .into_iter()
            .find_map(|message| match message {
                Outgoing::Request(request) => Some(Packet::Command {
                    sequence: self.commands.next_sequence(),
                    request,
                }),
                _ => None,
            })
    }

    /// Advances locally predicted timers by one tick.
    pub fn tick(&mut self) {
        self.local.tick(self.dt);
        for remote in self.remotes.values_mut() {
            remote.tick(self.dt);
        }
    }

    /// Replays one event from the server. Returns false if it was stale or
    /// about an entity this client does not know yet.
    pub fn apply_event(&mut self, sequence: u16, event: &ReplicationEvent) -> bool {
        if !self.events.accept(sequence) {
            debug!("Dropped stale event {}", sequence);
            return false;
        }

        let subject = event.subject();
        if subject == self.client_id {
            self.local.apply_replication(event)
        } else if let Some(remote) = self.remotes.get_mut(&subject) {
            remote.apply_replication(event)
        } else {
            debug!("Event for unknown entity {}: {:?}", subject, event);
            false
        }
    }

    /// Applies an authoritative snapshot. Returns false if it was older than
    /// one already applied.
    pub fn apply_server_state(
        &mut self,
        tick: u32,
        players: &[PlayerSnapshot],
        last_processed_input: &HashMap<EntityId, u32>,
    ) -> bool {
        if self.last_snapshot_tick.is_some_and(|last| tick <= last) {
            return false;
        }
        self.last_snapshot_tick = Some(tick);

        for snapshot in players {
            if snapshot.id == self.client_id {
                self.local.apply_snapshot(snapshot);
                let acked = last_processed_input.get(&self.client_id).copied().unwrap_or(0);
                self.reconcile(snapshot.motion, acked);
            } else {
                self.remotes
                    .entry(snapshot.id)
                    .or_insert_with(|| ObserverEntity::remote(snapshot.id, snapshot.motion.position))
                    .apply_snapshot(snapshot);
            }
        }

        self.remotes
            .retain(|id, _| players.iter().any(|snapshot| snapshot.id == *id));

        if !players.iter().any(|snapshot| snapshot.id == self.client_id) {
            warn!("Snapshot {} does not contain the local player", tick);
        }
        true
    }

    /// Replays unacknowledged inputs on top of the authoritative motion and
    /// adopts the result if the prediction drifted too far from it.
    fn reconcile(&mut self, authoritative: MotionState, last_processed: u32) {
        self.input_history
            .retain(|input| input.sequence > last_processed);

        let mut replayed = self.local.locomotion().clone();
        replayed.reset_to(authoritative);
        for input in &self.input_history {
            self.arena.step(&mut replayed, &input.intent, self.dt);
        }

        let distance = replayed
            .state()
            .position
            .distance(&self.local.motion().position);

        if distance > RECONCILE_THRESHOLD {
            debug!(
                "Rollback needed! Distance: {:.2}, replaying {} inputs",
                distance,
                self.input_history.len()
            );
            self.local.locomotion_mut().reset_to(*replayed.state());
            self.rollbacks += 1;
        }
    }

    pub fn hud(&self) -> Hud {
        self.local.hud()
    }

    pub fn client_id(&self) -> EntityId {
        self.client_id
    }

    pub fn local(&self) -> &ObserverEntity {
        &self.local
    }

    pub fn local_mut(&mut self) -> &mut ObserverEntity {
        &mut self.local
    }

    pub fn remote(&self, id: EntityId) -> Option<&ObserverEntity> {
        self.remotes.get(&id)
    }

    pub fn remotes(&self) -> impl Iterator<Item = &ObserverEntity> {
        self.remotes.values()
    }

    pub fn rollbacks(&self) -> u64 {
        self.rollbacks
    }

    pub fn dropped_events(&self) -> u64 {
        self.events.dropped()
    }
}
