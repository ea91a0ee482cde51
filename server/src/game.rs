//! Authoritative arena simulation.
//!
//! The server owns one [`AuthoritativeEntity`] per connected client. Movement
//! inputs are simulated as they are dequeued; everything else (attack
//! lifecycle, body separation, hit detection) runs once per tick in
//! [`GameState::step`].

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::physics::spheres_overlap;
use shared::{
    Arena, Attacker, AuthoritativeEntity, EntityId, InputState, Movable, Outgoing, PlayerEntity,
    PlayerSnapshot, Request, TargetTag, Vec3,
};
use std::collections::BTreeMap;

/// Radius of the ring players spawn on.
const SPAWN_RING_RADIUS: f32 = 6.0;
const SPAWN_JITTER: f32 = 0.5;

#[derive(Debug)]
pub struct GameState {
    pub tick: u32,
    arena: Arena,
    players: BTreeMap<EntityId, AuthoritativeEntity>,
    rng: StdRng,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Seeds the spawn jitter so tests can place players reproducibly.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            tick: 0,
            arena: Arena::default(),
            players: BTreeMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn add_player(&mut self, client_id: EntityId) {
        let angle = client_id as f32 * 2.399_963;
        let jitter = Vec3::new(
            self.rng.gen_range(-SPAWN_JITTER..=SPAWN_JITTER),
            0.0,
            self.rng.gen_range(-SPAWN_JITTER..=SPAWN_JITTER),
        );
        let spawn =
            Vec3::new(angle.cos(), 0.0, angle.sin()) * SPAWN_RING_RADIUS + jitter;

        self.spawn_player(client_id, spawn);
    }

    /// Adds a player at an exact position.
    pub fn spawn_player(&mut self, client_id: EntityId, position: Vec3) {
        info!(
            "Added player {} at ({:.2}, {:.2}, {:.2})",
            client_id, position.x, position.y, position.z
        );
        self.players
            .insert(client_id, AuthoritativeEntity::new(client_id, position));
    }

    pub fn remove_player(&mut self, client_id: &EntityId) {
        if self.players.remove(client_id).is_some() {
            info!("Removed player {}", client_id);
        }
    }

    /// Simulates one movement input for a player.
    pub fn apply_input(&mut self, client_id: EntityId, input: &InputState, dt: f32) {
        if let Some(player) = self.players.get_mut(&client_id) {
            player.simulate(&self.arena, &input.intent, dt);
        }
    }

    /// Handles a request forwarded by a player's own client.
    ///
    /// Returns false when the request was rejected.
    pub fn handle_request(&mut self, client_id: EntityId, request: Request) -> bool {
        let Some(player) = self.players.get_mut(&client_id) else {
            return false;
        };

        match request {
            Request::Attack { attack } => {
                let accepted = player.request_attack(attack);
                if !accepted {
                    debug!("Player {} attack request rejected", client_id);
                }
                accepted
            }
        }
    }

    /// Advances the world by one tick and returns the replication traffic it
    /// produced, in emission order.
    pub fn step(&mut self, dt: f32) -> Vec<Outgoing> {
        self.tick = self.tick.wrapping_add(1);

        for player in self.players.values_mut() {
            player.tick(dt);
        }

        self.separate_bodies();
        self.resolve_hits();

        let mut outgoing = Vec::new();
        for player in self.players.values_mut() {
            outgoing.extend(player.drain_outbox());
        }
        outgoing
    }

    fn separate_bodies(&mut self) {
        let ids: Vec<EntityId> = self.players.keys().copied().collect();

        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let (Some(mut a), Some(mut b)) = (
                    self.players.get(&ids[i]).map(|p| *p.motion()),
                    self.players.get(&ids[j]).map(|p| *p.motion()),
                ) else {
                    continue;
                };

                if self.arena.separate_bodies(&mut a, &mut b) {
                    if let Some(p) = self.players.get_mut(&ids[i]) {
                        p.locomotion_mut().state_mut().position = a.position;
                    }
                    if let Some(p) = self.players.get_mut(&ids[j]) {
                        p.locomotion_mut().state_mut().position = b.position;
                    }
                }
            }
        }
    }

    /// Feeds every hitbox/body overlap to the attacker, then applies the
    /// resulting damage to the victim.
    fn resolve_hits(&mut self) {
        let ids: Vec<EntityId> = self.players.keys().copied().collect();

        for &attacker_id in &ids {
            let Some((center, radius)) = self.players.get(&attacker_id).and_then(|attacker| {
                let definition = attacker.attack().current_definition()?;
                attacker.hitbox_active().then(|| {
                    (
                        self.arena.hitbox_center(attacker.motion(), &definition.hitbox),
                        definition.hitbox.radius,
                    )
                })
            }) else {
                continue;
            };

            for &target_id in &ids {
                if target_id == attacker_id {
                    continue;
                }
                let Some(target_center) = self
                    .players
                    .get(&target_id)
                    .map(|target| self.arena.body_center(target.motion()))
                else {
                    continue;
                };
                if !spheres_overlap(center, radius, target_center, self.arena.body_radius) {
                    continue;
                }

                let hit = self
                    .players
                    .get_mut(&attacker_id)
                    .and_then(|attacker| attacker.resolve_overlap(target_id, TargetTag::Player));
                if let (Some(hit), Some(target)) = (hit, self.players.get_mut(&target_id)) {
                    target.receive_hit(attacker_id, hit);
                }
            }
        }
    }

    pub fn snapshot(&self) -> Vec<PlayerSnapshot> {
        self.players.values().map(|p| p.snapshot()).collect()
    }

    pub fn player(&self, client_id: EntityId) -> Option<&AuthoritativeEntity> {
        self.players.get(&client_id)
    }

    pub fn player_mut(&mut self, client_id: EntityId) -> Option<&mut AuthoritativeEntity> {
        self.players.get_mut(&client_id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }
}
