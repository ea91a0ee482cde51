//! Minimal arena physics: gravity, a flat floor, square bounds, body
//! separation and sphere overlap for hitboxes.
//!
//! This stands in for a full physics engine. It produces the same inputs the
//! gameplay core expects from one: ground contact events and overlap checks.

use crate::attack::HitboxShape;
use crate::math::Vec3;
use crate::movement::{ContactPhase, LocomotionController, MotionState, MoveIntent, SurfaceTag};

pub const GRAVITY: f32 = 9.81;
pub const FLOOR_Y: f32 = 0.0;
pub const ARENA_HALF_EXTENT: f32 = 20.0;
pub const BODY_RADIUS: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub gravity: f32,
    pub floor_y: f32,
    pub half_extent: f32,
    pub body_radius: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            floor_y: FLOOR_Y,
            half_extent: ARENA_HALF_EXTENT,
            body_radius: BODY_RADIUS,
        }
    }
}

impl Arena {
    /// Applies gravity and keeps the body inside the arena.
    ///
    /// Returns the floor contact phase if the body touches the floor: `Enter`
    /// on the first tick of contact, `Stay` while the contact persists.
    pub fn integrate(&self, state: &mut MotionState, dt: f32) -> Option<ContactPhase> {
        let was_touching = state.position.y <= self.floor_y;

        if !state.grounded {
            state.vertical_velocity -= self.gravity * dt;
        }
        state.position.y += state.vertical_velocity * dt;

        let limit = self.half_extent - self.body_radius;
        state.position.x = state.position.x.clamp(-limit, limit);
        state.position.z = state.position.z.clamp(-limit, limit);

        if state.position.y <= self.floor_y && state.vertical_velocity <= 0.0 {
            state.position.y = self.floor_y;
            state.vertical_velocity = 0.0;
            return Some(if was_touching {
                ContactPhase::Stay
            } else {
                ContactPhase::Enter
            });
        }

        None
    }

    /// Runs one tick of locomotion followed by the physics step.
    pub fn step(&self, controller: &mut LocomotionController, intent: &MoveIntent, dt: f32) {
        controller.drive(intent, dt);
        if let Some(phase) = self.integrate(controller.state_mut(), dt) {
            controller.on_ground_contact(SurfaceTag::Ground, phase);
        }
    }

    pub fn body_center(&self, state: &MotionState) -> Vec3 {
        state.position + Vec3::new(0.0, self.body_radius, 0.0)
    }

    /// World-space center of a hitbox placed relative to the body's facing.
    pub fn hitbox_center(&self, state: &MotionState, hitbox: &HitboxShape) -> Vec3 {
        self.body_center(state)
            + state.right() * hitbox.offset.x
            + Vec3::new(0.0, hitbox.offset.y, 0.0)
            + state.forward() * hitbox.offset.z
    }

    /// Pushes two overlapping bodies apart on the ground plane.
    ///
    /// Returns true if the bodies overlapped.
    pub fn separate_bodies(&self, a: &mut MotionState, b: &mut MotionState) -> bool {
        let min_distance = self.body_radius * 2.0;
        let delta = (b.position - a.position).lateral();
        let distance = delta.magnitude();

        if distance >= min_distance {
            return false;
        }

        let normal = if distance < 0.001 {
            Vec3::new(1.0, 0.0, 0.0)
        } else {
            delta * (1.0 / distance)
        };
        let separation = (min_distance - distance) / 2.0;

        a.position += -normal * separation;
        b.position += normal * separation;
        true
    }
}

pub fn spheres_overlap(a: Vec3, radius_a: f32, b: Vec3, radius_b: f32) -> bool {
    let reach = radius_a + radius_b;
    (b - a).magnitude_squared() < reach * reach
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::MovementConfig;
    use assert_approx_eq::assert_approx_eq;

    const DT: f32 = 0.02;

    #[test]
    fn test_resting_body_reports_stay() {
        let arena = Arena::default();
        let mut state = MotionState::at(Vec3::ZERO);

        assert_eq!(arena.integrate(&mut state, DT), Some(ContactPhase::Stay));
        assert_eq!(state.position.y, 0.0);
        assert_eq!(state.vertical_velocity, 0.0);
    }

    #[test]
    fn test_falling_body_lands_with_enter() {
        let arena = Arena::default();
        let mut state = MotionState::at(Vec3::new(0.0, 0.05, 0.0));
        state.grounded = false;

        let mut contact = None;
        for _ in 0..20 {
            contact = arena.integrate(&mut state, DT);
            if contact.is_some() {
                break;
            }
        }

        assert_eq!(contact, Some(ContactPhase::Enter));
        assert_eq!(state.position.y, FLOOR_Y);
    }

    #[test]
    fn test_rising_body_has_no_contact() {
        let arena = Arena::default();
        let mut state = MotionState::at(Vec3::ZERO);
        state.grounded = false;
        state.vertical_velocity = 6.0;

        assert_eq!(arena.integrate(&mut state, DT), None);
        assert!(state.position.y > 0.0);
        assert!(state.vertical_velocity < 6.0);
    }

    #[test]
    fn test_bounds_clamp() {
        let arena = Arena::default();
        let mut state = MotionState::at(Vec3::new(100.0, 0.0, -100.0));
        arena.integrate(&mut state, DT);

        let limit = ARENA_HALF_EXTENT - BODY_RADIUS;
        assert_eq!(state.position.x, limit);
        assert_eq!(state.position.z, -limit);
    }

    #[test]
    fn test_jump_lands_and_recharges() {
        let arena = Arena::default();
        let mut controller = LocomotionController::new(MovementConfig::default(), Vec3::ZERO);
        let jump = MoveIntent {
            jump: true,
            ..MoveIntent::default()
        };

        arena.step(&mut controller, &jump, DT);
        assert!(!controller.state().grounded);

        arena.step(&mut controller, &jump, DT);
        assert_eq!(controller.state().air_jumps_used, 1);

        for _ in 0..200 {
            arena.step(&mut controller, &MoveIntent::default(), DT);
        }
        assert!(controller.state().grounded);
        assert_eq!(controller.state().air_jumps_used, 0);
    }

    #[test]
    fn test_landing_grounds_on_the_tick_after_contact() {
        let arena = Arena::default();
        let mut controller = LocomotionController::new(MovementConfig::default(), Vec3::ZERO);
        controller.state_mut().position.y = 0.05;
        controller.state_mut().grounded = false;
        controller.state_mut().air_jumps_used = 1;

        let mut ticks = 0;
        while controller.state().position.y > FLOOR_Y && ticks < 20 {
            arena.step(&mut controller, &MoveIntent::default(), DT);
            ticks += 1;
        }

        // Enter only recharges the jump
        assert_eq!(controller.state().air_jumps_used, 0);
        assert!(!controller.state().grounded);

        let mut state = *controller.state();
        assert_eq!(arena.integrate(&mut state, DT), Some(ContactPhase::Stay));

        arena.step(&mut controller, &MoveIntent::default(), DT);
        assert!(controller.state().grounded);
        assert_eq!(controller.state().position.y, FLOOR_Y);
    }

    #[test]
    fn test_hitbox_center_follows_facing() {
        let arena = Arena::default();
        let mut state = MotionState::at(Vec3::ZERO);
        let hitbox = HitboxShape {
            offset: Vec3::new(0.0, 0.0, 1.0),
            radius: 0.5,
        };

        let center = arena.hitbox_center(&state, &hitbox);
        assert_approx_eq!(center.z, 1.0, 1e-6);
        assert_approx_eq!(center.y, BODY_RADIUS, 1e-6);

        state.yaw = 90.0;
        let center = arena.hitbox_center(&state, &hitbox);
        assert_approx_eq!(center.x, 1.0, 1e-6);
        assert_approx_eq!(center.z, 0.0, 1e-6);
    }

    #[test]
    fn test_separate_overlapping_bodies() {
        let arena = Arena::default();
        let mut a = MotionState::at(Vec3::new(0.0, 0.0, 0.0));
        let mut b = MotionState::at(Vec3::new(0.4, 0.0, 0.0));

        assert!(arena.separate_bodies(&mut a, &mut b));
        assert_approx_eq!(a.position.distance(&b.position), BODY_RADIUS * 2.0, 1e-5);
        assert_approx_eq!(a.position.x, -0.3, 1e-5);
        assert_approx_eq!(b.position.x, 0.7, 1e-5);
    }

    #[test]
    fn test_separate_coincident_bodies() {
        let arena = Arena::default();
        let mut a = MotionState::at(Vec3::ZERO);
        let mut b = MotionState::at(Vec3::ZERO);

        assert!(arena.separate_bodies(&mut a, &mut b));
        assert_ne!(a.position.x, b.position.x);
    }

    #[test]
    fn test_distant_bodies_untouched() {
        let arena = Arena::default();
        let mut a = MotionState::at(Vec3::ZERO);
        let mut b = MotionState::at(Vec3::new(3.0, 0.0, 0.0));

        assert!(!arena.separate_bodies(&mut a, &mut b));
        assert_eq!(b.position.x, 3.0);
    }

    #[test]
    fn test_spheres_overlap() {
        assert!(spheres_overlap(Vec3::ZERO, 0.5, Vec3::new(0.9, 0.0, 0.0), 0.5));
        assert!(!spheres_overlap(Vec3::ZERO, 0.5, Vec3::new(1.0, 0.0, 0.0), 0.5));
    }
}
