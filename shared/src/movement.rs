//! Locomotion controller: grounded/aerial movement, jump charges and look.
//!
//! Runs on the controlling peer ahead of the authority (prediction) and on the
//! authority for the inputs it receives. Vertical integration and contacts
//! come from the physics step in [`crate::physics`].

use crate::math::Vec3;
use serde::{Deserialize, Serialize};

/// Displacement error, in units per second, above which airborne motion is
/// resynchronised with the measured displacement.
const CORRECTION_TOLERANCE: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementConfig {
    pub walk_speed: f32,
    pub sprint_speed: f32,
    pub max_aerial_mobility: f32,
    /// Maximum change of lateral velocity per tick while airborne.
    pub aerial_agility: f32,
    pub jump_power: f32,
    pub max_air_jumps: u32,
    /// Pitch limit in degrees either side of level.
    pub max_pitch: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: 10.0,
            sprint_speed: 20.0,
            max_aerial_mobility: 8.0,
            aerial_agility: 0.2,
            jump_power: 6.0,
            max_air_jumps: 1,
            max_pitch: 90.0,
        }
    }
}

/// Movement input for one tick, in the player's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MoveIntent {
    /// -1 (left) to 1 (right).
    pub strafe: f32,
    /// -1 (back) to 1 (forward).
    pub forward: f32,
    pub sprint: bool,
    pub jump: bool,
    /// Yaw delta in degrees.
    pub yaw: f32,
    /// Pitch delta in degrees.
    pub pitch: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceTag {
    Ground,
    Wall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactPhase {
    Enter,
    Stay,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    pub position: Vec3,
    /// Position at the start of the previous advance.
    pub previous_position: Vec3,
    /// Displacement the previous advance applied.
    pub expected_displacement: Vec3,
    pub lateral_velocity: Vec3,
    pub vertical_velocity: f32,
    pub grounded: bool,
    pub air_jumps_used: u32,
    /// Body facing in degrees, wrapped to `[0, 360)`.
    pub yaw: f32,
    /// Accumulated look pitch in degrees.
    pub pitch: f32,
}

impl MotionState {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            previous_position: position,
            expected_displacement: Vec3::ZERO,
            lateral_velocity: Vec3::ZERO,
            vertical_velocity: 0.0,
            grounded: true,
            air_jumps_used: 0,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    pub fn velocity(&self) -> Vec3 {
        Vec3::new(
            self.lateral_velocity.x,
            self.vertical_velocity,
            self.lateral_velocity.z,
        )
    }

    /// Unit vector the body is facing on the ground plane.
    pub fn forward(&self) -> Vec3 {
        let yaw = self.yaw.to_radians();
        Vec3::new(yaw.sin(), 0.0, yaw.cos())
    }

    pub fn right(&self) -> Vec3 {
        let yaw = self.yaw.to_radians();
        Vec3::new(yaw.cos(), 0.0, -yaw.sin())
    }
}

#[derive(Debug, Clone)]
pub struct LocomotionController {
    config: MovementConfig,
    state: MotionState,
    current_speed: f32,
}

impl LocomotionController {
    pub fn new(config: MovementConfig, position: Vec3) -> Self {
        Self {
            current_speed: config.walk_speed,
            config,
            state: MotionState::at(position),
        }
    }

    /// Applies one tick of movement input and moves the body laterally.
    pub fn drive(&mut self, intent: &MoveIntent, dt: f32) {
        self.set_sprint(intent.sprint);
        self.apply_look(intent.yaw, intent.pitch);
        let direction = self.world_direction(intent.strafe, intent.forward);
        self.update_velocity(direction, dt);
        if intent.jump {
            self.request_jump();
        }
        self.advance(dt);
        self.update_grounded();
    }

    /// Converts local stick axes into a normalized ground-plane direction.
    pub fn world_direction(&self, strafe: f32, forward: f32) -> Vec3 {
        (self.state.right() * strafe + self.state.forward() * forward).normalize()
    }

    pub fn set_sprint(&mut self, sprinting: bool) {
        self.current_speed = if sprinting && self.state.grounded {
            self.config.sprint_speed
        } else {
            self.config.walk_speed
        };
    }

    pub fn update_velocity(&mut self, direction: Vec3, dt: f32) {
        let direction = direction.lateral();

        if self.state.grounded {
            self.state.lateral_velocity = direction * self.current_speed;
            return;
        }

        if dt > 0.0 {
            let actual = (self.state.position - self.state.previous_position).lateral();
            let error = actual - self.state.expected_displacement.lateral();
            if error.magnitude() * (1.0 / dt) > CORRECTION_TOLERANCE {
                self.state.lateral_velocity = actual * (1.0 / dt);
            }
        }

        let target = direction * self.config.max_aerial_mobility;
        let difference = target - self.state.lateral_velocity;
        if difference.magnitude() <= self.config.aerial_agility {
            self.state.lateral_velocity = target;
        } else {
            self.state.lateral_velocity += difference.normalize() * self.config.aerial_agility;
        }
    }

    /// Jumps if a charge is left. The ground jump itself is free.
    pub fn request_jump(&mut self) -> bool {
        if self.state.air_jumps_used >= self.config.max_air_jumps {
            return false;
        }

        self.state.vertical_velocity = self.config.jump_power;
        if !self.state.grounded {
            self.state.air_jumps_used += 1;
        }
        self.update_grounded();
        true
    }

    /// Rotates the body by `yaw` and the look by `pitch` (degrees).
    ///
    /// A pitch delta that would reach the limit is dropped entirely.
    pub fn apply_look(&mut self, yaw: f32, pitch: f32) {
        self.state.yaw = (self.state.yaw + yaw).rem_euclid(360.0);

        if (self.state.pitch + pitch).abs() < self.config.max_pitch {
            self.state.pitch += pitch;
        }
    }

    pub fn on_ground_contact(&mut self, surface: SurfaceTag, phase: ContactPhase) {
        if surface != SurfaceTag::Ground {
            return;
        }
        match phase {
            ContactPhase::Enter => self.state.air_jumps_used = 0,
            ContactPhase::Stay => self.state.grounded = true,
        }
    }

    pub fn update_grounded(&mut self) {
        if self.state.vertical_velocity != 0.0 {
            self.state.grounded = false;
        }
    }

    /// Sets the velocity outright, e.g. for knockback.
    pub fn launch(&mut self, velocity: Vec3) {
        self.state.lateral_velocity = velocity.lateral();
        self.state.vertical_velocity = velocity.y;
        self.state.previous_position = self.state.position;
        self.state.expected_displacement = Vec3::ZERO;
        self.update_grounded();
    }

    pub fn advance(&mut self, dt: f32) {
        let displacement = self.state.lateral_velocity * dt;
        self.state.previous_position = self.state.position;
        self.state.expected_displacement = displacement;
        self.state.position += displacement;
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut MotionState {
        &mut self.state
    }

    /// Replaces the whole motion state, e.g. when rolling back to a snapshot.
    pub fn reset_to(&mut self, state: MotionState) {
        self.state = state;
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn current_speed(&self) -> f32 {
        self.current_speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const DT: f32 = 0.02;

    fn controller() -> LocomotionController {
        LocomotionController::new(MovementConfig::default(), Vec3::ZERO)
    }

    fn airborne_controller() -> LocomotionController {
        let mut controller = controller();
        controller.state_mut().grounded = false;
        controller.state_mut().vertical_velocity = -1.0;
        controller
    }

    #[test]
    fn test_ground_jump_then_air_jump_then_rejected() {
        let mut controller = controller();
        assert!(controller.state().grounded);

        assert!(controller.request_jump());
        assert_eq!(controller.state().air_jumps_used, 0);
        assert_eq!(controller.state().vertical_velocity, 6.0);
        assert!(!controller.state().grounded);

        controller.state_mut().vertical_velocity = 2.5;
        assert!(controller.request_jump());
        assert_eq!(controller.state().air_jumps_used, 1);

        controller.state_mut().vertical_velocity = 1.5;
        assert!(!controller.request_jump());
        assert_eq!(controller.state().vertical_velocity, 1.5);
        assert_eq!(controller.state().air_jumps_used, 1);
    }

    #[test]
    fn test_ground_contact_enter_resets_charges() {
        let mut controller = airborne_controller();
        controller.state_mut().air_jumps_used = 1;

        controller.on_ground_contact(SurfaceTag::Wall, ContactPhase::Enter);
        assert_eq!(controller.state().air_jumps_used, 1);
        assert!(!controller.state().grounded);

        controller.on_ground_contact(SurfaceTag::Ground, ContactPhase::Enter);
        assert_eq!(controller.state().air_jumps_used, 0);
        assert!(!controller.state().grounded);
    }

    #[test]
    fn test_ground_contact_stay_keeps_charges() {
        let mut controller = airborne_controller();
        controller.state_mut().air_jumps_used = 1;

        controller.on_ground_contact(SurfaceTag::Ground, ContactPhase::Stay);
        assert!(controller.state().grounded);
        assert_eq!(controller.state().air_jumps_used, 1);
    }

    #[test]
    fn test_vertical_velocity_leaves_ground() {
        let mut controller = controller();
        controller.update_grounded();
        assert!(controller.state().grounded);

        controller.state_mut().vertical_velocity = 0.3;
        controller.update_grounded();
        assert!(!controller.state().grounded);
    }

    #[test]
    fn test_drive_leaves_ground_on_vertical_velocity() {
        let mut controller = controller();
        controller.state_mut().vertical_velocity = 0.5;

        controller.drive(&MoveIntent::default(), DT);
        assert!(!controller.state().grounded);
    }

    #[test]
    fn test_grounded_velocity_walk_and_sprint() {
        let mut controller = controller();
        let direction = Vec3::new(0.0, 0.0, 1.0);

        controller.set_sprint(false);
        controller.update_velocity(direction, DT);
        assert_approx_eq!(controller.state().lateral_velocity.z, 10.0, 1e-6);

        controller.set_sprint(true);
        controller.update_velocity(direction, DT);
        assert_approx_eq!(controller.state().lateral_velocity.z, 20.0, 1e-6);
    }

    #[test]
    fn test_sprint_ignored_in_air() {
        let mut controller = airborne_controller();
        controller.set_sprint(true);
        assert_eq!(controller.current_speed(), 10.0);
    }

    #[test]
    fn test_aerial_velocity_is_rate_limited() {
        let mut controller = airborne_controller();
        let direction = Vec3::new(1.0, 0.0, 0.0);

        controller.update_velocity(direction, DT);
        assert_approx_eq!(controller.state().lateral_velocity.x, 0.2, 1e-6);

        controller.advance(DT);
        controller.update_velocity(direction, DT);
        assert_approx_eq!(controller.state().lateral_velocity.x, 0.4, 1e-5);
    }

    #[test]
    fn test_aerial_velocity_snaps_when_close() {
        let mut controller = airborne_controller();
        controller.state_mut().lateral_velocity = Vec3::new(7.9, 0.0, 0.0);

        controller.update_velocity(Vec3::new(1.0, 0.0, 0.0), DT);
        assert_eq!(controller.state().lateral_velocity, Vec3::new(8.0, 0.0, 0.0));
    }

    #[test]
    fn test_aerial_reversal_is_gradual() {
        let mut controller = airborne_controller();
        controller.state_mut().lateral_velocity = Vec3::new(8.0, 0.0, 0.0);

        controller.update_velocity(Vec3::new(-1.0, 0.0, 0.0), DT);
        assert_approx_eq!(controller.state().lateral_velocity.x, 7.8, 1e-5);
    }

    #[test]
    fn test_aerial_velocity_follows_external_pushback() {
        let mut controller = airborne_controller();
        controller.state_mut().lateral_velocity = Vec3::new(5.0, 0.0, 0.0);
        controller.advance(DT);
        // A wall stopped the body where it started.
        let start = controller.state().previous_position;
        controller.state_mut().position = start;

        controller.update_velocity(Vec3::ZERO, DT);
        assert_approx_eq!(controller.state().lateral_velocity.x, 0.0, 1e-6);
    }

    #[test]
    fn test_launch_resets_previous_position() {
        let mut controller = airborne_controller();
        controller.state_mut().position = Vec3::new(3.0, 1.0, 0.0);

        controller.launch(Vec3::new(4.0, 5.0, 0.0));
        let state = controller.state();
        assert_eq!(state.previous_position, state.position);
        assert_eq!(state.expected_displacement, Vec3::ZERO);
        assert_eq!(state.lateral_velocity, Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(state.vertical_velocity, 5.0);
        assert!(!state.grounded);

        controller.update_velocity(Vec3::new(1.0, 0.0, 0.0), DT);
        assert_approx_eq!(controller.state().lateral_velocity.x, 4.2, 1e-5);
    }

    #[test]
    fn test_pitch_clamp_drops_excess_delta() {
        let mut controller = controller();
        for _ in 0..17 {
            controller.apply_look(0.0, 5.0);
        }
        assert_eq!(controller.state().pitch, 85.0);

        controller.apply_look(0.0, 10.0);
        assert_eq!(controller.state().pitch, 85.0);
        controller.apply_look(0.0, 5.0);
        assert_eq!(controller.state().pitch, 85.0);

        controller.apply_look(0.0, -10.0);
        assert_eq!(controller.state().pitch, 75.0);
    }

    #[test]
    fn test_pitch_clamp_negative() {
        let mut controller = controller();
        controller.apply_look(0.0, -89.0);
        controller.apply_look(0.0, -2.0);
        assert_eq!(controller.state().pitch, -89.0);
    }

    #[test]
    fn test_yaw_wraps() {
        let mut controller = controller();
        controller.apply_look(350.0, 0.0);
        controller.apply_look(20.0, 0.0);
        assert_approx_eq!(controller.state().yaw, 10.0, 1e-4);

        controller.apply_look(-30.0, 0.0);
        assert_approx_eq!(controller.state().yaw, 340.0, 1e-4);
    }

    #[test]
    fn test_world_direction_follows_yaw() {
        let mut controller = controller();
        let ahead = controller.world_direction(0.0, 1.0);
        assert_approx_eq!(ahead.z, 1.0, 1e-6);

        controller.apply_look(90.0, 0.0);
        let ahead = controller.world_direction(0.0, 1.0);
        assert_approx_eq!(ahead.x, 1.0, 1e-6);
        assert_approx_eq!(ahead.z, 0.0, 1e-6);

        let diagonal = controller.world_direction(1.0, 1.0);
        assert_approx_eq!(diagonal.magnitude(), 1.0, 1e-6);
    }

    #[test]
    fn test_drive_moves_body() {
        let mut controller = controller();
        let intent = MoveIntent {
            forward: 1.0,
            ..MoveIntent::default()
        };

        controller.drive(&intent, DT);
        assert_approx_eq!(controller.state().position.z, 0.2, 1e-6);
        assert_eq!(controller.state().previous_position, Vec3::ZERO);
        assert_approx_eq!(controller.state().expected_displacement.z, 0.2, 1e-6);
    }
}
