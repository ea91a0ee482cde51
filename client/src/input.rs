//! Client input management with sequencing and edge detection

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{timestamp_millis, AttackKind, InputState, MoveIntent, Request};

/// Raw device state for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputSample {
    pub strafe: f32,
    pub forward: f32,
    pub sprint: bool,
    /// Held state; the jump request fires on the press edge only.
    pub jump: bool,
    /// Held state; the attack request fires on the press edge only.
    pub attack: bool,
    pub look_x: f32,
    pub look_y: f32,
}

/// Anything that can be polled for a tick of input.
pub trait InputSource {
    fn sample(&mut self) -> InputSample;
}

/// Seeded bot that wanders, jumps and swings at random.
pub struct ScriptedInput {
    rng: StdRng,
    held: InputSample,
    hold_ticks: u32,
}

impl ScriptedInput {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            held: InputSample::default(),
            hold_ticks: 0,
        }
    }

    fn pick_new_action(&mut self) {
        self.held = InputSample {
            strafe: self.rng.gen_range(-1.0..=1.0),
            forward: self.rng.gen_range(-0.5..=1.0),
            sprint: self.rng.gen_bool(0.3),
            jump: false,
            attack: false,
            look_x: self.rng.gen_range(-2.0..=2.0),
            look_y: 0.0,
        };
        self.hold_ticks = self.rng.gen_range(10..60);
    }
}

impl InputSource for ScriptedInput {
    fn sample(&mut self) -> InputSample {
        if self.hold_ticks == 0 {
            self.pick_new_action();
        }
        self.hold_ticks -= 1;

        InputSample {
            jump: self.rng.gen_bool(0.02),
            attack: self.rng.gen_bool(0.05),
            ..self.held
        }
    }
}

/// Turns device samples into sequenced movement inputs and attack requests
pub struct InputManager {
    next_sequence: u32,
    look_sensitivity: f32,
    prev_jump: bool,
    prev_attack: bool,
}

impl InputManager {
    pub fn new(look_sensitivity: f32) -> Self {
        Self {
            next_sequence: 1,
            look_sensitivity,
            prev_jump: false,
            prev_attack: false,
        }
    }

    /// Builds this tick's movement input and, on an attack press, the request
    /// to forward to the server.
    pub fn update(&mut self, sample: &InputSample) -> (InputState, Option<Request>) {
        let jump_pressed = sample.jump && !self.prev_jump;
        let attack_pressed = sample.attack && !self.prev_attack;
        self.prev_jump = sample.jump;
        self.prev_attack = sample.attack;

        let input = InputState {
            sequence: self.next_sequence,
            timestamp: timestamp_millis(),
            intent: MoveIntent {
                strafe: sample.strafe.clamp(-1.0, 1.0),
                forward: sample.forward.clamp(-1.0, 1.0),
                sprint: sample.sprint,
                jump: jump_pressed,
                yaw: sample.look_x * self.look_sensitivity,
                pitch: sample.look_y * self.look_sensitivity,
            },
        };
        self.next_sequence = self.next_sequence.wrapping_add(1);

        let request = attack_pressed.then_some(Request::Attack {
            attack: AttackKind::Base,
        });

        (input, request)
    }

    pub fn next_sequence(&self) -> u32 {
        self.next_sequence
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new(1.0)
    }
}
