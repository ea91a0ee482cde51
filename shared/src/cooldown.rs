//! Named countdown timers advanced once per simulation tick.
//!
//! Timers are keyed by [`TimerKind`] rather than by name, so every lookup is
//! resolved at compile time. A timer that runs out leaves the active set but
//! keeps its slot (with `remaining == 0`) so it can be restarted later.

use serde::{Deserialize, Serialize};

/// Remainders below this are treated as expired, so a timer started with
/// `n * dt` expires on its n-th tick despite float rounding.
const EXPIRY_EPSILON: f32 = 1e-5;

/// The timers an entity can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// Recharge time before another attack may be scheduled.
    AttackCooldown,
    /// Time the current attack's hitbox stays enabled.
    AttackDuration,
}

impl TimerKind {
    pub const ALL: [TimerKind; 2] = [TimerKind::AttackCooldown, TimerKind::AttackDuration];

    fn index(self) -> usize {
        match self {
            TimerKind::AttackCooldown => 0,
            TimerKind::AttackDuration => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CooldownTimer {
    pub max_duration: f32,
    pub remaining: f32,
}

#[derive(Debug, Clone, Default)]
pub struct CooldownRegistry {
    timers: [CooldownTimer; TimerKind::ALL.len()],
    /// Active timers in the order they were started.
    active: Vec<TimerKind>,
}

impl CooldownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) a timer at its full duration.
    pub fn start(&mut self, kind: TimerKind, duration: f32) {
        let duration = duration.max(0.0);
        self.timers[kind.index()] = CooldownTimer {
            max_duration: duration,
            remaining: duration,
        };
        self.track(kind);
    }

    /// Advances every active timer by `dt` and returns the ones that expired.
    pub fn tick(&mut self, dt: f32) -> Vec<TimerKind> {
        let mut expired = Vec::new();

        for &kind in &self.active {
            let timer = &mut self.timers[kind.index()];
            timer.remaining = (timer.remaining - dt).max(0.0);
            if timer.remaining <= EXPIRY_EPSILON {
                timer.remaining = 0.0;
                expired.push(kind);
            }
        }

        self.active.retain(|kind| !expired.contains(kind));
        expired
    }

    pub fn remaining(&self, kind: TimerKind) -> f32 {
        self.timers[kind.index()].remaining
    }

    pub fn max_duration(&self, kind: TimerKind) -> f32 {
        self.timers[kind.index()].max_duration
    }

    pub fn is_active(&self, kind: TimerKind) -> bool {
        self.active.contains(&kind)
    }

    pub fn active(&self) -> impl Iterator<Item = TimerKind> + '_ {
        self.active.iter().copied()
    }

    /// Overwrites a timer with an authoritative remainder.
    ///
    /// The value is clamped into `[0, max_duration]`. A timer that was never
    /// started adopts the remainder as its maximum.
    pub fn reconcile(&mut self, kind: TimerKind, remaining: f32) {
        let timer = &mut self.timers[kind.index()];
        if timer.max_duration < remaining {
            timer.max_duration = remaining.max(0.0);
        }
        timer.remaining = remaining.clamp(0.0, timer.max_duration);
        self.track(kind);
    }

    fn track(&mut self, kind: TimerKind) {
        let has_time = self.timers[kind.index()].remaining > 0.0;
        let tracked = self.active.contains(&kind);

        if has_time && !tracked {
            self.active.push(kind);
        } else if !has_time && tracked {
            self.active.retain(|k| *k != kind);
        }
    }
}
