use serde::{Deserialize, Serialize};

pub const MAX_HEALTH: i32 = 100;

/// Integer hit points bounded to `[0, max]`.
///
/// Only the authority calls [`HealthPool::apply_damage`]; replicas copy the
/// authority's value through [`HealthPool::mirror`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthPool {
    current: i32,
    max: i32,
}

impl HealthPool {
    pub fn new(max: i32) -> Self {
        let max = max.max(0);
        Self { current: max, max }
    }

    /// Deducts `amount` and returns the remaining health.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        self.current = self.current.saturating_sub(amount.max(0)).max(0);
        self.current
    }

    pub fn mirror(&mut self, value: i32) {
        self.current = value.clamp(0, self.max);
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }
}

impl Default for HealthPool {
    fn default() -> Self {
        Self::new(MAX_HEALTH)
    }
}
