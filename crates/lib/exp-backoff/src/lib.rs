//! Exponential backoff calculator.

#![no_std]

use core::time::Duration;

/// An exponential backoff state.
#[derive(Debug, Clone)]
pub struct State {
    /// The first delay, restored by [`State::reset`].
    pub initial: Duration,

    /// Factor to multiply the current delay to calculate the next one.
    pub factor: u32,

    /// Delay clamp.
    pub max: Duration,

    /// Precomputed delay value to return.
    pub value: Duration,
}

impl State {
    /// Start at `initial`, multiply by `factor` up to `max`.
    pub const fn new(initial: Duration, factor: u32, max: Duration) -> Self {
        Self {
            initial,
            factor,
            max,
            value: initial,
        }
    }

    /// Obtain the stored delay value and precompute next one.
    pub fn advance(&mut self) -> Duration {
        let current = self.value;
        self.value = current.saturating_mul(self.factor).min(self.max);
        current
    }

    /// Peek the stored delay value.
    pub const fn peek(&self) -> Duration {
        self.value
    }

    /// Go back to the initial delay.
    pub fn reset(&mut self) {
        self.value = self.initial;
    }
}
