//! Observable per-account counters.

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::State;

/// Live status of one account, shared with whoever reports on it.
#[derive(Debug)]
pub struct AccountStatus {
    name: String,
    state: AtomicU8,
    processed: AtomicU64,
    last_error: Mutex<Option<String>>,
}

/// A point-in-time copy of [`AccountStatus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Account display name.
    pub name: String,

    /// Current lifecycle state.
    pub state: State,

    /// Messages forwarded since start.
    pub processed: u64,

    /// The most recent error, if any.
    pub last_error: Option<String>,
}

impl AccountStatus {
    /// Fresh status in the initial state.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: AtomicU8::new(State::Initial.code()),
            processed: AtomicU64::new(0),
            last_error: Mutex::new(None),
        }
    }

    /// Account display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        State::from_code(self.state.load(Ordering::Acquire)).unwrap_or(State::Initial)
    }

    /// Messages forwarded since start.
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// The most recent error, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Copy everything at once.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            name: self.name.clone(),
            state: self.state(),
            processed: self.processed(),
            last_error: self.last_error(),
        }
    }

    pub(crate) fn set_state(&self, state: State) {
        self.state.store(state.code(), Ordering::Release);
    }

    pub(crate) fn processed_counter(&self) -> &AtomicU64 {
        &self.processed
    }

    pub(crate) fn record_error(&self, error: &impl std::fmt::Display) {
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(error.to_string());
    }
}
