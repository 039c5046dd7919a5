//! In-memory backend.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{DeviceAuthChallenge, Token, TokenBackend};

/// Failure injected by [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("backend unavailable")]
pub struct Unavailable;

/// Keeps the token in memory and records every call.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    /// The cached token.
    pub token: Mutex<Option<Token>>,

    /// Challenges passed to `notify`.
    pub notifications: Mutex<Vec<DeviceAuthChallenge>>,

    /// Number of `load` calls.
    pub loads: AtomicUsize,

    /// Number of `save` calls.
    pub saves: AtomicUsize,

    /// Fail `load`.
    pub fail_load: bool,
}

impl MemoryBackend {
    /// A backend holding the given token.
    pub fn with_token(token: Token) -> Self {
        Self {
            token: Mutex::new(Some(token)),
            ..Default::default()
        }
    }

    /// The currently cached token.
    pub fn cached(&self) -> Option<Token> {
        self.token.lock().ok().and_then(|token| token.clone())
    }
}

impl TokenBackend for MemoryBackend {
    type Error = Unavailable;

    async fn load(&self) -> Result<Option<Token>, Self::Error> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_load {
            return Err(Unavailable);
        }
        Ok(self.cached())
    }

    async fn save(&self, token: &Token) -> Result<(), Self::Error> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let mut cached = self.token.lock().map_err(|_| Unavailable)?;
        *cached = Some(token.clone());
        Ok(())
    }

    async fn notify(&self, challenge: &DeviceAuthChallenge) -> Result<(), Self::Error> {
        let mut notifications = self.notifications.lock().map_err(|_| Unavailable)?;
        notifications.push(challenge.clone());
        Ok(())
    }
}
