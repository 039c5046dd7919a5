//! Lifecycle states and the allowed transitions between them.

/// Lifecycle state of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum State {
    /// Not started, or fully shut down.
    Initial = 0,

    /// Probing both stores and opening the watch session.
    Connecting = 1,

    /// Ready to watch.
    Connected = 2,

    /// Waiting for mailbox changes.
    Watching = 3,

    /// Running a mirroring cycle.
    Handling = 4,

    /// Releasing sessions.
    Shutdown = 5,
}

impl State {
    /// All states, in lifecycle order.
    pub const ALL: [State; 6] = [
        State::Initial,
        State::Connecting,
        State::Connected,
        State::Watching,
        State::Handling,
        State::Shutdown,
    ];

    /// Whether moving from `self` to `next` is allowed.
    ///
    /// Phases entered from a state return to it, so `Watching` and
    /// `Handling` go back to wherever they were entered from.
    pub const fn can_transition_to(self, next: State) -> bool {
        matches!(
            (self, next),
            (_, State::Shutdown)
                | (State::Shutdown, State::Initial)
                | (State::Initial, State::Connecting)
                | (State::Connecting, State::Connected)
                | (State::Connected, State::Watching)
                | (State::Watching, State::Connected)
                | (State::Watching, State::Handling)
                | (State::Handling, State::Watching)
                | (State::Connected, State::Handling)
                | (State::Handling, State::Connected)
        )
    }

    /// Numeric code, for exporters.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// The state with the given code.
    pub const fn from_code(code: u8) -> Option<State> {
        match code {
            0 => Some(State::Initial),
            1 => Some(State::Connecting),
            2 => Some(State::Connected),
            3 => Some(State::Watching),
            4 => Some(State::Handling),
            5 => Some(State::Shutdown),
            _ => None,
        }
    }

    /// Lower-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            State::Initial => "initial",
            State::Connecting => "connecting",
            State::Connected => "connected",
            State::Watching => "watching",
            State::Handling => "handling",
            State::Shutdown => "shutdown",
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
