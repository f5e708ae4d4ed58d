/// Session lifecycle state
///
/// A voice session moves through a small connection-oriented state
/// machine; `StateCell` wraps the current state for lock-free reads from
/// any task.

use arc_swap::ArcSwap;
use std::sync::Arc;
use thiserror::Error;

/// Lifecycle state of a voice session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session has been started
    Idle,

    /// Connection and handshake in progress
    Connecting,

    /// Streaming in both directions
    Open,

    /// Connection attempt failed
    Failed,

    /// Session ended (locally or by the server)
    Closed,
}

impl SessionState {
    /// Check if the session is idle
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Check if a connection attempt is in progress
    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting)
    }

    /// Check if the session is streaming
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Check if the last connection attempt failed
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Check if the session has ended
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// State name, for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Connecting => "Connecting",
            Self::Open => "Open",
            Self::Failed => "Failed",
            Self::Closed => "Closed",
        }
    }

    /// Whether moving to `next` is a legal transition
    ///
    /// Closing is always allowed; a new connection attempt is allowed
    /// from any settled state (idle, closed, or failed).
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (_, Closed) => true,
            (Idle | Closed | Failed, Connecting) => true,
            (Connecting, Open) => true,
            (Connecting, Failed) => true,
            _ => false,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

/// State-machine errors
#[derive(Error, Debug)]
pub enum StateError {
    /// The requested transition is not legal
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition {
        /// State name before the attempt
        from: &'static str,
        /// Requested state name
        to: &'static str,
    },
}

/// Result type for state operations
pub type StateResult<T> = Result<T, StateError>;

/// Current session state, readable without locks from any task
pub struct StateCell {
    state: ArcSwap<SessionState>,
}

impl StateCell {
    /// Create a cell in the idle state
    pub fn new() -> Self {
        Self {
            state: ArcSwap::new(Arc::new(SessionState::Idle)),
        }
    }

    /// Read the current state
    pub fn get(&self) -> SessionState {
        **self.state.load()
    }

    /// Move to `next`, validating the transition
    ///
    /// # Errors
    /// [`StateError::InvalidTransition`] when the move is not legal
    pub fn transition(&self, next: SessionState) -> StateResult<()> {
        let current = self.get();
        if !current.can_transition_to(next) {
            return Err(StateError::InvalidTransition {
                from: current.name(),
                to: next.name(),
            });
        }
        self.state.store(Arc::new(next));
        Ok(())
    }

    /// Force the closed state, regardless of where we are
    pub fn force_closed(&self) {
        self.state.store(Arc::new(SessionState::Closed));
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
