//! Per-connection auth state machine.
//!
//! The gate owns the deadline timer. All transitions happen on the
//! connection task, so whichever of "credential checked" and "deadline
//! reached" is processed first wins; the other becomes [`Transition::Ignored`].

use crate::auth::verifier::Claims;
use crate::domain::AuthError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;

/// Lifecycle phase of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Pending,
    Authenticated,
    Closed,
}

/// Reason code carried by the `unauthorized` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnauthorizedReason {
    Timeout,
    InvalidToken,
}

impl From<&AuthError> for UnauthorizedReason {
    fn from(err: &AuthError) -> Self {
        match err {
            AuthError::Timeout => Self::Timeout,
            AuthError::InvalidToken(_) => Self::InvalidToken,
        }
    }
}

impl fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("TIMEOUT"),
            Self::InvalidToken => f.write_str("INVALID_TOKEN"),
        }
    }
}

/// Outcome of feeding an event to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// PENDING -> AUTHENTICATED. Make the connection broadcast-eligible.
    Authenticated,
    /// PENDING -> CLOSED. Notify the client, then close.
    Unauthorized(UnauthorizedReason),
    /// The gate already left PENDING; nothing to do.
    Ignored,
}

pub struct AuthGate {
    phase: AuthPhase,
    deadline: Instant,
    timer: Option<AbortHandle>,
}

impl AuthGate {
    /// A PENDING gate whose deadline is `timeout` from now. The timer is
    /// not running until [`AuthGate::arm`] is called.
    pub fn new(timeout: Duration) -> Self {
        Self {
            phase: AuthPhase::Pending,
            deadline: Instant::now() + timeout,
            timer: None,
        }
    }

    /// Start the deadline timer. `on_timeout` runs once at the deadline
    /// unless the timer is cancelled first; it should only signal the
    /// connection task, which then calls [`AuthGate::expire`].
    pub fn arm<F>(&mut self, on_timeout: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel_timer();
        let deadline = self.deadline;
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            on_timeout();
        });
        self.timer = Some(task.abort_handle());
    }

    pub fn phase(&self) -> AuthPhase {
        self.phase
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase == AuthPhase::Authenticated
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Apply the result of a credential check.
    pub fn authenticate(&mut self, verdict: &Result<Claims, AuthError>) -> Transition {
        if self.phase != AuthPhase::Pending {
            return Transition::Ignored;
        }
        self.cancel_timer();

        match verdict {
            Ok(_) => {
                self.phase = AuthPhase::Authenticated;
                Transition::Authenticated
            }
            Err(err) => {
                self.phase = AuthPhase::Closed;
                Transition::Unauthorized(err.into())
            }
        }
    }

    /// The deadline was reached.
    pub fn expire(&mut self) -> Transition {
        if self.phase != AuthPhase::Pending {
            return Transition::Ignored;
        }
        self.timer = None;
        self.phase = AuthPhase::Closed;
        Transition::Unauthorized(UnauthorizedReason::Timeout)
    }

    /// Transport went away. Returns false if already closed.
    pub fn close(&mut self) -> bool {
        self.cancel_timer();
        if self.phase == AuthPhase::Closed {
            return false;
        }
        self.phase = AuthPhase::Closed;
        true
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for AuthGate {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate")
            .field("phase", &self.phase)
            .field("deadline", &self.deadline)
            .field("armed", &self.timer.is_some())
            .finish()
    }
}
