//! Reconnection state machine for the client.
//!
//! Pure transitions, no I/O: the runner feeds events in and sleeps or connects
//! according to the state that comes out.

use std::time::Duration;

use crate::error::ClientError;

/// Exponential backoff between connection attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
    /// Consecutive failed attempts tolerated before giving up
    pub max_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
            max_attempts: 5,
        }
    }
}

impl Backoff {
    /// Delay before retry number `n` (0-based): `initial * 2^n`, capped at `max`.
    pub fn delay(&self, n: u32) -> Duration {
        let factor = 2u32.saturating_pow(n);
        self.initial.saturating_mul(factor).min(self.max)
    }
}

/// Why the client stopped for good
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// Ctrl+C / Ctrl+D at the prompt
    UserQuit,
    /// The relay refused this identity or join request
    Rejected(ClientError),
    /// Every attempt allowed by the backoff failed
    GaveUp(ClientError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientState {
    /// `failures` counts consecutive failed attempts before this one.
    /// `resumed` is set once a session has been up.
    Connecting { failures: u32, resumed: bool },
    Connected,
    /// Waiting `retry_in` before the next attempt
    Disconnected {
        failures: u32,
        retry_in: Duration,
        resumed: bool,
    },
    /// The relay still holds the previous session; connect again under a new client id
    Renewing { failures: u32 },
    Exited(ExitReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The WebSocket handshake completed
    Opened,
    /// The connection attempt or the live session ended with an error
    Lost(ClientError),
    UserQuit,
    BackoffElapsed,
    /// A fresh client id is in place
    IdentityRenewed,
}

impl ClientState {
    pub fn initial() -> Self {
        Self::Connecting {
            failures: 0,
            resumed: false,
        }
    }

    /// Apply one event.
    ///
    /// Events that make no sense in the current state leave it unchanged.
    pub fn next(self, event: ClientEvent, backoff: &Backoff) -> Self {
        match (self, event) {
            (_, ClientEvent::UserQuit) => Self::Exited(ExitReason::UserQuit),

            // A reconnect can race the relay reaping the old half-open session
            (
                Self::Connecting {
                    failures,
                    resumed: true,
                },
                ClientEvent::Lost(e @ ClientError::DuplicateClientId(_)),
            ) => {
                let failures = failures + 1;
                if failures >= backoff.max_attempts {
                    Self::Exited(ExitReason::GaveUp(e))
                } else {
                    Self::Renewing { failures }
                }
            }

            (_, ClientEvent::Lost(e)) if e.is_terminal() => Self::Exited(ExitReason::Rejected(e)),

            (Self::Connecting { .. }, ClientEvent::Opened) => Self::Connected,
            (Self::Connecting { failures, resumed }, ClientEvent::Lost(e)) => {
                let failures = failures + 1;
                if failures >= backoff.max_attempts {
                    Self::Exited(ExitReason::GaveUp(e))
                } else {
                    Self::Disconnected {
                        failures,
                        retry_in: backoff.delay(failures - 1),
                        resumed,
                    }
                }
            }

            // A session that was up resets the budget
            (Self::Connected, ClientEvent::Lost(_)) => Self::Disconnected {
                failures: 0,
                retry_in: backoff.delay(0),
                resumed: true,
            },

            (
                Self::Disconnected {
                    failures, resumed, ..
                },
                ClientEvent::BackoffElapsed,
            ) => Self::Connecting { failures, resumed },

            (Self::Renewing { failures }, ClientEvent::IdentityRenewed) => Self::Connecting {
                failures,
                resumed: true,
            },

            (state, _) => state,
        }
    }
}
