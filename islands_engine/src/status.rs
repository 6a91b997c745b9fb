/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Session lifecycle status and the supervision events derived from it.

use std::fmt;
use std::time::SystemTime;

use chrono::DateTime;
use chrono::offset::Local;
use enum_as_inner::EnumAsInner;
use serde::Deserialize;
use serde::Serialize;

/// The runtime status of a session worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumAsInner)]
pub enum SessionStatus {
    /// The worker is restoring its state. It is not yet consuming its
    /// mailbox.
    Initializing,
    /// The worker is waiting for its next message.
    Idle,
    /// The worker is processing the named action.
    Processing(String),
    /// The worker is shutting down.
    Stopping,
    /// The worker was asked to stop and did.
    Stopped,
    /// The worker terminated itself after its inactivity window elapsed.
    TimedOut,
    /// The worker crashed, was killed, or returned an error from its loop.
    Failed(String),
}

impl SessionStatus {
    /// Tells whether the status is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::TimedOut | Self::Failed(_))
    }

    /// Tells whether the worker has finished restoring.
    pub fn is_ready(&self) -> bool {
        !matches!(self, Self::Initializing)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Idle => write!(f, "idle"),
            Self::Processing(action) => write!(f, "processing {}", action),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Emitted by the supervisor whenever a session worker terminates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisionEvent {
    /// The session name.
    pub session: String,
    /// The incarnation of the worker that terminated.
    pub generation: u64,
    /// The worker's terminal status.
    pub status: SessionStatus,
    pub occurred_at: SystemTime,
}

impl SupervisionEvent {
    pub fn new(session: String, generation: u64, status: SessionStatus) -> Self {
        Self {
            session,
            generation,
            status,
            occurred_at: SystemTime::now(),
        }
    }
}

impl fmt::Display for SupervisionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]: {} at {}",
            self.session,
            self.generation,
            self.status,
            DateTime::<Local>::from(self.occurred_at),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal() {
        assert!(!SessionStatus::Initializing.is_terminal());
        assert!(!SessionStatus::Processing("add_player".into()).is_terminal());
        assert!(SessionStatus::TimedOut.is_terminal());
        assert!(SessionStatus::Failed("boom".into()).is_terminal());
        assert!(!SessionStatus::Initializing.is_ready());
        assert!(SessionStatus::Idle.is_ready());
    }

    #[test]
    fn test_event_display() {
        let event = SupervisionEvent::new(
            "alice".to_string(),
            2,
            SessionStatus::Failed("killed".to_string()),
        );
        assert!(event.to_string().starts_with("alice[2]: failed: killed at "));
    }
}
