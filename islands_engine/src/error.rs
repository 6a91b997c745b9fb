/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use islands::GameError;
use islands::RuleViolation;

/// Errors returned to callers of the session engine. Every caller-facing
/// operation either succeeds or fails with exactly one of these.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// The action is not permitted in the session's current phase.
    #[error("rule violation: {0}")]
    RuleViolation(#[from] RuleViolation),

    /// A row or column lies outside the board.
    #[error("invalid coordinate ({row}, {col})")]
    InvalidCoordinate { row: i64, col: i64 },

    /// The island key does not name a known island type.
    #[error("invalid island type: {0}")]
    InvalidIslandType(String),

    /// The island would share a cell with one already placed.
    #[error("island overlaps an existing island")]
    OverlappingIsland,

    /// Islands were declared set before every island was positioned.
    #[error("not all islands are positioned")]
    NotAllIslandsPositioned,

    /// Player and session names must be non-empty.
    #[error("invalid player name: {0:?}")]
    InvalidPlayerName(String),

    /// A session is already registered under this name.
    #[error("session {0} is already running")]
    AlreadyRunning(String),

    /// No session is registered under this name.
    #[error("no session is running under {0}")]
    NotRunning(String),

    /// The session terminated before it could reply, or was abandoned before
    /// it came up.
    #[error("session {0} terminated before replying")]
    Unavailable(String),

    /// The session did not reply within the configured call timeout.
    #[error("call to session {0} timed out")]
    CallTimeout(String),
}

impl From<GameError> for SessionError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::InvalidCoordinate { row, col } => Self::InvalidCoordinate { row, col },
            GameError::InvalidIslandType(key) => Self::InvalidIslandType(key),
            GameError::OverlappingIsland { .. } => Self::OverlappingIsland,
        }
    }
}
