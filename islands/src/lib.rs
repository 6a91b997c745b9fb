/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! The Islands game model.
//!
//! Two players each lay out one island of every [`IslandType`] on a 10x10
//! [`Board`], declare them set, and then take turns guessing coordinates on
//! the opponent's board. A guess that completes an island "forests" it;
//! foresting every island on the opponent's board wins the game.
//!
//! All types here are plain values: operations return new values and never
//! mutate their receiver. Which operation is legal when is decided by
//! [`Rules`].

mod board;
mod coordinate;
mod guesses;
mod island;
pub mod rules;

pub use board::Board;
pub use board::GuessOutcome;
pub use board::GuessResult;
pub use board::WinStatus;
pub use coordinate::BOARD_RANGE;
pub use coordinate::Coordinate;
pub use guesses::Guesses;
pub use island::Island;
pub use island::IslandType;
pub use rules::Action;
pub use rules::GameState;
pub use rules::PlayerId;
pub use rules::PlayerState;
pub use rules::RuleViolation;
pub use rules::Rules;

/// Errors from validating positions and island placements.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum GameError {
    #[error("coordinate ({row}, {col}) is off the board")]
    InvalidCoordinate { row: i64, col: i64 },

    #[error("unknown island type: {0}")]
    InvalidIslandType(String),

    #[error("{island} would overlap the {existing} island")]
    OverlappingIsland {
        island: IslandType,
        existing: IslandType,
    },
}
