/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! The rules gate: a finite state machine deciding which action is legal
//! in the current phase of a game.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::WinStatus;

/// One of the two seats in a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerId {
    Player1,
    Player2,
}

impl PlayerId {
    pub fn opponent(&self) -> PlayerId {
        match self {
            PlayerId::Player1 => PlayerId::Player2,
            PlayerId::Player2 => PlayerId::Player1,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerId::Player1 => write!(f, "player1"),
            PlayerId::Player2 => write!(f, "player2"),
        }
    }
}

/// The phase of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Initialized,
    PlayersSet,
    Player1Turn,
    Player2Turn,
    GameOver,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameState::Initialized => "initialized",
            GameState::PlayersSet => "players_set",
            GameState::Player1Turn => "player1_turn",
            GameState::Player2Turn => "player2_turn",
            GameState::GameOver => "game_over",
        };
        f.write_str(name)
    }
}

/// Whether a player has declared their islands final.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    IslandsNotSet,
    IslandsSet,
}

/// The actions the rules gate arbitrates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    AddPlayer,
    PositionIslands(PlayerId),
    SetIslands(PlayerId),
    GuessCoordinate(PlayerId),
    WinCheck(WinStatus),
}

/// An action was attempted in a phase that does not permit it.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("{action:?} is not permitted in state {state}")]
pub struct RuleViolation {
    pub state: GameState,
    pub action: Action,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    state: GameState,
    player1: PlayerState,
    player2: PlayerState,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            state: GameState::Initialized,
            player1: PlayerState::IslandsNotSet,
            player2: PlayerState::IslandsNotSet,
        }
    }
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn player_state(&self, player: PlayerId) -> PlayerState {
        match player {
            PlayerId::Player1 => self.player1,
            PlayerId::Player2 => self.player2,
        }
    }

    /// Check `action` against the current phase, returning the rules
    /// after the transition. The receiver is never modified.
    pub fn check(&self, action: Action) -> Result<Rules, RuleViolation> {
        let mut next = self.clone();
        match (self.state, action) {
            (GameState::Initialized, Action::AddPlayer) => {
                next.state = GameState::PlayersSet;
            }
            (GameState::PlayersSet, Action::PositionIslands(player))
                if self.player_state(player) == PlayerState::IslandsNotSet => {}
            (GameState::PlayersSet, Action::SetIslands(player))
                if self.player_state(player) == PlayerState::IslandsNotSet =>
            {
                match player {
                    PlayerId::Player1 => next.player1 = PlayerState::IslandsSet,
                    PlayerId::Player2 => next.player2 = PlayerState::IslandsSet,
                }
                if next.player1 == PlayerState::IslandsSet
                    && next.player2 == PlayerState::IslandsSet
                {
                    next.state = GameState::Player1Turn;
                }
            }
            (GameState::Player1Turn, Action::GuessCoordinate(PlayerId::Player1)) => {
                next.state = GameState::Player2Turn;
            }
            (GameState::Player2Turn, Action::GuessCoordinate(PlayerId::Player2)) => {
                next.state = GameState::Player1Turn;
            }
            (
                GameState::Player1Turn | GameState::Player2Turn,
                Action::WinCheck(WinStatus::NoWin),
            ) => {}
            (GameState::Player1Turn | GameState::Player2Turn, Action::WinCheck(WinStatus::Win)) => {
                next.state = GameState::GameOver;
            }
            (state, action) => return Err(RuleViolation { state, action }),
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> Rules {
        Rules::new()
            .check(Action::AddPlayer)
            .and_then(|r| r.check(Action::SetIslands(PlayerId::Player1)))
            .and_then(|r| r.check(Action::SetIslands(PlayerId::Player2)))
            .unwrap()
    }

    #[test]
    fn test_initialized() {
        let rules = Rules::new();
        assert_eq!(rules.state(), GameState::Initialized);
        assert_eq!(
            rules.check(Action::PositionIslands(PlayerId::Player1)),
            Err(RuleViolation {
                state: GameState::Initialized,
                action: Action::PositionIslands(PlayerId::Player1),
            })
        );
        let rules = rules.check(Action::AddPlayer).unwrap();
        assert_eq!(rules.state(), GameState::PlayersSet);
        assert!(rules.check(Action::AddPlayer).is_err());
    }

    #[test]
    fn test_set_islands_once() {
        let rules = Rules::new().check(Action::AddPlayer).unwrap();
        let rules = rules.check(Action::SetIslands(PlayerId::Player1)).unwrap();
        assert_eq!(rules.state(), GameState::PlayersSet);
        assert_eq!(
            rules.player_state(PlayerId::Player1),
            PlayerState::IslandsSet
        );
        assert!(rules.check(Action::SetIslands(PlayerId::Player1)).is_err());
        assert!(rules.check(Action::PositionIslands(PlayerId::Player1)).is_err());
        assert!(rules.check(Action::PositionIslands(PlayerId::Player2)).is_ok());

        let rules = rules.check(Action::SetIslands(PlayerId::Player2)).unwrap();
        assert_eq!(rules.state(), GameState::Player1Turn);
    }

    #[test]
    fn test_turns() {
        let rules = ready();
        assert!(rules.check(Action::GuessCoordinate(PlayerId::Player2)).is_err());
        let rules = rules.check(Action::GuessCoordinate(PlayerId::Player1)).unwrap();
        assert_eq!(rules.state(), GameState::Player2Turn);
        let rules = rules.check(Action::WinCheck(WinStatus::NoWin)).unwrap();
        assert_eq!(rules.state(), GameState::Player2Turn);
        let rules = rules.check(Action::GuessCoordinate(PlayerId::Player2)).unwrap();
        assert_eq!(rules.state(), GameState::Player1Turn);
    }

    #[test]
    fn test_win() {
        let rules = ready()
            .check(Action::GuessCoordinate(PlayerId::Player1))
            .and_then(|r| r.check(Action::WinCheck(WinStatus::Win)))
            .unwrap();
        assert_eq!(rules.state(), GameState::GameOver);
        assert!(rules.check(Action::GuessCoordinate(PlayerId::Player2)).is_err());
        assert!(rules.check(Action::WinCheck(WinStatus::NoWin)).is_err());
    }

    #[test]
    fn test_win_check_outside_turns() {
        let rules = Rules::new().check(Action::AddPlayer).unwrap();
        assert!(rules.check(Action::WinCheck(WinStatus::NoWin)).is_err());
    }
}
