/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use islands::Action;
use islands::Board;
use islands::Coordinate;
use islands::GuessOutcome;
use islands::Guesses;
use islands::Island;
use islands::IslandType;
use islands::PlayerId;
use islands::Rules;
use serde::Deserialize;
use serde::Serialize;

use crate::SessionError;

/// One seat in a session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Unset for player 2 until someone joins.
    pub name: Option<String>,
    pub board: Board,
    pub guesses: Guesses,
}

/// The complete state of one session. This is the unit that is persisted
/// after every successful action and restored after a restart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub player1: Player,
    pub player2: Player,
    pub rules: Rules,
}

impl SessionState {
    /// A fresh session owned by `name`. Its rules only permit adding the
    /// second player.
    pub fn new(name: &str) -> Self {
        Self {
            player1: Player {
                name: Some(name.to_string()),
                ..Player::default()
            },
            player2: Player::default(),
            rules: Rules::new(),
        }
    }

    /// The session's identity, which is also its key in the backing store.
    pub fn name(&self) -> &str {
        self.player1.name.as_deref().unwrap_or_default()
    }

    pub fn player(&self, player: PlayerId) -> &Player {
        match player {
            PlayerId::Player1 => &self.player1,
            PlayerId::Player2 => &self.player2,
        }
    }

    pub(crate) fn player_mut(&mut self, player: PlayerId) -> &mut Player {
        match player {
            PlayerId::Player1 => &mut self.player1,
            PlayerId::Player2 => &mut self.player2,
        }
    }
}

// Transitions. Each one validates against the rules gate first, computes
// the next state from a copy, and leaves `self` untouched; the worker
// commits the result only once it has been persisted.
impl SessionState {
    pub(crate) fn add_player(&self, name: &str) -> Result<SessionState, SessionError> {
        if name.is_empty() {
            return Err(SessionError::InvalidPlayerName(name.to_string()));
        }
        let rules = self.rules.check(Action::AddPlayer)?;
        let mut next = self.clone();
        next.player2.name = Some(name.to_string());
        next.rules = rules;
        Ok(next)
    }

    pub(crate) fn position_island(
        &self,
        player: PlayerId,
        key: &str,
        row: i64,
        col: i64,
    ) -> Result<SessionState, SessionError> {
        let rules = self.rules.check(Action::PositionIslands(player))?;
        let coordinate = Coordinate::new(row, col)?;
        let island_type = key.parse::<IslandType>()?;
        let island = Island::new(island_type, coordinate)?;
        let board = self.player(player).board.position_island(island_type, island)?;

        let mut next = self.clone();
        next.player_mut(player).board = board;
        next.rules = rules;
        Ok(next)
    }

    pub(crate) fn set_islands(
        &self,
        player: PlayerId,
    ) -> Result<(SessionState, Board), SessionError> {
        let rules = self.rules.check(Action::SetIslands(player))?;
        let board = &self.player(player).board;
        if !board.all_islands_positioned() {
            return Err(SessionError::NotAllIslandsPositioned);
        }

        let board = board.clone();
        let mut next = self.clone();
        next.rules = rules;
        Ok((next, board))
    }

    /// Fire at the opponent's board. The guess and the win check are two
    /// separate rules transitions; both must pass for anything to change.
    pub(crate) fn guess_coordinate(
        &self,
        player: PlayerId,
        row: i64,
        col: i64,
    ) -> Result<(SessionState, GuessOutcome), SessionError> {
        let rules = self.rules.check(Action::GuessCoordinate(player))?;
        let coordinate = Coordinate::new(row, col)?;
        let opponent = player.opponent();
        let (outcome, opponent_board) = self.player(opponent).board.guess(coordinate);
        let rules = rules.check(Action::WinCheck(outcome.win))?;
        let guesses = self.player(player).guesses.add(outcome.result, coordinate);

        let mut next = self.clone();
        next.player_mut(opponent).board = opponent_board;
        next.player_mut(player).guesses = guesses;
        next.rules = rules;
        Ok((next, outcome))
    }
}

#[cfg(test)]
mod tests {
    use islands::GameState;
    use islands::GuessResult;
    use islands::WinStatus;

    use super::*;

    const LAYOUT: [(&str, i64, i64); 5] = [
        ("atoll", 1, 1),
        ("dot", 1, 5),
        ("l_shape", 5, 1),
        ("s_shape", 5, 5),
        ("square", 9, 9),
    ];

    fn ready() -> SessionState {
        let mut state = SessionState::new("alice").add_player("bob").unwrap();
        for player in [PlayerId::Player1, PlayerId::Player2] {
            for (key, row, col) in LAYOUT {
                state = state.position_island(player, key, row, col).unwrap();
            }
            state = state.set_islands(player).unwrap().0;
        }
        state
    }

    #[test]
    fn test_fresh() {
        let state = SessionState::new("alice");
        assert_eq!(state.name(), "alice");
        assert_eq!(state.player2.name, None);
        assert_eq!(state.rules.state(), GameState::Initialized);
    }

    #[test]
    fn test_add_player() {
        let state = SessionState::new("alice");
        assert_eq!(
            state.add_player(""),
            Err(SessionError::InvalidPlayerName(String::new()))
        );
        let next = state.add_player("bob").unwrap();
        assert_eq!(next.player2.name.as_deref(), Some("bob"));
        assert!(matches!(
            next.add_player("carol"),
            Err(SessionError::RuleViolation(_))
        ));
        // The receiver is never modified.
        assert_eq!(state, SessionState::new("alice"));
    }

    #[test]
    fn test_position_island_errors() {
        let state = SessionState::new("alice");
        assert!(matches!(
            state.position_island(PlayerId::Player1, "square", 1, 1),
            Err(SessionError::RuleViolation(_))
        ));

        let state = state.add_player("bob").unwrap();
        assert_eq!(
            state.position_island(PlayerId::Player1, "square", 11, 1),
            Err(SessionError::InvalidCoordinate { row: 11, col: 1 })
        );
        assert_eq!(
            state.position_island(PlayerId::Player1, "wrong", 1, 1),
            Err(SessionError::InvalidIslandType("wrong".to_string()))
        );
        // Fits at its corner, but hangs off the board.
        assert_eq!(
            state.position_island(PlayerId::Player1, "square", 10, 10),
            Err(SessionError::InvalidCoordinate { row: 10, col: 11 })
        );

        let placed = state
            .position_island(PlayerId::Player1, "square", 1, 1)
            .unwrap();
        assert_eq!(
            placed.position_island(PlayerId::Player1, "square", 1, 1),
            Err(SessionError::OverlappingIsland)
        );
        assert!(placed.player2.board.islands().is_empty());
    }

    #[test]
    fn test_set_islands() {
        let mut state = SessionState::new("alice").add_player("bob").unwrap();
        assert_eq!(
            state.set_islands(PlayerId::Player1),
            Err(SessionError::NotAllIslandsPositioned)
        );
        for (key, row, col) in LAYOUT {
            state = state
                .position_island(PlayerId::Player1, key, row, col)
                .unwrap();
        }
        let (state, board) = state.set_islands(PlayerId::Player1).unwrap();
        assert!(board.all_islands_positioned());
        assert_eq!(board, state.player1.board);
        assert!(matches!(
            state.set_islands(PlayerId::Player1),
            Err(SessionError::RuleViolation(_))
        ));
    }

    #[test]
    fn test_guess_coordinate() {
        let state = ready();
        assert_eq!(state.rules.state(), GameState::Player1Turn);
        assert!(matches!(
            state.guess_coordinate(PlayerId::Player2, 1, 1),
            Err(SessionError::RuleViolation(_))
        ));
        assert_eq!(
            state.guess_coordinate(PlayerId::Player1, 0, 1),
            Err(SessionError::InvalidCoordinate { row: 0, col: 1 })
        );

        let (next, outcome) = state.guess_coordinate(PlayerId::Player1, 1, 5).unwrap();
        assert_eq!(outcome.result, GuessResult::Hit);
        assert_eq!(outcome.forested, Some(IslandType::Dot));
        assert_eq!(outcome.win, WinStatus::NoWin);
        assert_eq!(next.rules.state(), GameState::Player2Turn);
        // The guess lands on player 2's board and in player 1's ledger.
        assert!(next.player2.board.islands()[&IslandType::Dot].forested());
        assert!(!next.player1.board.islands()[&IslandType::Dot].forested());
        assert_eq!(next.player1.guesses.hits().len(), 1);
        assert!(next.player2.guesses.hits().is_empty());

        let (next, outcome) = next.guess_coordinate(PlayerId::Player2, 10, 1).unwrap();
        assert_eq!(outcome.result, GuessResult::Miss);
        assert_eq!(next.player2.guesses.misses().len(), 1);
        assert_eq!(next.rules.state(), GameState::Player1Turn);
    }
}
