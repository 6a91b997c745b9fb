/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::Coordinate;
use crate::GameError;
use crate::Island;
use crate::IslandType;

/// Whether a guess landed on an island.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuessResult {
    Hit,
    Miss,
}

/// Whether the last guess forested every island on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinStatus {
    Win,
    NoWin,
}

/// The observable result of guessing a coordinate on a board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessOutcome {
    pub result: GuessResult,
    /// The island this guess completed, if any.
    pub forested: Option<IslandType>,
    pub win: WinStatus,
}

/// One player's board: at most one island of each type.
///
/// Boards are values; every operation returns a new board and leaves the
/// receiver untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    islands: BTreeMap<IslandType, Island>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn islands(&self) -> &BTreeMap<IslandType, Island> {
        &self.islands
    }

    /// Place (or move) the island of type `island_type`. An island may not
    /// share a cell with any island already on the board, including a
    /// previous placement of the same type.
    pub fn position_island(
        &self,
        island_type: IslandType,
        island: Island,
    ) -> Result<Board, GameError> {
        if let Some((existing, _)) = self
            .islands
            .iter()
            .find(|(_, placed)| placed.overlaps(&island))
        {
            return Err(GameError::OverlappingIsland {
                island: island_type,
                existing: *existing,
            });
        }
        let mut board = self.clone();
        board.islands.insert(island_type, island);
        Ok(board)
    }

    pub fn all_islands_positioned(&self) -> bool {
        IslandType::ALL
            .iter()
            .all(|ty| self.islands.contains_key(ty))
    }

    /// Fire at `coordinate`, returning the outcome and the updated board.
    pub fn guess(&self, coordinate: Coordinate) -> (GuessOutcome, Board) {
        let hit = self
            .islands
            .iter()
            .find_map(|(ty, island)| island.guess(coordinate).map(|island| (*ty, island)));

        match hit {
            None => (
                GuessOutcome {
                    result: GuessResult::Miss,
                    forested: None,
                    win: self.win_status(),
                },
                self.clone(),
            ),
            Some((island_type, island)) => {
                let forested = island.forested().then_some(island_type);
                let mut board = self.clone();
                board.islands.insert(island_type, island);
                let win = board.win_status();
                (
                    GuessOutcome {
                        result: GuessResult::Hit,
                        forested,
                        win,
                    },
                    board,
                )
            }
        }
    }

    fn win_status(&self) -> WinStatus {
        if self.islands.values().all(Island::forested) {
            WinStatus::Win
        } else {
            WinStatus::NoWin
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(row: i64, col: i64) -> Coordinate {
        Coordinate::new(row, col).unwrap()
    }

    fn place(board: &Board, ty: IslandType, row: i64, col: i64) -> Result<Board, GameError> {
        board.position_island(ty, Island::new(ty, coord(row, col))?)
    }

    #[test]
    fn test_overlap_rejected() {
        let board = place(&Board::new(), IslandType::Square, 1, 1).unwrap();
        assert_eq!(
            place(&board, IslandType::Dot, 2, 2),
            Err(GameError::OverlappingIsland {
                island: IslandType::Dot,
                existing: IslandType::Square,
            })
        );
        // Re-placing onto its own cells also overlaps.
        assert!(place(&board, IslandType::Square, 1, 1).is_err());
        // Moving to free cells replaces the previous placement.
        let moved = place(&board, IslandType::Square, 5, 5).unwrap();
        assert_eq!(moved.islands().len(), 1);
        assert!(
            moved.islands()[&IslandType::Square]
                .coordinates()
                .contains(&coord(6, 6))
        );
    }

    #[test]
    fn test_all_positioned() {
        let layout = [
            (IslandType::Atoll, 1, 1),
            (IslandType::Dot, 1, 5),
            (IslandType::LShape, 5, 1),
            (IslandType::SShape, 5, 5),
            (IslandType::Square, 9, 9),
        ];
        let mut board = Board::new();
        for (ty, row, col) in layout {
            assert!(!board.all_islands_positioned());
            board = place(&board, ty, row, col).unwrap();
        }
        assert!(board.all_islands_positioned());
    }

    #[test]
    fn test_guess() {
        let board = place(&Board::new(), IslandType::Dot, 1, 1).unwrap();
        let board = place(&board, IslandType::Square, 5, 5).unwrap();

        let (outcome, board) = board.guess(coord(9, 9));
        assert_eq!(outcome.result, GuessResult::Miss);
        assert_eq!(outcome.forested, None);
        assert_eq!(outcome.win, WinStatus::NoWin);

        let (outcome, board) = board.guess(coord(1, 1));
        assert_eq!(outcome.result, GuessResult::Hit);
        assert_eq!(outcome.forested, Some(IslandType::Dot));
        assert_eq!(outcome.win, WinStatus::NoWin);

        let mut board = board;
        for (row, col) in [(5, 5), (5, 6), (6, 5)] {
            let (outcome, next) = board.guess(coord(row, col));
            assert_eq!(outcome.forested, None);
            board = next;
        }
        let (outcome, _) = board.guess(coord(6, 6));
        assert_eq!(outcome.forested, Some(IslandType::Square));
        assert_eq!(outcome.win, WinStatus::Win);
    }

    #[test]
    fn test_guess_leaves_receiver_untouched() {
        let board = place(&Board::new(), IslandType::Dot, 1, 1).unwrap();
        let (_, after) = board.guess(coord(1, 1));
        assert_ne!(board, after);
        assert!(!board.islands()[&IslandType::Dot].forested());
    }
}
