/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fmt;
use std::ops::RangeInclusive;

use serde::Deserialize;
use serde::Serialize;

use crate::GameError;

/// Valid rows and columns on a board, in both dimensions.
pub const BOARD_RANGE: RangeInclusive<i64> = 1..=10;

/// A cell on a board. Coordinates can only be constructed within
/// [`BOARD_RANGE`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    row: u8,
    col: u8,
}

impl Coordinate {
    /// Validate a raw (row, col) pair.
    pub fn new(row: i64, col: i64) -> Result<Self, GameError> {
        if BOARD_RANGE.contains(&row) && BOARD_RANGE.contains(&col) {
            Ok(Self {
                row: row as u8,
                col: col as u8,
            })
        } else {
            Err(GameError::InvalidCoordinate { row, col })
        }
    }

    pub fn row(&self) -> i64 {
        self.row.into()
    }

    pub fn col(&self) -> i64 {
        self.col.into()
    }

    /// The coordinate shifted by the given offsets, if it stays on the board.
    pub fn offset(&self, rows: i64, cols: i64) -> Result<Self, GameError> {
        Self::new(self.row() + rows, self.col() + cols)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
