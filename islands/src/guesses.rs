/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::Coordinate;
use crate::GuessResult;

/// A player's ledger of the coordinates they have fired at.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guesses {
    hits: BTreeSet<Coordinate>,
    misses: BTreeSet<Coordinate>,
}

impl Guesses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, result: GuessResult, coordinate: Coordinate) -> Guesses {
        let mut guesses = self.clone();
        match result {
            GuessResult::Hit => guesses.hits.insert(coordinate),
            GuessResult::Miss => guesses.misses.insert(coordinate),
        };
        guesses
    }

    pub fn hits(&self) -> &BTreeSet<Coordinate> {
        &self.hits
    }

    pub fn misses(&self) -> &BTreeSet<Coordinate> {
        &self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add() {
        let c1 = Coordinate::new(1, 1).unwrap();
        let c2 = Coordinate::new(2, 2).unwrap();
        let guesses = Guesses::new()
            .add(GuessResult::Hit, c1)
            .add(GuessResult::Miss, c2)
            .add(GuessResult::Hit, c1);
        assert_eq!(guesses.hits().len(), 1);
        assert!(guesses.hits().contains(&c1));
        assert!(guesses.misses().contains(&c2));
    }
}
