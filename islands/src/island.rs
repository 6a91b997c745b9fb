/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::Coordinate;
use crate::GameError;

/// The shapes an island can take. Every board must place one island of
/// each type before its player can declare the islands set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IslandType {
    Atoll,
    Dot,
    LShape,
    SShape,
    Square,
}

impl IslandType {
    /// All island types, in key order.
    pub const ALL: [IslandType; 5] = [
        IslandType::Atoll,
        IslandType::Dot,
        IslandType::LShape,
        IslandType::SShape,
        IslandType::Square,
    ];

    /// Cell offsets (rows, cols) relative to the island's upper-left corner.
    fn offsets(&self) -> &'static [(i64, i64)] {
        match self {
            IslandType::Atoll => &[(0, 0), (0, 1), (1, 1), (2, 0), (2, 1)],
            IslandType::Dot => &[(0, 0)],
            IslandType::LShape => &[(0, 0), (1, 0), (2, 0), (2, 1)],
            IslandType::SShape => &[(0, 1), (0, 2), (1, 0), (1, 1)],
            IslandType::Square => &[(0, 0), (0, 1), (1, 0), (1, 1)],
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            IslandType::Atoll => "atoll",
            IslandType::Dot => "dot",
            IslandType::LShape => "l_shape",
            IslandType::SShape => "s_shape",
            IslandType::Square => "square",
        }
    }
}

impl FromStr for IslandType {
    type Err = GameError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        IslandType::ALL
            .into_iter()
            .find(|ty| ty.key() == key)
            .ok_or_else(|| GameError::InvalidIslandType(key.to_string()))
    }
}

impl fmt::Display for IslandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// An island placed on a board, together with the cells of it that have
/// been hit so far.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Island {
    coordinates: BTreeSet<Coordinate>,
    hit_coordinates: BTreeSet<Coordinate>,
}

impl Island {
    /// Lay out an island of the given type with its upper-left corner at
    /// `upper_left`. Fails if any cell falls off the board.
    pub fn new(island_type: IslandType, upper_left: Coordinate) -> Result<Self, GameError> {
        let coordinates = island_type
            .offsets()
            .iter()
            .map(|(rows, cols)| upper_left.offset(*rows, *cols))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self {
            coordinates,
            hit_coordinates: BTreeSet::new(),
        })
    }

    pub fn coordinates(&self) -> &BTreeSet<Coordinate> {
        &self.coordinates
    }

    pub fn overlaps(&self, other: &Island) -> bool {
        !self.coordinates.is_disjoint(&other.coordinates)
    }

    /// Record a guess against this island. Returns the updated island if
    /// the guess hit it, `None` otherwise.
    pub fn guess(&self, coordinate: Coordinate) -> Option<Island> {
        if !self.coordinates.contains(&coordinate) {
            return None;
        }
        let mut island = self.clone();
        island.hit_coordinates.insert(coordinate);
        Some(island)
    }

    /// An island is forested once every one of its cells has been hit.
    pub fn forested(&self) -> bool {
        self.coordinates == self.hit_coordinates
    }
}
