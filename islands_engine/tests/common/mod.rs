/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use islands::PlayerId;
use islands_engine::EngineConfig;
use islands_engine::InMemoryStore;
use islands_engine::SessionError;
use islands_engine::SessionRef;
use islands_engine::SessionState;
use islands_engine::SessionStore;
use islands_engine::SessionSupervisor;

/// Non-overlapping upper-left corners for every island type.
pub const LAYOUT: [(&str, i64, i64); 5] = [
    ("atoll", 1, 1),
    ("dot", 1, 5),
    ("l_shape", 5, 1),
    ("s_shape", 5, 5),
    ("square", 9, 9),
];

/// Every cell covered by [`LAYOUT`].
pub const LAYOUT_CELLS: [(i64, i64); 18] = [
    (1, 1),
    (1, 2),
    (2, 2),
    (3, 1),
    (3, 2),
    (1, 5),
    (5, 1),
    (6, 1),
    (7, 1),
    (7, 2),
    (5, 6),
    (5, 7),
    (6, 5),
    (6, 6),
    (9, 9),
    (9, 10),
    (10, 9),
    (10, 10),
];

/// One caller action against a session.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    AddPlayer(&'static str),
    Place(PlayerId, &'static str, i64, i64),
    SetIslands(PlayerId),
    Guess(PlayerId, i64, i64),
}

impl Step {
    pub async fn apply(self, session: &SessionRef) -> Result<(), SessionError> {
        match self {
            Step::AddPlayer(name) => session.add_player(name).await,
            Step::Place(player, key, row, col) => {
                session.position_island(player, key, row, col).await
            }
            Step::SetIslands(player) => session.set_islands(player).await.map(|_| ()),
            Step::Guess(player, row, col) => session
                .guess_coordinate(player, row, col)
                .await
                .map(|_| ()),
        }
    }
}

/// A game from the first join through a few turns. Every step succeeds.
pub fn script() -> Vec<Step> {
    let mut steps = vec![Step::AddPlayer("bob")];
    for player in [PlayerId::Player1, PlayerId::Player2] {
        for (key, row, col) in LAYOUT {
            steps.push(Step::Place(player, key, row, col));
        }
    }
    steps.push(Step::SetIslands(PlayerId::Player1));
    steps.push(Step::SetIslands(PlayerId::Player2));
    steps.push(Step::Guess(PlayerId::Player1, 1, 5));
    steps.push(Step::Guess(PlayerId::Player2, 10, 1));
    steps.push(Step::Guess(PlayerId::Player1, 9, 9));
    steps.push(Step::Guess(PlayerId::Player2, 1, 1));
    steps
}

pub async fn play(session: &SessionRef, steps: &[Step]) {
    for step in steps {
        step.apply(session)
            .await
            .unwrap_or_else(|err| panic!("{:?} failed: {}", step, err));
    }
}

pub fn supervisor(config: EngineConfig) -> (SessionSupervisor, Arc<InMemoryStore>) {
    islands_engine::telemetry::initialize_logging_for_test();
    let store = Arc::new(InMemoryStore::new());
    (SessionSupervisor::new(config, store.clone()), store)
}

/// A fault to inject into a [`FaultyStore`] for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The next `put` returns an error.
    FailPut,
    /// The next `put` panics.
    PanicPut,
    /// The next `put` blocks its thread for the given duration first.
    SlowPut(Duration),
    /// Every `get` panics.
    PanicGet,
    /// The next `get` panics.
    PanicGetOnce,
}

/// An [`InMemoryStore`] with per-session injectable faults.
#[derive(Debug, Default)]
pub struct FaultyStore {
    pub inner: InMemoryStore,
    faults: Mutex<HashMap<String, Fault>>,
}

impl FaultyStore {
    pub fn arm(&self, name: &str, fault: Fault) {
        self.faults.lock().unwrap().insert(name.to_string(), fault);
    }

    fn take_put_fault(&self, name: &str) -> Option<Fault> {
        let mut faults = self.faults.lock().unwrap();
        match faults.get(name) {
            Some(Fault::PanicGet | Fault::PanicGetOnce) | None => None,
            Some(_) => faults.remove(name),
        }
    }
}

impl SessionStore for FaultyStore {
    fn get(&self, name: &str) -> Result<Option<SessionState>, anyhow::Error> {
        let fault = {
            let mut faults = self.faults.lock().unwrap();
            let fault = faults.get(name).copied();
            if fault == Some(Fault::PanicGetOnce) {
                faults.remove(name);
            }
            fault
        };
        if matches!(fault, Some(Fault::PanicGet | Fault::PanicGetOnce)) {
            panic!("store read for {} exploded", name);
        }
        self.inner.get(name)
    }

    fn put(&self, name: &str, state: SessionState) -> Result<(), anyhow::Error> {
        match self.take_put_fault(name) {
            Some(Fault::FailPut) => anyhow::bail!("store write for {} rejected", name),
            Some(Fault::PanicPut) => panic!("store write for {} exploded", name),
            Some(Fault::SlowPut(delay)) => std::thread::sleep(delay),
            Some(Fault::PanicGet | Fault::PanicGetOnce) | None => {}
        }
        self.inner.put(name, state)
    }

    fn delete(&self, name: &str) -> Result<(), anyhow::Error> {
        self.inner.delete(name)
    }
}
