/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! The backing store: last-known session snapshots, keyed by session name.

use std::fmt::Debug;

use dashmap::DashMap;

use crate::state::SessionState;

/// A shared key-value table of session snapshots. Implementations must
/// allow concurrent access to independent keys, and a `put` must replace
/// the whole snapshot or fail without effect.
///
/// Errors are unexpected failures of the store itself. A session worker
/// that cannot persist fails and is restarted from the last snapshot.
pub trait SessionStore: Send + Sync + Debug {
    fn get(&self, name: &str) -> Result<Option<SessionState>, anyhow::Error>;

    fn put(&self, name: &str, state: SessionState) -> Result<(), anyhow::Error>;

    fn delete(&self, name: &str) -> Result<(), anyhow::Error>;
}

/// The default store: an in-memory concurrent map. Its contents live only
/// as long as the process.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: DashMap<String, SessionState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The snapshot stored under `name`, if any.
    pub fn snapshot(&self, name: &str) -> Option<SessionState> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }
}

impl SessionStore for InMemoryStore {
    fn get(&self, name: &str) -> Result<Option<SessionState>, anyhow::Error> {
        Ok(self.snapshot(name))
    }

    fn put(&self, name: &str, state: SessionState) -> Result<(), anyhow::Error> {
        self.entries.insert(name.to_string(), state);
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), anyhow::Error> {
        self.entries.remove(name);
        Ok(())
    }
}
