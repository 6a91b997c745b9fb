/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! The name registry maps a session name to the handle of its live worker.
//! At most one worker is registered under a name at any time.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::SessionError;
use crate::session::SessionHandle;

#[derive(Debug, Default)]
pub struct NameRegistry {
    sessions: DashMap<String, SessionHandle>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handle produced by `spawn` under `name`, failing with
    /// [`SessionError::AlreadyRunning`] if the name is taken. `spawn` only
    /// runs if the name is free, and runs while the name is held, so no
    /// other registration can interleave.
    pub(crate) fn register_with<T>(
        &self,
        name: &str,
        spawn: impl FnOnce() -> (SessionHandle, T),
    ) -> Result<(SessionHandle, T), SessionError> {
        match self.sessions.entry(name.to_string()) {
            Entry::Occupied(_) => Err(SessionError::AlreadyRunning(name.to_string())),
            Entry::Vacant(entry) => {
                let (handle, rest) = spawn();
                entry.insert(handle.clone());
                Ok((handle, rest))
            }
        }
    }

    /// The handle of the worker currently registered under `name`.
    pub fn resolve(&self, name: &str) -> Option<SessionHandle> {
        self.sessions.get(name).map(|entry| entry.value().clone())
    }

    /// Remove `handle`'s registration. A newer incarnation registered under
    /// the same name is left alone. Returns whether anything was removed.
    pub(crate) fn unregister(&self, handle: &SessionHandle) -> bool {
        self.sessions
            .remove_if(handle.name(), |_, registered| {
                registered.generation() == handle.generation()
            })
            .is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sessions.contains_key(name)
    }

    /// Names of all registered sessions, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names = self
            .sessions
            .iter()
            .map(|entry| entry.key().clone())
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
