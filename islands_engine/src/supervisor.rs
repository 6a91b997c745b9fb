/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! The session supervisor starts and stops session workers and restarts
//! them when they fail.
//!
//! Every worker incarnation is paired with a monitor task that awaits its
//! exit. The monitor unregisters the worker and, if it failed, spawns a
//! fresh incarnation that restores from the backing store. It then
//! publishes the terminal status and a [`SupervisionEvent`]. Restarts are
//! one-for-one and bounded per session by a restart intensity; a session
//! that exceeds it is abandoned with its last snapshot left in the store.
//!
//! A session that is being stopped is never restarted. `stop_session`
//! records its intent before looking the worker up, and the monitor checks
//! for it while holding the intent entry, so a crash racing a stop cannot
//! bring the session back.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::SessionError;
use crate::config::EngineConfig;
use crate::registry::NameRegistry;
use crate::session;
use crate::session::SessionHandle;
use crate::session::SessionRef;
use crate::status::SessionStatus;
use crate::status::SupervisionEvent;
use crate::store::SessionStore;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Starts, stops, and restarts session workers. Cloning yields another
/// handle to the same supervisor.
#[derive(Clone, Debug)]
pub struct SessionSupervisor {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: EngineConfig,
    store: Arc<dyn SessionStore>,
    registry: Arc<NameRegistry>,
    next_generation: AtomicU64,
    events: broadcast::Sender<SupervisionEvent>,
    /// Names with a `stop_session` in flight, with the number of callers.
    stopping: DashMap<String, usize>,
}

impl SessionSupervisor {
    pub fn new(config: EngineConfig, store: Arc<dyn SessionStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                config,
                store,
                registry: Arc::new(NameRegistry::new()),
                next_generation: AtomicU64::new(0),
                events,
                stopping: DashMap::new(),
            }),
        }
    }

    /// Start a worker for the session `name` and wait until it has restored
    /// its state. The worker resumes from the store's snapshot if there is
    /// one.
    ///
    /// An incarnation that fails while restoring is restarted under the
    /// restart intensity, and this waits for the replacement in turn. If the
    /// session is abandoned before any incarnation comes up, this fails with
    /// [`SessionError::Unavailable`].
    pub async fn start_session(&self, name: &str) -> Result<SessionRef, SessionError> {
        if name.is_empty() {
            return Err(SessionError::InvalidPlayerName(name.to_string()));
        }
        let mut handle =
            spawn_session(&self.inner, name, RestartBudget::new(&self.inner.config))?;
        tracing::info!("{}[{}]: started", name, handle.generation());

        loop {
            let status = handle.wait_until_ready().await;
            let Some(reason) = status.as_failed() else {
                break;
            };
            tracing::warn!("{}[{}]: failed to start: {}", name, handle.generation(), reason);
            // A replacement is registered before the failure is published.
            match self.inner.registry.resolve(name) {
                Some(next) if next.generation() != handle.generation() => handle = next,
                _ => return Err(SessionError::Unavailable(name.to_string())),
            }
        }
        Ok(self.session_ref(name))
    }

    /// Stop the session `name` and purge its snapshot. Stopping a session
    /// that is not running only purges. On return no worker is registered
    /// under `name`, including one restarted after a crash that raced the
    /// stop.
    pub async fn stop_session(&self, name: &str) -> Result<(), SessionError> {
        let _intent = StopIntent::new(&self.inner.stopping, name);
        self.purge(name);
        while let Some(handle) = self.inner.registry.resolve(name) {
            handle.stop();
            let status = handle.wait_for_termination().await;
            tracing::info!("{}[{}]: stopped ({})", name, handle.generation(), status);
        }
        // The worker may have persisted once more before it saw the signal.
        self.purge(name);
        Ok(())
    }

    /// Address the running session `name`.
    pub fn session(&self, name: &str) -> Result<SessionRef, SessionError> {
        if self.inner.registry.contains(name) {
            Ok(self.session_ref(name))
        } else {
            Err(SessionError::NotRunning(name.to_string()))
        }
    }

    /// The control handle of the worker currently serving `name`.
    pub fn handle(&self, name: &str) -> Option<SessionHandle> {
        self.inner.registry.resolve(name)
    }

    /// Names of all running sessions, sorted.
    pub fn running_sessions(&self) -> Vec<String> {
        self.inner.registry.names()
    }

    /// Receive a [`SupervisionEvent`] for every worker termination from now
    /// on.
    pub fn subscribe(&self) -> broadcast::Receiver<SupervisionEvent> {
        self.inner.events.subscribe()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Arc<NameRegistry> {
        &self.inner.registry
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.inner.store
    }

    fn session_ref(&self, name: &str) -> SessionRef {
        SessionRef::new(
            name,
            self.inner.registry.clone(),
            self.inner.config.call_timeout,
        )
    }

    fn purge(&self, name: &str) {
        if let Err(err) = self.inner.store.delete(name) {
            tracing::warn!("{}: failed to purge snapshot: {:#}", name, err);
        }
    }
}

/// Marks `name` as being stopped for as long as it lives.
struct StopIntent<'a> {
    stopping: &'a DashMap<String, usize>,
    name: String,
}

impl<'a> StopIntent<'a> {
    fn new(stopping: &'a DashMap<String, usize>, name: &str) -> Self {
        *stopping.entry(name.to_string()).or_insert(0) += 1;
        Self {
            stopping,
            name: name.to_string(),
        }
    }
}

impl Drop for StopIntent<'_> {
    fn drop(&mut self) {
        if let Entry::Occupied(mut entry) = self.stopping.entry(self.name.clone()) {
            if *entry.get() <= 1 {
                entry.remove();
            } else {
                *entry.get_mut() -= 1;
            }
        }
    }
}

/// Restart intensity for one session: at most `max_restarts` restarts in
/// any `window`.
#[derive(Debug, Clone)]
struct RestartBudget {
    max_restarts: u32,
    window: Duration,
    restarts: VecDeque<Instant>,
}

impl RestartBudget {
    fn new(config: &EngineConfig) -> Self {
        Self {
            max_restarts: config.max_restarts,
            window: config.restart_window,
            restarts: VecDeque::new(),
        }
    }

    /// Record a restart at `now` if the budget allows one.
    fn try_restart(&mut self, now: Instant) -> bool {
        while let Some(&oldest) = self.restarts.front() {
            if now.duration_since(oldest) < self.window {
                break;
            }
            self.restarts.pop_front();
        }
        if self.restarts.len() >= self.max_restarts as usize {
            return false;
        }
        self.restarts.push_back(now);
        true
    }
}

/// Register and spawn a new incarnation of `name`, along with its monitor.
fn spawn_session(
    inner: &Arc<Inner>,
    name: &str,
    budget: RestartBudget,
) -> Result<SessionHandle, SessionError> {
    let (handle, join) = inner.registry.register_with(name, || {
        let generation = inner.next_generation.fetch_add(1, Ordering::Relaxed);
        session::spawn(
            name,
            generation,
            inner.store.clone(),
            inner.config.inactivity_timeout,
            inner.config.mailbox_capacity,
        )
    })?;
    tokio::spawn(monitor(inner.clone(), handle.clone(), join, budget));
    Ok(handle)
}

async fn monitor(
    inner: Arc<Inner>,
    handle: SessionHandle,
    join: JoinHandle<SessionStatus>,
    mut budget: RestartBudget,
) {
    let status = match join.await {
        Ok(status) => status,
        Err(err) if err.is_cancelled() => SessionStatus::Failed("killed".to_string()),
        Err(err) => SessionStatus::Failed(err.to_string()),
    };
    let name = handle.name();
    inner.registry.unregister(&handle);

    // Restart before publishing, so that whoever observes the failure also
    // finds its replacement registered.
    if let Some(reason) = status.as_failed() {
        tracing::error!("{}[{}]: failed: {}", name, handle.generation(), reason);
        // Held across the restart: a stop that records its intent after this
        // point finds the replacement registered.
        let stopping = inner.stopping.get(name);
        if stopping.is_some() {
            tracing::info!("{}: not restarted, stop requested", name);
        } else if budget.try_restart(Instant::now()) {
            match spawn_session(&inner, name, budget) {
                Ok(restarted) => tracing::warn!(
                    "{}[{}]: restarted, replacing generation {}",
                    name,
                    restarted.generation(),
                    handle.generation()
                ),
                // Someone started it again in the meantime.
                Err(err) => tracing::debug!("{}: not restarted: {}", name, err),
            }
        } else {
            tracing::error!(
                "{}: restart intensity exceeded ({} in {:?}), giving up",
                name,
                budget.max_restarts,
                budget.window
            );
        }
        drop(stopping);
    }

    handle.set_terminal(status.clone());
    let event = SupervisionEvent::new(name.to_string(), handle.generation(), status);
    tracing::info!("{}", event);
    // No subscribers is fine.
    let _ = inner.events.send(event);
}
