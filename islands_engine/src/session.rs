/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! The session worker.
//!
//! Each session is served by one tokio task that owns its [`SessionState`]
//! and processes its mailbox one message at a time. Callers address a
//! session by name through a [`SessionRef`]; the supervisor controls its
//! lifecycle through a [`SessionHandle`].
//!
//! A worker restores its state from the backing store before it polls its
//! mailbox for the first time, so messages sent while it is still
//! initializing wait in the mailbox and observe the restored state.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use islands::Board;
use islands::GuessOutcome;
use islands::PlayerId;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Instrument;

use crate::SessionError;
use crate::registry::NameRegistry;
use crate::state::SessionState;
use crate::status::SessionStatus;
use crate::store::SessionStore;

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Messages handled by a session worker. Every action carries the port on
/// which its result is delivered.
#[derive(Debug)]
pub(crate) enum SessionMessage {
    AddPlayer {
        name: String,
        reply: Reply<()>,
    },
    PositionIsland {
        player: PlayerId,
        island: String,
        row: i64,
        col: i64,
        reply: Reply<()>,
    },
    SetIslands {
        player: PlayerId,
        reply: Reply<Board>,
    },
    GuessCoordinate {
        player: PlayerId,
        row: i64,
        col: i64,
        reply: Reply<GuessOutcome>,
    },
    /// Read the current state. Does not count as activity.
    GetState {
        reply: oneshot::Sender<SessionState>,
    },
}

impl SessionMessage {
    fn action(&self) -> &'static str {
        match self {
            Self::AddPlayer { .. } => "add_player",
            Self::PositionIsland { .. } => "position_island",
            Self::SetIslands { .. } => "set_islands",
            Self::GuessCoordinate { .. } => "guess_coordinate",
            Self::GetState { .. } => "get_state",
        }
    }
}

/// Control-plane signals, polled ahead of the mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Signal {
    /// Stop after the message currently being processed, if any. The
    /// backing store is left untouched.
    Stop,
}

/// Controls one incarnation of a session worker: its mailbox, its signal
/// port and its lifecycle status.
#[derive(Clone)]
pub struct SessionHandle {
    name: Arc<str>,
    generation: u64,
    mailbox: mpsc::Sender<SessionMessage>,
    signals: mpsc::UnboundedSender<Signal>,
    status: Arc<watch::Sender<SessionStatus>>,
    abort: AbortHandle,
}

impl SessionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The incarnation number. Every (re)start gets a new one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// A watch that observes the lifecycle status of this incarnation.
    pub fn status(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Ask the worker to stop. Returns false if it is already gone.
    pub fn stop(&self) -> bool {
        tracing::debug!("{}[{}]: stop requested", self.name, self.generation);
        self.signals.send(Signal::Stop).is_ok()
    }

    /// Abort the worker task without letting it finish its current
    /// message. The supervisor treats this as a crash and restarts it.
    pub fn kill(&self) {
        tracing::debug!("{}[{}]: kill requested", self.name, self.generation);
        self.abort.abort();
    }

    /// Wait until the worker has finished restoring its state, returning
    /// the first status past initialization.
    pub async fn wait_until_ready(&self) -> SessionStatus {
        let mut status = self.status.subscribe();
        let result = status.wait_for(SessionStatus::is_ready).await;
        match result {
            Ok(status) => status.clone(),
            Err(_) => SessionStatus::Failed("status channel closed".to_string()),
        }
    }

    /// Wait until this incarnation has terminated and been unregistered,
    /// returning its terminal status.
    pub async fn wait_for_termination(&self) -> SessionStatus {
        let mut status = self.status.subscribe();
        let result = status.wait_for(SessionStatus::is_terminal).await;
        match result {
            Ok(status) => status.clone(),
            Err(_) => SessionStatus::Failed("status channel closed".to_string()),
        }
    }

    async fn post(&self, message: SessionMessage) -> Result<(), SessionError> {
        self.mailbox
            .send(message)
            .await
            .map_err(|_| SessionError::Unavailable(self.name.to_string()))
    }

    /// Publish the terminal status once the worker has been unregistered.
    pub(crate) fn set_terminal(&self, status: SessionStatus) {
        self.status.send_replace(status);
    }

    /// A handle that is not connected to any running worker.
    #[cfg(test)]
    pub(crate) fn detached(name: &str, generation: u64) -> Self {
        let (mailbox, _) = mpsc::channel(1);
        let (signals, _) = mpsc::unbounded_channel();
        let (status, _) = watch::channel(SessionStatus::Initializing);
        Self {
            name: name.into(),
            generation,
            mailbox,
            signals,
            status: Arc::new(status),
            abort: tokio::spawn(async {}).abort_handle(),
        }
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("name", &self.name)
            .field("generation", &self.generation)
            .field("status", &*self.status.borrow())
            .finish()
    }
}

/// Spawn a worker for `name`. The returned join handle resolves to the
/// worker's terminal status; it is the supervisor's job to observe it.
pub(crate) fn spawn(
    name: &str,
    generation: u64,
    store: Arc<dyn SessionStore>,
    inactivity_timeout: Duration,
    mailbox_capacity: usize,
) -> (SessionHandle, JoinHandle<SessionStatus>) {
    let (mailbox, mailbox_rx) = mpsc::channel(mailbox_capacity);
    let (signals, signals_rx) = mpsc::unbounded_channel();
    let status = Arc::new(watch::channel(SessionStatus::Initializing).0);

    let worker = SessionWorker {
        name: name.to_string(),
        state: SessionState::new(name),
        store,
        inactivity_timeout,
        deadline: Instant::now() + inactivity_timeout,
        status: status.clone(),
    };
    let span = tracing::info_span!("session", name = %name, generation);
    let join = tokio::spawn(worker.serve(mailbox_rx, signals_rx).instrument(span));

    let handle = SessionHandle {
        name: name.into(),
        generation,
        mailbox,
        signals,
        status,
        abort: join.abort_handle(),
    };
    (handle, join)
}

struct SessionWorker {
    name: String,
    state: SessionState,
    store: Arc<dyn SessionStore>,
    inactivity_timeout: Duration,
    deadline: Instant,
    status: Arc<watch::Sender<SessionStatus>>,
}

impl SessionWorker {
    async fn serve(
        mut self,
        mut mailbox: mpsc::Receiver<SessionMessage>,
        mut signals: mpsc::UnboundedReceiver<Signal>,
    ) -> SessionStatus {
        let result = AssertUnwindSafe(self.run(&mut mailbox, &mut signals))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(status)) => status,
            Ok(Err(err)) => {
                tracing::error!("{}: session failure: {:#}", self.name, err);
                SessionStatus::Failed(format!("{:#}", err))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!("{}: session panicked: {}", self.name, message);
                SessionStatus::Failed(format!("panic: {}", message))
            }
        }
    }

    /// Restore, then process signals, mail and the inactivity deadline
    /// until the worker stops.
    async fn run(
        &mut self,
        mailbox: &mut mpsc::Receiver<SessionMessage>,
        signals: &mut mpsc::UnboundedReceiver<Signal>,
    ) -> Result<SessionStatus, anyhow::Error> {
        self.restore()?;

        loop {
            self.change_status(SessionStatus::Idle);
            tokio::select! {
                biased;

                // A closed signal port means every handle is gone.
                Some(Signal::Stop) | None = signals.recv() => {
                    self.change_status(SessionStatus::Stopping);
                    tracing::info!("{}: stopping", self.name);
                    return Ok(SessionStatus::Stopped);
                }
                _ = tokio::time::sleep_until(self.deadline) => {
                    self.change_status(SessionStatus::Stopping);
                    tracing::info!(
                        "{}: no activity for {:?}, terminating",
                        self.name,
                        self.inactivity_timeout
                    );
                    if let Err(err) = self.store.delete(&self.name) {
                        tracing::error!("{}: failed to purge snapshot: {:#}", self.name, err);
                    }
                    return Ok(SessionStatus::TimedOut);
                }
                message = mailbox.recv() => match message {
                    Some(message) => self.handle(message)?,
                    None => return Ok(SessionStatus::Stopped),
                },
            }
        }
    }

    /// Load the last snapshot, or keep the fresh state if there is none,
    /// and write the result back so the store always has an entry for a
    /// live session.
    fn restore(&mut self) -> Result<(), anyhow::Error> {
        match self.store.get(&self.name)? {
            Some(snapshot) => {
                tracing::info!("{}: restored from snapshot", self.name);
                self.state = snapshot;
            }
            None => tracing::info!("{}: starting fresh", self.name),
        }
        self.store.put(&self.name, self.state.clone())?;
        self.deadline = Instant::now() + self.inactivity_timeout;
        Ok(())
    }

    fn handle(&mut self, message: SessionMessage) -> Result<(), anyhow::Error> {
        let action = message.action();
        self.change_status(SessionStatus::Processing(action.to_string()));

        match message {
            SessionMessage::AddPlayer { name, reply } => {
                let result = self.state.add_player(&name).map(|next| (next, ()));
                self.apply(action, result, reply)
            }
            SessionMessage::PositionIsland {
                player,
                island,
                row,
                col,
                reply,
            } => {
                let result = self
                    .state
                    .position_island(player, &island, row, col)
                    .map(|next| (next, ()));
                self.apply(action, result, reply)
            }
            SessionMessage::SetIslands { player, reply } => {
                let result = self.state.set_islands(player);
                self.apply(action, result, reply)
            }
            SessionMessage::GuessCoordinate {
                player,
                row,
                col,
                reply,
            } => {
                let result = self.state.guess_coordinate(player, row, col);
                self.apply(action, result, reply)
            }
            SessionMessage::GetState { reply } => {
                let _ = reply.send(self.state.clone());
                Ok(())
            }
        }
    }

    /// Commit a successful transition (persist, then adopt the new state and
    /// reset the inactivity deadline) and deliver the reply. A rejected
    /// transition changes nothing.
    fn apply<T>(
        &mut self,
        action: &str,
        result: Result<(SessionState, T), SessionError>,
        reply: Reply<T>,
    ) -> Result<(), anyhow::Error> {
        let response = match result {
            Ok((next, value)) => {
                self.store.put(&self.name, next.clone())?;
                self.state = next;
                self.deadline = Instant::now() + self.inactivity_timeout;
                Ok(value)
            }
            Err(err) => {
                tracing::debug!("{}: {} rejected: {}", self.name, action, err);
                Err(err)
            }
        };
        if reply.send(response).is_err() {
            tracing::debug!("{}: caller went away before {} replied", self.name, action);
        }
        Ok(())
    }

    fn change_status(&self, status: SessionStatus) {
        self.status.send_replace(status);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(|s| s.as_str()))
        .unwrap_or("panic cannot be downcasted")
}

/// Addresses a session by name. Every call resolves the name through the
/// registry, so a reference stays valid across restarts of the worker.
#[derive(Clone, Debug)]
pub struct SessionRef {
    name: String,
    registry: Arc<NameRegistry>,
    call_timeout: Duration,
}

impl SessionRef {
    pub(crate) fn new(name: &str, registry: Arc<NameRegistry>, call_timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            registry,
            call_timeout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Seat `name` as player 2.
    pub async fn add_player(&self, name: &str) -> Result<(), SessionError> {
        let name = name.to_string();
        self.call(|reply| SessionMessage::AddPlayer { name, reply })
            .await?
    }

    /// Place the island named `island` with its upper-left corner at
    /// (`row`, `col`) on `player`'s board.
    pub async fn position_island(
        &self,
        player: PlayerId,
        island: &str,
        row: i64,
        col: i64,
    ) -> Result<(), SessionError> {
        let island = island.to_string();
        self.call(|reply| SessionMessage::PositionIsland {
            player,
            island,
            row,
            col,
            reply,
        })
        .await?
    }

    /// Declare `player`'s islands final, returning their board.
    pub async fn set_islands(&self, player: PlayerId) -> Result<Board, SessionError> {
        self.call(|reply| SessionMessage::SetIslands { player, reply })
            .await?
    }

    /// Fire at (`row`, `col`) on the opponent's board.
    pub async fn guess_coordinate(
        &self,
        player: PlayerId,
        row: i64,
        col: i64,
    ) -> Result<GuessOutcome, SessionError> {
        self.call(|reply| SessionMessage::GuessCoordinate {
            player,
            row,
            col,
            reply,
        })
        .await?
    }

    /// A copy of the session's current state.
    pub async fn state(&self) -> Result<SessionState, SessionError> {
        self.call(|reply| SessionMessage::GetState { reply }).await
    }

    async fn call<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> SessionMessage,
    ) -> Result<T, SessionError> {
        let handle = self
            .registry
            .resolve(&self.name)
            .ok_or_else(|| SessionError::NotRunning(self.name.clone()))?;
        let (reply, reply_rx) = oneshot::channel();

        let call = async {
            handle.post(message(reply)).await?;
            reply_rx
                .await
                .map_err(|_| SessionError::Unavailable(self.name.clone()))
        };
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| SessionError::CallTimeout(self.name.clone()))?
    }
}
