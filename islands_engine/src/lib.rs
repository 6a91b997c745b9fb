/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! A session engine for concurrent two-player Islands games.
//!
//! Each game is a session served by its own worker task, addressed by the
//! first player's name. The [`SessionSupervisor`] starts and stops workers
//! and restarts a worker that fails; a restarted worker resumes from the
//! last snapshot in the backing [`SessionStore`]. A session that sees no
//! successful action within the configured inactivity window removes its
//! snapshot and terminates.
//!
//! ```ignore
//! let supervisor = SessionSupervisor::new(EngineConfig::from_env(), Arc::new(InMemoryStore::new()));
//! let session = supervisor.start_session("alice").await?;
//! session.add_player("bob").await?;
//! session.position_island(PlayerId::Player1, "square", 1, 1).await?;
//! ```

pub mod config;
mod error;
pub mod registry;
pub mod session;
pub mod state;
pub mod status;
pub mod store;
pub mod supervisor;
pub mod telemetry;

pub use config::EngineConfig;
pub use error::SessionError;
pub use registry::NameRegistry;
pub use session::SessionHandle;
pub use session::SessionRef;
pub use state::Player;
pub use state::SessionState;
pub use status::SessionStatus;
pub use status::SupervisionEvent;
pub use store::InMemoryStore;
pub use store::SessionStore;
pub use supervisor::SessionSupervisor;
