/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Logging setup for processes that host the session engine.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding an `EnvFilter` directive, e.g.
/// `ISLANDS_LOG=islands_engine=debug`.
pub const LOG_ENV: &str = "ISLANDS_LOG";

const LOG_LEVEL_INFO: &str = "info";
const LOG_LEVEL_DEBUG: &str = "debug";

/// Install a stderr fmt subscriber filtered by [`LOG_ENV`], defaulting to
/// `info`. Calling this more than once is harmless.
pub fn initialize_logging() {
    initialize_logging_impl(LOG_LEVEL_INFO, false);
}

/// Like [`initialize_logging`], but defaults to `debug` and writes through
/// the test harness so output is captured per test.
pub fn initialize_logging_for_test() {
    initialize_logging_impl(LOG_LEVEL_DEBUG, true);
}

fn initialize_logging_impl(default_level: &str, for_test: bool) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = if for_test {
        Registry::default()
            .with(filter)
            .with(fmt::Layer::default().with_test_writer())
            .try_init()
    } else {
        Registry::default()
            .with(filter)
            .with(fmt::Layer::default().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(err) = result {
        tracing::debug!("logging already initialized for this process: {}", err);
    }
}
