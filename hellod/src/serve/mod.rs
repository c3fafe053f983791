/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod stats;
pub use stats::HelloServerStats;

mod error;
pub use error::ServerTaskError;

mod server;
pub use server::{HelloServer, HelloServerConfig};

mod task;
use task::{HelloTask, HelloTaskContext};

mod runtime;
use runtime::HelloServerRuntime;

#[derive(Clone)]
pub(crate) enum ServerQuitCommand {
    QuitRuntime,
}
