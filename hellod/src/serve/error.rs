/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use hello_proto::HelloRequestError;

#[derive(Debug, Error)]
pub enum ServerTaskError {
    #[error("write failed: {0:?}")]
    WriteFailed(io::Error),
    #[error("read failed: {0:?}")]
    ReadFailed(io::Error),
    #[error("invalid request: {0}")]
    InvalidRequest(HelloRequestError),
    #[error("connection closed by client")]
    ClosedByClient,
    #[error("server force quit")]
    ServerForceQuit,
}

impl From<HelloRequestError> for ServerTaskError {
    fn from(value: HelloRequestError) -> Self {
        match value {
            HelloRequestError::ReadFailed(e) => ServerTaskError::ReadFailed(e),
            HelloRequestError::ClosedByPeer => ServerTaskError::ClosedByClient,
            _ => ServerTaskError::InvalidRequest(value),
        }
    }
}
