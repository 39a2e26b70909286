/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use crate::ParseError;

#[derive(Debug, Error)]
pub enum StatsdClientBuildError {
    #[error("no target host has been set")]
    EmptyHost,
    #[error("target port should not be 0")]
    InvalidPort,
    #[error("failed to resolve target {host}:{port}: {source}")]
    ResolveFailed {
        host: String,
        port: u16,
        source: io::Error,
    },
    #[error("invalid metrics prefix: {0}")]
    InvalidPrefix(#[from] ParseError),
    #[error("batch size should not be 0")]
    ZeroBatchSize,
    #[error("send timeout should not be 0")]
    ZeroSendTimeout,
    #[error("socket error: {0}")]
    SocketError(io::Error),
}
