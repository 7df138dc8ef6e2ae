// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for pic2acg.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all bindings operations.
#[derive(Debug, Error)]
pub enum Pic2acgError {
    // -- Data directory --
    #[error("failed to create data directory {}: {source}", .path.display())]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("application not initialized: call initApplication first")]
    NotInitialized,

    #[error("data directory migration failed: {0}")]
    Migration(String),

    // -- Method dispatch --
    #[error("invalid params for {method}: {reason}")]
    InvalidParams { method: String, reason: String },

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Host boundary --
    #[error("host bridge error: {0}")]
    Bridge(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, Pic2acgError>;
