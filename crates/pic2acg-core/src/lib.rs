// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pic2acg — Core types and error definitions shared by the bindings crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::BridgeConfig;
pub use error::Pic2acgError;
pub use types::*;
