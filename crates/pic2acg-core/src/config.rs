// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use serde::{Deserialize, Serialize};

/// Settings shared by the facade and the host boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// File inside the data directory holding persisted properties.
    pub properties_file: String,
    /// Pointer file inside the host files directory naming a relocated
    /// data directory.
    pub data_pointer_file: String,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub default_log_filter: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            properties_file: "properties.json".into(),
            data_pointer_file: "data.local".into(),
            default_log_filter: "info".into(),
        }
    }
}
