// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Process-wide `tracing` subscriber for the native library.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install the fmt subscriber once per process.
///
/// `RUST_LOG` wins over `default_filter`. If the host already installed a
/// global subscriber, that one is kept.
pub fn init(default_filter: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));
        if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok() {
            tracing::debug!("native logging initialised");
        }
    });
}
