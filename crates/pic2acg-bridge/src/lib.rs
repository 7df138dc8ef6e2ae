// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! pic2acg — native bindings facade for the mobile shell.
//!
//! The shell reaches native code through three entry points:
//! `initApplication`, `flatInvoke` and `eventNotify`. [`Mobile`] implements
//! them; the [`ffi`] and `android` modules expose one process-wide instance
//! to C-ABI hosts and to the JVM respectively.

pub mod data_dir;
pub mod dispatch;
pub mod events;
pub mod ffi;
pub mod logging;
pub mod mobile;
pub mod properties;
pub mod traits;

#[cfg(target_os = "android")]
pub mod android;

use std::sync::OnceLock;

pub use dispatch::{InvokeContext, MethodRegistry};
pub use events::EventHub;
pub use mobile::Mobile;
pub use properties::PropertyStore;
pub use traits::{EventCallback, MethodHandler};

/// The facade shared by every host boundary in this process.
///
/// Created on first use with the built-in methods; logging is initialised at
/// the same time.
pub fn shared() -> &'static Mobile {
    static SHARED: OnceLock<Mobile> = OnceLock::new();
    SHARED.get_or_init(|| {
        let mobile = Mobile::with_builtin_methods();
        logging::init(&mobile.config().default_log_filter);
        tracing::info!(methods = mobile.registry().len(), "native bridge ready");
        mobile
    })
}
