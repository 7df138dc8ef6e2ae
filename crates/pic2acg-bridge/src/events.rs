// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Event delivery from native code to the shell.
//
// The shell registers exactly one callback. Registering a new one replaces
// the previous callback; nothing is queued while no callback is set.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, trace};

use crate::traits::EventCallback;

/// Holder for the shell's event callback.
#[derive(Default)]
pub struct EventHub {
    callback: Mutex<Option<Arc<dyn EventCallback>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `callback`, replacing any previous one. The callback is not
    /// invoked.
    pub fn set(&self, callback: Arc<dyn EventCallback>) {
        let previous = self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(callback);
        debug!(replaced = previous.is_some(), "event callback stored");
    }

    /// Drop the stored callback. Returns whether one was set.
    pub fn clear(&self) -> bool {
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    pub fn is_set(&self) -> bool {
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Deliver `event` to the stored callback.
    ///
    /// The lock is released before the callback runs, so the callback may
    /// itself call back into the hub. Returns `false` when no callback is set.
    pub fn emit(&self, event: &str) -> bool {
        let callback = self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match callback {
            Some(callback) => {
                trace!(len = event.len(), "delivering event");
                callback.on_event(event);
                true
            }
            None => {
                trace!("event dropped: no callback");
                false
            }
        }
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("callback_set", &self.is_set())
            .finish()
    }
}
