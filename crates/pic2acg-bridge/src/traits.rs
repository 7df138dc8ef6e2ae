// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Seams between the facade and the code it calls into.
//
// Method handlers plug into the flat dispatch table; event callbacks are
// supplied by the host shell and receive notifications as plain strings.

use pic2acg_core::error::Result;

use crate::dispatch::InvokeContext;

/// A single entry of the flat dispatch table.
///
/// Handlers receive the raw `params` string exactly as the shell passed it
/// and return the reply string unchanged to the shell.
pub trait MethodHandler: Send + Sync {
    fn invoke(&self, ctx: &mut InvokeContext<'_>, params: &str) -> Result<String>;
}

impl<F> MethodHandler for F
where
    F: Fn(&mut InvokeContext<'_>, &str) -> Result<String> + Send + Sync,
{
    fn invoke(&self, ctx: &mut InvokeContext<'_>, params: &str) -> Result<String> {
        self(ctx, params)
    }
}

/// Receiver for events pushed from native code to the shell.
///
/// Implementations must not block for long: the shell forwards each event to
/// its UI thread itself.
pub trait EventCallback: Send + Sync {
    fn on_event(&self, event: &str);
}

impl<F> EventCallback for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_event(&self, event: &str) {
        self(event)
    }
}
