// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// C ABI boundary for iOS and desktop hosts.
//
// Strings cross the boundary as NUL-terminated UTF-8. Strings returned by
// this module are owned by Rust and must be released with
// `pic2acg_string_free`. On failure a function returns `-1` or NULL and the
// message is available from `pic2acg_last_error` on the same thread.

use std::cell::RefCell;
use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::sync::Arc;

use pic2acg_core::error::{Pic2acgError, Result};
use tracing::warn;

use crate::traits::EventCallback;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(err: &Pic2acgError) {
    warn!(error = %err, "native call failed");
    let message = CString::new(err.to_string().replace('\0', " ")).unwrap_or_default();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(message));
}

fn clear_last_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

fn status(result: Result<()>) -> c_int {
    match result {
        Ok(()) => {
            clear_last_error();
            0
        }
        Err(e) => {
            set_last_error(&e);
            -1
        }
    }
}

fn owned_string(result: Result<String>) -> *mut c_char {
    let result = result.and_then(|s| {
        CString::new(s).map_err(|e| Pic2acgError::Bridge(format!("reply contains NUL: {e}")))
    });
    match result {
        Ok(s) => {
            clear_last_error();
            s.into_raw()
        }
        Err(e) => {
            set_last_error(&e);
            std::ptr::null_mut()
        }
    }
}

/// # Safety
///
/// `ptr` must be NULL or point to a NUL-terminated string that outlives `'a`.
unsafe fn read_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(Pic2acgError::Bridge(format!("{what} is NULL")));
    }
    // SAFETY: non-null and NUL-terminated per the caller's contract.
    let raw = unsafe { CStr::from_ptr(ptr) };
    raw.to_str()
        .map_err(|e| Pic2acgError::Bridge(format!("{what} is not UTF-8: {e}")))
}

/// Create the data directory and load its properties. Returns 0 on success.
///
/// # Safety
///
/// `data_path` must be NULL or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pic2acg_init_application(data_path: *const c_char) -> c_int {
    // SAFETY: forwarded caller contract.
    let path = unsafe { read_str(data_path, "data_path") };
    status(path.and_then(|path| crate::shared().init_application(path)))
}

/// Generic method call. Returns the reply, or NULL on failure.
///
/// # Safety
///
/// `method` and `params` must be NULL or valid NUL-terminated strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pic2acg_flat_invoke(
    method: *const c_char,
    params: *const c_char,
) -> *mut c_char {
    // SAFETY: forwarded caller contract.
    let args = unsafe { read_str(method, "method").and_then(|m| Ok((m, read_str(params, "params")?))) };
    owned_string(args.and_then(|(method, params)| crate::shared().flat_invoke(method, params)))
}

/// Event callback signature: the event string is only valid for the
/// duration of the call.
pub type EventFn = extern "C" fn(event: *const c_char, user_data: *mut c_void);

struct ForeignCallback {
    callback: EventFn,
    user_data: *mut c_void,
}

// SAFETY: hosts registering a callback guarantee that it and `user_data` may
// be used from any thread, as documented on `pic2acg_event_notify`.
unsafe impl Send for ForeignCallback {}
unsafe impl Sync for ForeignCallback {}

impl EventCallback for ForeignCallback {
    fn on_event(&self, event: &str) {
        match CString::new(event) {
            Ok(event) => (self.callback)(event.as_ptr(), self.user_data),
            Err(_) => warn!("dropping event containing NUL"),
        }
    }
}

/// Register the event callback, or clear it when `callback` is NULL.
///
/// The callback is not invoked by this call. It may later be invoked from
/// any thread.
///
/// # Safety
///
/// `callback` and `user_data` must stay valid until replaced or cleared.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pic2acg_event_notify(callback: Option<EventFn>, user_data: *mut c_void) {
    match callback {
        Some(callback) => crate::shared().event_notify(Arc::new(ForeignCallback {
            callback,
            user_data,
        })),
        None => {
            crate::shared().clear_event_callback();
        }
    }
}

/// Resolve the data directory for the host files directory. Returns NULL on
/// failure.
///
/// # Safety
///
/// `files_dir` must be NULL or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pic2acg_data_local(files_dir: *const c_char) -> *mut c_char {
    // SAFETY: forwarded caller contract.
    let files_dir = unsafe { read_str(files_dir, "files_dir") };
    owned_string(files_dir.map(|dir| {
        crate::shared()
            .data_local(dir)
            .to_string_lossy()
            .into_owned()
    }))
}

/// Move the data directory to `target`. Returns 0 on success.
///
/// # Safety
///
/// `files_dir` and `target` must be NULL or valid NUL-terminated strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pic2acg_migrate(files_dir: *const c_char, target: *const c_char) -> c_int {
    // SAFETY: forwarded caller contract.
    let args =
        unsafe { read_str(files_dir, "files_dir").and_then(|f| Ok((f, read_str(target, "target")?))) };
    status(args.and_then(|(files_dir, target)| crate::shared().migrate(files_dir, target).map(drop)))
}

/// Release a string returned by this library. NULL is ignored.
///
/// # Safety
///
/// `s` must be NULL or a pointer previously returned by this library and not
/// yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pic2acg_string_free(s: *mut c_char) {
    if !s.is_null() {
        // SAFETY: produced by `CString::into_raw` in `owned_string`.
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Message of the last failure on this thread, or NULL. Valid until the next
/// call into this library on the same thread.
#[unsafe(no_mangle)]
pub extern "C" fn pic2acg_last_error() -> *const c_char {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map_or(std::ptr::null(), |message| message.as_ptr())
    })
}
