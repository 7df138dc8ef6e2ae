// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android boundary via JNI.
//
// Exports the native methods of the Kotlin object `opensource.pic2acg.Mobile`:
//
//   external fun initApplication(dataPath: String)
//   external fun flatInvoke(method: String, params: String): String
//   external fun eventNotify(listener: EventListener)   // fun onEvent(String)
//   external fun dataLocal(filesDir: String): String
//   external fun migrate(filesDir: String, target: String)
//
// Failures are raised as `java.lang.Exception` carrying the error message.
// The MethodChannel handler in the activity already turns exceptions into
// `result.error(...)` for Flutter.

#![cfg(target_os = "android")]

use jni::JNIEnv;
use jni::JavaVM;
use jni::objects::{GlobalRef, JObject, JString, JValue};
use jni::sys::jstring;

use pic2acg_core::error::{Pic2acgError, Result};

use crate::traits::EventCallback;

/// Java class thrown on failure.
const EXCEPTION_CLASS: &str = "java/lang/Exception";

/// Signature of `EventListener.onEvent(String)`.
const ON_EVENT_SIG: &str = "(Ljava/lang/String;)V";

// ---------------------------------------------------------------------------
// JNI helpers
// ---------------------------------------------------------------------------

/// Convenience: map any `jni::errors::Error` into `Pic2acgError::Bridge`.
fn jni_err(context: &str, e: jni::errors::Error) -> Pic2acgError {
    Pic2acgError::Bridge(format!("{context}: {e}"))
}

fn read_string(env: &mut JNIEnv, value: &JString, what: &str) -> Result<String> {
    if value.is_null() {
        return Err(Pic2acgError::Bridge(format!("{what} is null")));
    }
    env.get_string(value)
        .map(String::from)
        .map_err(|e| jni_err(what, e))
}

fn throw(env: &mut JNIEnv, err: &Pic2acgError) {
    tracing::warn!(error = %err, "Android: native call failed");
    if let Err(e) = env.throw_new(EXCEPTION_CLASS, err.to_string()) {
        tracing::error!(error = %e, "Android: could not raise exception");
    }
}

/// Return `result` to Java as a `String`, or throw and return null.
fn to_jstring(env: &mut JNIEnv, result: Result<String>) -> jstring {
    let result = result.and_then(|s| env.new_string(s).map_err(|e| jni_err("new_string", e)));
    match result {
        Ok(s) => s.into_raw(),
        Err(e) => {
            throw(env, &e);
            std::ptr::null_mut()
        }
    }
}

// ---------------------------------------------------------------------------
// Event delivery
// ---------------------------------------------------------------------------

/// Kotlin listener held as a global reference so it outlives the
/// `eventNotify` call frame.
struct JniEventCallback {
    vm: JavaVM,
    listener: GlobalRef,
}

impl EventCallback for JniEventCallback {
    fn on_event(&self, event: &str) {
        let mut env = match self.vm.attach_current_thread() {
            Ok(env) => env,
            Err(e) => {
                tracing::error!(error = %e, "Android: cannot attach thread for event");
                return;
            }
        };
        let j_event = match env.new_string(event) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Android: cannot allocate event string");
                return;
            }
        };
        if let Err(e) = env.call_method(
            self.listener.as_obj(),
            "onEvent",
            ON_EVENT_SIG,
            &[JValue::Object(&j_event)],
        ) {
            tracing::warn!(error = %e, "Android: listener onEvent failed");
            // A pending Java exception would poison the next JNI call.
            let _ = env.exception_clear();
        }
    }
}

// ---------------------------------------------------------------------------
// Exported natives
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "system" fn Java_opensource_pic2acg_Mobile_initApplication<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    data_path: JString<'local>,
) {
    let result = read_string(&mut env, &data_path, "dataPath")
        .and_then(|path| crate::shared().init_application(path));
    if let Err(e) = result {
        throw(&mut env, &e);
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_opensource_pic2acg_Mobile_flatInvoke<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    method: JString<'local>,
    params: JString<'local>,
) -> jstring {
    let reply = read_string(&mut env, &method, "method").and_then(|method| {
        let params = read_string(&mut env, &params, "params")?;
        crate::shared().flat_invoke(&method, &params)
    });
    to_jstring(&mut env, reply)
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_opensource_pic2acg_Mobile_eventNotify<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    listener: JObject<'local>,
) {
    if listener.is_null() {
        crate::shared().clear_event_callback();
        return;
    }
    let callback = env
        .get_java_vm()
        .map_err(|e| jni_err("get_java_vm", e))
        .and_then(|vm| {
            let listener = env
                .new_global_ref(&listener)
                .map_err(|e| jni_err("new_global_ref(listener)", e))?;
            Ok(JniEventCallback { vm, listener })
        });
    match callback {
        Ok(callback) => crate::shared().event_notify(std::sync::Arc::new(callback)),
        Err(e) => throw(&mut env, &e),
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_opensource_pic2acg_Mobile_dataLocal<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    files_dir: JString<'local>,
) -> jstring {
    let path = read_string(&mut env, &files_dir, "filesDir").map(|dir| {
        crate::shared()
            .data_local(dir)
            .to_string_lossy()
            .into_owned()
    });
    to_jstring(&mut env, path)
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_opensource_pic2acg_Mobile_migrate<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    files_dir: JString<'local>,
    target: JString<'local>,
) {
    let result = read_string(&mut env, &files_dir, "filesDir").and_then(|files_dir| {
        let target = read_string(&mut env, &target, "target")?;
        crate::shared().migrate(files_dir, target).map(drop)
    });
    if let Err(e) = result {
        throw(&mut env, &e);
    }
}
