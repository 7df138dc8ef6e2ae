// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The bindings facade called by the mobile shell.
//
// Three entry points cross into the host runtime: `init_application`,
// `flat_invoke` and `event_notify`. Every call is synchronous. The host may
// call from any thread, so facade state sits behind mutexes; no lock is held
// while a shell callback runs.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pic2acg_core::error::{Pic2acgError, Result};
use pic2acg_core::types::InvokeRecord;
use pic2acg_core::BridgeConfig;
use tracing::{debug, info, instrument};

use crate::data_dir;
use crate::dispatch::{InvokeContext, MethodRegistry};
use crate::events::EventHub;
use crate::properties::PropertyStore;
use crate::traits::EventCallback;

/// State established by [`Mobile::init_application`].
#[derive(Debug)]
pub(crate) struct AppState {
    pub(crate) data_dir: PathBuf,
    pub(crate) properties: PropertyStore,
}

/// Bindings facade.
#[derive(Debug)]
pub struct Mobile {
    config: BridgeConfig,
    registry: MethodRegistry,
    state: Mutex<Option<AppState>>,
    events: EventHub,
}

impl Default for Mobile {
    fn default() -> Self {
        Self::new()
    }
}

impl Mobile {
    /// Facade without handlers: `flat_invoke` echoes every call.
    pub fn new() -> Self {
        Self::with_registry(MethodRegistry::new(), BridgeConfig::default())
    }

    /// Facade answering the shell's property and account methods.
    pub fn with_builtin_methods() -> Self {
        Self::with_registry(MethodRegistry::builtin(), BridgeConfig::default())
    }

    pub fn with_registry(registry: MethodRegistry, config: BridgeConfig) -> Self {
        Self {
            config,
            registry,
            state: Mutex::new(None),
            events: EventHub::new(),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Ensure the data directory exists and load its properties.
    ///
    /// Parent directories are created as needed and calling this again with
    /// the same path is harmless. A later call with another path switches the
    /// facade to that directory.
    #[instrument(skip_all, fields(path = %data_path.as_ref().display()))]
    pub fn init_application(&self, data_path: impl AsRef<Path>) -> Result<()> {
        // Held across load and swap: no property write lands in between.
        let mut state = self.lock_state();
        *state = Some(self.open_state(data_path.as_ref())?);
        Ok(())
    }

    fn open_state(&self, data_dir: &Path) -> Result<AppState> {
        std::fs::create_dir_all(data_dir).map_err(|source| Pic2acgError::DataDir {
            path: data_dir.to_path_buf(),
            source,
        })?;

        let properties = PropertyStore::load(data_dir.join(&self.config.properties_file))?;
        info!(
            path = %data_dir.display(),
            properties = properties.len(),
            "application initialized"
        );
        Ok(AppState {
            data_dir: data_dir.to_path_buf(),
            properties,
        })
    }

    /// Active data directory, if initialized.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.lock_state().as_ref().map(|state| state.data_dir.clone())
    }

    /// Generic method call.
    ///
    /// A registered handler answers with its own reply. Any other method is
    /// answered with `{"method":…,"params":…,"result":"success"}`.
    #[instrument(skip(self, params), fields(params_len = params.len()))]
    pub fn flat_invoke(&self, method: &str, params: &str) -> Result<String> {
        match self.registry.get(method) {
            Some(handler) => {
                let mut ctx = InvokeContext::new(&self.state);
                handler.invoke(&mut ctx, params)
            }
            None => {
                debug!("no handler, echoing call");
                Ok(serde_json::to_string(&InvokeRecord::success(method, params))?)
            }
        }
    }

    /// Keep `callback` for later event delivery. It is not invoked here.
    pub fn event_notify(&self, callback: Arc<dyn EventCallback>) {
        self.events.set(callback);
        info!("event notify callback set");
    }

    /// Closure-friendly form of [`event_notify`](Self::event_notify).
    pub fn event_notify_fn<F>(&self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_notify(Arc::new(callback));
    }

    /// Deliver `event` to the shell. Returns `false` when no callback is set.
    pub fn send_event(&self, event: &str) -> bool {
        self.events.emit(event)
    }

    /// Forget the shell callback. Returns whether one was set.
    pub fn clear_event_callback(&self) -> bool {
        self.events.clear()
    }

    /// Data directory the shell should pass to `init_application`, given the
    /// host's private files directory.
    pub fn data_local(&self, files_dir: impl AsRef<Path>) -> PathBuf {
        data_dir::current_data_dir(files_dir.as_ref(), &self.config.data_pointer_file)
    }

    /// Relocate the data directory to `target`.
    ///
    /// When the facade was initialized on the directory being moved, it is
    /// re-initialized on `target` so subsequent calls see the moved data.
    /// Property access from other threads waits until the move is done. If
    /// the moved data cannot be reopened, the facade becomes uninitialized.
    pub fn migrate(&self, files_dir: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<PathBuf> {
        let files_dir = files_dir.as_ref();
        let mut state = self.lock_state();
        let previous = self.data_local(files_dir);
        let moved_to =
            data_dir::migrate_data_dir(files_dir, &self.config.data_pointer_file, target)?;

        if let Some(active) = state.as_ref().filter(|active| active.data_dir == previous) {
            debug!(from = %active.properties.path().display(), "reopening moved properties");
            *state = None;
            *state = Some(self.open_state(&moved_to)?);
        }
        Ok(moved_to)
    }

    fn lock_state(&self) -> MutexGuard<'_, Option<AppState>> {
        lock_state(&self.state)
    }
}

/// Lock facade state, recovering from a panic in another holder.
pub(crate) fn lock_state(state: &Mutex<Option<AppState>>) -> MutexGuard<'_, Option<AppState>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, OnceLock};
    use std::thread;
    use std::time::Duration;

    use serde_json::{json, Value};

    use super::*;

    fn decode(reply: &str) -> Value {
        serde_json::from_str(reply).expect("reply must be JSON")
    }

    #[test]
    fn init_creates_nested_directory() {
        let root = tempfile::tempdir().expect("tempdir");
        let path = root.path().join("a/b/c");

        let mobile = Mobile::new();
        mobile.init_application(&path).expect("init");
        assert!(path.is_dir());
        assert_eq!(mobile.data_dir(), Some(path));
    }

    #[test]
    fn init_is_idempotent() {
        let root = tempfile::tempdir().expect("tempdir");
        let mobile = Mobile::new();
        mobile.init_application(root.path()).expect("first init");
        mobile.init_application(root.path()).expect("second init");
        assert!(root.path().is_dir());
    }

    #[test]
    fn init_reports_io_cause() {
        let root = tempfile::tempdir().expect("tempdir");
        let file = root.path().join("occupied");
        std::fs::write(&file, "not a dir").expect("write");

        let err = Mobile::new()
            .init_application(file.join("data"))
            .unwrap_err();
        match err {
            Pic2acgError::DataDir { path, .. } => assert_eq!(path, file.join("data")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn flat_invoke_echoes() {
        let mobile = Mobile::new();
        let reply = mobile.flat_invoke("foo", "bar").expect("invoke");
        assert_eq!(
            decode(&reply),
            json!({ "method": "foo", "params": "bar", "result": "success" })
        );
    }

    #[test]
    fn flat_invoke_echoes_awkward_strings() {
        let mobile = Mobile::new();
        for (method, params) in [
            ("", ""),
            ("with \"quotes\"", "{\"json\":[1,2]}"),
            ("unicode ✓", "line\nbreak\t\u{0}"),
        ] {
            let reply = mobile.flat_invoke(method, params).expect("invoke");
            assert_eq!(
                decode(&reply),
                json!({ "method": method, "params": params, "result": "success" })
            );
        }
    }

    #[test]
    fn flat_invoke_echo_needs_no_init() {
        let mobile = Mobile::with_builtin_methods();
        let reply = mobile.flat_invoke("androidGetVersion", "").expect("invoke");
        assert_eq!(decode(&reply)["result"], "success");
    }

    #[test]
    fn event_notify_does_not_invoke_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mobile = Mobile::new();
        mobile.event_notify_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(mobile.send_event("hello"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(mobile.clear_event_callback());
        assert!(!mobile.send_event("dropped"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn property_methods_require_init() {
        let mobile = Mobile::with_builtin_methods();
        let err = mobile.flat_invoke("getProxy", "").unwrap_err();
        assert!(matches!(err, Pic2acgError::NotInitialized));
    }

    #[test]
    fn properties_round_trip_through_flat_invoke() {
        let root = tempfile::tempdir().expect("tempdir");
        let mobile = Mobile::with_builtin_methods();
        mobile.init_application(root.path()).expect("init");

        let saved = mobile
            .flat_invoke("saveProperty", r#"{"name":"theme","value":"dark"}"#)
            .expect("save");
        assert_eq!(decode(&saved), json!({ "success": true }));

        let loaded = mobile
            .flat_invoke("loadProperty", r#"{"name":"theme","defaultValue":"light"}"#)
            .expect("load");
        assert_eq!(loaded, "dark");

        let fallback = mobile
            .flat_invoke("loadProperty", r#"{"name":"missing","defaultValue":"light"}"#)
            .expect("load");
        assert_eq!(fallback, "light");

        let nameless = mobile.flat_invoke("loadProperty", "{}").expect("load");
        assert_eq!(nameless, "");
    }

    #[test]
    fn save_property_without_value_fails_softly() {
        let root = tempfile::tempdir().expect("tempdir");
        let mobile = Mobile::with_builtin_methods();
        mobile.init_application(root.path()).expect("init");

        let reply = mobile
            .flat_invoke("saveProperty", r#"{"name":"theme"}"#)
            .expect("save");
        assert_eq!(decode(&reply), json!({ "success": false }));
    }

    #[test]
    fn malformed_params_are_rejected() {
        let root = tempfile::tempdir().expect("tempdir");
        let mobile = Mobile::with_builtin_methods();
        mobile.init_application(root.path()).expect("init");

        let err = mobile.flat_invoke("loadProperty", "not json").unwrap_err();
        assert!(matches!(err, Pic2acgError::InvalidParams { .. }));
    }

    #[test]
    fn simple_properties_have_defaults() {
        let root = tempfile::tempdir().expect("tempdir");
        let mobile = Mobile::with_builtin_methods();
        mobile.init_application(root.path()).expect("init");

        assert_eq!(mobile.flat_invoke("getSwitchAddress", "").expect("get"), "");
        assert_eq!(
            mobile.flat_invoke("getUseApiClientLoadImage", "").expect("get"),
            "false"
        );

        mobile.flat_invoke("setSwitchAddress", "3").expect("set");
        mobile.flat_invoke("setUseApiClientLoadImage", "true").expect("set");
        assert_eq!(mobile.flat_invoke("getSwitchAddress", "").expect("get"), "3");
        assert_eq!(
            mobile.flat_invoke("getUseApiClientLoadImage", "").expect("get"),
            "true"
        );
    }

    #[test]
    fn properties_persist_across_instances() {
        let root = tempfile::tempdir().expect("tempdir");

        let first = Mobile::with_builtin_methods();
        first.init_application(root.path()).expect("init");
        first.flat_invoke("setProxy", "http://proxy:8080").expect("set");

        let second = Mobile::with_builtin_methods();
        second.init_application(root.path()).expect("init");
        assert_eq!(
            second.flat_invoke("getProxy", "").expect("get"),
            "http://proxy:8080"
        );
    }

    #[test]
    fn login_flow() {
        let root = tempfile::tempdir().expect("tempdir");
        let mobile = Mobile::with_builtin_methods();
        mobile.init_application(root.path()).expect("init");

        assert_eq!(mobile.flat_invoke("preLogin", "").expect("preLogin"), "false");

        mobile.flat_invoke("setUsername", "reader").expect("set");
        assert_eq!(mobile.flat_invoke("preLogin", "").expect("preLogin"), "false");

        mobile.flat_invoke("setPassword", "hunter2").expect("set");
        assert_eq!(mobile.flat_invoke("preLogin", "").expect("preLogin"), "true");
        assert_eq!(
            decode(&mobile.flat_invoke("login", "").expect("login")),
            json!({ "success": true })
        );

        mobile.flat_invoke("clearToken", "").expect("clearToken");
        assert_eq!(mobile.flat_invoke("getUsername", "").expect("get"), "");
        assert_eq!(mobile.flat_invoke("getPassword", "").expect("get"), "");
        assert_eq!(mobile.flat_invoke("preLogin", "").expect("preLogin"), "false");
    }

    #[test]
    fn data_local_reports_active_dir() {
        let root = tempfile::tempdir().expect("tempdir");
        let mobile = Mobile::with_builtin_methods();
        mobile.init_application(root.path()).expect("init");

        let reply = mobile.flat_invoke("dataLocal", "").expect("dataLocal");
        assert_eq!(Path::new(&reply), root.path());
    }

    #[test]
    fn migrate_reinitializes_active_dir() {
        let files = tempfile::tempdir().expect("tempdir");
        let external = tempfile::tempdir().expect("tempdir");
        let target = external.path().join("moved");

        let mobile = Mobile::with_builtin_methods();
        let data = mobile.data_local(files.path());
        mobile.init_application(&data).expect("init");
        mobile.flat_invoke("setProxy", "kept").expect("set");

        let moved = mobile.migrate(files.path(), &target).expect("migrate");
        assert_eq!(moved, target);
        assert_eq!(mobile.data_dir(), Some(target.clone()));
        assert_eq!(mobile.data_local(files.path()), target);
        assert_eq!(mobile.flat_invoke("getProxy", "").expect("get"), "kept");
    }

    #[test]
    fn handlers_may_call_back_into_facade() {
        static FACADE: OnceLock<Mobile> = OnceLock::new();
        let root = tempfile::tempdir().expect("tempdir");

        let mobile = FACADE.get_or_init(|| {
            let mut registry = MethodRegistry::builtin();
            registry.register_fn("whereAmI", |ctx, _params| {
                let facade = FACADE.get().expect("facade");
                let dir = ctx.data_dir()?;
                assert_eq!(facade.data_dir(), Some(dir.clone()));
                let proxy = facade.flat_invoke("getProxy", "")?;
                facade.send_event(&format!("{}|{proxy}", dir.display()));
                Ok(proxy)
            });
            Mobile::with_registry(registry, BridgeConfig::default())
        });
        mobile.init_application(root.path()).expect("init");
        mobile.flat_invoke("setProxy", "http://p").expect("set");

        let (events_tx, events_rx) = mpsc::channel();
        let events_tx = Mutex::new(events_tx);
        mobile.event_notify_fn(move |event| {
            // The shell answers events by calling back in.
            let local = FACADE.get().expect("facade").flat_invoke("dataLocal", "");
            let _ = events_tx.lock().unwrap().send((event.to_owned(), local.ok()));
        });

        let (done_tx, done_rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = done_tx.send(FACADE.get().expect("facade").flat_invoke("whereAmI", ""));
        });
        let reply = done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("re-entrant handler must not deadlock")
            .expect("invoke");
        assert_eq!(reply, "http://p");

        let (event, local) = events_rx.recv_timeout(Duration::from_secs(5)).expect("event");
        assert_eq!(event, format!("{}|http://p", root.path().display()));
        assert_eq!(local.as_deref().map(Path::new), Some(root.path()));
    }

    #[test]
    fn concurrent_calls_from_many_threads() {
        let root = tempfile::tempdir().expect("tempdir");
        let mobile = Arc::new(Mobile::with_builtin_methods());
        mobile.init_application(root.path()).expect("init");

        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&delivered);
        mobile.event_notify_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let workers: Vec<_> = (0..8)
            .map(|worker| {
                let mobile = Arc::clone(&mobile);
                let root = root.path().to_path_buf();
                thread::spawn(move || {
                    for i in 0..25 {
                        mobile.init_application(&root).expect("init");
                        let name = format!("w{worker}");
                        let save = json!({ "name": name, "value": i.to_string() }).to_string();
                        mobile.flat_invoke("saveProperty", &save).expect("save");
                        let echo = mobile.flat_invoke("echo", &name).expect("echo");
                        assert_eq!(serde_json::from_str::<Value>(&echo).expect("json")["params"], name);
                        assert!(mobile.send_event(&name));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker panicked");
        }

        assert_eq!(delivered.load(Ordering::SeqCst), 8 * 25);
        let reopened = Mobile::with_builtin_methods();
        reopened.init_application(root.path()).expect("init");
        for worker in 0..8 {
            let load = json!({ "name": format!("w{worker}") }).to_string();
            assert_eq!(reopened.flat_invoke("loadProperty", &load).expect("load"), "24");
        }
    }

    #[test]
    fn writes_during_migration_are_not_lost() {
        let files = tempfile::tempdir().expect("tempdir");
        let external = tempfile::tempdir().expect("tempdir");
        let target = external.path().join("moved");

        let mobile = Arc::new(Mobile::with_builtin_methods());
        mobile.init_application(files.path()).expect("init");
        for i in 0..50 {
            std::fs::write(files.path().join(format!("page-{i}.jpg")), b"jpg").expect("write");
        }

        let writer = {
            let mobile = Arc::clone(&mobile);
            thread::spawn(move || {
                for i in 0..200 {
                    mobile.flat_invoke("setProxy", &format!("p{i}")).expect("set");
                }
            })
        };
        mobile.migrate(files.path(), &target).expect("migrate");
        writer.join().expect("writer panicked");

        assert_eq!(mobile.flat_invoke("getProxy", "").expect("get"), "p199");
        assert!(
            !files.path().join("properties.json").exists(),
            "no writes may land in the old directory"
        );
        let reopened = Mobile::with_builtin_methods();
        reopened.init_application(&target).expect("init");
        assert_eq!(reopened.flat_invoke("getProxy", "").expect("get"), "p199");
    }
}
