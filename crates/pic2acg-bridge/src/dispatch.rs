// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Flat method dispatch.
//
// The shell funnels every native call through `flatInvoke(method, params)`.
// This module maps method names to handlers. Methods without a handler are
// answered by the facade with the echo record, so an empty registry gives the
// plain echo behaviour.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use pic2acg_core::error::{Pic2acgError, Result};
use pic2acg_core::types::{keys, Ack, LoadPropertyParams, SavePropertyParams};

use crate::mobile::{lock_state, AppState};
use crate::properties::PropertyStore;
use crate::traits::MethodHandler;

/// Access to facade state for the duration of one handler call.
///
/// The state lock is taken per access and released before the accessor
/// returns, so a handler may call back into the facade between accesses.
pub struct InvokeContext<'a> {
    state: &'a Mutex<Option<AppState>>,
}

impl<'a> InvokeContext<'a> {
    pub(crate) fn new(state: &'a Mutex<Option<AppState>>) -> Self {
        Self { state }
    }

    /// Run `f` on the property store of the active data directory.
    ///
    /// The state lock is held while `f` runs; `f` must not call back into
    /// the facade.
    pub fn with_properties<T>(
        &mut self,
        f: impl FnOnce(&mut PropertyStore) -> Result<T>,
    ) -> Result<T> {
        let mut state = lock_state(self.state);
        let state = state.as_mut().ok_or(Pic2acgError::NotInitialized)?;
        f(&mut state.properties)
    }

    /// Active data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        lock_state(self.state)
            .as_ref()
            .map(|state| state.data_dir.clone())
            .ok_or(Pic2acgError::NotInitialized)
    }
}

/// Method name → handler table.
#[derive(Default)]
pub struct MethodRegistry {
    handlers: HashMap<String, Box<dyn MethodHandler>>,
}

impl MethodRegistry {
    /// Empty table: every method is answered with the echo record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the application's property, account and data-location
    /// methods.
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        registry.register("loadProperty", load_property);
        registry.register("saveProperty", save_property);

        for (getter, setter, key, default) in [
            ("getSwitchAddress", "setSwitchAddress", keys::SWITCH_ADDRESS, ""),
            ("getImageSwitchAddress", "setImageSwitchAddress", keys::IMAGE_SWITCH_ADDRESS, ""),
            (
                "getUseApiClientLoadImage",
                "setUseApiClientLoadImage",
                keys::USE_API_CLIENT_LOAD_IMAGE,
                "false",
            ),
            ("getProxy", "setProxy", keys::PROXY, ""),
            ("getUsername", "setUsername", keys::USERNAME, ""),
            ("getPassword", "setPassword", keys::PASSWORD, ""),
        ] {
            registry.register(getter, GetProperty { key, default });
            registry.register(setter, SetProperty { key });
        }

        registry.register("preLogin", pre_login);
        registry.register("login", acknowledge);
        registry.register("register", acknowledge);
        registry.register("clearToken", clear_token);
        registry.register("dataLocal", data_local);
        registry
    }

    /// Register `handler` under `method`, replacing an existing entry.
    pub fn register<H>(&mut self, method: impl Into<String>, handler: H)
    where
        H: MethodHandler + 'static,
    {
        self.handlers.insert(method.into(), Box::new(handler));
    }

    /// Closure-friendly form of [`register`](Self::register).
    pub fn register_fn<F>(&mut self, method: impl Into<String>, handler: F)
    where
        F: Fn(&mut InvokeContext<'_>, &str) -> Result<String> + Send + Sync + 'static,
    {
        self.register(method, handler);
    }

    pub fn get(&self, method: &str) -> Option<&dyn MethodHandler> {
        self.handlers.get(method).map(Box::as_ref)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Built-in handlers
// ---------------------------------------------------------------------------

/// Reads a single property, falling back to a fixed default.
struct GetProperty {
    key: &'static str,
    default: &'static str,
}

impl MethodHandler for GetProperty {
    fn invoke(&self, ctx: &mut InvokeContext<'_>, _params: &str) -> Result<String> {
        ctx.with_properties(|store| Ok(store.get_or(self.key, self.default)))
    }
}

/// Stores the raw params string as a single property.
struct SetProperty {
    key: &'static str,
}

impl MethodHandler for SetProperty {
    fn invoke(&self, ctx: &mut InvokeContext<'_>, params: &str) -> Result<String> {
        ctx.with_properties(|store| store.set(self.key, params))?;
        ack(Ack::OK)
    }
}

fn ack(ack: Ack) -> Result<String> {
    Ok(serde_json::to_string(&ack)?)
}

fn parse_params<T>(method: &str, params: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(params).map_err(|e| Pic2acgError::InvalidParams {
        method: method.to_owned(),
        reason: e.to_string(),
    })
}

fn load_property(ctx: &mut InvokeContext<'_>, params: &str) -> Result<String> {
    ctx.with_properties(|store| {
        let params: LoadPropertyParams = parse_params("loadProperty", params)?;
        let Some(name) = params.name else {
            return Ok(String::new());
        };
        Ok(store.get_or(&name, params.default_value.as_deref().unwrap_or("")))
    })
}

fn save_property(ctx: &mut InvokeContext<'_>, params: &str) -> Result<String> {
    ctx.with_properties(|store| {
        let params: SavePropertyParams = parse_params("saveProperty", params)?;
        match (params.name, params.value) {
            (Some(name), Some(value)) => {
                store.set(name, value)?;
                ack(Ack::OK)
            }
            _ => ack(Ack::FAILED),
        }
    })
}

fn pre_login(ctx: &mut InvokeContext<'_>, _params: &str) -> Result<String> {
    ctx.with_properties(|store| {
        let has_credentials = [keys::USERNAME, keys::PASSWORD]
            .iter()
            .all(|key| store.get(key).is_some_and(|value| !value.is_empty()));
        Ok(has_credentials.to_string())
    })
}

/// Account operations are settled by the remote API client, not here.
fn acknowledge(_ctx: &mut InvokeContext<'_>, _params: &str) -> Result<String> {
    ack(Ack::OK)
}

fn clear_token(ctx: &mut InvokeContext<'_>, _params: &str) -> Result<String> {
    ctx.with_properties(|store| store.remove_all(&[keys::USERNAME, keys::PASSWORD]))?;
    ack(Ack::OK)
}

fn data_local(ctx: &mut InvokeContext<'_>, _params: &str) -> Result<String> {
    Ok(ctx.data_dir()?.to_string_lossy().into_owned())
}
