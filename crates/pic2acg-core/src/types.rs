// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wire types exchanged with the mobile shell.

use serde::{Deserialize, Serialize};

/// Value placed in [`InvokeRecord::result`] when no handler claims a method.
pub const RESULT_SUCCESS: &str = "success";

/// Reply returned by `flatInvoke` for methods without a registered handler.
///
/// Field order is the wire order: `method`, `params`, `result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeRecord {
    pub method: String,
    pub params: String,
    pub result: String,
}

impl InvokeRecord {
    /// Echo record for `method` called with `params`.
    pub fn success(method: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: params.into(),
            result: RESULT_SUCCESS.into(),
        }
    }
}

/// Params of `loadProperty`.
///
/// Both fields are optional on the wire: a missing `name` yields an empty
/// reply and a missing `defaultValue` defaults to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPropertyParams {
    pub name: Option<String>,
    pub default_value: Option<String>,
}

/// Params of `saveProperty`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavePropertyParams {
    pub name: Option<String>,
    pub value: Option<String>,
}

/// `{"success": bool}` acknowledgement used by mutating methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub const OK: Ack = Ack { success: true };
    pub const FAILED: Ack = Ack { success: false };
}

/// Property names persisted in the data directory.
pub mod keys {
    pub const SWITCH_ADDRESS: &str = "switchAddress";
    pub const IMAGE_SWITCH_ADDRESS: &str = "imageSwitchAddress";
    pub const USE_API_CLIENT_LOAD_IMAGE: &str = "useApiClientLoadImage";
    pub const PROXY: &str = "proxy";
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
}
