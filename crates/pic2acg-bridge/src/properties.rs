// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persistent key/value properties stored as a flat JSON object in the data
// directory.
//
// The whole map is rewritten after every mutation. Writes go to a sibling
// `.tmp` file first and are then renamed over the original so an interrupted
// write never leaves a truncated file behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pic2acg_core::error::Result;
use tracing::{debug, instrument, warn};

/// Name → value properties backed by a JSON file.
#[derive(Debug)]
pub struct PropertyStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl PropertyStore {
    /// Load the store from `path`.
    ///
    /// A missing file yields an empty store. A file that is not a JSON
    /// object of strings is logged and ignored; it is replaced on the next
    /// write.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                Ok(values) => values,
                Err(e) => {
                    warn!(error = %e, "ignoring unreadable properties file");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(count = values.len(), "properties loaded");
        Ok(Self { path, values })
    }

    /// File backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Value of `name`, or `default` when unset.
    pub fn get_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or(default).to_owned()
    }

    /// Set `name` to `value` and persist. On error the store is unchanged.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let mut values = self.values.clone();
        values.insert(name.into(), value.into());
        self.commit(values)
    }

    /// Remove every name in `names` and persist once. Returns how many
    /// entries were actually present. On error the store is unchanged.
    pub fn remove_all(&mut self, names: &[&str]) -> Result<usize> {
        let mut values = self.values.clone();
        let removed = names
            .iter()
            .filter(|name| values.remove(**name).is_some())
            .count();
        self.commit(values)?;
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Write `values` to disk, then adopt them as the in-memory state.
    fn commit(&mut self, values: BTreeMap<String, String>) -> Result<()> {
        let content = serde_json::to_string(&values)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), count = values.len(), "properties saved");
        self.values = values;
        Ok(())
    }
}
