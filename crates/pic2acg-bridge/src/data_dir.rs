// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution and migration.
//
// The host's private files directory is the default data location. The user
// may relocate the data (e.g. to external storage); the new location is then
// recorded in a pointer file inside the files directory.

use std::path::{Path, PathBuf};

use pic2acg_core::error::{Pic2acgError, Result};
use tracing::{debug, info, instrument, warn};

/// Resolve the active data directory.
///
/// Returns the path named by `files_dir/<pointer_file>` when that file exists
/// and names an existing directory, otherwise `files_dir` itself.
pub fn current_data_dir(files_dir: &Path, pointer_file: &str) -> PathBuf {
    let pointer = files_dir.join(pointer_file);
    match std::fs::read_to_string(&pointer) {
        Ok(content) => {
            let target = PathBuf::from(content.trim_end_matches(['\r', '\n']));
            if target.is_dir() {
                return target;
            }
            warn!(target = %target.display(), "data pointer names a missing directory");
            files_dir.to_path_buf()
        }
        Err(_) => files_dir.to_path_buf(),
    }
}

/// Move all data from the active data directory into `target`.
///
/// Any existing content of `target` is removed first. Afterwards the pointer
/// file names `target`, or is deleted when `target` is `files_dir`. Returns
/// the new data directory.
#[instrument(skip_all, fields(files_dir = %files_dir.display(), target = %target.as_ref().display()))]
pub fn migrate_data_dir(
    files_dir: &Path,
    pointer_file: &str,
    target: impl AsRef<Path>,
) -> Result<PathBuf> {
    let target = target.as_ref().to_path_buf();
    let current = current_data_dir(files_dir, pointer_file);
    if current == target {
        debug!("data already at target");
        return Ok(target);
    }
    if target.starts_with(&current) || current.starts_with(&target) {
        return Err(Pic2acgError::Migration(format!(
            "{} and the current data directory {} overlap",
            target.display(),
            current.display()
        )));
    }

    remove_if_exists(&current.join(pointer_file))?;

    if target.exists() {
        for entry in std::fs::read_dir(&target)? {
            remove_path(&entry?.path())?;
        }
    } else {
        std::fs::create_dir_all(&target).map_err(|source| Pic2acgError::DataDir {
            path: target.clone(),
            source,
        })?;
    }

    let mut moved = 0usize;
    for entry in std::fs::read_dir(&current)? {
        let entry = entry?;
        move_path(&entry.path(), &target.join(entry.file_name()))?;
        moved += 1;
    }

    let pointer = files_dir.join(pointer_file);
    if target == files_dir {
        remove_if_exists(&pointer)?;
    } else {
        std::fs::write(&pointer, target.to_string_lossy().as_bytes())?;
    }

    info!(moved, "data directory migrated");
    Ok(target)
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

fn remove_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)?;
    } else {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

/// Rename `from` to `to`, copying when a rename is not possible (e.g.
/// across filesystems).
fn move_path(from: &Path, to: &Path) -> Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    debug!(from = %from.display(), "rename failed, copying");
    copy_then_remove(from, to)
}

/// Recursively copy `from` to `to`, deleting each source entry once it has
/// been copied.
fn copy_then_remove(from: &Path, to: &Path) -> Result<()> {
    if from.is_dir() {
        std::fs::create_dir_all(to)?;
        for entry in std::fs::read_dir(from)? {
            let entry = entry?;
            copy_then_remove(&entry.path(), &to.join(entry.file_name()))?;
        }
        std::fs::remove_dir(from)?;
    } else {
        std::fs::copy(from, to)?;
        std::fs::remove_file(from)?;
    }
    Ok(())
}
