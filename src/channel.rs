/*
 * This file is part of sensorsmonitor.
 *
 * Copyright (C) 2025 sensorsmonitor contributors
 *
 * sensorsmonitor is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * sensorsmonitor is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with sensorsmonitor. If not, see <https://www.gnu.org/licenses/>.
 */

//! Publication channel
//!
//! The channel is a named pipe. At startup an existing FIFO is adopted
//! untouched so running consumers keep working; anything else at the path
//! is removed and replaced. Every publish opens the pipe for writing, which
//! blocks until a reader opens the other end, writes one line and closes.

use std::ffi::CString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::json;
use sm_error::ChannelError;
use tracing::{debug, info, warn};

use crate::constants::{paths, pipe};
use crate::logger::log_event;

/// What sits at the channel path at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    Absent,
    WrongKind,
    ReadyAsPipe,
}

/// Channel path inside the runtime directory
pub fn channel_path(runtime_dir: &Path) -> PathBuf {
    runtime_dir.join(paths::PIPE_NAME)
}

/// Inspect `path`, following symlinks.
///
/// Errors other than "not found" are reported as `Absent`; creating the pipe
/// will then fail with the real cause.
pub fn probe(path: &Path) -> ChannelState {
    match fs::metadata(path) {
        Ok(meta) if meta.file_type().is_fifo() => ChannelState::ReadyAsPipe,
        Ok(_) => ChannelState::WrongKind,
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                debug!("stat {:?} failed: {}", path, e);
            }
            ChannelState::Absent
        }
    }
}

/// A named pipe ready for publishing
#[derive(Debug)]
pub struct Channel {
    path: PathBuf,
    initial_state: ChannelState,
}

impl Channel {
    /// Make sure a FIFO exists at `path`, reusing one that is already there
    pub fn establish(path: PathBuf) -> Result<Self, ChannelError> {
        let initial_state = probe(&path);
        match initial_state {
            ChannelState::ReadyAsPipe => {
                info!("Reusing existing named pipe {:?}", path);
                return Ok(Self { path, initial_state });
            }
            ChannelState::WrongKind => {
                warn!("{:?} exists but is not a named pipe, removing it", path);
                remove_any(&path).map_err(|source| ChannelError::Remove {
                    path: path.clone(),
                    source,
                })?;
            }
            ChannelState::Absent => {}
        }

        create_fifo(&path, pipe::MODE).map_err(|source| ChannelError::Create {
            path: path.clone(),
            source,
        })?;
        info!("Created named pipe {:?}", path);
        Ok(Self { path, initial_state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// What was found at the path before the channel was established
    pub fn initial_state(&self) -> ChannelState {
        self.initial_state
    }

    /// Write `line` to the next reader.
    ///
    /// Blocks in `open` until a reader attaches; there is no timeout.
    pub fn publish(&self, line: &str) -> Result<(), ChannelError> {
        debug!("Waiting for a reader on {:?}", self.path);
        let mut pipe = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|source| ChannelError::OpenForWrite {
                path: self.path.clone(),
                source,
            })?;
        pipe.write_all(line.as_bytes())
            .map_err(|source| ChannelError::Write {
                path: self.path.clone(),
                source,
            })?;
        debug!(bytes = line.len(), "Published line");
        Ok(())
    }

    /// Delete the pipe from the filesystem
    pub fn remove(&self) -> io::Result<()> {
        fs::remove_file(&self.path)
    }
}

/// Termination cleanup: record the signal and, if asked, delete the pipe.
///
/// Returns whether the pipe was removed.
pub fn cleanup_on_signal(path: &Path, remove_on_exit: bool) -> bool {
    info!("SIGNAL: Received SIGINT/SIGTERM - shutting down");
    log_event("signal", json!({ "remove_on_exit": remove_on_exit }));
    if !remove_on_exit {
        return false;
    }
    match fs::remove_file(path) {
        Ok(()) => {
            info!("Removed named pipe {:?}", path);
            true
        }
        Err(e) => {
            warn!("Could not remove {:?}: {}", path, e);
            false
        }
    }
}

/// Remove a file or an empty directory
fn remove_any(path: &Path) -> io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    }
}

fn create_fifo(path: &Path, mode: u32) -> io::Result<()> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte"))?;
    // SAFETY: c_path is a valid NUL-terminated string that outlives the call.
    if unsafe { libc::mkfifo(c_path.as_ptr(), mode as libc::mode_t) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
