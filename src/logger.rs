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

//! Optional JSON-lines event log (`--event-log PATH`)

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;
use serde_json::{json, Value};

lazy_static! {
    static ref LOG_FILE: Mutex<Option<File>> = Mutex::new(None);
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Open `path` for appending and route subsequent events to it
pub fn init_logging(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some(file);
    }
    Ok(())
}

/// Append one event record. Does nothing until [`init_logging`] succeeded.
pub fn log_event(event: &str, data: Value) {
    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(f) = guard.as_mut() {
            let line = json!({
                "ts_ms": now_millis(),
                "event": event,
                "data": data,
            });
            let _ = writeln!(f, "{}", line);
        }
    }
}

/// Stop writing events and close the log file
pub fn close_logging() {
    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = None;
    }
}
