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

//! Command line and environment configuration

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use sm_error::ConfigError;

use crate::classify::Limits;
use crate::constants::{env, limits, paths, timing};

#[derive(Parser, Debug, Clone)]
#[command(name = "sensorsmonitor")]
#[command(version)]
#[command(about = "Publish GPU/CPU temperature and power over a named pipe")]
#[command(long_about = "sensorsmonitor - hwmon aggregator for status bars

Averages amdgpu temperature/power and k10temp Tdie across all detected chips
and writes one line per reader to $XDG_RUNTIME_DIR/sensorsmonitor:

    amdgpu 45°C 23W   Tdie 51°C

Writes block until a reader opens the pipe, e.g.
    cat $XDG_RUNTIME_DIR/sensorsmonitor

ENVIRONMENT VARIABLES:
    XDG_RUNTIME_DIR        Directory holding the named pipe (required)
    SENSORSMONITOR_LOG     Log filter (trace, debug, info, warn, error)")]
pub struct Cli {
    /// Seconds to sleep after each publish
    #[arg(
        short,
        long,
        value_name = "SECS",
        default_value_t = timing::DEFAULT_POLL_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,

    /// Chips kept per family; further chips are ignored
    #[arg(
        short = 'm',
        long = "max-chips",
        value_name = "N",
        default_value_t = limits::DEFAULT_MAX_PER_FAMILY as u64,
        value_parser = clap::value_parser!(u64).range(1..=limits::MAX_PER_FAMILY_CEILING)
    )]
    pub max_chips: u64,

    /// hwmon class directory to read sensors from
    #[arg(long, value_name = "DIR", default_value = paths::HWMON_BASE)]
    pub hwmon_root: PathBuf,

    /// Print every chip, feature and readable value, then exit
    #[arg(long, conflicts_with = "once")]
    pub dump: bool,

    /// Print a single rendered line to stdout instead of publishing
    #[arg(long)]
    pub once: bool,

    /// Remove the named pipe when terminated by SIGINT/SIGTERM
    #[arg(long)]
    pub remove_on_exit: bool,

    /// Append JSON event records to this file
    #[arg(long, value_name = "PATH")]
    pub event_log: Option<PathBuf>,

    /// Log to the systemd journal instead of stderr
    #[arg(long)]
    pub journald: bool,
}

/// What the process does after startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Publish,
    Dump,
    Once,
}

impl Cli {
    pub fn mode(&self) -> RunMode {
        if self.dump {
            RunMode::Dump
        } else if self.once {
            RunMode::Once
        } else {
            RunMode::Publish
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_per_family: self.max_chips as usize,
        }
    }
}

/// Runtime directory from the process environment
pub fn runtime_dir() -> Result<PathBuf, ConfigError> {
    runtime_dir_from(std::env::var_os(paths::RUNTIME_DIR_ENV))
}

/// Runtime directory from an environment value; unset or empty is an error
pub fn runtime_dir_from(value: Option<OsString>) -> Result<PathBuf, ConfigError> {
    match value {
        Some(v) if !v.is_empty() => Ok(PathBuf::from(v)),
        _ => Err(ConfigError::MissingEnv {
            var: paths::RUNTIME_DIR_ENV,
        }),
    }
}

/// tracing filter directive from the environment
pub fn log_filter() -> String {
    std::env::var(env::LOG_FILTER).unwrap_or_else(|_| env::DEFAULT_LOG_FILTER.to_string())
}
