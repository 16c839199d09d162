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

//! Constants and configuration defaults for sensorsmonitor
//!
//! Paths, the pipe name, timing and limits live here rather than as magic
//! numbers in the modules that use them.

/// System paths
pub mod paths {
    /// Base path for hwmon devices
    pub const HWMON_BASE: &str = "/sys/class/hwmon";

    /// Environment variable holding the per-user runtime directory
    pub const RUNTIME_DIR_ENV: &str = "XDG_RUNTIME_DIR";

    /// File name of the named pipe inside the runtime directory
    pub const PIPE_NAME: &str = "sensorsmonitor";
}

/// Named pipe settings
pub mod pipe {
    /// rw-r--r--
    pub const MODE: u32 = 0o644;
}

/// Polling cadence
pub mod timing {
    /// Seconds between the end of one publish and the next discovery pass
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
}

/// Bounds on the per-family record sequences
pub mod limits {
    /// Records kept per family before further chips are dropped
    pub const DEFAULT_MAX_PER_FAMILY: usize = 4;

    /// Upper bound accepted on the command line
    pub const MAX_PER_FAMILY_CEILING: u64 = 64;
}

/// Environment variables read at startup
pub mod env {
    /// tracing filter directive (trace, debug, info, warn, error)
    pub const LOG_FILTER: &str = "SENSORSMONITOR_LOG";

    pub const DEFAULT_LOG_FILTER: &str = "info";
}

/// hwmon attribute scaling, as applied by libsensors
pub mod scale {
    /// millidegrees, millivolts, milliamps, milli-percent
    pub const MILLI: f64 = 1_000.0;

    /// microwatts, microjoules
    pub const MICRO: f64 = 1_000_000.0;
}
