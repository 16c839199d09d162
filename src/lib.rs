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

//! sensorsmonitor - hwmon temperature/power aggregator for status bars
//!
//! Reads amdgpu and k10temp sensors through the hwmon sysfs interface,
//! averages each family across all detected chips and publishes one text
//! line per reader over a named pipe in `$XDG_RUNTIME_DIR`.

pub mod aggregate;
pub mod channel;
pub mod classify;
pub mod config;
pub mod constants;
pub mod dump;
pub mod hwmon;
pub mod logger;
pub mod render;
pub mod sensors;
pub mod service;

#[cfg(test)]
pub mod test_utils;
