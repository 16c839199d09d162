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

//! Output line rendering
//!
//! Grammar of a published line:
//!
//! ```text
//! ["amdgpu " <int> "°C " <int> "W"] ["   "] ["Tdie " <int> "°C"] "\n"
//! ```
//!
//! A segment is present only if its family had at least one record; the
//! separator only if both are.

use std::fmt::Write;

use crate::aggregate::Aggregate;

const AMDGPU_TAG: &str = "amdgpu ";
const TDIE_TAG: &str = "Tdie ";
const DEGREES: &str = "°C";
const WATTS: &str = "W";
const SEPARATOR: &str = "   ";

/// Widest decimal i32, "-2147483648"
const MAX_INT_WIDTH: usize = 11;

/// Byte length of the longest line any aggregate can produce
pub const MAX_LINE_LEN: usize = AMDGPU_TAG.len()
    + MAX_INT_WIDTH
    + DEGREES.len()
    + 1
    + MAX_INT_WIDTH
    + WATTS.len()
    + SEPARATOR.len()
    + TDIE_TAG.len()
    + MAX_INT_WIDTH
    + DEGREES.len()
    + 1;

/// Render `agg` into one newline-terminated line
pub fn render(agg: &Aggregate) -> String {
    let mut line = String::with_capacity(MAX_LINE_LEN);

    if let Some(gpu) = agg.amdgpu {
        let _ = write!(
            line,
            "{AMDGPU_TAG}{}{DEGREES} {}{WATTS}",
            gpu.temp_c, gpu.power_w
        );
    }
    if agg.amdgpu.is_some() && agg.k10temp.is_some() {
        line.push_str(SEPARATOR);
    }
    if let Some(cpu) = agg.k10temp {
        let _ = write!(line, "{TDIE_TAG}{}{DEGREES}", cpu.tdie_c);
    }
    line.push('\n');

    debug_assert!(line.len() <= MAX_LINE_LEN);
    line
}
