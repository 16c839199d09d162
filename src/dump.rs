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

//! `--dump`: list every chip, feature and readable value the backend sees

use std::io::Write;

use anyhow::{Context, Result};
use tracing::error;

use crate::sensors::SensorBackend;

/// Write the inventory of `backend` to `out`.
///
/// Chips are numbered from 1. A feature whose label cannot be read is
/// reported on the log and left out. Value failures are returned as
/// [`sm_error::BackendError`] inside the `anyhow` chain so callers can recover the
/// exit code.
pub fn dump<B, W>(backend: &B, out: &mut W) -> Result<()>
where
    B: SensorBackend + ?Sized,
    W: Write,
{
    for chip in backend.chips() {
        writeln!(out, "{} {} {}", chip.id + 1, chip.prefix, chip.path.display())
            .context("write dump")?;
        writeln!(out, "  adapter={}", chip.adapter).context("write dump")?;

        for feature in backend.features(&chip) {
            let label = match backend.label(&chip, &feature) {
                Ok(label) => label,
                Err(e) => {
                    error!("{}", e);
                    continue;
                }
            };
            writeln!(out, "    label={}", label).context("write dump")?;

            for sub in backend.readable_subfeatures(&chip, &feature) {
                let value = backend.read_value(&chip, &sub)?;
                writeln!(out, "        {}={:.6}", sub.name, value).context("write dump")?;
            }
        }
    }
    Ok(())
}
