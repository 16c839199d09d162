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

//! Discovery and classification
//!
//! Walks every chip the backend reports, keeps the ones whose driver belongs
//! to a known [`Family`], and routes each reading into that chip's record
//! through the ordered [`RULES`] table. Routing is keyed on
//! `(family, subfeature kind, label)`, so supporting another chip family means
//! adding a record variant and a few rules.

use sm_error::BackendError;
use tracing::{debug, trace, warn};

use crate::constants::limits;
use crate::sensors::{Reading, SensorBackend, SubfeatureKind};

/// Chip families we aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// AMD GPUs
    Amdgpu,
    /// AMD family 10h+ CPU die sensor
    K10temp,
}

impl Family {
    pub const ALL: [Family; 2] = [Family::Amdgpu, Family::K10temp];

    /// Driver name as reported by the chip
    pub fn prefix(self) -> &'static str {
        match self {
            Family::Amdgpu => "amdgpu",
            Family::K10temp => "k10temp",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Family> {
        Family::ALL.into_iter().find(|f| f.prefix() == prefix)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AmdgpuRecord {
    /// degrees C
    pub temp_input: f64,
    /// watts
    pub power_average: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct K10TempRecord {
    /// degrees C
    pub tdie: f64,
}

/// The readings of one classified chip
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FamilyRecord {
    Amdgpu(AmdgpuRecord),
    K10temp(K10TempRecord),
}

impl FamilyRecord {
    /// Zero-valued record for `family`
    pub fn new(family: Family) -> Self {
        match family {
            Family::Amdgpu => FamilyRecord::Amdgpu(AmdgpuRecord::default()),
            Family::K10temp => FamilyRecord::K10temp(K10TempRecord::default()),
        }
    }

    pub fn family(&self) -> Family {
        match self {
            FamilyRecord::Amdgpu(_) => Family::Amdgpu,
            FamilyRecord::K10temp(_) => Family::K10temp,
        }
    }

    /// Store `value` in `field`. Returns false if the field belongs to another family.
    pub fn set(&mut self, field: Field, value: f64) -> bool {
        match (self, field) {
            (FamilyRecord::Amdgpu(r), Field::AmdgpuTempInput) => r.temp_input = value,
            (FamilyRecord::Amdgpu(r), Field::AmdgpuPowerAverage) => r.power_average = value,
            (FamilyRecord::K10temp(r), Field::K10Tdie) => r.tdie = value,
            _ => return false,
        }
        true
    }
}

/// A record field a reading can be routed into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    AmdgpuTempInput,
    AmdgpuPowerAverage,
    K10Tdie,
}

impl Field {
    pub fn family(self) -> Family {
        match self {
            Field::AmdgpuTempInput | Field::AmdgpuPowerAverage => Family::Amdgpu,
            Field::K10Tdie => Family::K10temp,
        }
    }
}

/// Predicate on a feature label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMatch {
    Any,
    Exactly(&'static str),
}

impl LabelMatch {
    pub fn matches(self, label: &str) -> bool {
        match self {
            LabelMatch::Any => true,
            LabelMatch::Exactly(want) => label == want,
        }
    }
}

/// `(family, kind, label) -> field`
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub family: Family,
    pub kind: SubfeatureKind,
    pub label: LabelMatch,
    pub field: Field,
}

/// Routing table, evaluated in order; the first match wins.
///
/// k10temp only trusts "Tdie": "Tctl" carries a +27°C offset on some parts.
pub const RULES: &[Rule] = &[
    Rule {
        family: Family::Amdgpu,
        kind: SubfeatureKind::TEMP_INPUT,
        label: LabelMatch::Any,
        field: Field::AmdgpuTempInput,
    },
    Rule {
        family: Family::Amdgpu,
        kind: SubfeatureKind::POWER_AVERAGE,
        label: LabelMatch::Any,
        field: Field::AmdgpuPowerAverage,
    },
    Rule {
        family: Family::K10temp,
        kind: SubfeatureKind::TEMP_INPUT,
        label: LabelMatch::Exactly("Tdie"),
        field: Field::K10Tdie,
    },
];

/// Find the field a reading from `family` with `label` belongs to
pub fn route(rules: &[Rule], family: Family, reading: &Reading, label: &str) -> Option<Field> {
    rules
        .iter()
        .find(|r| r.family == family && r.kind == reading.kind && r.label.matches(label))
        .map(|r| r.field)
}

/// Caps on the per-family record sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_per_family: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_per_family: limits::DEFAULT_MAX_PER_FAMILY,
        }
    }
}

/// The classified readings of one collection cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub amdgpu: Vec<AmdgpuRecord>,
    pub k10temp: Vec<K10TempRecord>,
}

impl Snapshot {
    pub fn count(&self, family: Family) -> usize {
        match family {
            Family::Amdgpu => self.amdgpu.len(),
            Family::K10temp => self.k10temp.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.amdgpu.is_empty() && self.k10temp.is_empty()
    }

    fn push(&mut self, record: FamilyRecord) {
        match record {
            FamilyRecord::Amdgpu(r) => self.amdgpu.push(r),
            FamilyRecord::K10temp(r) => self.k10temp.push(r),
        }
    }
}

/// Run one discovery pass over `backend`.
///
/// Chips of unknown families and chips past the per-family cap are skipped
/// without error. Features with an empty label are skipped with a warning.
/// Any other label or value failure aborts the pass.
pub fn discover<B: SensorBackend + ?Sized>(
    backend: &B,
    limits: &Limits,
) -> Result<Snapshot, BackendError> {
    let mut snapshot = Snapshot::default();

    for chip in backend.chips() {
        let Some(family) = Family::from_prefix(&chip.prefix) else {
            trace!(chip = %chip.name(), "Skipped chip (unknown family)");
            continue;
        };
        if snapshot.count(family) >= limits.max_per_family {
            debug!(
                chip = %chip.name(),
                max = limits.max_per_family,
                "Dropped chip (family at capacity)"
            );
            continue;
        }

        let mut record = FamilyRecord::new(family);
        for feature in backend.features(&chip) {
            let label = match backend.label(&chip, &feature) {
                Ok(label) => label,
                Err(BackendError::Unlabeled { chip, feature }) => {
                    warn!(%chip, %feature, "Skipping unlabeled feature");
                    continue;
                }
                Err(e) => return Err(e),
            };

            for sub in backend.readable_subfeatures(&chip, &feature) {
                let reading = Reading {
                    kind: sub.kind,
                    value: backend.read_value(&chip, &sub)?,
                };
                if let Some(field) = route(RULES, family, &reading, &label) {
                    trace!(
                        chip = %chip.name(),
                        subfeature = %sub.name,
                        %label,
                        value = reading.value,
                        "Routed reading to {:?}",
                        field
                    );
                    record.set(field, reading.value);
                }
            }
        }
        snapshot.push(record);
    }

    debug!(
        amdgpu = snapshot.amdgpu.len(),
        k10temp = snapshot.k10temp.len(),
        "Discovery pass complete"
    );
    Ok(snapshot)
}
