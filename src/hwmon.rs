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

//! hwmon sysfs sensor backend
//!
//! Reads `/sys/class/hwmon` the way libsensors does: one chip per `hwmonN`
//! directory with a `name` file, features parsed from `<type><index>_<attr>`
//! attribute files, `_label` files as feature labels. The tree is scanned once
//! at [`HwmonBackend::init`]; values are read from sysfs on every call.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use sm_error::BackendError;
use tracing::{debug, info, trace};

use crate::sensors::{
    Attribute, ChipIdentity, FeatureHandle, FeatureKind, SensorBackend, SubfeatureHandle,
    SubfeatureKind,
};

#[derive(Debug)]
struct ChipEntry {
    identity: ChipIdentity,
    features: Vec<FeatureEntry>,
}

#[derive(Debug)]
struct FeatureEntry {
    handle: FeatureHandle,
    label_path: Option<PathBuf>,
    subfeatures: Vec<SubfeatureHandle>,
}

/// Sensor backend over the Linux hwmon class directory
#[derive(Debug)]
pub struct HwmonBackend {
    root: PathBuf,
    chips: Vec<ChipEntry>,
}

impl HwmonBackend {
    /// Scan `root` (normally `/sys/class/hwmon`) for chips and their features.
    ///
    /// Fails only if `root` itself cannot be listed; individual devices that
    /// cannot be read are skipped.
    pub fn init(root: impl AsRef<Path>) -> Result<Self, BackendError> {
        let root = root.as_ref();
        debug!("Scanning hwmon chips in {:?}", root);

        let entries = fs::read_dir(root).map_err(|source| BackendError::Init {
            root: root.to_path_buf(),
            source,
        })?;

        let mut dirs: Vec<(u32, String, PathBuf)> = Vec::new();
        for ent in entries.flatten() {
            let tag = ent.file_name().to_string_lossy().into_owned();
            let index = extract_index(&tag, "hwmon", "").unwrap_or(u32::MAX);
            dirs.push((index, tag, ent.path()));
        }
        dirs.sort();

        let mut chips = Vec::new();
        for (_, _, path) in dirs {
            if !path.is_dir() {
                continue;
            }
            // Resolve to the actual device dir in case of symlink
            let dir = fs::canonicalize(&path).unwrap_or(path);
            let prefix = match read_trimmed(dir.join("name")) {
                Ok(name) if !name.is_empty() => name,
                _ => {
                    trace!("Skipped {:?} (no name attribute)", dir);
                    continue;
                }
            };

            let features = scan_features(&dir);
            let identity = ChipIdentity {
                id: chips.len(),
                prefix,
                adapter: adapter_name(&dir),
                path: dir,
            };
            info!(
                chip = %identity.name(),
                adapter = %identity.adapter,
                features = features.len(),
                "Found hwmon chip"
            );
            chips.push(ChipEntry { identity, features });
        }

        info!("Total hwmon chips found: {}", chips.len());
        Ok(Self {
            root: root.to_path_buf(),
            chips,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn feature_entry(&self, chip: &ChipIdentity, feature: &FeatureHandle) -> Option<&FeatureEntry> {
        self.chips
            .get(chip.id)?
            .features
            .iter()
            .find(|f| f.handle.name == feature.name)
    }
}

impl SensorBackend for HwmonBackend {
    fn chips(&self) -> Vec<ChipIdentity> {
        self.chips.iter().map(|c| c.identity.clone()).collect()
    }

    fn features(&self, chip: &ChipIdentity) -> Vec<FeatureHandle> {
        self.chips
            .get(chip.id)
            .map(|c| c.features.iter().map(|f| f.handle.clone()).collect())
            .unwrap_or_default()
    }

    fn readable_subfeatures(
        &self,
        chip: &ChipIdentity,
        feature: &FeatureHandle,
    ) -> Vec<SubfeatureHandle> {
        self.feature_entry(chip, feature)
            .map(|f| f.subfeatures.iter().filter(|s| s.readable).cloned().collect())
            .unwrap_or_default()
    }

    fn read_value(&self, chip: &ChipIdentity, sub: &SubfeatureHandle) -> Result<f64, BackendError> {
        let raw = read_trimmed(chip.path.join(&sub.name)).map_err(|source| BackendError::Read {
            chip: chip.name(),
            subfeature: sub.name.clone(),
            source,
        })?;
        let value: f64 = raw.parse().map_err(|_| BackendError::Parse {
            chip: chip.name(),
            subfeature: sub.name.clone(),
            raw: raw.clone(),
        })?;
        Ok(sub.kind.scale(value))
    }

    /// The `_label` attribute if present, otherwise the feature name
    fn label(&self, chip: &ChipIdentity, feature: &FeatureHandle) -> Result<String, BackendError> {
        let Some(label_path) = self.feature_entry(chip, feature).and_then(|f| f.label_path.as_ref())
        else {
            return Ok(feature.name.clone());
        };
        let label = read_trimmed(label_path).map_err(|source| BackendError::Label {
            chip: chip.name(),
            feature: feature.name.clone(),
            source,
        })?;
        if label.is_empty() {
            return Err(BackendError::Unlabeled {
                chip: chip.name(),
                feature: feature.name.clone(),
            });
        }
        Ok(label)
    }

    fn shutdown(&mut self) {
        debug!(chips = self.chips.len(), "Releasing hwmon backend");
        self.chips.clear();
    }
}

/// Collect the features of one chip directory, ordered by (type, index)
fn scan_features(dir: &Path) -> Vec<FeatureEntry> {
    let mut features: BTreeMap<(FeatureKind, u32), FeatureEntry> = BTreeMap::new();

    let Ok(dir_iter) = fs::read_dir(dir) else {
        return Vec::new();
    };
    for file in dir_iter.flatten() {
        let fname = file.file_name();
        let fname = fname.to_string_lossy();
        let Some((head, suffix)) = fname.split_once('_') else {
            continue;
        };
        let Some((kind, index)) = parse_feature_name(head) else {
            continue;
        };

        let entry = features.entry((kind, index)).or_insert_with(|| FeatureEntry {
            handle: FeatureHandle {
                name: head.to_string(),
                kind,
                index,
            },
            label_path: None,
            subfeatures: Vec::new(),
        });

        if suffix == "label" {
            entry.label_path = Some(file.path());
            continue;
        }
        let Some(attr) = Attribute::from_suffix(suffix) else {
            trace!("Ignoring unknown attribute {}", fname);
            continue;
        };
        let mode = file.metadata().map(|m| m.permissions().mode()).unwrap_or(0);
        entry.subfeatures.push(SubfeatureHandle {
            name: fname.to_string(),
            kind: SubfeatureKind::new(kind, attr),
            readable: mode & 0o400 != 0,
            writable: mode & 0o200 != 0,
        });
    }

    features
        .into_values()
        .filter(|f| !f.subfeatures.is_empty())
        .map(|mut f| {
            f.subfeatures.sort_by_key(|s| s.kind.attr);
            f
        })
        .collect()
}

/// Split "temp2" into (Temp, 2)
fn parse_feature_name(head: &str) -> Option<(FeatureKind, u32)> {
    FeatureKind::ALL
        .iter()
        .find_map(|kind| extract_index(head, kind.prefix(), "").map(|idx| (*kind, idx)))
}

/// Describe the bus a chip hangs off, from its `device/subsystem` link
fn adapter_name(dir: &Path) -> String {
    let device = dir.join("device");
    if !device.exists() {
        return "Virtual device".to_string();
    }
    let subsystem = fs::canonicalize(device.join("subsystem"))
        .ok()
        .and_then(|p| p.file_name().map(|s| s.to_string_lossy().into_owned()));
    match subsystem.as_deref() {
        Some("pci") => "PCI adapter".to_string(),
        Some("platform") | Some("of_platform") => "ISA adapter".to_string(),
        Some("i2c") => fs::canonicalize(&device)
            .ok()
            .and_then(|d| d.parent().map(|p| p.join("name")))
            .and_then(|p| read_trimmed(p).ok())
            .unwrap_or_else(|| "I2C adapter".to_string()),
        Some("acpi") => "ACPI interface".to_string(),
        Some("hid") => "HID adapter".to_string(),
        Some("spi") => "SPI adapter".to_string(),
        Some("mdio_bus") => "MDIO adapter".to_string(),
        Some("scsi") => "SCSI adapter".to_string(),
        Some(other) => other.to_string(),
        None => "Unknown adapter".to_string(),
    }
}

fn read_trimmed<P: AsRef<Path>>(p: P) -> io::Result<String> {
    let mut s = String::new();
    fs::File::open(p)?.read_to_string(&mut s)?;
    Ok(s.trim().to_string())
}

pub fn extract_index(fname: &str, prefix: &str, suffix: &str) -> Option<u32> {
    if fname.starts_with(prefix) && fname.ends_with(suffix) && fname.len() > prefix.len() + suffix.len() {
        let mid = &fname[prefix.len()..fname.len() - suffix.len()];
        if mid.bytes().all(|b| b.is_ascii_digit()) {
            return mid.parse().ok();
        }
    }
    None
}
