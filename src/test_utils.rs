/*
 * Test utilities and fake hardware for sensorsmonitor
 *
 * Builds throwaway hwmon trees on disk so the sysfs backend and the whole
 * discovery pipeline can be exercised without real sensors.
 */

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::classify::{AmdgpuRecord, K10TempRecord, Snapshot};

/// A fake `/sys/class/hwmon` rooted in a temporary directory
pub struct FakeHwmon {
    dir: TempDir,
}

impl FakeHwmon {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp hwmon root"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Create `hwmon<index>` with the given driver name
    pub fn chip(&self, index: u32, name: &str) -> FakeChip {
        let path = self.root().join(format!("hwmon{}", index));
        fs::create_dir_all(&path).expect("create chip dir");
        fs::write(path.join("name"), format!("{}\n", name)).expect("write name");
        FakeChip { path }
    }

    /// An amdgpu chip exposing edge temperature and average power
    pub fn amdgpu(&self, index: u32, temp_mc: i64, power_uw: i64) -> FakeChip {
        let chip = self.chip(index, "amdgpu");
        chip.temp(1, Some("edge"), temp_mc).power_average(1, power_uw);
        chip
    }

    /// A k10temp chip exposing Tctl and Tdie
    pub fn k10temp(&self, index: u32, tctl_mc: i64, tdie_mc: i64) -> FakeChip {
        let chip = self.chip(index, "k10temp");
        chip.temp(1, Some("Tctl"), tctl_mc).temp(2, Some("Tdie"), tdie_mc);
        chip
    }
}

pub struct FakeChip {
    path: PathBuf,
}

impl FakeChip {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a raw attribute file
    pub fn attr(&self, file: &str, content: &str) -> &Self {
        fs::write(self.path.join(file), format!("{}\n", content)).expect("write attribute");
        self
    }

    pub fn temp(&self, idx: u32, label: Option<&str>, millidegrees: i64) -> &Self {
        self.attr(&format!("temp{}_input", idx), &millidegrees.to_string());
        if let Some(label) = label {
            self.attr(&format!("temp{}_label", idx), label);
        }
        self
    }

    pub fn power_average(&self, idx: u32, microwatts: i64) -> &Self {
        self.attr(&format!("power{}_average", idx), &microwatts.to_string())
    }
}

pub fn amdgpu_record(temp_input: f64, power_average: f64) -> AmdgpuRecord {
    AmdgpuRecord {
        temp_input,
        power_average,
    }
}

pub fn k10temp_record(tdie: f64) -> K10TempRecord {
    K10TempRecord { tdie }
}

pub fn snapshot(amdgpu: Vec<AmdgpuRecord>, k10temp: Vec<K10TempRecord>) -> Snapshot {
    Snapshot { amdgpu, k10temp }
}
