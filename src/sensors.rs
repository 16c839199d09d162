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

//! Sensor backend boundary
//!
//! A backend exposes chips, the features of each chip and the numeric
//! subfeatures of each feature, in the shape libsensors uses. Discovery only
//! ever talks to this trait, so the sysfs implementation in [`crate::hwmon`]
//! can be swapped for a fake in tests.

use std::fmt;
use std::path::PathBuf;

use sm_error::BackendError;

use crate::constants::scale;

/// A detected hardware monitoring chip
#[derive(Debug, Clone, PartialEq)]
pub struct ChipIdentity {
    /// Backend-assigned handle, stable for the process lifetime
    pub id: usize,
    /// Driver name, e.g. "amdgpu" or "k10temp"; used as the family discriminator
    pub prefix: String,
    pub path: PathBuf,
    pub adapter: String,
}

impl ChipIdentity {
    /// "name@hwmonX", unique even with several chips of one driver
    pub fn name(&self) -> String {
        let tag = self
            .path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("chip{}", self.id));
        format!("{}@{}", self.prefix, tag)
    }
}

/// Physical quantity a feature measures. Ordered as libsensors orders features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureKind {
    In,
    Fan,
    Temp,
    Power,
    Energy,
    Curr,
    Humidity,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 7] = [
        FeatureKind::In,
        FeatureKind::Fan,
        FeatureKind::Temp,
        FeatureKind::Power,
        FeatureKind::Energy,
        FeatureKind::Curr,
        FeatureKind::Humidity,
    ];

    /// sysfs file name prefix
    pub fn prefix(self) -> &'static str {
        match self {
            FeatureKind::In => "in",
            FeatureKind::Fan => "fan",
            FeatureKind::Temp => "temp",
            FeatureKind::Power => "power",
            FeatureKind::Energy => "energy",
            FeatureKind::Curr => "curr",
            FeatureKind::Humidity => "humidity",
        }
    }

    /// Divisor applied to raw sysfs values of non-status attributes
    fn divisor(self) -> f64 {
        match self {
            FeatureKind::In | FeatureKind::Temp | FeatureKind::Curr | FeatureKind::Humidity => {
                scale::MILLI
            }
            FeatureKind::Power | FeatureKind::Energy => scale::MICRO,
            FeatureKind::Fan => 1.0,
        }
    }
}

/// Which aspect of a feature a subfeature reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attribute {
    Input,
    Average,
    Min,
    Max,
    Lcrit,
    Crit,
    Emergency,
    MinHyst,
    MaxHyst,
    CritHyst,
    EmergencyHyst,
    Lowest,
    Highest,
    InputLowest,
    InputHighest,
    AverageLowest,
    AverageHighest,
    Cap,
    CapMax,
    CapMin,
    CapHyst,
    Offset,
    Target,
    Alarm,
    MinAlarm,
    MaxAlarm,
    LcritAlarm,
    CritAlarm,
    EmergencyAlarm,
    CapAlarm,
    Fault,
    Beep,
    Type,
    Div,
    Pulses,
}

/// sysfs suffix of every attribute we recognise
const ATTRIBUTE_SUFFIXES: &[(&str, Attribute)] = &[
    ("input", Attribute::Input),
    ("average", Attribute::Average),
    ("min", Attribute::Min),
    ("max", Attribute::Max),
    ("lcrit", Attribute::Lcrit),
    ("crit", Attribute::Crit),
    ("emergency", Attribute::Emergency),
    ("min_hyst", Attribute::MinHyst),
    ("max_hyst", Attribute::MaxHyst),
    ("crit_hyst", Attribute::CritHyst),
    ("emergency_hyst", Attribute::EmergencyHyst),
    ("lowest", Attribute::Lowest),
    ("highest", Attribute::Highest),
    ("input_lowest", Attribute::InputLowest),
    ("input_highest", Attribute::InputHighest),
    ("average_lowest", Attribute::AverageLowest),
    ("average_highest", Attribute::AverageHighest),
    ("cap", Attribute::Cap),
    ("cap_max", Attribute::CapMax),
    ("cap_min", Attribute::CapMin),
    ("cap_hyst", Attribute::CapHyst),
    ("offset", Attribute::Offset),
    ("target", Attribute::Target),
    ("alarm", Attribute::Alarm),
    ("min_alarm", Attribute::MinAlarm),
    ("max_alarm", Attribute::MaxAlarm),
    ("lcrit_alarm", Attribute::LcritAlarm),
    ("crit_alarm", Attribute::CritAlarm),
    ("emergency_alarm", Attribute::EmergencyAlarm),
    ("cap_alarm", Attribute::CapAlarm),
    ("fault", Attribute::Fault),
    ("beep", Attribute::Beep),
    ("type", Attribute::Type),
    ("div", Attribute::Div),
    ("pulses", Attribute::Pulses),
];

impl Attribute {
    pub fn from_suffix(suffix: &str) -> Option<Attribute> {
        ATTRIBUTE_SUFFIXES
            .iter()
            .find(|(s, _)| *s == suffix)
            .map(|(_, a)| *a)
    }

    pub fn suffix(self) -> &'static str {
        ATTRIBUTE_SUFFIXES
            .iter()
            .find(|(_, a)| *a == self)
            .map(|(s, _)| *s)
            .unwrap_or("unknown")
    }

    /// Flags and enumerations are reported unscaled
    pub fn is_status(self) -> bool {
        matches!(
            self,
            Attribute::Alarm
                | Attribute::MinAlarm
                | Attribute::MaxAlarm
                | Attribute::LcritAlarm
                | Attribute::CritAlarm
                | Attribute::EmergencyAlarm
                | Attribute::CapAlarm
                | Attribute::Fault
                | Attribute::Beep
                | Attribute::Type
                | Attribute::Div
                | Attribute::Pulses
        )
    }
}

/// The physical quantity a subfeature reports, e.g. temperature input
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubfeatureKind {
    pub feature: FeatureKind,
    pub attr: Attribute,
}

impl SubfeatureKind {
    pub const TEMP_INPUT: SubfeatureKind = SubfeatureKind::new(FeatureKind::Temp, Attribute::Input);
    pub const POWER_AVERAGE: SubfeatureKind =
        SubfeatureKind::new(FeatureKind::Power, Attribute::Average);

    pub const fn new(feature: FeatureKind, attr: Attribute) -> Self {
        Self { feature, attr }
    }

    /// Convert a raw sysfs integer into the unit libsensors reports
    /// (degrees C, volts, amps, watts, joules, percent, RPM)
    pub fn scale(self, raw: f64) -> f64 {
        if self.attr.is_status() {
            raw
        } else {
            raw / self.feature.divisor()
        }
    }
}

impl fmt::Display for SubfeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.feature.prefix(), self.attr.suffix())
    }
}

/// A measurable attribute of a chip, e.g. one temperature sensor site
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureHandle {
    /// e.g. "temp2"
    pub name: String,
    pub kind: FeatureKind,
    pub index: u32,
}

/// One numeric channel under a feature
#[derive(Debug, Clone, PartialEq)]
pub struct SubfeatureHandle {
    /// e.g. "temp2_input"
    pub name: String,
    pub kind: SubfeatureKind,
    pub readable: bool,
    pub writable: bool,
}

/// One instantaneous sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub kind: SubfeatureKind,
    pub value: f64,
}

/// Access to a host's hardware sensors.
///
/// Enumeration is restartable and returns the same order on every call
/// within a process; reads hit the hardware each time.
#[cfg_attr(test, mockall::automock)]
pub trait SensorBackend {
    fn chips(&self) -> Vec<ChipIdentity>;

    fn features(&self, chip: &ChipIdentity) -> Vec<FeatureHandle>;

    /// Subfeatures of `feature` that can be read
    fn readable_subfeatures(
        &self,
        chip: &ChipIdentity,
        feature: &FeatureHandle,
    ) -> Vec<SubfeatureHandle>;

    fn read_value(&self, chip: &ChipIdentity, sub: &SubfeatureHandle) -> Result<f64, BackendError>;

    fn label(&self, chip: &ChipIdentity, feature: &FeatureHandle) -> Result<String, BackendError>;

    /// Release backend resources. Never fails.
    fn shutdown(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_suffixes_round_trip() {
        for (suffix, attr) in ATTRIBUTE_SUFFIXES {
            assert_eq!(Attribute::from_suffix(suffix), Some(*attr));
            assert_eq!(attr.suffix(), *suffix);
        }
        assert_eq!(Attribute::from_suffix("label"), None);
        assert_eq!(Attribute::from_suffix("average_interval"), None);
    }

    #[test]
    fn scaling_follows_feature_units() {
        assert_eq!(SubfeatureKind::TEMP_INPUT.scale(45_500.0), 45.5);
        assert_eq!(SubfeatureKind::POWER_AVERAGE.scale(23_000_000.0), 23.0);
        let fan = SubfeatureKind::new(FeatureKind::Fan, Attribute::Input);
        assert_eq!(fan.scale(1200.0), 1200.0);
        let alarm = SubfeatureKind::new(FeatureKind::Temp, Attribute::CritAlarm);
        assert_eq!(alarm.scale(1.0), 1.0);
    }

    #[test]
    fn features_order_like_libsensors() {
        let mut kinds = vec![FeatureKind::Power, FeatureKind::Temp, FeatureKind::In];
        kinds.sort();
        assert_eq!(kinds, vec![FeatureKind::In, FeatureKind::Temp, FeatureKind::Power]);
    }

    #[test]
    fn kind_displays_as_prefix_and_suffix() {
        assert_eq!(SubfeatureKind::TEMP_INPUT.to_string(), "temp-input");
        assert_eq!(SubfeatureKind::POWER_AVERAGE.to_string(), "power-average");
    }
}
