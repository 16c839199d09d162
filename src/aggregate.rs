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

//! Per-family averages of a [`Snapshot`], rounded for display

use serde::Serialize;

use crate::classify::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AmdgpuSummary {
    pub temp_c: i32,
    pub power_w: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct K10TempSummary {
    pub tdie_c: i32,
}

/// One summary per family; `None` when the family had no records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub amdgpu: Option<AmdgpuSummary>,
    pub k10temp: Option<K10TempSummary>,
}

/// Arithmetic mean, `None` for an empty input
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, n) = values
        .into_iter()
        .fold((0.0_f64, 0_usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Round half up by adding 0.5 and truncating toward zero.
///
/// Saturates at the i32 range; NaN becomes 0.
pub fn display_round(mean: f64) -> i32 {
    (mean + 0.5) as i32
}

pub fn aggregate(snapshot: &Snapshot) -> Aggregate {
    let amdgpu = mean(snapshot.amdgpu.iter().map(|r| r.temp_input))
        .zip(mean(snapshot.amdgpu.iter().map(|r| r.power_average)))
        .map(|(temp, power)| AmdgpuSummary {
            temp_c: display_round(temp),
            power_w: display_round(power),
        });
    let k10temp = mean(snapshot.k10temp.iter().map(|r| r.tdie)).map(|tdie| K10TempSummary {
        tdie_c: display_round(tdie),
    });
    Aggregate { amdgpu, k10temp }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{amdgpu_record, k10temp_record, snapshot};

    #[test]
    fn test_mean() {
        assert_eq!(mean(Vec::new()), None);
        assert_eq!(mean(vec![42.0]), Some(42.0));
        assert_eq!(mean(vec![40.0, 43.0]), Some(41.5));
    }

    #[test]
    fn test_display_round_half_up() {
        assert_eq!(display_round(41.5), 42);
        assert_eq!(display_round(41.49999), 41);
        assert_eq!(display_round(42.5), 43);
        assert_eq!(display_round(0.0), 0);
    }

    #[test]
    fn test_display_round_edges() {
        // truncation is toward zero after the bias
        assert_eq!(display_round(-0.7), 0);
        assert_eq!(display_round(-1.7), -1);
        assert_eq!(display_round(1e12), i32::MAX);
        assert_eq!(display_round(f64::NAN), 0);
    }

    #[test]
    fn empty_families_are_absent() {
        let agg = aggregate(&Snapshot::default());
        assert_eq!(agg, Aggregate::default());
        assert!(agg.amdgpu.is_none());
        assert!(agg.k10temp.is_none());
    }

    #[test]
    fn families_average_independently() {
        let snap = snapshot(
            vec![amdgpu_record(40.0, 20.0), amdgpu_record(43.0, 25.0)],
            vec![k10temp_record(50.25)],
        );
        let agg = aggregate(&snap);
        assert_eq!(agg.amdgpu, Some(AmdgpuSummary { temp_c: 42, power_w: 23 }));
        assert_eq!(agg.k10temp, Some(K10TempSummary { tdie_c: 50 }));
    }

    #[test]
    fn zero_valued_records_count_toward_the_mean() {
        let snap = snapshot(vec![amdgpu_record(60.0, 30.0), amdgpu_record(0.0, 0.0)], Vec::new());
        let agg = aggregate(&snap);
        assert_eq!(agg.amdgpu, Some(AmdgpuSummary { temp_c: 30, power_w: 15 }));
        assert_eq!(agg.k10temp, None);
    }
}
