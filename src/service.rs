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

//! Publish loop: discover, aggregate, render, publish, sleep

use std::convert::Infallible;
use std::thread;
use std::time::Duration;

use serde_json::json;
use sm_error::{BackendError, MonitorError};
use tracing::{debug, error, trace};

use crate::aggregate::{aggregate, Aggregate};
use crate::channel::Channel;
use crate::classify::{discover, Limits};
use crate::logger::log_event;
use crate::render::render;
use crate::sensors::SensorBackend;

/// Everything the loop needs besides the backend
#[derive(Debug)]
pub struct MonitorContext {
    pub channel: Channel,
    pub interval: Duration,
    pub limits: Limits,
}

/// Fresh readings from every chip, averaged per family
pub fn collect<B: SensorBackend + ?Sized>(
    backend: &B,
    limits: &Limits,
) -> Result<Aggregate, BackendError> {
    let snapshot = discover(backend, limits)?;
    trace!(
        amdgpu = snapshot.amdgpu.len(),
        k10temp = snapshot.k10temp.len(),
        "Snapshot taken"
    );
    Ok(aggregate(&snapshot))
}

/// One rendered line, without touching the channel
pub fn render_once<B: SensorBackend + ?Sized>(
    backend: &B,
    limits: &Limits,
) -> Result<String, BackendError> {
    collect(backend, limits).map(|agg| render(&agg))
}

/// Run one full cycle and return the published line.
///
/// Blocks until a reader takes the line.
pub fn run_cycle<B: SensorBackend + ?Sized>(
    backend: &B,
    ctx: &MonitorContext,
) -> Result<String, MonitorError> {
    let agg = collect(backend, &ctx.limits)?;
    let line = render(&agg);
    ctx.channel.publish(&line)?;
    log_event("publish", json!({ "aggregate": agg, "line": line }));
    Ok(line)
}

/// Publish forever. Only returns on the first fatal error.
pub fn run<B: SensorBackend + ?Sized>(
    backend: &B,
    ctx: &MonitorContext,
) -> Result<Infallible, MonitorError> {
    let mut cycle: u64 = 0;
    loop {
        let line = run_cycle(backend, ctx)?;
        cycle = cycle.wrapping_add(1);
        debug!(cycle, line = line.trim_end(), "Cycle complete");
        thread::sleep(ctx.interval);
    }
}

/// Release the backend, log `err` and record a `fatal_error` event.
///
/// Returns the exit code the process should terminate with.
pub fn report_fatal<B: SensorBackend + ?Sized>(
    backend: Option<&mut B>,
    err: &MonitorError,
) -> i32 {
    if let Some(backend) = backend {
        backend.shutdown();
    }
    let code = err.exit_code();
    let errno = match err {
        MonitorError::Channel(e) => e.raw_os_error(),
        _ => None,
    };
    error!(stage = err.stage(), code, errno, "{}", err);
    log_event(
        "fatal_error",
        json!({ "stage": err.stage(), "code": code, "errno": errno, "error": err.to_string() }),
    );
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::channel_path;
    use crate::hwmon::HwmonBackend;
    use crate::logger::{close_logging, init_logging};
    use crate::sensors::{
        ChipIdentity, FeatureHandle, FeatureKind, MockSensorBackend, SubfeatureHandle,
        SubfeatureKind,
    };
    use crate::test_utils::FakeHwmon;
    use serial_test::serial;
    use sm_error::{exit_codes, ChannelError, ConfigError};
    use std::fs::File;
    use std::io::Read;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> MonitorContext {
        MonitorContext {
            channel: Channel::establish(channel_path(dir.path())).unwrap(),
            interval: Duration::from_millis(1),
            limits: Limits::default(),
        }
    }

    fn failing_backend() -> MockSensorBackend {
        let chip = ChipIdentity {
            id: 0,
            prefix: "amdgpu".into(),
            path: PathBuf::from("/sys/class/hwmon/hwmon0"),
            adapter: "PCI adapter".into(),
        };
        let feature = FeatureHandle {
            name: "temp1".into(),
            kind: FeatureKind::Temp,
            index: 1,
        };
        let sub = SubfeatureHandle {
            name: "temp1_input".into(),
            kind: SubfeatureKind::TEMP_INPUT,
            readable: true,
            writable: false,
        };

        let mut mock = MockSensorBackend::new();
        mock.expect_chips().returning(move || vec![chip.clone()]);
        mock.expect_features().returning(move |_| vec![feature.clone()]);
        mock.expect_label().returning(|_, _| Ok("edge".to_string()));
        mock.expect_readable_subfeatures()
            .returning(move |_, _| vec![sub.clone()]);
        mock.expect_read_value().returning(|chip, sub| {
            Err(BackendError::Read {
                chip: chip.name(),
                subfeature: sub.name.clone(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        });
        mock
    }

    #[test]
    fn render_once_combines_families() {
        let hw = FakeHwmon::new();
        hw.amdgpu(0, 45_400, 23_600_000);
        hw.k10temp(1, 60_000, 51_000);
        let backend = HwmonBackend::init(hw.root()).unwrap();

        let line = render_once(&backend, &Limits::default()).unwrap();
        assert_eq!(line, "amdgpu 45°C 24W   Tdie 51°C\n");
    }

    #[test]
    fn render_once_without_chips_is_bare_newline() {
        let hw = FakeHwmon::new();
        hw.chip(0, "nvme").temp(1, Some("Composite"), 38_000);
        let backend = HwmonBackend::init(hw.root()).unwrap();

        assert_eq!(render_once(&backend, &Limits::default()).unwrap(), "\n");
    }

    #[test]
    fn cycle_publishes_to_reader() {
        let hw = FakeHwmon::new();
        hw.k10temp(0, 60_000, 50_500);
        let backend = HwmonBackend::init(hw.root()).unwrap();
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        let path = ctx.channel.path().to_path_buf();
        let reader = std::thread::spawn(move || {
            let mut s = String::new();
            File::open(path).unwrap().read_to_string(&mut s).unwrap();
            s
        });

        let line = run_cycle(&backend, &ctx).unwrap();
        assert_eq!(line, "Tdie 51°C\n");
        assert_eq!(reader.join().unwrap(), line);
    }

    #[test]
    fn cycle_reads_fresh_values() {
        let hw = FakeHwmon::new();
        let chip = hw.k10temp(0, 60_000, 40_000);
        let backend = HwmonBackend::init(hw.root()).unwrap();

        assert_eq!(render_once(&backend, &Limits::default()).unwrap(), "Tdie 40°C\n");
        chip.attr("temp2_input", "41600");
        assert_eq!(render_once(&backend, &Limits::default()).unwrap(), "Tdie 42°C\n");
    }

    #[test]
    fn read_failure_stops_before_publishing() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        let err = run_cycle(&failing_backend(), &ctx).unwrap_err();
        assert!(matches!(err, MonitorError::Backend(BackendError::Read { .. })));
        assert_eq!(err.exit_code(), exit_codes::READ_VALUE);
    }

    #[test]
    fn run_returns_first_fatal_error() {
        let hw = FakeHwmon::new();
        hw.k10temp(0, 60_000, 50_000);
        let backend = HwmonBackend::init(hw.root()).unwrap();
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        ctx.channel.remove().unwrap();

        let err = run(&backend, &ctx).unwrap_err();
        assert_eq!(err.stage(), "channel");
        assert_eq!(err.exit_code(), exit_codes::OPEN_PIPE_FOR_WRITING);
    }

    fn fatal_events(path: &std::path::Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
            .filter(|v| v["event"] == "fatal_error")
            .collect()
    }

    #[test]
    #[serial]
    fn fatal_error_shuts_down_backend_and_records_event() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("events.json");
        init_logging(&log).unwrap();

        let mut backend = MockSensorBackend::new();
        backend.expect_shutdown().times(1).return_const(());
        let err = MonitorError::Channel(ChannelError::OpenForWrite {
            path: dir.path().join("sensorsmonitor"),
            source: std::io::Error::from_raw_os_error(libc::ENOENT),
        });

        let code = report_fatal(Some(&mut backend), &err);
        close_logging();
        backend.checkpoint();

        assert_eq!(code, exit_codes::OPEN_PIPE_FOR_WRITING);
        let events = fatal_events(&log);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["data"]["stage"], "channel");
        assert_eq!(events[0]["data"]["code"], exit_codes::OPEN_PIPE_FOR_WRITING);
        assert_eq!(events[0]["data"]["errno"], libc::ENOENT);
    }

    #[test]
    #[serial]
    fn fatal_error_without_backend_still_reports() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("events.json");
        init_logging(&log).unwrap();

        let err = MonitorError::Config(ConfigError::MissingEnv {
            var: "XDG_RUNTIME_DIR",
        });
        let code = report_fatal::<MockSensorBackend>(None, &err);
        close_logging();

        assert_eq!(code, exit_codes::NO_RUNTIME_DIR);
        let events = fatal_events(&log);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["data"]["stage"], "config");
        assert!(events[0]["data"]["errno"].is_null());
        assert_eq!(events[0]["data"]["error"], "$XDG_RUNTIME_DIR not set");
    }
}
