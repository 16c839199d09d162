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

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use sm_error::{exit_codes, BackendError, MonitorError};
use tracing::{info, warn};

use sensorsmonitor::channel::{channel_path, cleanup_on_signal, Channel};
use sensorsmonitor::config::{self, Cli, RunMode};
use sensorsmonitor::dump::dump;
use sensorsmonitor::hwmon::HwmonBackend;
use sensorsmonitor::logger::{self, log_event};
use sensorsmonitor::sensors::SensorBackend;
use sensorsmonitor::service::{self, MonitorContext};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the tracing subscriber and report where logs go
fn init_tracing(journald: bool) -> &'static str {
    let filter = config::log_filter();

    if journald {
        match tracing_journald::layer() {
            Ok(journald_layer) => {
                use tracing_subscriber::prelude::*;
                tracing_subscriber::registry()
                    .with(journald_layer)
                    .with(tracing_subscriber::EnvFilter::new(&filter))
                    .init();
                return "systemd journal";
            }
            Err(e) => {
                eprintln!("Failed to create journald layer: {}, falling back to stderr", e);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_level(true)
        .with_env_filter(&filter)
        .init();
    "stderr"
}

/// Release the backend, report `err` and terminate with its exit code
fn fatal(backend: Option<&mut HwmonBackend>, err: MonitorError) -> ! {
    std::process::exit(service::report_fatal(backend, &err));
}

/// SIGINT/SIGTERM: optionally remove the pipe, then exit 130
fn install_signal_handler(pipe: PathBuf, remove_on_exit: bool) {
    if let Err(e) = ctrlc::set_handler(move || {
        cleanup_on_signal(&pipe, remove_on_exit);
        std::process::exit(exit_codes::SIGNALLED);
    }) {
        warn!("Failed to set signal handler: {}. Termination will use default signal handling.", e);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let sink = init_tracing(cli.journald);
    if let Some(path) = &cli.event_log {
        if let Err(e) = logger::init_logging(path) {
            warn!("Event log {:?} unavailable: {}", path, e);
        }
    }

    info!("STARTUP: sensorsmonitor {} starting", VERSION);
    info!("STARTUP: Logging to {}", sink);
    log_event(
        "startup",
        json!({
            "version": VERSION,
            "mode": format!("{:?}", cli.mode()),
            "interval_secs": cli.interval,
            "max_chips": cli.max_chips,
            "hwmon_root": cli.hwmon_root,
        }),
    );

    let mut backend = match HwmonBackend::init(&cli.hwmon_root) {
        Ok(backend) => backend,
        Err(e) => fatal(None, e.into()),
    };
    info!(
        "STARTUP: {} hwmon chip(s) under {:?}",
        backend.chips().len(),
        backend.root()
    );

    match cli.mode() {
        RunMode::Dump => {
            let stdout = io::stdout();
            if let Err(e) = dump(&backend, &mut stdout.lock()) {
                match e.downcast::<BackendError>() {
                    Ok(be) => fatal(Some(&mut backend), be.into()),
                    Err(e) => return Err(e),
                }
            }
            backend.shutdown();
            Ok(())
        }
        RunMode::Once => {
            let line = match service::render_once(&backend, &cli.limits()) {
                Ok(line) => line,
                Err(e) => fatal(Some(&mut backend), e.into()),
            };
            io::stdout()
                .write_all(line.as_bytes())
                .context("write line to stdout")?;
            backend.shutdown();
            Ok(())
        }
        RunMode::Publish => {
            let runtime_dir = match config::runtime_dir() {
                Ok(dir) => dir,
                Err(e) => fatal(Some(&mut backend), e.into()),
            };
            let path = channel_path(&runtime_dir);
            install_signal_handler(path.clone(), cli.remove_on_exit);

            let channel = match Channel::establish(path) {
                Ok(channel) => channel,
                Err(e) => fatal(Some(&mut backend), e.into()),
            };
            info!(
                "STARTUP: Publishing to {:?} every {}s",
                channel.path(),
                cli.interval
            );
            log_event(
                "channel_ready",
                json!({ "path": channel.path(), "initial_state": channel.initial_state() }),
            );

            let ctx = MonitorContext {
                channel,
                interval: cli.interval(),
                limits: cli.limits(),
            };
            let err = match service::run(&backend, &ctx) {
                Err(e) => e,
                Ok(never) => match never {},
            };
            fatal(Some(&mut backend), err)
        }
    }
}
