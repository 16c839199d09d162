//! Error handling for sensorsmonitor
//!
//! Every failure the monitor can hit is fatal. Each error class carries the
//! operation that failed, the OS-level detail and the process exit code the
//! binary terminates with.

use std::io;
use std::path::PathBuf;

/// Result type alias using MonitorError
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Process exit codes, one per fatal condition
pub mod exit_codes {
    /// The sensor backend could not be initialised
    pub const BACKEND_INIT: i32 = 1;
    /// `XDG_RUNTIME_DIR` is not set
    pub const NO_RUNTIME_DIR: i32 = 2;
    /// Something that is not a FIFO sits at the channel path and could not be removed
    pub const DELETE_EXISTING_PIPE: i32 = 3;
    /// The named pipe could not be created
    pub const CREATE_PIPE: i32 = 4;
    /// The named pipe could not be opened for writing
    pub const OPEN_PIPE_FOR_WRITING: i32 = 5;
    /// A feature label could not be read
    pub const READ_LABEL: i32 = 6;
    /// A subfeature value could not be read or parsed
    pub const READ_VALUE: i32 = 7;
    /// The rendered line could not be written to the pipe
    pub const WRITE_PIPE: i32 = 8;
    /// Terminated by SIGINT/SIGTERM
    pub const SIGNALLED: i32 = 130;
}

// ============================================================================
// Configuration Errors
// ============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("${var} not set")]
    MissingEnv { var: &'static str },
}

impl ConfigError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingEnv { .. } => exit_codes::NO_RUNTIME_DIR,
        }
    }
}

// ============================================================================
// Publication Channel Errors
// ============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ChannelError {
    #[error("failed to remove unexpected file '{path}': {source}")]
    Remove { path: PathBuf, source: io::Error },

    #[error("failed to create named pipe '{path}': {source}")]
    Create { path: PathBuf, source: io::Error },

    #[error("failed to open {path} for write: {source}")]
    OpenForWrite { path: PathBuf, source: io::Error },

    #[error("failed to write to {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

impl ChannelError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Remove { .. } => exit_codes::DELETE_EXISTING_PIPE,
            Self::Create { .. } => exit_codes::CREATE_PIPE,
            Self::OpenForWrite { .. } => exit_codes::OPEN_PIPE_FOR_WRITING,
            Self::Write { .. } => exit_codes::WRITE_PIPE,
        }
    }

    /// Underlying OS error number, if any
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Remove { source, .. }
            | Self::Create { source, .. }
            | Self::OpenForWrite { source, .. }
            | Self::Write { source, .. } => source.raw_os_error(),
        }
    }
}

// ============================================================================
// Sensor Backend Errors
// ============================================================================

#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("sensors init failed on {root}: {source}")]
    Init { root: PathBuf, source: io::Error },

    #[error("can't get label of feature {feature} on {chip}: {source}")]
    Label {
        chip: String,
        feature: String,
        source: io::Error,
    },

    /// The feature has a label attribute but it is empty
    #[error("feature {feature} on {chip} has an empty label")]
    Unlabeled { chip: String, feature: String },

    #[error("can't get value of subfeature {subfeature} on {chip}: {source}")]
    Read {
        chip: String,
        subfeature: String,
        source: io::Error,
    },

    #[error("can't parse value of subfeature {subfeature} on {chip}: {raw:?}")]
    Parse {
        chip: String,
        subfeature: String,
        raw: String,
    },
}

impl BackendError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Init { .. } => exit_codes::BACKEND_INIT,
            Self::Label { .. } | Self::Unlabeled { .. } => exit_codes::READ_LABEL,
            Self::Read { .. } | Self::Parse { .. } => exit_codes::READ_VALUE,
        }
    }
}

// ============================================================================
// Unified Error
// ============================================================================

/// Any fatal condition of the monitor
#[derive(thiserror::Error, Debug)]
pub enum MonitorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl MonitorError {
    /// Exit code the process terminates with for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(e) => e.exit_code(),
            Self::Channel(e) => e.exit_code(),
            Self::Backend(e) => e.exit_code(),
        }
    }

    /// Short name of the failing stage, used in structured log fields
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Channel(_) => "channel",
            Self::Backend(_) => "backend",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            exit_codes::BACKEND_INIT,
            exit_codes::NO_RUNTIME_DIR,
            exit_codes::DELETE_EXISTING_PIPE,
            exit_codes::CREATE_PIPE,
            exit_codes::OPEN_PIPE_FOR_WRITING,
            exit_codes::READ_LABEL,
            exit_codes::READ_VALUE,
            exit_codes::WRITE_PIPE,
            exit_codes::SIGNALLED,
        ];
        for (i, a) in codes.iter().enumerate() {
            assert_ne!(*a, 0);
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn unified_error_keeps_class_exit_code() {
        let err: MonitorError = ChannelError::Remove {
            path: PathBuf::from("/run/user/1000/sensorsmonitor"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        }
        .into();
        assert_eq!(err.exit_code(), exit_codes::DELETE_EXISTING_PIPE);
        assert_eq!(err.stage(), "channel");

        let err: MonitorError = ConfigError::MissingEnv { var: "XDG_RUNTIME_DIR" }.into();
        assert_eq!(err.exit_code(), exit_codes::NO_RUNTIME_DIR);
        assert_eq!(err.to_string(), "$XDG_RUNTIME_DIR not set");
    }

    #[test]
    fn backend_errors_map_to_read_codes() {
        let label = BackendError::Unlabeled {
            chip: "k10temp".into(),
            feature: "temp1".into(),
        };
        assert_eq!(label.exit_code(), exit_codes::READ_LABEL);

        let parse = BackendError::Parse {
            chip: "amdgpu".into(),
            subfeature: "power1_average".into(),
            raw: "n/a".into(),
        };
        assert_eq!(parse.exit_code(), exit_codes::READ_VALUE);
        assert!(parse.to_string().contains("power1_average"));
    }
}
