use std::io;
use std::path::PathBuf;

use readme_table_config::ConfigError;
use thiserror::Error;

/// Process exit statuses. `0` and `1` are the stable contract for build
/// pipelines; the rest signal faults. `2` is left to clap's usage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    NoTable = 1,
    InvalidConfig = 3,
    Io = 4,
    Parse = 5,
}

impl ExitCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Success),
            1 => Some(Self::NoTable),
            3 => Some(Self::InvalidConfig),
            4 => Some(Self::Io),
            5 => Some(Self::Parse),
            _ => None,
        }
    }

    /// Exit status for a configuration failure.
    pub fn for_config_error(err: &ConfigError) -> Self {
        match err {
            ConfigError::WorkingDirectory { .. } | ConfigError::Io { .. } => Self::Io,
            ConfigError::OverrideNotFound { .. }
            | ConfigError::Parse { .. }
            | ConfigError::Validation(_) => Self::InvalidConfig,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("rendered markdown is not well-formed XML: {source}")]
    Parse { source: roxmltree::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

impl PipelineError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Read { .. } | Self::Write { .. } => ExitCode::Io,
            Self::Parse { .. } => ExitCode::Parse,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
