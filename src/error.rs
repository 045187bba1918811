use crate::config::ConfigError;
use crate::resx::ResxError;
use crate::version::VersionError;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for both tools.
///
/// Stages turn an [`DeployError::ExternalProcessFailure`] into a failed stage
/// and keep going; every other variant ends the run.
#[derive(Error, Debug)]
pub enum DeployError {
    /// A mandatory file (target assembly, project path) is missing
    #[error("Could not find {what}: {}", .path.display())]
    NotFound { what: &'static str, path: PathBuf },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A spawned tool exited non-zero or did not produce its output
    #[error("{program} failed: {reason}")]
    ExternalProcessFailure { program: String, reason: String },

    #[error(transparent)]
    Resx(#[from] ResxError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeployError {
    pub fn external(program: impl Into<String>, reason: impl Into<String>) -> Self {
        DeployError::ExternalProcessFailure {
            program: program.into(),
            reason: reason.into(),
        }
    }

    pub fn is_external_failure(&self) -> bool {
        matches!(self, DeployError::ExternalProcessFailure { .. })
    }
}

/// Result type alias for pipeline operations
pub type DeployResult<T> = Result<T, DeployError>;
