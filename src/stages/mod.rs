pub mod git;
pub mod inno;
pub mod nuget;
pub mod resx;

use crate::config::DeployConfig;
use crate::error::{DeployError, DeployResult};
use crate::version::{stamper, VersionMarker, VersionQuadruplet};
use log::debug;
use std::fs;
use std::path::Path;

pub use git::GitStage;
pub use inno::InnoStage;
pub use nuget::NugetStage;
pub use resx::ResxStage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Completed(String),
    /// The stage's options are incomplete; not an error
    Skipped(String),
    /// An external tool failed; later stages still run
    Failed(String),
}

impl StageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StageStatus::Completed(_) => "completed",
            StageStatus::Skipped(_) => "skipped",
            StageStatus::Failed(_) => "failed",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            StageStatus::Completed(detail)
            | StageStatus::Skipped(detail)
            | StageStatus::Failed(detail) => detail,
        }
    }
}

// RUST LEARNING: Traits define shared behavior (like TypeScript interfaces)
// - The runner holds stages as `&dyn Stage` and doesn't care which one it is
pub trait Stage {
    fn name(&self) -> &'static str;

    /// Validate the stage's options and run it.
    ///
    /// Incomplete options come back as [`StageStatus::Skipped`]; an
    /// `ExternalProcessFailure` error marks the stage failed.
    fn execute(&self) -> DeployResult<StageStatus>;
}

/// Description and version of the built target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub description: String,
    pub file_version: VersionQuadruplet,
}

impl VersionInfo {
    /// `/Version` wins; otherwise the file version (then assembly version)
    /// declared in `/AssemblyInfo`.
    pub fn resolve(config: &DeployConfig, target: &Path) -> DeployResult<Self> {
        let description = match config.description.as_deref() {
            Some(description) if !description.is_empty() => description.to_string(),
            _ => target
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_default(),
        };

        let file_version = if let Some(version) = config.version.as_deref() {
            VersionQuadruplet::parse(version)?
        } else if let Some(assembly_info) = config.assembly_info.as_deref() {
            read_declared_version(assembly_info)?
        } else {
            return Err(DeployError::InvalidConfiguration(
                "the target's version is unknown, pass /Version or /AssemblyInfo".to_string(),
            ));
        };

        debug!("Target {} is version {}", description, file_version);
        Ok(Self {
            description,
            file_version,
        })
    }
}

fn read_declared_version(assembly_info: &Path) -> DeployResult<VersionQuadruplet> {
    if !assembly_info.is_file() {
        return Err(DeployError::NotFound {
            what: "assembly info file",
            path: assembly_info.to_path_buf(),
        });
    }

    let text = fs::read_to_string(assembly_info)?;
    for marker in [VersionMarker::File, VersionMarker::Assembly] {
        if let Some(version) = stamper::read_version(&text, marker)? {
            return Ok(version);
        }
    }

    Err(DeployError::InvalidConfiguration(format!(
        "{} declares no version",
        assembly_info.display()
    )))
}

/// The option's path, if it names an existing file
pub(crate) fn existing_file(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| p.is_file())
}
