use crate::config::DeployConfig;
use crate::error::DeployResult;
use crate::process::ExternalCommand;
use crate::stages::{existing_file, Stage, StageStatus, VersionInfo};
use colored::Colorize;
use log::debug;
use std::path::Path;

/// Annotated release tag, pushed to `origin`
pub struct GitStage<'a> {
    config: &'a DeployConfig,
    info: &'a VersionInfo,
}

impl<'a> GitStage<'a> {
    pub fn new(config: &'a DeployConfig, info: &'a VersionInfo) -> Self {
        Self { config, info }
    }

    pub fn version_name(&self) -> String {
        let prefix = self
            .config
            .git_version_name
            .as_deref()
            .unwrap_or(&self.info.description);
        tag_name(prefix, &self.info.file_version.to_string())
    }

    pub fn tag_message(&self, repository: &str) -> String {
        match self.config.git_tag_name.as_deref() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => format!("{} v{}", repository, self.info.file_version),
        }
    }
}

/// `"{prefix}_{version}"`, upper-cased, spaces replaced with underscores
pub fn tag_name(prefix: &str, version: &str) -> String {
    format!("{}_{}", prefix, version)
        .to_uppercase()
        .replace(' ', "_")
}

impl Stage for GitStage<'_> {
    fn name(&self) -> &'static str {
        "Git"
    }

    fn execute(&self) -> DeployResult<StageStatus> {
        let Some(git) = existing_file(self.config.git.as_deref()) else {
            return Ok(StageStatus::Skipped("/Git is missing".to_string()));
        };
        let Some(working_dir) = self
            .config
            .git_working_dir
            .as_deref()
            .filter(|dir| !dir.as_os_str().is_empty())
        else {
            return Ok(StageStatus::Skipped("/GitWorkingDir is missing".to_string()));
        };
        let Some(repository) = self
            .config
            .git_repository
            .as_deref()
            .filter(|name| !name.is_empty())
        else {
            return Ok(StageStatus::Skipped("/GitRepository is missing".to_string()));
        };

        let version_name = self.version_name();
        let message = self.tag_message(repository);

        println!("Creating Git tag");
        println!("  {}: {}", "VersionName".cyan(), version_name);
        println!("  {}: {}", "TagName".cyan(), message);
        println!("  {}: {}", "Repository".cyan(), repository);
        println!("  {}: {}", "Working Folder".cyan(), working_dir.display());

        create_tag(git, working_dir, &version_name, &message)?;
        Ok(StageStatus::Completed(format!("tagged {}", version_name)))
    }
}

fn create_tag(git: &Path, working_dir: &Path, version_name: &str, message: &str) -> DeployResult<()> {
    debug!("Tagging {} in {}", version_name, working_dir.display());

    ExternalCommand::new(git)
        .args(["tag", "-a", version_name, "-m", message])
        .current_dir(working_dir)
        .run_checked()?;

    ExternalCommand::new(git)
        .args(["push", "origin", "tag", version_name])
        .current_dir(working_dir)
        .run_checked()?;

    Ok(())
}
