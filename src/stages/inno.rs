use crate::config::DeployConfig;
use crate::error::{DeployError, DeployResult};
use crate::process::ExternalCommand;
use crate::stages::{existing_file, Stage, StageStatus, VersionInfo};
use log::debug;
use regex::{NoExpand, Regex};
use std::fs;
use std::path::Path;

/// Compiles an Inno Setup installer for the target's version
pub struct InnoStage<'a> {
    config: &'a DeployConfig,
    info: &'a VersionInfo,
}

/// Replace the `MyAppVersion` define, or `None` when the script has none
pub fn set_script_version(script: &str, version: &str) -> Option<String> {
    let define = Regex::new(r#"#define MyAppVersion "[^"\r\n]*""#).expect("Invalid regex");
    if !define.is_match(script) {
        return None;
    }

    let replacement = format!("#define MyAppVersion \"{}\"", version);
    Some(define.replace(script, NoExpand(&replacement)).into_owned())
}

/// `{0}` in the setup file pattern stands for the version
pub fn setup_file_name(pattern: &str, version: &str) -> String {
    pattern.replace("{0}", version)
}

impl<'a> InnoStage<'a> {
    pub fn new(config: &'a DeployConfig, info: &'a VersionInfo) -> Self {
        Self { config, info }
    }
}

impl Stage for InnoStage<'_> {
    fn name(&self) -> &'static str {
        "Inno Setup"
    }

    fn execute(&self) -> DeployResult<StageStatus> {
        let Some(compiler) = existing_file(self.config.inno_exe.as_deref()) else {
            return Ok(StageStatus::Skipped("/innoExe is missing".to_string()));
        };
        let Some(script) = existing_file(self.config.inno_script.as_deref()) else {
            return Ok(StageStatus::Skipped("/innoScript is missing".to_string()));
        };
        let Some(pattern) = self
            .config
            .inno_setup
            .as_deref()
            .filter(|pattern| !pattern.is_empty())
        else {
            return Ok(StageStatus::Skipped("/innoSetup is missing".to_string()));
        };

        let version = self.info.file_version.three_part();

        println!("Setting Inno Version in Config");
        let contents = fs::read_to_string(script)?;
        let Some(updated) = set_script_version(&contents, &version) else {
            return Err(DeployError::external(
                "inno",
                format!("{} has no #define MyAppVersion", script.display()),
            ));
        };
        fs::write(script, updated)?;

        let setup_file = setup_file_name(pattern, &version);
        let setup_path = Path::new(&setup_file);
        if setup_path.exists() {
            debug!("Removing stale installer {}", setup_path.display());
            fs::remove_file(setup_path)?;
        }
        println!("New Inno Setup file is {}", setup_path.display());

        let command = ExternalCommand::new(compiler).arg("/cc").arg(script);
        println!("Building Inno Setup File");
        command.run_checked()?;

        if !setup_path.exists() {
            return Err(DeployError::external(
                command.name(),
                format!("{} was not built", setup_path.display()),
            ));
        }

        Ok(StageStatus::Completed(format!("built {}", setup_path.display())))
    }
}
