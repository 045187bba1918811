use crate::config::{executable_dir, UpdateVersionConfig};
use crate::error::{DeployError, DeployResult};
use crate::event_log::EventLog;
use crate::version::{IgnoreDecision, IgnoreList, VersionQuadruplet, VersionStamper};
use chrono::Local;
use colored::Colorize;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

pub const IGNORE_LIST_FILE: &str = "ignoreList.dat";
pub const REPORT_FILE: &str = "verinfoUpdate.txt";

/// Where the version file is looked for, relative to the project directory
const CANDIDATES: [&str; 3] = [
    "Properties/AssemblyInfo.cs",
    "properties/AssemblyInfo.cs",
    "AssemblyInfo.cs",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Stamped {
        file: PathBuf,
        previous: String,
        version: VersionQuadruplet,
    },
    /// Stamped too recently according to the ignore list
    Ignored,
    /// None of the candidate files exist
    NoVersionFile,
}

/// Plain-text record of the run, written to `/output`
#[derive(Debug, Default)]
pub struct Report {
    lines: Vec<String>,
}

impl Report {
    pub fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn render(&self) -> String {
        let mut text = self.lines.join("\r\n");
        text.push_str("\r\n");
        text
    }

    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render())
    }
}

/// Stamp the project's version file. The report is written whenever
/// `/output` is given, whether or not stamping succeeded.
pub fn run_update_version(
    config: &UpdateVersionConfig,
    event_log: &EventLog,
) -> DeployResult<UpdateOutcome> {
    let mut report = Report::default();
    let result = stamp_project(config, &mut report);

    if let Err(err) = &result {
        report.line(format!("Error: {}", err));
    }

    if let Some(path) = report_path(config) {
        match report.write(&path) {
            Ok(()) => debug!("Report written to {}", path.display()),
            Err(err) => {
                warn!("Could not write report {}: {}", path.display(), err);
                event_log.add(&format!(
                    "ERROR could not write report {}: {}",
                    path.display(),
                    err
                ));
            }
        }
    }

    result
}

/// The project path without a stray trailing quote, ending in a separator
pub fn project_dir(raw: &str) -> String {
    let trimmed = raw.strip_suffix('"').unwrap_or(raw);
    if trimmed.ends_with('/') || trimmed.ends_with('\\') {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, std::path::MAIN_SEPARATOR)
    }
}

fn stamp_project(config: &UpdateVersionConfig, report: &mut Report) -> DeployResult<UpdateOutcome> {
    report.line("Parameters");
    report.line(format!("  Path: {}", config.path.as_deref().unwrap_or("")));
    report.line(format!("  Marker: {:?}", config.marker()));
    report.line(format!("  Increment: {:?}", config.increment_flags()));

    let raw_path = config
        .path
        .as_deref()
        .filter(|path| !path.is_empty())
        .ok_or_else(|| DeployError::InvalidConfiguration("/Path is required".to_string()))?;
    let project = project_dir(raw_path);

    if let Some(window) = config.ignore {
        let list = IgnoreList::new(ignore_list_path(config)?);
        debug!("Checking ignore list {}", list.file_path().display());

        if let IgnoreDecision::Skip { last_stamped } =
            list.check_and_touch(&project, window.unwrap_or(0.0), Local::now())?
        {
            let message = format!("Ignored, last stamped {}", last_stamped.to_rfc3339());
            println!("{}", message.yellow());
            report.line(message);
            return Ok(UpdateOutcome::Ignored);
        }
    }

    let project_path = Path::new(&project);
    if !project_path.is_dir() {
        report.line("Path NOT Found");
        return Err(DeployError::NotFound {
            what: "project directory",
            path: project_path.to_path_buf(),
        });
    }
    report.line("Path Exists");

    for candidate in CANDIDATES {
        let file = project_path.join(candidate);
        if !file.is_file() {
            report.line(format!("{} NOT Found", file.display()));
            continue;
        }

        report.line(format!("{} Found", file.display()));
        let stamper = VersionStamper::new(config.marker(), config.increment_flags());
        let outcome = stamper.stamp_file(&file)?;

        report.line(format!("New Version {}", outcome.version));
        println!(
            "{} {} {} {}",
            "Version:".green(),
            outcome.previous.dimmed(),
            "->".dimmed(),
            outcome.version.to_string().bold()
        );

        return Ok(UpdateOutcome::Stamped {
            file,
            previous: outcome.previous,
            version: outcome.version,
        });
    }

    println!("{}", "No AssemblyInfo.cs found".yellow());
    Ok(UpdateOutcome::NoVersionFile)
}

fn ignore_list_path(config: &UpdateVersionConfig) -> DeployResult<PathBuf> {
    match &config.ignore_list {
        Some(path) => Ok(path.clone()),
        None => Ok(executable_dir()?.join(IGNORE_LIST_FILE)),
    }
}

fn report_path(config: &UpdateVersionConfig) -> Option<PathBuf> {
    match &config.output {
        None => None,
        Some(Some(path)) => Some(path.clone()),
        Some(None) => match executable_dir() {
            Ok(dir) => Some(dir.join(REPORT_FILE)),
            Err(err) => {
                warn!("No default report location: {}", err);
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ASSEMBLY_INFO: &str =
        "using System.Reflection;\r\n[assembly: AssemblyVersion(\"1.0.0.0\")]\r\n";

    fn project_with_info(relative: &str) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join(relative);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(file, ASSEMBLY_INFO).unwrap();
        temp_dir
    }

    fn config_for(dir: &Path) -> UpdateVersionConfig {
        UpdateVersionConfig {
            path: Some(dir.display().to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_project_dir_strips_trailing_quote() {
        let sep = std::path::MAIN_SEPARATOR;
        assert_eq!(project_dir("/src/app\""), format!("/src/app{}", sep));
        assert_eq!(project_dir("/src/app/"), "/src/app/");
    }

    #[test]
    fn test_stamps_properties_file() {
        let project = project_with_info("Properties/AssemblyInfo.cs");
        let mut config = config_for(project.path());
        config.release = true;

        let outcome = run_update_version(&config, &EventLog::disabled()).unwrap();
        match outcome {
            UpdateOutcome::Stamped { previous, version, .. } => {
                assert_eq!(previous, "1.0.0.0");
                assert_eq!(version, VersionQuadruplet::new(1, 0, 1, 1));
            }
            other => panic!("Expected Stamped, got: {:?}", other),
        }

        let text =
            fs::read_to_string(project.path().join("Properties/AssemblyInfo.cs")).unwrap();
        assert!(text.contains("AssemblyVersion(\"1.0.1.1\")"));
    }

    #[test]
    fn test_falls_back_to_root_file() {
        let project = project_with_info("AssemblyInfo.cs");
        let outcome = run_update_version(&config_for(project.path()), &EventLog::disabled())
            .unwrap();
        assert!(matches!(outcome, UpdateOutcome::Stamped { .. }));
    }

    #[test]
    fn test_ignore_window_skips_second_stamp() {
        let project = project_with_info("AssemblyInfo.cs");
        let mut config = config_for(project.path());
        config.ignore = Some(Some(60.0));
        config.ignore_list = Some(project.path().join("ignore.dat"));

        let first = run_update_version(&config, &EventLog::disabled()).unwrap();
        assert!(matches!(first, UpdateOutcome::Stamped { .. }));
        let second = run_update_version(&config, &EventLog::disabled()).unwrap();
        assert_eq!(second, UpdateOutcome::Ignored);

        let text = fs::read_to_string(project.path().join("AssemblyInfo.cs")).unwrap();
        assert!(text.contains("AssemblyVersion(\"1.0.0.1\")"));
    }

    #[test]
    fn test_report_written_on_error() {
        let temp_dir = TempDir::new().unwrap();
        let report = temp_dir.path().join("report.txt");
        let config = UpdateVersionConfig {
            path: Some(temp_dir.path().join("missing").display().to_string()),
            output: Some(Some(report.clone())),
            ..Default::default()
        };

        let result = run_update_version(&config, &EventLog::disabled());
        assert!(matches!(result, Err(DeployError::NotFound { .. })));

        let text = fs::read_to_string(report).unwrap();
        assert!(text.starts_with("Parameters\r\n"));
        assert!(text.contains("Path NOT Found"));
        assert!(text.contains("Error: Could not find project directory"));
    }

    #[test]
    fn test_no_version_file() {
        let temp_dir = TempDir::new().unwrap();
        let outcome =
            run_update_version(&config_for(temp_dir.path()), &EventLog::disabled()).unwrap();
        assert_eq!(outcome, UpdateOutcome::NoVersionFile);
    }
}
