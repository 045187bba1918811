use crate::config::DeployConfig;
use crate::error::{DeployError, DeployResult};
use crate::event_log::EventLog;
use crate::stages::{GitStage, InnoStage, NugetStage, ResxStage, Stage, StageStatus, VersionInfo};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use log::debug;

/// What happened to one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub name: &'static str,
    pub status: StageStatus,
}

/// How the deploy run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    IgnoredDebugBuild,
    Finished(Vec<StageReport>),
}

/// Run the deploy pipeline for one build.
///
/// A stage whose external tool fails is reported and the next stage still
/// runs; any other error stops the pipeline.
pub fn run_deploy(config: &DeployConfig, event_log: &EventLog) -> DeployResult<DeployOutcome> {
    if config.ignore_debug && !config.release {
        println!("{}", "Ignoring Debug Build".yellow());
        return Ok(DeployOutcome::IgnoredDebugBuild);
    }

    if config.resx {
        debug!("ResX mode, other deploy options are ignored");
        let report = run_stage(&ResxStage::new(config), event_log)?;
        let reports = vec![report];
        print_summary(&reports);
        return Ok(DeployOutcome::Finished(reports));
    }

    let target = config.target.as_deref().ok_or_else(|| {
        DeployError::InvalidConfiguration("/Target is required".to_string())
    })?;
    if !target.is_file() {
        return Err(DeployError::NotFound {
            what: "target file",
            path: target.to_path_buf(),
        });
    }

    let info = VersionInfo::resolve(config, target)?;
    println!(
        "{} {} {}",
        "Target:".cyan(),
        info.description,
        info.file_version.to_string().dimmed()
    );

    // RUST LEARNING: Trait objects let one Vec hold different stage types
    let stages: Vec<Box<dyn Stage + '_>> = vec![
        Box::new(GitStage::new(config, &info)),
        Box::new(NugetStage::new(config, &info, target)),
        Box::new(InnoStage::new(config, &info)),
    ];

    let mut reports = Vec::with_capacity(stages.len());
    for stage in &stages {
        reports.push(run_stage(stage.as_ref(), event_log)?);
    }

    print_summary(&reports);
    Ok(DeployOutcome::Finished(reports))
}

pub fn run_stage(stage: &dyn Stage, event_log: &EventLog) -> DeployResult<StageReport> {
    let name = stage.name();
    println!("{}", format!("✨ Running {}...", name).green());

    let status = match stage.execute() {
        Ok(status) => status,
        Err(err) if err.is_external_failure() => {
            eprintln!("{} {}", "Error:".red(), err);
            event_log.add_error(&err);
            StageStatus::Failed(err.to_string())
        }
        Err(err) => return Err(err),
    };

    match &status {
        StageStatus::Completed(detail) => event_log.add(&format!("{}: {}", name, detail)),
        StageStatus::Skipped(reason) => debug!("{} skipped: {}", name, reason),
        StageStatus::Failed(_) => {}
    }

    Ok(StageReport { name, status })
}

fn print_summary(reports: &[StageReport]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Stage").fg(comfy_table::Color::Green),
        Cell::new("Status").fg(comfy_table::Color::Green),
        Cell::new("Details").fg(comfy_table::Color::Green),
    ]);

    for report in reports {
        let color = match report.status {
            StageStatus::Completed(_) => comfy_table::Color::Green,
            StageStatus::Skipped(_) => comfy_table::Color::DarkGrey,
            StageStatus::Failed(_) => comfy_table::Color::Red,
        };
        table.add_row(vec![
            Cell::new(report.name),
            Cell::new(report.status.label()).fg(color),
            Cell::new(report.status.detail()),
        ]);
    }

    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct FailingStage;

    impl Stage for FailingStage {
        fn name(&self) -> &'static str {
            "Failing"
        }

        fn execute(&self) -> DeployResult<StageStatus> {
            Err(DeployError::external("tool", "exited with 1"))
        }
    }

    struct BrokenStage;

    impl Stage for BrokenStage {
        fn name(&self) -> &'static str {
            "Broken"
        }

        fn execute(&self) -> DeployResult<StageStatus> {
            Err(DeployError::InvalidConfiguration("bad".to_string()))
        }
    }

    #[test]
    fn test_external_failure_marks_stage_failed() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("events.log");
        let event_log = EventLog::new(Some(log_path.clone()));

        let report = run_stage(&FailingStage, &event_log).unwrap();
        assert_eq!(report.status.label(), "failed");
        assert!(fs::read_to_string(log_path).unwrap().contains("tool failed"));
    }

    #[test]
    fn test_other_errors_stop_the_run() {
        let result = run_stage(&BrokenStage, &EventLog::disabled());
        assert!(matches!(result, Err(DeployError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_ignore_debug_build() {
        let config = DeployConfig {
            ignore_debug: true,
            debug: true,
            ..Default::default()
        };
        let outcome = run_deploy(&config, &EventLog::disabled()).unwrap();
        assert_eq!(outcome, DeployOutcome::IgnoredDebugBuild);
    }

    #[test]
    fn test_missing_target_is_not_found() {
        let config = DeployConfig {
            release: true,
            target: Some(PathBuf::from("/definitely/missing/App.dll")),
            ..Default::default()
        };
        assert!(matches!(
            run_deploy(&config, &EventLog::disabled()),
            Err(DeployError::NotFound { .. })
        ));
    }

    #[test]
    fn test_unconfigured_stages_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("App.dll");
        fs::write(&target, "binary").unwrap();

        let config = DeployConfig {
            release: true,
            target: Some(target),
            version: Some("1.0.0.0".to_string()),
            ..Default::default()
        };

        let DeployOutcome::Finished(reports) = run_deploy(&config, &EventLog::disabled()).unwrap()
        else {
            panic!("Expected the pipeline to run");
        };
        let names: Vec<&str> = reports.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Git", "NuGet", "Inno Setup"]);
        assert!(reports.iter().all(|r| r.status.label() == "skipped"));
    }
}
