use crate::config::DeployConfig;
use crate::error::DeployResult;
use crate::resx::{MissingEntry, ResourceSynchronizer};
use crate::stages::{Stage, StageStatus};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PRIMARY: &str = "LanguageStrings.resx";

/// Master and dependent resource files found next to a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResxFiles {
    pub master: Option<PathBuf>,
    pub dependents: Vec<PathBuf>,
}

/// Scan the directory holding `project_path` (or `project_path` itself when
/// it is a directory). Names are compared case-insensitively: the file named
/// `primary` is the master (failing that, the first file ending in it), and
/// other files starting with its stem are dependents.
pub fn discover(project_path: &Path, primary: &str) -> DeployResult<ResxFiles> {
    let dir = if project_path.is_dir() {
        project_path
    } else {
        project_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    };
    debug!("Looking for resource files in {}", dir.display());

    let primary_lower = primary.to_lowercase();
    let stem_lower = Path::new(&primary_lower)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("resx"))
        })
        .collect();
    files.sort();

    let mut exact = None;
    let mut suffixed = None;
    let mut dependents = Vec::new();
    for file in files {
        let name = file
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        // Files named after the primary are master candidates, never dependents
        if name == primary_lower {
            exact = Some(file);
        } else if name.ends_with(&primary_lower) {
            if suffixed.is_none() {
                suffixed = Some(file);
            }
        } else if name.starts_with(&stem_lower) {
            dependents.push(file);
        }
    }

    Ok(ResxFiles {
        master: exact.or(suffixed),
        dependents,
    })
}

/// Adds keys missing from translated resource files
pub struct ResxStage<'a> {
    config: &'a DeployConfig,
}

impl<'a> ResxStage<'a> {
    pub fn new(config: &'a DeployConfig) -> Self {
        Self { config }
    }

    /// Build the synchronizer, or `None` when `/ResXPath` is not set
    pub fn initialise(&self) -> DeployResult<Option<ResourceSynchronizer>> {
        let Some(project_path) = self
            .config
            .resx_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
        else {
            return Ok(None);
        };

        let primary = self
            .config
            .resx_primary
            .as_deref()
            .filter(|primary| !primary.is_empty())
            .unwrap_or(DEFAULT_PRIMARY);

        let files = discover(project_path, primary)?;
        let master = files.master.unwrap_or_else(|| {
            if project_path.is_dir() {
                project_path.join(primary)
            } else {
                project_path.with_file_name(primary)
            }
        });

        let mut synchronizer = ResourceSynchronizer::new(master, files.dependents);
        if let Some(backup_dir) = self.config.resx_backup.as_ref().filter(|dir| dir.is_dir()) {
            synchronizer = synchronizer.with_backup_dir(backup_dir.clone());
        }

        Ok(Some(synchronizer))
    }
}

impl Stage for ResxStage<'_> {
    fn name(&self) -> &'static str {
        "ResX"
    }

    fn execute(&self) -> DeployResult<StageStatus> {
        let Some(synchronizer) = self.initialise()? else {
            return Ok(StageStatus::Skipped("/ResXPath is missing".to_string()));
        };

        let update_files = !self.config.resx_test_only;
        println!("Checking for missing Resx entries");

        let summary = synchronizer.run(update_files, |missing: &MissingEntry| {
            let file_name = missing
                .file
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            println!("Entry {} missing from {}", missing.key, file_name);
            Ok(())
        })?;

        let verb = if update_files { "updated" } else { "missing" };
        println!("{} entries {}.", summary.missing, verb);

        Ok(StageStatus::Completed(format!(
            "{} files checked, {} entries {}",
            summary.files, summary.missing, verb
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeployError;
    use crate::resx::ResxError;
    use tempfile::TempDir;

    fn write_files(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), "<root>\n</root>\n").unwrap();
        }
    }

    #[test]
    fn test_discover_master_and_dependents() {
        let temp_dir = TempDir::new().unwrap();
        write_files(
            temp_dir.path(),
            &[
                "languagestrings.resx",
                "LanguageStrings.fr.resx",
                "LanguageStrings.de.resx",
                "Other.resx",
            ],
        );
        fs::write(temp_dir.path().join("LanguageStrings.txt"), "").unwrap();

        let files = discover(&temp_dir.path().join("App.csproj"), DEFAULT_PRIMARY).unwrap();
        assert_eq!(
            files.master,
            Some(temp_dir.path().join("languagestrings.resx"))
        );
        assert_eq!(
            files.dependents,
            vec![
                temp_dir.path().join("LanguageStrings.de.resx"),
                temp_dir.path().join("LanguageStrings.fr.resx"),
            ]
        );
    }

    #[test]
    fn test_discover_prefers_exact_primary_name() {
        let temp_dir = TempDir::new().unwrap();
        write_files(
            temp_dir.path(),
            &[
                "Admin.LanguageStrings.resx",
                "LanguageStrings.resx",
                "LanguageStrings.de.resx",
            ],
        );

        let files = discover(temp_dir.path(), DEFAULT_PRIMARY).unwrap();
        assert_eq!(
            files.master,
            Some(temp_dir.path().join("LanguageStrings.resx"))
        );
        assert_eq!(
            files.dependents,
            vec![temp_dir.path().join("LanguageStrings.de.resx")]
        );
    }

    #[test]
    fn test_discover_suffix_match_is_never_a_dependent() {
        let temp_dir = TempDir::new().unwrap();
        write_files(
            temp_dir.path(),
            &[
                "Admin.LanguageStrings.resx",
                "Shop.LanguageStrings.resx",
                "LanguageStrings.de.resx",
            ],
        );

        let files = discover(temp_dir.path(), DEFAULT_PRIMARY).unwrap();
        assert_eq!(
            files.master,
            Some(temp_dir.path().join("Admin.LanguageStrings.resx"))
        );
        assert_eq!(
            files.dependents,
            vec![temp_dir.path().join("LanguageStrings.de.resx")]
        );
    }

    #[test]
    fn test_without_path_the_stage_skips() {
        let config = DeployConfig {
            resx: true,
            ..Default::default()
        };
        let status = ResxStage::new(&config).execute().unwrap();
        assert!(matches!(status, StageStatus::Skipped(_)));
    }

    #[test]
    fn test_missing_master_is_invalid_configuration() {
        let temp_dir = TempDir::new().unwrap();
        write_files(temp_dir.path(), &["LanguageStrings.de.resx"]);

        let config = DeployConfig {
            resx: true,
            resx_path: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        let result = ResxStage::new(&config).execute();
        assert!(matches!(
            result,
            Err(DeployError::Resx(ResxError::InvalidConfiguration(_)))
        ));
    }

    #[test]
    fn test_backup_requires_existing_directory() {
        let temp_dir = TempDir::new().unwrap();
        write_files(temp_dir.path(), &["LanguageStrings.resx", "LanguageStrings.de.resx"]);
        let backup = temp_dir.path().join("backup");

        let config = DeployConfig {
            resx_path: Some(temp_dir.path().join("App.csproj")),
            resx_backup: Some(backup.clone()),
            ..Default::default()
        };

        ResxStage::new(&config).execute().unwrap();
        assert!(!backup.exists());

        fs::create_dir(&backup).unwrap();
        ResxStage::new(&config).execute().unwrap();
        assert!(backup.join("LanguageStrings.de.resx").is_file());
    }
}
