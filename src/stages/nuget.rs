use crate::config::DeployConfig;
use crate::error::{DeployError, DeployResult};
use crate::process::ExternalCommand;
use crate::stages::{existing_file, Stage, StageStatus, VersionInfo};
use crate::version::VersionQuadruplet;
use colored::Colorize;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DEFAULT_PUSH_SOURCE: &str = "https://www.nuget.org/api/v2/package";
const DEFAULT_VERSION_PARTS: u8 = 3;

/// Packs the target into a `.nupkg` next to it and optionally pushes it
pub struct NugetStage<'a> {
    config: &'a DeployConfig,
    info: &'a VersionInfo,
    target: &'a Path,
}

/// Version string used for `$version$`, truncated to `parts` components
pub fn package_version(version: &VersionQuadruplet, parts: u8) -> String {
    match parts {
        1 => format!("{}.0", version.major),
        2 => format!("{}.{}", version.major, version.minor),
        4 => version.render(),
        _ => version.three_part(),
    }
}

impl<'a> NugetStage<'a> {
    pub fn new(config: &'a DeployConfig, info: &'a VersionInfo, target: &'a Path) -> Self {
        Self {
            config,
            info,
            target,
        }
    }

    fn pack(&self, nuget: &Path, nuspec: &Path, net_version: &str) -> DeployResult<PathBuf> {
        println!("Creating Nuget Package");

        let target_dir = self
            .target
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let temp_dir = target_dir.join("temp");

        if temp_dir.exists() {
            fs::remove_dir_all(&temp_dir)?;
        }
        let lib_dir = temp_dir.join("lib").join(net_version);
        fs::create_dir_all(&lib_dir)?;

        let outcome = self.pack_in(nuget, nuspec, &temp_dir, &lib_dir).and_then(|produced| {
            move_package(&produced, target_dir, self.config.nuget_overwrite)
        });

        if let Err(err) = fs::remove_dir_all(&temp_dir) {
            warn!("Could not remove {}: {}", temp_dir.display(), err);
        }

        outcome
    }

    fn pack_in(
        &self,
        nuget: &Path,
        nuspec: &Path,
        temp_dir: &Path,
        lib_dir: &Path,
    ) -> DeployResult<PathBuf> {
        copy_into(self.target, lib_dir)?;
        let documentation = self.target.with_extension("xml");
        if documentation.is_file() {
            copy_into(&documentation, lib_dir)?;
        }

        let mut contents = fs::read_to_string(nuspec)?;
        if let Some(parts) = self.config.nuget_ver {
            let version = package_version(
                &self.info.file_version,
                parts.unwrap_or(DEFAULT_VERSION_PARTS),
            );
            debug!("Package version: {}", version);
            contents = contents.replace("$version$", &version);
        }

        let nuspec_name = nuspec.file_name().ok_or_else(|| {
            DeployError::InvalidConfiguration(format!("{} is not a file", nuspec.display()))
        })?;
        let temp_nuspec = temp_dir.join(nuspec_name);
        fs::write(&temp_nuspec, contents)?;

        let command = ExternalCommand::new(nuget)
            .arg("pack")
            .arg(&temp_nuspec)
            .arg("-NoPackageAnalysis")
            .current_dir(temp_dir);
        let outcome = command.run()?;

        find_package(temp_dir).ok_or_else(|| {
            DeployError::external(
                command.name(),
                format!("no package was created (exited with {})", outcome.status),
            )
        })
    }

    fn push(&self, nuget: &Path, package: &Path) -> DeployResult<Option<String>> {
        let Some(key_file) = existing_file(self.config.nuget_key_file.as_deref()) else {
            debug!("Push requested without an existing key file");
            return Ok(None);
        };
        let key = fs::read_to_string(key_file)?.trim().to_string();
        if key.is_empty() {
            debug!("Key file {} is empty", key_file.display());
            return Ok(None);
        }

        let source = self
            .config
            .nuget_source
            .as_deref()
            .filter(|source| !source.is_empty())
            .unwrap_or(DEFAULT_PUSH_SOURCE);

        let mut command = ExternalCommand::new(nuget)
            .arg("push")
            .arg(package)
            .secret_arg(key)
            .arg("-Source")
            .arg(source);
        if let Some(dir) = package.parent() {
            command = command.current_dir(dir);
        }
        command.run_checked()?;

        println!("{}", "Nuget Push Complete".green());
        Ok(Some(source.to_string()))
    }
}

impl Stage for NugetStage<'_> {
    fn name(&self) -> &'static str {
        "NuGet"
    }

    fn execute(&self) -> DeployResult<StageStatus> {
        let Some(net_version) = self
            .config
            .net_version
            .as_deref()
            .filter(|version| !version.is_empty())
        else {
            println!("netVersion parameter is missing");
            return Ok(StageStatus::Skipped("netVersion parameter is missing".to_string()));
        };
        let Some(nuget) = existing_file(self.config.nuget_exe.as_deref()) else {
            return Ok(StageStatus::Skipped("/NugetExe is missing".to_string()));
        };
        let Some(nuspec) = existing_file(self.config.nuget_pack.as_deref()) else {
            return Ok(StageStatus::Skipped("/NugetPack is missing".to_string()));
        };

        let package = self.pack(nuget, nuspec, net_version)?;
        println!("{} {}", "Nuget Package Created:".green(), package.display());

        if !self.config.nuget_push {
            return Ok(StageStatus::Completed(format!("packed {}", package.display())));
        }

        Ok(match self.push(nuget, &package)? {
            Some(source) => StageStatus::Completed(format!(
                "packed {} and pushed to {}",
                package.display(),
                source
            )),
            None => StageStatus::Completed(format!(
                "packed {} (push skipped, no API key)",
                package.display()
            )),
        })
    }
}

fn copy_into(file: &Path, dir: &Path) -> DeployResult<()> {
    let name = file
        .file_name()
        .ok_or_else(|| DeployError::InvalidConfiguration(format!("{} is not a file", file.display())))?;
    fs::copy(file, dir.join(name))?;
    Ok(())
}

// RUST LEARNING: Iterator chains with `filter_map` skip entries we can't read
fn find_package(dir: &Path) -> Option<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .find(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("nupkg"))
        })
}

fn move_package(produced: &Path, target_dir: &Path, overwrite: bool) -> DeployResult<PathBuf> {
    let name = produced.file_name().ok_or_else(|| {
        DeployError::InvalidConfiguration(format!("{} is not a file", produced.display()))
    })?;
    let destination = target_dir.join(name);

    if destination.exists() {
        if !overwrite {
            return Err(DeployError::external(
                "nuget",
                format!(
                    "{} already exists, pass /NugetOverwrite to replace it",
                    destination.display()
                ),
            ));
        }
        fs::remove_file(&destination)?;
    }

    fs::rename(produced, &destination)?;
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_version_parts() {
        let version = VersionQuadruplet::new(3, 7, 12, 440);
        assert_eq!(package_version(&version, 1), "3.0");
        assert_eq!(package_version(&version, 2), "3.7");
        assert_eq!(package_version(&version, 3), "3.7.12");
        assert_eq!(package_version(&version, 4), "3.7.12.440");
        assert_eq!(package_version(&version, 9), "3.7.12");
    }

    #[test]
    fn test_missing_net_version_skips() {
        let config = DeployConfig::default();
        let info = VersionInfo {
            description: "Demo".to_string(),
            file_version: VersionQuadruplet::new(1, 0, 0, 0),
        };

        let status = NugetStage::new(&config, &info, Path::new("Demo.dll"))
            .execute()
            .unwrap();
        assert_eq!(
            status,
            StageStatus::Skipped("netVersion parameter is missing".to_string())
        );
    }

    #[cfg(unix)]
    mod with_fake_nuget {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        // Packs by copying the nuspec into Demo.nupkg; pushes by recording its arguments
        const FAKE_NUGET: &str = "#!/bin/sh\n\
if [ \"$1\" = \"pack\" ]; then cp \"$2\" Demo.nupkg; fi\n\
if [ \"$1\" = \"push\" ]; then echo \"$@\" > pushed.txt; fi\n";

        struct Fixture {
            temp_dir: TempDir,
            config: DeployConfig,
            info: VersionInfo,
            target: PathBuf,
        }

        fn fixture() -> Fixture {
            let temp_dir = TempDir::new().unwrap();
            let bin = temp_dir.path().join("bin");
            fs::create_dir_all(&bin).unwrap();

            let target = bin.join("Demo.dll");
            fs::write(&target, "binary").unwrap();
            fs::write(bin.join("Demo.xml"), "<doc/>").unwrap();

            let nuget = temp_dir.path().join("nuget");
            fs::write(&nuget, FAKE_NUGET).unwrap();
            fs::set_permissions(&nuget, fs::Permissions::from_mode(0o755)).unwrap();

            let nuspec = temp_dir.path().join("Demo.nuspec");
            fs::write(&nuspec, "<version>$version$</version>").unwrap();

            let config = DeployConfig {
                net_version: Some("net452".to_string()),
                nuget_exe: Some(nuget),
                nuget_pack: Some(nuspec),
                nuget_ver: Some(Some(2)),
                ..Default::default()
            };
            let info = VersionInfo {
                description: "Demo".to_string(),
                file_version: VersionQuadruplet::new(4, 5, 6, 7),
            };

            Fixture {
                temp_dir,
                config,
                info,
                target,
            }
        }

        #[test]
        fn test_pack_moves_package_next_to_target() {
            let fx = fixture();
            let status = NugetStage::new(&fx.config, &fx.info, &fx.target)
                .execute()
                .unwrap();

            assert!(matches!(status, StageStatus::Completed(_)));
            let package = fx.temp_dir.path().join("bin").join("Demo.nupkg");
            assert_eq!(
                fs::read_to_string(package).unwrap(),
                "<version>4.5</version>"
            );
            assert!(!fx.temp_dir.path().join("bin").join("temp").exists());
        }

        #[test]
        fn test_existing_package_needs_overwrite() {
            let mut fx = fixture();
            let existing = fx.temp_dir.path().join("bin").join("Demo.nupkg");
            fs::write(&existing, "old").unwrap();

            let result = NugetStage::new(&fx.config, &fx.info, &fx.target).execute();
            assert!(matches!(result, Err(ref err) if err.is_external_failure()));
            assert_eq!(fs::read_to_string(&existing).unwrap(), "old");

            fx.config.nuget_overwrite = true;
            NugetStage::new(&fx.config, &fx.info, &fx.target)
                .execute()
                .unwrap();
            assert_eq!(
                fs::read_to_string(&existing).unwrap(),
                "<version>4.5</version>"
            );
        }

        #[test]
        fn test_push_uses_key_and_default_source() {
            let mut fx = fixture();
            let key_file = fx.temp_dir.path().join("key.txt");
            fs::write(&key_file, "  secret-key\n").unwrap();
            fx.config.nuget_push = true;
            fx.config.nuget_key_file = Some(key_file);

            NugetStage::new(&fx.config, &fx.info, &fx.target)
                .execute()
                .unwrap();

            let pushed =
                fs::read_to_string(fx.temp_dir.path().join("bin").join("pushed.txt")).unwrap();
            assert!(pushed.contains("secret-key -Source https://www.nuget.org/api/v2/package"));
        }
    }
}
