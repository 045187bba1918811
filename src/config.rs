use crate::version::{IncrementFlags, VersionMarker};
use clap::Parser;
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Could not determine the executable's directory")]
    ExecutableDirNotFound,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Name of the defaults file `build-deploy-util` looks for in the working directory
pub const DEPLOY_DEFAULTS_FILE: &str = ".build-deploy.json";
/// Name of the defaults file `update-version` looks for in the working directory
pub const UPDATE_VERSION_DEFAULTS_FILE: &str = ".update-version.json";

const LEGACY_SYNTAX_HELP: &str =
    "Options are case-insensitive and may also be written as /Name=value or -Name=value.";

// RUST LEARNING: Generic struct with a zero-sized marker
// - `PhantomData<T>` records which type this file deserializes into
//   without storing a value of it
pub struct FileConfig<T> {
    file_path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T> FileConfig<T>
where
    T: for<'de> Deserialize<'de> + Default,
{
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            _marker: PhantomData,
        }
    }

    /// Read the file, falling back to `T::default()` when it does not exist
    pub fn load(&self) -> Result<T> {
        debug!("Loading config from: {}", self.file_path.display());
        if !self.file_path.exists() {
            debug!("Config file not found, using default");
            return Ok(T::default());
        }

        let contents = fs::read_to_string(&self.file_path)?;
        let config = serde_json::from_str(&contents)?;
        debug!("Config loaded successfully");
        Ok(config)
    }
}

/// JSON defaults, e.g. `{ "options": { "GitRepository": "app", "Release": true } }`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DefaultsFile {
    #[serde(default)]
    pub options: BTreeMap<String, serde_json::Value>,
}

/// Rewrite one `/Key=value`, `-Key=value` or `--Key=value` argument into the
/// lower-case `--key=value` form clap understands.
pub fn normalize_arg(raw: &str) -> String {
    let stripped = raw
        .strip_prefix("--")
        .or_else(|| raw.strip_prefix('-'))
        .or_else(|| raw.strip_prefix('/'))
        .unwrap_or(raw);

    if stripped == "?" || stripped == "h" || stripped.eq_ignore_ascii_case("help") {
        return "--help".to_string();
    }

    match stripped.split_once('=') {
        Some((key, value)) => format!("--{}={}", key.to_ascii_lowercase(), value),
        None => format!("--{}", stripped.to_ascii_lowercase()),
    }
}

/// Turn a defaults file into arguments: `true` becomes a bare flag,
/// `false`/`null` are dropped, everything else becomes `--key=value`.
pub fn defaults_to_args(options: &BTreeMap<String, serde_json::Value>) -> Vec<String> {
    options
        .iter()
        .filter_map(|(key, value)| {
            let key = key.to_ascii_lowercase();
            // RUST LEARNING: Pattern matching on enum variants to convert JSON values
            match value {
                serde_json::Value::Bool(true) => Some(format!("--{}", key)),
                serde_json::Value::Bool(false) | serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(format!("--{}={}", key, s)),
                serde_json::Value::Number(n) => Some(format!("--{}={}", key, n)),
                other => Some(format!("--{}={}", key, other)),
            }
        })
        .collect()
}

/// Build the argument list handed to clap: program name, then defaults from
/// the JSON file, then the normalized command line (later values win).
pub fn resolve_args<I>(raw: I, defaults_file_name: &str) -> Result<Vec<String>>
where
    I: IntoIterator<Item = String>,
{
    let mut raw = raw.into_iter();
    let program = raw.next().unwrap_or_default();
    let normalized: Vec<String> = raw.map(|arg| normalize_arg(&arg)).collect();

    let explicit = normalized
        .iter()
        .rev()
        .find_map(|arg| arg.strip_prefix("--config="))
        .map(PathBuf::from);

    let defaults_path = match &explicit {
        Some(path) if !path.is_file() => return Err(ConfigError::NotFound(path.clone())),
        Some(path) => path.clone(),
        None => std::env::current_dir()?.join(defaults_file_name),
    };

    let defaults = FileConfig::<DefaultsFile>::new(defaults_path).load()?;

    let mut args = vec![program];
    args.extend(defaults_to_args(&defaults.options));
    args.extend(normalized);
    debug!("Resolved arguments: {:?}", args);
    Ok(args)
}

/// Directory holding the running executable; side files default to living here
pub fn executable_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or(ConfigError::ExecutableDirNotFound)
}

// RUST LEARNING: `#[derive(Parser)]` generates command-line parsing code for the struct
// - Built once per run and passed by reference to every stage
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "build-deploy-util")]
#[command(
    about = "Post-build deploy steps: git tag, NuGet package, Inno Setup installer and ResX sync"
)]
#[command(args_override_self = true, after_help = LEGACY_SYNTAX_HELP)]
pub struct DeployConfig {
    /// It's a release build
    #[arg(long = "release")]
    pub release: bool,

    /// It's a debug build (the default when /Release is absent)
    #[arg(long = "debug")]
    pub debug: bool,

    /// Do nothing for debug builds
    #[arg(long = "ignoredebug")]
    pub ignore_debug: bool,

    /// Built assembly (.exe/.dll)
    #[arg(long = "target", value_name = "FILE")]
    pub target: Option<PathBuf>,

    /// Version of the target, e.g. 1.2.3.4
    #[arg(long = "version", value_name = "X.Y.Z.W")]
    pub version: Option<String>,

    /// AssemblyInfo.cs to read the target's version from when /Version is absent
    #[arg(long = "assemblyinfo", value_name = "FILE")]
    pub assembly_info: Option<PathBuf>,

    /// Product description (defaults to the target's file name)
    #[arg(long = "description")]
    pub description: Option<String>,

    /// Path to the git executable
    #[arg(long = "git", value_name = "FILE", help_heading = "Git")]
    pub git: Option<PathBuf>,

    /// Repository name
    #[arg(long = "gitrepository", help_heading = "Git")]
    pub git_repository: Option<String>,

    /// Repository working directory
    #[arg(long = "gitworkingdir", value_name = "DIR", help_heading = "Git")]
    pub git_working_dir: Option<PathBuf>,

    /// Tag name prefix (defaults to the description)
    #[arg(long = "gitversionname", help_heading = "Git")]
    pub git_version_name: Option<String>,

    /// Tag message (defaults to "<repository> v<version>")
    #[arg(long = "gittagname", help_heading = "Git")]
    pub git_tag_name: Option<String>,

    /// Target framework folder, e.g. net452
    #[arg(long = "netversion", help_heading = "NuGet")]
    pub net_version: Option<String>,

    /// Path to nuget
    #[arg(long = "nugetexe", value_name = "FILE", help_heading = "NuGet")]
    pub nuget_exe: Option<PathBuf>,

    /// The .nuspec file
    #[arg(long = "nugetpack", value_name = "FILE", help_heading = "NuGet")]
    pub nuget_pack: Option<PathBuf>,

    /// Replace $version$ in the nuspec, using 1 to 4 version parts (default 3)
    #[arg(long = "nugetver", value_name = "PARTS", require_equals = true, help_heading = "NuGet")]
    pub nuget_ver: Option<Option<u8>>,

    /// Replace an existing package
    #[arg(long = "nugetoverwrite", help_heading = "NuGet")]
    pub nuget_overwrite: bool,

    /// Push the package after packing
    #[arg(long = "nugetpush", help_heading = "NuGet")]
    pub nuget_push: bool,

    /// File containing the NuGet API key
    #[arg(long = "nugetkeyfile", value_name = "FILE", help_heading = "NuGet")]
    pub nuget_key_file: Option<PathBuf>,

    /// Push source (defaults to nuget.org)
    #[arg(long = "nugetsource", value_name = "URL", help_heading = "NuGet")]
    pub nuget_source: Option<String>,

    /// Path to the Inno Setup command line compiler
    #[arg(long = "innoexe", value_name = "FILE", help_heading = "Inno Setup")]
    pub inno_exe: Option<PathBuf>,

    /// The .iss script
    #[arg(long = "innoscript", value_name = "FILE", help_heading = "Inno Setup")]
    pub inno_script: Option<PathBuf>,

    /// Compiled setup file; {0} is replaced with the version
    #[arg(long = "innosetup", value_name = "FILE", help_heading = "Inno Setup")]
    pub inno_setup: Option<String>,

    /// Only synchronize resource files, ignoring every other deploy option
    #[arg(long = "resx", help_heading = "ResX")]
    pub resx: bool,

    /// Primary resource file name (LanguageStrings.resx)
    #[arg(long = "resxprimary", value_name = "NAME", help_heading = "ResX")]
    pub resx_primary: Option<String>,

    /// Directory that receives copies of files before they are updated
    #[arg(long = "resxbackup", value_name = "DIR", help_heading = "ResX")]
    pub resx_backup: Option<PathBuf>,

    /// Only report differences
    #[arg(long = "resxtestonly", help_heading = "ResX")]
    pub resx_test_only: bool,

    /// Project file or directory holding the resource files
    #[arg(long = "resxpath", value_name = "PATH", help_heading = "ResX")]
    pub resx_path: Option<PathBuf>,

    /// Event log file
    #[arg(long = "eventlog", value_name = "FILE")]
    pub event_log: Option<PathBuf>,

    /// JSON defaults file
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long = "verbose")]
    pub verbose: bool,
}

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "update-version")]
#[command(about = "Bumps the version declared in a project's AssemblyInfo.cs")]
#[command(args_override_self = true, after_help = LEGACY_SYNTAX_HELP)]
pub struct UpdateVersionConfig {
    /// Project directory
    #[arg(long = "path", value_name = "DIR")]
    pub path: Option<String>,

    /// Skip projects stamped within the last T minutes
    #[arg(long = "ignore", value_name = "MINUTES", require_equals = true)]
    pub ignore: Option<Option<f64>>,

    /// Ignore list file (defaults to ignoreList.dat next to the executable)
    #[arg(long = "ignorelist", value_name = "FILE")]
    pub ignore_list: Option<PathBuf>,

    /// Write a report to this file (defaults to verinfoUpdate.txt next to the executable)
    #[arg(long = "output", value_name = "FILE", require_equals = true)]
    pub output: Option<Option<PathBuf>>,

    /// Increase the major number
    #[arg(long = "increasemajor")]
    pub increase_major: bool,

    /// Increase the minor number
    #[arg(long = "increaseminor")]
    pub increase_minor: bool,

    /// Increase the build number
    #[arg(long = "increasebuild")]
    pub increase_build: bool,

    /// Release build (same as /IncreaseBuild)
    #[arg(long = "release")]
    pub release: bool,

    /// Stamp AssemblyFileVersion instead of AssemblyVersion
    #[arg(long = "fileversion")]
    pub file_version: bool,

    /// Event log file
    #[arg(long = "eventlog", value_name = "FILE")]
    pub event_log: Option<PathBuf>,

    /// JSON defaults file
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long = "verbose")]
    pub verbose: bool,
}

impl UpdateVersionConfig {
    pub fn increment_flags(&self) -> IncrementFlags {
        IncrementFlags {
            increase_major: self.increase_major,
            increase_minor: self.increase_minor,
            increase_build: self.increase_build,
            release: self.release,
        }
    }

    pub fn marker(&self) -> VersionMarker {
        VersionMarker::from_file_version_flag(self.file_version)
    }
}
