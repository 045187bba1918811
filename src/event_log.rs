use chrono::Local;
use log::{debug, warn};
use std::error::Error;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only log of notable events and errors, kept across runs.
///
/// Writing is best effort: a log that cannot be written is reported through
/// `log::warn!` and otherwise ignored, so it never hides the error being logged.
#[derive(Debug, Clone)]
pub struct EventLog {
    file_path: Option<PathBuf>,
}

impl EventLog {
    pub fn new(file_path: Option<PathBuf>) -> Self {
        Self { file_path }
    }

    pub fn disabled() -> Self {
        Self { file_path: None }
    }

    /// `<data dir>/build-deploy/events.log`, when the platform has a data dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("build-deploy").join("events.log"))
    }

    /// Use `explicit` when given, otherwise the default location
    pub fn from_option(explicit: Option<PathBuf>) -> Self {
        Self::new(explicit.or_else(Self::default_path))
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn add(&self, message: &str) {
        let Some(path) = &self.file_path else {
            return;
        };

        if let Err(err) = append(path, message) {
            warn!("Could not write event log {}: {}", path.display(), err);
        } else {
            debug!("Event logged: {}", message);
        }
    }

    /// Log an error together with its chain of sources
    pub fn add_error(&self, error: &dyn Error) {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            let cause_text = cause.to_string();
            // Wrappers like `Io` or `Aborted` already print their source
            if !message.contains(&cause_text) {
                message.push_str(" | caused by: ");
                message.push_str(&cause_text);
            }
            source = cause.source();
        }
        self.add(&format!("ERROR {}", message));
    }
}

fn append(path: &Path, message: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    // One record per line, whatever the message contains
    let single_line = message.replace(['\r', '\n'], " ");
    writeln!(
        file,
        "{}\t{}",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        single_line
    )
}
