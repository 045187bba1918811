pub mod document;
pub mod synchronizer;
pub mod types;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Resource file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Invalid resource file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("Invalid resource configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Failed to save {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}", describe_abort(.path, .source, .save_error.as_ref()))]
    Aborted {
        path: PathBuf,
        source: Box<ResxError>,
        save_error: Option<std::io::Error>,
    },
}

fn describe_abort(
    path: &std::path::Path,
    source: &ResxError,
    save_error: Option<&std::io::Error>,
) -> String {
    match save_error {
        None => format!(
            "Processing {} failed ({}); the partial document was saved",
            path.display(),
            source
        ),
        Some(save_error) => format!(
            "Processing {} failed ({}) and saving it also failed: {}",
            path.display(),
            source,
            save_error
        ),
    }
}

pub type Result<T> = std::result::Result<T, ResxError>;

pub use document::ResxDocument;
pub use synchronizer::{compare, load_dependent, load_master, with_document, ResourceSynchronizer};
pub use types::{MissingEntry, ResourceEntry, ResourceTable, SyncSummary};
