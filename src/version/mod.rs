pub mod ignore_list;
pub mod quadruplet;
pub mod stamper;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VersionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid version literal '{literal}': {reason}")]
    Format { literal: String, reason: String },
    #[error("Version literal after '{marker}' has no closing \")]\"")]
    Unterminated { marker: String },
}

pub type Result<T> = std::result::Result<T, VersionError>;

pub use ignore_list::{IgnoreDecision, IgnoreList};
pub use quadruplet::{IncrementFlags, VersionQuadruplet};
pub use stamper::{StampOutcome, VersionMarker, VersionStamper};
