//! # build-deploy
//!
//! Post-build tooling for .NET projects, shipped as two binaries:
//!
//! - `build-deploy-util` tags the release in git, packs and pushes a NuGet
//!   package, compiles an Inno Setup installer, and keeps translated `.resx`
//!   files in step with their master file.
//! - `update-version` bumps the version declared in a project's
//!   `AssemblyInfo.cs`.
//!
//! RUST LEARNING: `//!` comments are "inner doc comments" for modules/crates
//! - `//` is regular comment, `///` is doc comment for items, `//!` is for the containing item

pub mod cli;
pub mod config;
pub mod error;
pub mod event_log;
pub mod process;
pub mod resx;
pub mod stages;
pub mod version;

// RUST LEARNING: `pub use` re-exports items so users can write `build_deploy::EventLog`
pub use config::{DeployConfig, UpdateVersionConfig};
pub use error::{DeployError, DeployResult};
pub use event_log::EventLog;
pub use resx::{ResourceSynchronizer, ResxDocument, ResxError};
pub use version::{VersionQuadruplet, VersionStamper};

/// The current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
