use crate::resx::{
    document::ResxDocument,
    types::{MissingEntry, ResourceTable, SyncSummary},
    ResxError, Result,
};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Load the master table. Duplicate keys keep their first occurrence.
pub fn load_master(path: &Path) -> Result<ResourceTable> {
    let document = ResxDocument::load(path)?;
    let mut table = ResourceTable::new();

    for entry in document.entries() {
        if !table.insert(entry.clone()) {
            warn!(
                "Duplicate key '{}' in {}, keeping the first occurrence",
                entry.name,
                path.display()
            );
        }
    }

    debug!("Master table has {} entries", table.len());
    Ok(table)
}

pub fn load_dependent(path: &Path) -> Result<HashMap<String, String>> {
    Ok(ResxDocument::load(path)?.texts())
}

/// Report every master key missing from `document`, appending it when
/// `allow_insert` is set. Returns the number of missing keys.
pub fn compare<F>(
    master: &ResourceTable,
    document: &mut ResxDocument,
    allow_insert: bool,
    on_missing: &mut F,
) -> Result<usize>
where
    F: FnMut(&MissingEntry) -> Result<()>,
{
    let existing = document.texts();
    let mut missing = 0;

    for entry in master.iter() {
        if existing.contains_key(&entry.name) {
            continue;
        }

        missing += 1;
        on_missing(&MissingEntry {
            file: document.path().to_path_buf(),
            key: entry.name.clone(),
        })?;

        if allow_insert {
            document.append(entry.clone());
        }
    }

    Ok(missing)
}

/// Load `path`, hand it to `process`, and write it back no matter how
/// `process` went.
///
/// A processing error comes back as [`ResxError::Aborted`], which records
/// whether the partially processed document made it to disk.
pub fn with_document<T, F>(path: &Path, process: F) -> Result<T>
where
    F: FnOnce(&mut ResxDocument) -> Result<T>,
{
    let mut document = ResxDocument::load(path)?;
    let outcome = process(&mut document);
    let saved = document.save();

    match (outcome, saved) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(source)) => Err(ResxError::Save {
            path: path.to_path_buf(),
            source,
        }),
        (Err(err), saved) => Err(ResxError::Aborted {
            path: path.to_path_buf(),
            source: Box::new(err),
            save_error: saved.err(),
        }),
    }
}

pub struct ResourceSynchronizer {
    master_file: PathBuf,
    dependent_files: Vec<PathBuf>,
    backup_dir: Option<PathBuf>,
}

impl ResourceSynchronizer {
    pub fn new(master_file: PathBuf, dependent_files: Vec<PathBuf>) -> Self {
        Self {
            master_file,
            dependent_files,
            backup_dir: None,
        }
    }

    /// Copy each dependent file here before it is rewritten
    pub fn with_backup_dir(mut self, backup_dir: PathBuf) -> Self {
        self.backup_dir = Some(backup_dir);
        self
    }

    pub fn master_file(&self) -> &Path {
        &self.master_file
    }

    pub fn dependent_files(&self) -> &[PathBuf] {
        &self.dependent_files
    }

    /// Compare every dependent against the master, in the order given.
    ///
    /// Each dependent is written back even when nothing was added. The first
    /// failing dependent stops the run; files processed before it stay written.
    pub fn run<F>(&self, update_files: bool, mut on_missing: F) -> Result<SyncSummary>
    where
        F: FnMut(&MissingEntry) -> Result<()>,
    {
        if !self.master_file.is_file() {
            return Err(ResxError::InvalidConfiguration(format!(
                "master file {} does not exist",
                self.master_file.display()
            )));
        }
        if self.dependent_files.is_empty() {
            return Err(ResxError::InvalidConfiguration(
                "no dependent files to compare".to_string(),
            ));
        }

        let master = load_master(&self.master_file)?;
        let mut summary = SyncSummary::default();

        for file in &self.dependent_files {
            if let Some(backup_dir) = &self.backup_dir {
                backup_file(file, backup_dir)?;
            }

            debug!("Comparing {} against master", file.display());
            let missing = with_document(file, |document| {
                compare(&master, document, update_files, &mut on_missing)
            })?;

            summary.files += 1;
            summary.missing += missing;
            if update_files {
                summary.inserted += missing;
            }
        }

        Ok(summary)
    }
}

fn backup_file(file: &Path, backup_dir: &Path) -> Result<PathBuf> {
    let file_name = file
        .file_name()
        .ok_or_else(|| ResxError::InvalidConfiguration(format!("{} has no file name", file.display())))?;
    let destination = backup_dir.join(file_name);

    if destination.exists() {
        fs::remove_file(&destination)?;
    }
    fs::copy(file, &destination)?;
    debug!("Backed up {} to {}", file.display(), destination.display());

    Ok(destination)
}
