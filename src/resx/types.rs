use std::collections::HashMap;
use std::path::PathBuf;

/// One `data` element of a resource file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub name: String,
    pub text: String,
    pub description: String,
}

impl ResourceEntry {
    pub fn new(name: impl Into<String>, text: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            description: description.into(),
        }
    }
}

/// Master entries keyed by name, iterated in document order.
#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
    entries: Vec<ResourceEntry>,
    index: HashMap<String, usize>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry unless its key is already present; the first occurrence wins.
    pub fn insert(&mut self, entry: ResourceEntry) -> bool {
        if self.index.contains_key(&entry.name) {
            return false;
        }
        self.index.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    pub fn get(&self, key: &str) -> Option<&ResourceEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Raised for every master key a dependent file lacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingEntry {
    pub file: PathBuf,
    pub key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncSummary {
    pub files: usize,
    pub missing: usize,
    pub inserted: usize,
}
