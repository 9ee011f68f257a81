//! In-memory virtual file map.
//!
//! The store is the single source of truth for both the protocol side
//! (file operations mutate it) and the bundler side (builds read a
//! snapshot of it). Keys are canonical `/`-rooted paths, iterated in
//! sorted order so every consumer sees a deterministic view.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::Language;
use crate::error::StoreError;

use super::paths::normalize;

/// A single file in the virtual file map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Canonical `/`-rooted path, unique key of the store.
    pub path: String,
    pub content: String,
    pub language: Language,
}

/// Virtual file map keyed by canonical path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualFileStore {
    files: BTreeMap<String, FileEntry>,
}

impl VirtualFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(path, content)` pairs, e.g. the result of
    /// listing a project from canonical storage.
    pub fn from_files<I, P, C>(files: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: Into<String>,
    {
        let mut store = Self::new();
        for (path, content) in files {
            store.put(path.as_ref(), content)?;
        }
        Ok(store)
    }

    /// Insert or replace a file, deriving its language from the extension.
    ///
    /// Returns the canonical path the entry was stored under.
    pub fn put(&mut self, path: &str, content: impl Into<String>) -> Result<String, StoreError> {
        let path = normalize(path)?;
        let language = Language::from_path(&path);
        self.insert(path.clone(), content.into(), language);
        Ok(path)
    }

    /// Insert or replace a file with an explicitly declared language.
    pub fn put_with_language(
        &mut self,
        path: &str,
        content: impl Into<String>,
        language: Language,
    ) -> Result<String, StoreError> {
        let path = normalize(path)?;
        self.insert(path.clone(), content.into(), language);
        Ok(path)
    }

    fn insert(&mut self, path: String, content: String, language: Language) {
        debug!(
            "Storing {} ({}, {} bytes)",
            path,
            language.as_str(),
            content.len()
        );
        self.files.insert(
            path.clone(),
            FileEntry {
                path,
                content,
                language,
            },
        );
    }

    /// Replace the content of an existing entry, keeping its language.
    pub fn set_content(&mut self, path: &str, content: impl Into<String>) -> Result<(), StoreError> {
        match self.files.get_mut(path) {
            Some(entry) => {
                entry.content = content.into();
                Ok(())
            }
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }

    /// Remove a file by exact key.
    ///
    /// The last remaining file can never be removed.
    pub fn remove(&mut self, path: &str) -> Result<FileEntry, StoreError> {
        if !self.files.contains_key(path) {
            return Err(StoreError::NotFound(path.to_string()));
        }
        if self.files.len() == 1 {
            return Err(StoreError::LastFile(path.to_string()));
        }
        self.files
            .remove(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    /// Exact-key lookup.
    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        self.files.get(path)
    }

    /// Exact-key membership test.
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Content of the file at `path`, if present.
    pub fn content(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(|e| e.content.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// All canonical paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// All entries in path order.
    pub fn entries(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.values()
    }

    /// First path in sorted order.
    pub fn first_path(&self) -> Option<&str> {
        self.files.keys().next().map(String::as_str)
    }
}
