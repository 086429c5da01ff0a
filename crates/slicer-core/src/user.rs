//! Per-user overrides and starred setting keys.
//!
//! Both are plain JSON files owned by the process and loaded and saved
//! explicitly. Saves go through an atomic rename.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use slicer_fs::DocumentStore;

use crate::{Error, Result};

/// Chat user identifier.
pub type UserId = i64;

/// `user id -> {key: value}` override store.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSettingsStore {
    path: PathBuf,
    users: BTreeMap<UserId, BTreeMap<String, String>>,
}

impl UserSettingsStore {
    /// Empty store that will save to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            users: BTreeMap::new(),
        }
    }

    /// Load `path`; a missing file gives an empty store.
    ///
    /// # Errors
    ///
    /// Fails when the file is not a JSON object of objects or a user key is
    /// not a decimal id.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self::new(path);
        if !store.path.is_file() {
            tracing::debug!(path = ?store.path, "No user settings yet");
            return Ok(store);
        }
        let raw: BTreeMap<String, BTreeMap<String, String>> = DocumentStore::new().load(&store.path)?;
        for (id, overrides) in raw {
            let id: UserId = id.trim().parse().map_err(|_| Error::InvalidUserSettings {
                path: store.path.clone(),
                message: format!("'{id}' is not a user id"),
            })?;
            store.users.insert(id, overrides);
        }
        tracing::debug!(path = ?store.path, users = store.users.len(), "Loaded user settings");
        Ok(store)
    }

    /// Write the store back to its file.
    pub fn save(&self) -> Result<()> {
        let raw: BTreeMap<String, &BTreeMap<String, String>> = self
            .users
            .iter()
            .map(|(id, overrides)| (id.to_string(), overrides))
            .collect();
        DocumentStore::new().save(&self.path, &raw)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overrides of `user`; empty when the user has none.
    pub fn overrides(&self, user: UserId) -> BTreeMap<String, String> {
        self.users.get(&user).cloned().unwrap_or_default()
    }

    /// Set one override, returning the previous value.
    pub fn set(&mut self, user: UserId, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.users.entry(user).or_default().insert(key.into(), value.into())
    }

    /// Merge several overrides at once, e.g. from a preset.
    pub fn extend(&mut self, user: UserId, values: BTreeMap<String, String>) {
        self.users.entry(user).or_default().extend(values);
    }

    /// Remove one override. Users left without overrides are dropped.
    pub fn remove(&mut self, user: UserId, key: &str) -> Option<String> {
        let overrides = self.users.get_mut(&user)?;
        let removed = overrides.remove(key);
        if overrides.is_empty() {
            self.users.remove(&user);
        }
        removed
    }

    /// Drop every override of `user`.
    pub fn clear(&mut self, user: UserId) {
        self.users.remove(&user);
    }

    pub fn users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.users.keys().copied()
    }
}

/// Setting keys shown first in the settings menu.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StarredKeys {
    keys: BTreeSet<String>,
}

impl StarredKeys {
    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Load the runtime list, seeding it from `defaults` when it is missing.
    ///
    /// When only the defaults exist they are written out as the runtime
    /// file. When neither exists the list is empty.
    pub fn load(path: &Path, defaults: &Path) -> Result<Self> {
        let store = DocumentStore::new();
        if path.is_file() {
            let keys: Vec<String> = store.load(path)?;
            return Ok(Self::new(keys));
        }
        if defaults.is_file() {
            let keys: Vec<String> = store.load(defaults)?;
            let starred = Self::new(keys);
            starred.save(path)?;
            tracing::debug!(?path, count = starred.len(), "Seeded starred settings from defaults");
            return Ok(starred);
        }
        Ok(Self::default())
    }

    /// Write the keys as a sorted JSON array.
    pub fn save(&self, path: &Path) -> Result<()> {
        let keys: Vec<&String> = self.keys.iter().collect();
        DocumentStore::new().save(path, &keys)?;
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Star `key`; returns whether it was newly added.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    /// Unstar `key`; returns whether it was starred.
    pub fn remove(&mut self, key: &str) -> bool {
        self.keys.remove(key)
    }

    /// Flip the star on `key`; returns whether it is now starred.
    pub fn toggle(&mut self, key: &str) -> bool {
        if self.keys.remove(key) {
            false
        } else {
            self.keys.insert(key.to_string())
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}
