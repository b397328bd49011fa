use crate::error::{DeployerError, Result};
use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Outcome of merging one entry into the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Unchanged,
}

/// Persisted mapping of component name to deployed address.
///
/// On disk this is a flat JSON object shared by every stage, so stages can
/// only ever add keys the others ignore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    entries: BTreeMap<String, Address>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    /// Load a registry; a missing file is a first run and yields an empty one.
    pub fn load(path: &Path) -> Result<Self> {
        match crate::io::read_if_exists(path)? {
            Some(data) if !data.trim().is_empty() => Ok(serde_json::from_str(&data)?),
            _ => Ok(Self::new()),
        }
    }

    pub fn flush(&self, path: &Path) -> Result<()> {
        let mut data = serde_json::to_string_pretty(self)?;
        data.push('\n');
        crate::io::atomic_write(path, data.as_bytes())
    }

    // ---------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------

    pub fn get(&self, name: &str) -> Option<&Address> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Look up `name` on behalf of `needed_by`, failing if it is absent.
    pub fn require(&self, name: &str, needed_by: &str) -> Result<&Address> {
        self.entries
            .get(name)
            .ok_or_else(|| DeployerError::NotRegistered {
                name: name.to_string(),
                needed_by: needed_by.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Address)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    /// Record `name → address`. Re-recording the same address is a no-op; a
    /// different address for an existing name is refused.
    pub fn merge(&mut self, name: &str, address: Address) -> Result<MergeOutcome> {
        match self.entries.get(name) {
            Some(existing) if *existing == address => Ok(MergeOutcome::Unchanged),
            Some(existing) => Err(DeployerError::RegistryConflict {
                name: name.to_string(),
                existing: existing.to_string(),
                attempted: address.to_string(),
            }),
            None => {
                self.entries.insert(name.to_string(), address);
                Ok(MergeOutcome::Inserted)
            }
        }
    }

    /// Drop entries before a fresh restart of a stage. Returns the names that
    /// were actually present.
    pub fn forget<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        names
            .into_iter()
            .filter(|name| self.entries.remove(*name).is_some())
            .map(str::to_string)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
