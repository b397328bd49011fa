//! Build artifacts: the compiled, possibly unlinked, form of a component.

use crate::error::{DeployerError, Result};
use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A compiled contract as emitted by the build toolchain.
///
/// Only the fields the orchestrator needs are read; everything else in the
/// build JSON (ABI, source maps, compiler metadata) is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub bytecode: String,
    /// Libraries already bound into `bytecode`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, Address>,
}

impl Artifact {
    pub fn new(contract_name: impl Into<String>, bytecode: impl Into<String>) -> Self {
        Self {
            contract_name: contract_name.into(),
            bytecode: bytecode.into(),
            links: BTreeMap::new(),
        }
    }

    pub fn is_linked_to(&self, library: &str) -> bool {
        self.links.contains_key(library)
    }

    /// True when the bytecode still holds a placeholder for `library`.
    pub fn needs(&self, library: &str) -> bool {
        self.bytecode.contains(&crate::link::placeholder(library))
    }
}

// ---------------------------------------------------------------------------
// ArtifactSource
// ---------------------------------------------------------------------------

/// Where artifacts come from. The orchestrator only loads artifacts for
/// components it is about to deploy.
pub trait ArtifactSource {
    fn load(&self, name: &str) -> Result<Artifact>;
}

/// A directory of `<ContractName>.json` build outputs.
#[derive(Debug, Clone)]
pub struct BuildDir {
    dir: PathBuf,
}

impl BuildDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl ArtifactSource for BuildDir {
    fn load(&self, name: &str) -> Result<Artifact> {
        let path = self.artifact_path(name);
        let data = crate::io::read_if_exists(&path)?
            .ok_or_else(|| DeployerError::ArtifactNotFound(path.display().to_string()))?;
        let artifact: Artifact = serde_json::from_str(&data)?;
        Ok(artifact)
    }
}

impl ArtifactSource for BTreeMap<String, Artifact> {
    fn load(&self, name: &str) -> Result<Artifact> {
        self.get(name)
            .cloned()
            .ok_or_else(|| DeployerError::ArtifactNotFound(name.to_string()))
    }
}
