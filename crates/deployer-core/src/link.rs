//! Library linking.
//!
//! Unlinked bytecode carries a 40-character placeholder per library:
//! `__` followed by the library name, padded with `_`. Linking replaces every
//! occurrence with the library's deployed address and records the binding on
//! the artifact so a second pass can tell it has nothing left to do.

use crate::artifact::Artifact;
use crate::error::{DeployerError, Result};
use crate::registry::Registry;
use crate::types::Address;

const PLACEHOLDER_LEN: usize = 40;
const MAX_NAME_LEN: usize = 36;

pub fn placeholder(library: &str) -> String {
    let name: String = library.chars().take(MAX_NAME_LEN).collect();
    let mut out = format!("__{name}");
    while out.len() < PLACEHOLDER_LEN {
        out.push('_');
    }
    out
}

/// Whether `library` gets a placeholder no other name can share: it must fit
/// untruncated and must not end in the padding character.
pub fn has_unique_placeholder(library: &str) -> bool {
    library.chars().count() <= MAX_NAME_LEN && !library.ends_with('_')
}

/// Bind `library` at `address` into `artifact`.
///
/// Idempotent for the same address. Binding a different address for a
/// library that is already linked is refused.
pub fn link_address(mut artifact: Artifact, library: &str, address: &Address) -> Result<Artifact> {
    if let Some(existing) = artifact.links.get(library) {
        if existing == address {
            return Ok(artifact);
        }
        return Err(DeployerError::Link {
            library: library.to_string(),
            dependent: artifact.contract_name.clone(),
            reason: format!("already linked at {existing}, refusing {address}"),
        });
    }

    let marker = placeholder(library);
    if let Some(other) = artifact
        .links
        .keys()
        .find(|other| placeholder(other) == marker)
    {
        return Err(DeployerError::Link {
            library: library.to_string(),
            dependent: artifact.contract_name.clone(),
            reason: format!("placeholder {marker} was already bound by '{other}'"),
        });
    }
    if artifact.bytecode.contains(&marker) {
        artifact.bytecode = artifact.bytecode.replace(&marker, &address.hex_digits());
    }
    artifact.links.insert(library.to_string(), address.clone());
    Ok(artifact)
}

// ---------------------------------------------------------------------------
// LinkResolver
// ---------------------------------------------------------------------------

/// Resolves library addresses from the registry and binds them into
/// dependents.
#[derive(Debug, Clone, Copy)]
pub struct LinkResolver<'a> {
    registry: &'a Registry,
}

impl<'a> LinkResolver<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Fail fast on the first library without a registry entry, before
    /// anything is loaded for `dependent`.
    pub fn ensure_registered<S: AsRef<str>>(&self, libraries: &[S], dependent: &str) -> Result<()> {
        libraries
            .iter()
            .try_for_each(|lib| self.address_of(lib.as_ref(), dependent).map(|_| ()))
    }

    fn address_of(&self, library: &str, dependent: &str) -> Result<&'a Address> {
        self.registry.get(library).ok_or_else(|| DeployerError::Link {
            library: library.to_string(),
            dependent: dependent.to_string(),
            reason: "library has no registry entry; it must be deployed in an earlier step"
                .to_string(),
        })
    }

    /// Link one library. The library must already be registered; anything
    /// else means it was declared after its dependent.
    pub fn link(&self, library: &str, artifact: Artifact) -> Result<Artifact> {
        let address = self.address_of(library, &artifact.contract_name)?;
        tracing::debug!(
            library,
            dependent = %artifact.contract_name,
            %address,
            "linking library"
        );
        link_address(artifact, library, address)
    }

    /// Link every library in order, failing on the first missing one.
    pub fn link_all<S: AsRef<str>>(&self, libraries: &[S], artifact: Artifact) -> Result<Artifact> {
        libraries
            .iter()
            .try_fold(artifact, |acc, lib| self.link(lib.as_ref(), acc))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
