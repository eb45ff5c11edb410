//! Recursive dependency-tree resolution with ancestor-aware shadowing.
//!
//! Resolution walks the manifest's dependency requests, pins every range
//! to a concrete version, and discovers each package's own dependencies
//! by reading `package.json` out of its archive. An availability map of
//! ancestor pins is copied down each branch: a request an ancestor
//! already satisfies is skipped instead of nested again. Sibling
//! branches never see each other's picks, so two branches may pin
//! conflicting versions of a third package independently - that is the
//! resolver's diamond-dependency policy, and the optimizer deals with
//! the duplication afterwards.

use crate::archive;
use crate::error::{Result, SpmError};
use crate::fetch;
use crate::manifest::{Dependency, Manifest};
use crate::progress::ProgressTracker;
use crate::registry::RegistryClient;
use crate::version;
use futures::future::{self, BoxFuture};
use std::collections::HashMap;

/// One resolved package and its fully resolved subtree.
///
/// Within a tree every reference is pinned - a concrete version, URL, or
/// local path - never an unresolved range. The root node carries an
/// empty reference; it is never installed itself, only its dependencies
/// are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageNode {
    pub name: String,
    pub reference: String,
    pub dependencies: Vec<PackageNode>,
}

impl PackageNode {
    pub fn new(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference: reference.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(
        name: impl Into<String>,
        reference: impl Into<String>,
        dependencies: Vec<PackageNode>,
    ) -> Self {
        Self {
            name: name.into(),
            reference: reference.into(),
            dependencies,
        }
    }

    /// The root of a tree is the project itself, not an installable
    /// package.
    pub fn is_root(&self) -> bool {
        self.reference.is_empty()
    }
}

/// Package name -> reference pinned somewhere on the current
/// root-to-node path. Copied per branch; siblings never share a map.
pub type Availability = HashMap<String, String>;

/// Pin a possibly-ranged reference to one concrete version.
///
/// Exact versions, URLs, and local paths pass through unchanged. Ranges
/// are resolved against the registry's published version list, taking
/// the maximum satisfying version.
pub async fn pin_reference(registry: &RegistryClient, dep: Dependency) -> Result<Dependency> {
    if version::is_exact(&dep.reference) || version::parse_range(&dep.reference).is_none() {
        return Ok(dep);
    }

    let versions = registry.published_versions(&dep.name).await?;
    match version::max_satisfying(&versions, &dep.reference) {
        Some(pinned) => {
            tracing::debug!(name = %dep.name, range = %dep.reference, %pinned, "pinned reference");
            Ok(Dependency::new(dep.name, pinned))
        }
        None => Err(SpmError::UnresolvableVersion {
            name: dep.name,
            range: dep.reference,
        }),
    }
}

/// A dependency is shadowed when an ancestor already provides a
/// compatible copy: the references are literally equal, or the request
/// is a range satisfied by the ancestor's pinned version. Anything else
/// is volatile and must be resolved fresh.
pub fn is_shadowed(dep: &Dependency, available: &Availability) -> bool {
    let Some(available_reference) = available.get(&dep.name) else {
        return false;
    };
    if available_reference == &dep.reference {
        return true;
    }
    // An exact request only matches the exact same pin
    if version::is_exact(&dep.reference) {
        return false;
    }
    version::satisfies(available_reference, &dep.reference)
}

/// Resolve the full transitive dependency tree below `(name, reference)`.
///
/// Volatile dependencies resolve concurrently: each is pinned, its
/// manifest is read out of its archive, and its own subtree is resolved
/// against a branch-local copy of the availability map extended with
/// its pin. The first failure anywhere in the fan-out fails the whole
/// subtree.
pub fn resolve_tree<'a>(
    registry: &'a RegistryClient,
    progress: &'a ProgressTracker,
    name: String,
    reference: String,
    dependencies: Vec<Dependency>,
    available: Availability,
) -> BoxFuture<'a, Result<PackageNode>> {
    Box::pin(async move {
        let volatile: Vec<Dependency> = dependencies
            .into_iter()
            .filter(|dep| !is_shadowed(dep, &available))
            .collect();

        let branches = volatile.into_iter().map(|dep| {
            let available = available.clone();
            async move {
                progress.add(1);

                let pinned = pin_reference(registry, dep).await?;
                let archive_bytes = fetch::fetch_package(registry, &pinned).await?;
                let manifest =
                    Manifest::from_slice(&archive::read_manifest_from_archive(&archive_bytes)?)?;

                let mut branch_available = available;
                branch_available.insert(pinned.name.clone(), pinned.reference.clone());

                progress.tick();

                resolve_tree(
                    registry,
                    progress,
                    pinned.name,
                    pinned.reference,
                    manifest.dependency_list(),
                    branch_available,
                )
                .await
            }
        });

        let resolved = future::try_join_all(branches).await?;

        Ok(PackageNode {
            name,
            reference,
            dependencies: resolved,
        })
    })
}
