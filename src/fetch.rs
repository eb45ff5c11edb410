//! Package payload retrieval - local archives, registry tarballs, raw URLs.
//!
//! [`fetch_package`] turns an already-pinned dependency reference into
//! raw archive bytes. It never resolves ranges; callers run the pinner
//! first for anything that is not a direct location.

use crate::error::{Result, SpmError};
use crate::manifest::Dependency;
use crate::registry::RegistryClient;
use crate::version;
use bytes::Bytes;
use std::path::PathBuf;

/// Prefixes marking a reference as a local filesystem path
const PATH_PREFIXES: &[&str] = &["/", "./", "../"];

/// True when a reference points into the local filesystem.
pub fn is_path_reference(reference: &str) -> bool {
    PATH_PREFIXES
        .iter()
        .any(|prefix| reference.starts_with(prefix))
}

/// Fetch the raw archive bytes for a pinned dependency.
///
/// - local path references are read from disk
///   ([`SpmError::LocalArchiveNotFound`] when absent)
/// - exact versions are rewritten to the registry's canonical tarball URL
/// - everything else is fetched as-is over HTTP
///   ([`SpmError::PackageFetchFailed`] on any non-success response)
pub async fn fetch_package(registry: &RegistryClient, dep: &Dependency) -> Result<Bytes> {
    if is_path_reference(&dep.reference) {
        let bytes = tokio::fs::read(&dep.reference)
            .await
            .map_err(|_| SpmError::LocalArchiveNotFound(PathBuf::from(&dep.reference)))?;
        return Ok(Bytes::from(bytes));
    }

    let url = if version::is_exact(&dep.reference) {
        registry.tarball_url(&dep.name, &dep.reference)
    } else {
        dep.reference.clone()
    };

    tracing::debug!(name = %dep.name, %url, "fetching package archive");

    let response = registry
        .http()
        .get(&url)
        .send()
        .await
        .map_err(|_| SpmError::PackageFetchFailed(url.clone()))?;

    if !response.status().is_success() {
        return Err(SpmError::PackageFetchFailed(url));
    }

    response
        .bytes()
        .await
        .map_err(|_| SpmError::PackageFetchFailed(url))
}
