//! Installing a resolved tree on disk - extraction, executable symlinks,
//! and lifecycle scripts.
//!
//! Each package's archive is extracted into its slot before its
//! dependencies fan out underneath it, since children are written into
//! the directory that extraction creates. Sibling installs run
//! concurrently; one package's lifecycle scripts run strictly in order
//! and only after its own subtree has finished installing.

use crate::archive;
use crate::error::{Result, SpmError};
use crate::fetch;
use crate::manifest::{Dependency, Manifest, PACKAGE_MANIFEST};
use crate::progress::ProgressTracker;
use crate::registry::RegistryClient;
use crate::resolve::PackageNode;
use futures::future::{self, BoxFuture};
use std::path::{Component, Path, PathBuf};

/// Per-package directory holding that package's direct dependencies
pub const STORE_DIR: &str = "spm_node_modules";

/// Shared executable directory inside a store directory
pub const BIN_DIR: &str = ".bin";

/// Lifecycle scripts, in the only order they may run
const LIFECYCLE_SCRIPTS: &[&str] = &["preinstall", "install", "postinstall"];

/// Install `node` into `target`: extract its archive (the root node has
/// none), then concurrently install every direct dependency into
/// `target/spm_node_modules/<name>`. The node is complete only once all
/// of its children have completed.
pub fn install_tree<'a>(
    registry: &'a RegistryClient,
    progress: &'a ProgressTracker,
    node: &'a PackageNode,
    target: &'a Path,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        progress.add(1);

        if !node.is_root() {
            let dep = Dependency::new(node.name.clone(), node.reference.clone());
            let bytes = fetch::fetch_package(registry, &dep).await?;
            archive::extract_package_to(&bytes, target)?;
        }

        let branches = node
            .dependencies
            .iter()
            .map(|dep| install_dependency(registry, progress, dep, target));
        future::try_join_all(branches).await?;

        progress.tick();
        Ok(())
    })
}

/// Install one direct dependency of the package living at `parent_dir`,
/// then wire up its executables and run its lifecycle scripts.
async fn install_dependency(
    registry: &RegistryClient,
    progress: &ProgressTracker,
    node: &PackageNode,
    parent_dir: &Path,
) -> Result<()> {
    let store_dir = parent_dir.join(STORE_DIR);
    let target = store_dir.join(&node.name);

    install_tree(registry, progress, node, &target).await?;

    let manifest = Manifest::load(&target.join(PACKAGE_MANIFEST))?;

    link_bins(&manifest, &target, &store_dir).await?;
    run_lifecycle_scripts(&node.name, &manifest, &target).await?;

    Ok(())
}

/// Create `<store>/.bin/<name>` symlinks for every executable the
/// manifest declares, pointing at the package's files via paths
/// relative to the bin directory.
async fn link_bins(manifest: &Manifest, package_dir: &Path, store_dir: &Path) -> Result<()> {
    if manifest.bin.is_empty() {
        return Ok(());
    }

    let bin_dir = store_dir.join(BIN_DIR);
    // Sibling installs race on this; create-if-absent, never exclusive
    tokio::fs::create_dir_all(&bin_dir).await?;

    for (bin_name, bin_path) in &manifest.bin {
        let source = package_dir.join(bin_path);
        let dest = bin_dir.join(bin_name);
        let relative = relative_to(&source, &bin_dir);

        tracing::debug!(bin = %bin_name, target = %relative.display(), "linking executable");
        tokio::fs::symlink(&relative, &dest).await?;
    }

    Ok(())
}

/// Run the package's lifecycle scripts in their fixed order, each
/// through the shell, with the package's own bin directory ahead of the
/// inherited PATH. Absent scripts are skipped; a non-zero exit aborts.
async fn run_lifecycle_scripts(
    package_name: &str,
    manifest: &Manifest,
    package_dir: &Path,
) -> Result<()> {
    if manifest.scripts.is_empty() {
        return Ok(());
    }

    let own_bin = package_dir.join(STORE_DIR).join(BIN_DIR);
    let path_var = match std::env::var("PATH") {
        Ok(current) => format!("{}:{current}", own_bin.display()),
        Err(_) => own_bin.display().to_string(),
    };

    for script_name in LIFECYCLE_SCRIPTS {
        let Some(command) = manifest.scripts.get(*script_name) else {
            continue;
        };

        tracing::debug!(package = %package_name, script = %script_name, "running lifecycle script");

        let status = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(package_dir)
            .env("PATH", &path_var)
            .status()
            .await?;

        if !status.success() {
            return Err(SpmError::ScriptExecutionFailed {
                package: package_name.to_string(),
                script: (*script_name).to_string(),
                status: status.code().unwrap_or(-1),
            });
        }
    }

    Ok(())
}

/// Express `path` relative to `base`, walking up with `..` where the
/// two diverge. Both paths must be rooted the same way.
fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path_components: Vec<Component> = path.components().collect();
    let base_components: Vec<Component> = base.components().collect();

    let common = path_components
        .iter()
        .zip(base_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_components.len() {
        relative.push("..");
    }
    for component in &path_components[common..] {
        relative.push(component);
    }
    relative
}
