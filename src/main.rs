use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use spm::install::install_tree;
use spm::manifest::{Manifest, PROJECT_MANIFEST};
use spm::optimize::optimize_tree;
use spm::progress::ProgressTracker;
use spm::registry::RegistryClient;
use spm::resolve::{Availability, resolve_tree};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spm")]
#[command(author, version, about = "A minimal npm-style package manager", long_about = None)]
struct Cli {
    /// Project directory containing spm-package.json
    cwd: Option<PathBuf>,

    /// Destination directory for the installation (defaults to the
    /// project directory)
    dest: Option<PathBuf>,

    /// Registry base URL (overrides SPM_REGISTRY)
    #[arg(long)]
    registry: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let cwd = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let dest = cli.dest.unwrap_or_else(|| cwd.clone());

    let manifest_path = cwd.join(PROJECT_MANIFEST);
    let manifest = Manifest::load(&manifest_path)
        .with_context(|| format!("Failed to read {}", manifest_path.display()))?;

    let registry = match &cli.registry {
        Some(url) => RegistryClient::new(url)?,
        None => RegistryClient::from_env()?,
    };

    println!("{}", "Resolving the package tree...".bold());
    let progress = ProgressTracker::new("resolve");
    let tree = resolve_tree(
        &registry,
        &progress,
        manifest.name.clone(),
        String::new(),
        manifest.dependency_list(),
        Availability::new(),
    )
    .await?;
    progress.finish();

    let tree = optimize_tree(tree);

    println!("{}", "Linking the packages on the filesystem...".bold());
    let progress = ProgressTracker::new("link");
    install_tree(&registry, &progress, &tree, &dest).await?;
    progress.finish();

    println!("{} Installed into {}", "✓".green(), dest.display());
    Ok(())
}
