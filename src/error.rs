use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpmError {
    #[error("Registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("Couldn't find a version matching \"{range}\" for package \"{name}\"")]
    UnresolvableVersion { name: String, range: String },

    #[error("Couldn't fetch package \"{0}\"")]
    PackageFetchFailed(String),

    #[error("Local archive not found: {0}")]
    LocalArchiveNotFound(PathBuf),

    #[error("Couldn't find \"{0}\" inside the archive")]
    FileNotFoundInArchive(String),

    #[error("Script \"{script}\" of package \"{package}\" exited with status {status}")]
    ScriptExecutionFailed {
        package: String,
        script: String,
        status: i32,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, SpmError>;
