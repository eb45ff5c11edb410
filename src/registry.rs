//! Package registry client with in-memory metadata caching.
//!
//! The [`RegistryClient`] owns the shared HTTP client for the whole
//! pipeline. Metadata queries (`GET <registry>/<name>`) are parsed down
//! to the published version list and cached per package name, so pinning
//! many ranges against the same package costs one network round trip.

use crate::error::{Result, SpmError};
use std::sync::Arc;
use std::time::Duration;

/// Default registry base URL
pub const DEFAULT_REGISTRY: &str = "https://registry.yarnpkg.com";

/// Environment variable overriding the registry base URL
pub const REGISTRY_ENV: &str = "SPM_REGISTRY";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Registry client shared across resolution and installation
#[derive(Clone)]
pub struct RegistryClient {
    base_url: String,
    http: reqwest::Client,
    versions_cache: moka::future::Cache<String, Arc<Vec<String>>>,
}

impl RegistryClient {
    /// Create a client against the given registry base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(REQUEST_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(format!("spm/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Version lists are queried once per package name per run
        let versions_cache = moka::future::Cache::new(1000);

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            versions_cache,
        })
    }

    /// Create a client using `SPM_REGISTRY` or the default registry.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var(REGISTRY_ENV).unwrap_or_else(|_| DEFAULT_REGISTRY.to_string());
        Self::new(&url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Shared HTTP client, reused for tarball retrieval.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Canonical per-version tarball URL for a registry package.
    pub fn tarball_url(&self, name: &str, version: &str) -> String {
        format!("{}/{}/-/{}-{}.tgz", self.base_url, name, name, version)
    }

    /// All published versions for a package, from the registry metadata
    /// document. Only the key set of `versions` is consumed.
    ///
    /// # Errors
    ///
    /// Any network or parse failure maps to
    /// [`SpmError::RegistryUnavailable`].
    pub async fn published_versions(&self, name: &str) -> Result<Arc<Vec<String>>> {
        if let Some(cached) = self.versions_cache.get(name).await {
            return Ok(cached);
        }

        let url = format!("{}/{}", self.base_url, name);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SpmError::RegistryUnavailable(format!("{name}: {e}")))?;

        if !response.status().is_success() {
            return Err(SpmError::RegistryUnavailable(format!(
                "{name}: registry returned {}",
                response.status()
            )));
        }

        let info: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SpmError::RegistryUnavailable(format!("{name}: {e}")))?;

        let versions: Vec<String> = info
            .get("versions")
            .and_then(|v| v.as_object())
            .map(|obj| obj.keys().cloned().collect())
            .unwrap_or_default();

        let versions = Arc::new(versions);
        self.versions_cache
            .insert(name.to_string(), Arc::clone(&versions))
            .await;

        Ok(versions)
    }
}
