//! Package index reachability checks.
//!
//! Diagnostic only: a failed check is reported as a warning and never
//! stops a run.

use anyhow::{anyhow, Context, Result};
use std::time::Duration;
use tracing::debug;

use crate::provision::descriptor::EnvironmentDescriptor;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Checks that configured package indexes answer HTTP requests.
///
/// # Example
///
/// ```no_run
/// use provisor::provision::IndexChecker;
/// use std::time::Duration;
///
/// let checker = IndexChecker::new(Duration::from_secs(5)).unwrap();
/// checker.check("https://pypi.org/simple/").unwrap();
/// ```
pub struct IndexChecker {
    client: reqwest::blocking::Client,
}

impl IndexChecker {
    /// Create a checker whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("provisor/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    /// GET `url` and require a successful status.
    pub fn check(&self, url: &str) -> Result<()> {
        debug!(%url, "Checking package index");
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to reach {}", url))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP {} from {}", response.status(), url));
        }
        Ok(())
    }

    /// Check every index `descriptor` names. Returns one message per failure.
    pub fn check_descriptor(&self, descriptor: &EnvironmentDescriptor) -> Vec<String> {
        index_urls(descriptor)
            .into_iter()
            .filter_map(|url| self.check(url).err().map(|e| format!("{:#}", e)))
            .collect()
    }
}

/// Index URLs configured on `descriptor`.
pub fn index_urls(descriptor: &EnvironmentDescriptor) -> Vec<&str> {
    descriptor
        .index_url
        .iter()
        .chain(descriptor.extra_index_url.iter())
        .map(String::as_str)
        .collect()
}
