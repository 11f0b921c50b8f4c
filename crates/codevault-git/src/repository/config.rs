//! Fetch configuration.

use std::num::NonZeroU32;
use std::time::Duration;

/// Placeholder for the repository name in a URL template.
pub const REPOSITORY_PLACEHOLDER: &str = "{repository}";

/// Placeholder for the source region in a URL template.
pub const REGION_PLACEHOLDER: &str = "{region}";

/// Configuration for fetching source repositories.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Clone URL with `{repository}` and `{region}` placeholders.
    url_template: String,

    /// History depth to fetch. `None` fetches the full history.
    shallow_depth: Option<NonZeroU32>,

    /// Upper bound for clone and checkout.
    fetch_timeout: Duration,
}

fn default_url_template() -> String {
    "https://git-codecommit.{region}.amazonaws.com/v1/repos/{repository}".to_string()
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(300)
}

impl FetchConfig {
    /// Creates a new builder for FetchConfig.
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder::default()
    }

    /// Returns the shallow clone depth, if any.
    pub fn shallow_depth(&self) -> Option<NonZeroU32> {
        self.shallow_depth
    }

    /// Returns the fetch timeout.
    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Expands the URL template for one repository.
    pub fn source_url(&self, repository: &str, region: &str) -> String {
        self.url_template
            .replace(REPOSITORY_PLACEHOLDER, repository)
            .replace(REGION_PLACEHOLDER, region)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url_template: default_url_template(),
            shallow_depth: None,
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

/// Builder for FetchConfig.
#[derive(Debug, Default)]
pub struct FetchConfigBuilder {
    url_template: Option<String>,
    shallow_depth: Option<u32>,
    fetch_timeout: Option<Duration>,
}

impl FetchConfigBuilder {
    /// Sets the clone URL template.
    pub fn url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = Some(template.into());
        self
    }

    /// Sets the shallow clone depth. `0` means full history.
    pub fn shallow_depth(mut self, depth: u32) -> Self {
        self.shallow_depth = Some(depth);
        self
    }

    /// Sets the fetch timeout.
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the template does not name the repository or the
    /// timeout is zero.
    pub fn build(self) -> Result<FetchConfig, &'static str> {
        let url_template = self.url_template.unwrap_or_else(default_url_template);
        if !url_template.contains(REPOSITORY_PLACEHOLDER) {
            return Err("url_template must contain {repository}");
        }

        let fetch_timeout = self.fetch_timeout.unwrap_or_else(default_fetch_timeout);
        if fetch_timeout.is_zero() {
            return Err("fetch_timeout must be greater than zero");
        }

        Ok(FetchConfig {
            url_template,
            shallow_depth: self.shallow_depth.and_then(NonZeroU32::new),
            fetch_timeout,
        })
    }
}
