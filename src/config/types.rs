use crate::url::DomainScope;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Mailsweep
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum link depth to follow from a seed (the seed is depth 0)
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of pages fetched per site
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Maximum number of sites crawled at the same time
    #[serde(rename = "max-concurrent-sites")]
    pub max_concurrent_sites: u32,

    /// Wall-clock budget for one whole site (seconds)
    #[serde(rename = "site-timeout")]
    pub site_timeout: u64,

    /// Deadline for one request, connect through body (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Deadline for establishing a connection (seconds)
    #[serde(rename = "connect-timeout")]
    pub connect_timeout: u64,

    /// Responses larger than this are discarded (bytes)
    #[serde(rename = "max-body-bytes")]
    pub max_body_bytes: u64,

    /// Verify TLS certificates; disable only for sites with broken chains
    #[serde(rename = "verify-tls")]
    pub verify_tls: bool,

    /// Which URLs count as "the same site"
    #[serde(rename = "domain-scope")]
    pub domain_scope: DomainScope,

    /// Total attempts for a transiently failing fetch (1 = no retry)
    #[serde(rename = "retry-attempts")]
    pub retry_attempts: u32,

    /// Delay before the first retry; doubled for every further retry (milliseconds)
    #[serde(rename = "retry-backoff")]
    pub retry_backoff: u64,
}

impl CrawlerConfig {
    pub fn site_timeout(&self) -> Duration {
        Duration::from_secs(self.site_timeout)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_pages: 50,
            max_concurrent_sites: 20,
            site_timeout: 240,
            request_timeout: 15,
            connect_timeout: 10,
            max_body_bytes: 2_000_000,
            verify_tls: true,
            domain_scope: DomainScope::ExactHost,
            retry_attempts: 3,
            retry_backoff: 1000,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler (optional)
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "Mailsweep".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

/// Address extraction configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Local parts accepted for addresses found in page text
    #[serde(rename = "role-aliases")]
    pub role_aliases: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            role_aliases: crate::extract::DEFAULT_ROLE_ALIASES
                .iter()
                .map(|alias| alias.to_string())
                .collect(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the `website,email` CSV file
    #[serde(rename = "csv-path")]
    pub csv_path: String,

    /// Write one row with an empty email for every site that yielded nothing
    #[serde(rename = "emit-empty-rows")]
    pub emit_empty_rows: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: "./emails.csv".to_string(),
            emit_empty_rows: false,
        }
    }
}
