use serde::Deserialize;
use std::fmt;
use url::Url;

/// How a crawl decides whether a discovered URL still belongs to the seed's site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DomainScope {
    /// Host must equal the seed's host, ignoring a leading `www.`
    #[default]
    ExactHost,

    /// Registrable domain (eTLD+1) must match, so `blog.example.co.uk`
    /// belongs to `www.example.co.uk`
    Registrable,
}

impl fmt::Display for DomainScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactHost => write!(f, "exact-host"),
            Self::Registrable => write!(f, "registrable"),
        }
    }
}

/// Extracts the site domain from a URL
///
/// The host is lowercased and a leading `www.` label is stripped. Ports are
/// not part of the site domain.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use mailsweep::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").map(str::to_string).unwrap_or(host);
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Computes the registrable domain (eTLD+1) of a host using the Public Suffix List
///
/// Hosts the list knows nothing about (IP addresses, `localhost`, bare
/// suffixes) fall back to the host itself.
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();
    if host.parse::<std::net::IpAddr>().is_ok() {
        return host;
    }
    match psl::domain(host.as_bytes()) {
        Some(domain) => String::from_utf8_lossy(domain.as_bytes()).to_string(),
        None => host,
    }
}

/// The identity boundary of one site crawl
///
/// Built once from the seed URL; every discovered link is checked against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteScope {
    policy: DomainScope,
    domain: String,
}

impl SiteScope {
    /// Creates the scope for a seed URL, or `None` if the seed has no host
    pub fn for_seed(seed: &Url, policy: DomainScope) -> Option<Self> {
        let host = extract_domain(seed)?;
        let domain = match policy {
            DomainScope::ExactHost => host,
            DomainScope::Registrable => registrable_domain(&host),
        };
        Some(Self { policy, domain })
    }

    /// The domain string this site is identified by
    ///
    /// Also used as the host filter for addresses found in page text.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn policy(&self) -> DomainScope {
        self.policy
    }

    /// Returns true if the URL belongs to this site
    pub fn contains(&self, url: &Url) -> bool {
        let Some(host) = extract_domain(url) else {
            return false;
        };
        match self.policy {
            DomainScope::ExactHost => host == self.domain,
            DomainScope::Registrable => registrable_domain(&host) == self.domain,
        }
    }
}
