//! Address patterns and normalization helpers
//!
//! Regexes are compiled once and shared read-only by every crawl task.

use once_cell::sync::Lazy;
use regex::Regex;

/// A "dot" in an obfuscated host: `.`, `(dot)`, `[dot]`, `{dot}` or ` dot `
const DOT: &str = r"(?:\.|\s*[(\[{]\s*dot\s*[)\]}]\s*|\s+dot\s+)";

/// An "at" in an obfuscated address: `@`, `&#64;`, `&commat;`, `(at)`, `[at]`, `{at}` or ` at `
const AT: &str = r"(?:\s*(?:@|&#64;|&commat;|[(\[{]\s*at\s*[)\]}])\s*|\s+at\s+)";

/// `href="mailto:local@host.tld"` with either quote style
pub(crate) static MAILTO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)href\s*=\s*["']\s*mailto:([a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,})"#)
        .expect("mailto pattern is valid")
});

/// Plain `local@host.tld`
pub(crate) static PLAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}").expect("plain pattern is valid")
});

/// Obfuscated `local (at) host [dot] tld` and friends
pub(crate) static OBFUSCATED_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?i)(?P<local>[a-z0-9._%+\-]+){at}(?P<host>[a-z0-9\-]+(?:{dot}[a-z0-9\-]+)+)",
        at = AT,
        dot = DOT
    );
    Regex::new(&pattern).expect("obfuscated pattern is valid")
});

static DOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(&format!("(?i){}", DOT)).expect("dot pattern is valid"));

/// Rewrites an obfuscated host (`example [dot] com`) into `example.com`
pub(crate) fn normalize_host(host: &str) -> String {
    DOT_RE.replace_all(host.trim(), ".").to_lowercase()
}

/// Lowercases and checks the `local@host.tld` shape
///
/// Returns `None` for anything that only looked like an address: empty or
/// dot-bounded parts, empty host labels, or a top-level label that is not at
/// least two letters.
pub(crate) fn canonical_address(local: &str, host: &str) -> Option<String> {
    let local = local.trim().to_lowercase();
    let host = host.trim().trim_end_matches('.').to_lowercase();

    if local.is_empty() || local.starts_with('.') || local.ends_with('.') {
        return None;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return None;
    }

    let tld = labels[labels.len() - 1];
    if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    Some(format!("{}@{}", local, host))
}

/// Splits and canonicalizes a plain `local@host` match
pub(crate) fn canonical_plain(address: &str) -> Option<String> {
    let (local, host) = address.split_once('@')?;
    canonical_address(local, host)
}

/// Returns true if `host` is `domain` or one of its subdomains
pub(crate) fn host_in_domain(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .map_or(false, |prefix| prefix.ends_with('.'))
}
