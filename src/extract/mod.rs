//! Address extraction
//!
//! Turns raw page content into a set of contact addresses using an ordered
//! list of strategies. The first strategy that finds anything wins:
//!
//! 1. `MailtoLinks`: every `href="mailto:..."` on the page, unfiltered.
//!    An author who links an address explicitly wants it used.
//! 2. `RoleAddresses`: plain and obfuscated addresses in the page text, kept
//!    only if the local part is a role alias (info, press, ...) and the host
//!    belongs to the site being crawled.
//!
//! Extraction never fails: undecodable bytes are replaced and a page that
//! matches nothing yields an empty set.

mod patterns;

use crate::config::ExtractorConfig;
use patterns::{
    canonical_address, canonical_plain, host_in_domain, normalize_host, MAILTO_RE,
    OBFUSCATED_RE, PLAIN_RE,
};
use std::collections::{BTreeSet, HashSet};

/// Role mailboxes accepted when an address is found in page text
pub const DEFAULT_ROLE_ALIASES: &[&str] = &[
    "info", "contact", "hello", "hi", "team", "office", "admin", "support",
    "help", "inquiries", "enquiries", "mail", "mailbox", "mailroom",
    "ceo", "founder", "founders", "partners", "partner", "managingpartner",
    "invest", "investor", "investors", "venture", "capital", "fund", "funds",
    "fundraising", "lp", "dealflow", "sales", "bizdev", "business",
    "partnerships", "partnership", "outreach", "marketing", "press", "media",
    "pr", "comms", "careers", "jobs", "hr", "talent", "people", "recruiting",
    "ops", "operations", "services", "service", "webmaster", "postmaster",
];

/// One tier of the extraction rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    MailtoLinks,
    RoleAddresses,
}

impl ExtractionStrategy {
    /// Strategies in the order they are tried
    pub const ORDERED: [ExtractionStrategy; 2] = [Self::MailtoLinks, Self::RoleAddresses];

    /// Applies this strategy to decoded page text
    ///
    /// Returns `None` when the strategy found nothing, so the caller moves on
    /// to the next one.
    pub fn apply(
        &self,
        text: &str,
        site_domain: &str,
        aliases: &HashSet<String>,
    ) -> Option<BTreeSet<String>> {
        let found = match self {
            Self::MailtoLinks => mailto_addresses(text),
            Self::RoleAddresses => role_addresses(text, site_domain, aliases),
        };

        if found.is_empty() {
            None
        } else {
            Some(found)
        }
    }
}

fn mailto_addresses(text: &str) -> BTreeSet<String> {
    MAILTO_RE
        .captures_iter(text)
        .filter_map(|caps| canonical_plain(&caps[1]))
        .collect()
}

fn role_addresses(text: &str, site_domain: &str, aliases: &HashSet<String>) -> BTreeSet<String> {
    let site_domain = site_domain.to_lowercase();

    let plain = PLAIN_RE
        .find_iter(text)
        .filter_map(|m| canonical_plain(m.as_str()));

    let obfuscated = OBFUSCATED_RE
        .captures_iter(text)
        .filter_map(|caps| canonical_address(&caps["local"], &normalize_host(&caps["host"])));

    plain
        .chain(obfuscated)
        .filter(|address| {
            address.split_once('@').map_or(false, |(local, host)| {
                aliases.contains(local) && host_in_domain(host, &site_domain)
            })
        })
        .collect()
}

/// Extracts contact addresses from page content
///
/// Built once from configuration and shared by every site crawl.
#[derive(Debug, Clone)]
pub struct Extractor {
    aliases: HashSet<String>,
}

impl Extractor {
    /// Creates an extractor accepting the given role aliases
    pub fn new<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            aliases: aliases
                .into_iter()
                .map(|alias| alias.as_ref().trim().to_lowercase())
                .filter(|alias| !alias.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(&config.role_aliases)
    }

    /// Extracts addresses from raw page bytes
    ///
    /// # Arguments
    ///
    /// * `content` - Raw response body, in any (or no valid) encoding
    /// * `site_domain` - Domain of the site being crawled, e.g. `example.com`
    ///
    /// # Example
    ///
    /// ```
    /// use mailsweep::extract::{Extractor, DEFAULT_ROLE_ALIASES};
    ///
    /// let extractor = Extractor::new(DEFAULT_ROLE_ALIASES);
    /// let found = extractor.extract(b"write to info (at) example [dot] com", "example.com");
    /// assert!(found.contains("info@example.com"));
    /// ```
    pub fn extract(&self, content: &[u8], site_domain: &str) -> BTreeSet<String> {
        let text = String::from_utf8_lossy(content);
        self.extract_text(&text, site_domain)
    }

    /// Extracts addresses from already-decoded text
    pub fn extract_text(&self, text: &str, site_domain: &str) -> BTreeSet<String> {
        ExtractionStrategy::ORDERED
            .iter()
            .find_map(|strategy| strategy.apply(text, site_domain, &self.aliases))
            .unwrap_or_default()
    }

    pub fn is_alias(&self, local: &str) -> bool {
        self.aliases.contains(&local.to_lowercase())
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(DEFAULT_ROLE_ALIASES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str, domain: &str) -> Vec<String> {
        Extractor::default()
            .extract(text.as_bytes(), domain)
            .into_iter()
            .collect()
    }

    #[test]
    fn test_mailto_wins_over_text() {
        let html = r#"<p>info@example.com</p>
            <a href="mailto:jane.doe@gmail.com">Jane</a>
            <p>press (at) example [dot] com</p>"#;
        assert_eq!(extract(html, "example.com"), vec!["jane.doe@gmail.com"]);
    }

    #[test]
    fn test_mailto_is_case_insensitive_and_lowercased() {
        let html = r#"<A HREF='MAILTO:INFO@A.TEST'>mail us</A>"#;
        assert_eq!(extract(html, "a.test"), vec!["info@a.test"]);
    }

    #[test]
    fn test_mailto_with_query_string() {
        let html = r#"<a href="mailto:hello@example.com?subject=Hi">Say hi</a>"#;
        assert_eq!(extract(html, "example.com"), vec!["hello@example.com"]);
    }

    #[test]
    fn test_mailto_duplicates_collapse() {
        let html = r#"<a href="mailto:Info@Example.com">a</a><a href="mailto:info@example.com">b</a>"#;
        assert_eq!(extract(html, "example.com"), vec!["info@example.com"]);
    }

    #[test]
    fn test_text_keeps_only_aliases_on_site_domain() {
        let text = "Reach info@example.com, ceo@otherdomain.com, or jane@example.com.";
        assert_eq!(extract(text, "example.com"), vec!["info@example.com"]);
    }

    #[test]
    fn test_text_accepts_subdomain_hosts() {
        let text = "press@news.example.com";
        assert_eq!(extract(text, "example.com"), vec!["press@news.example.com"]);
    }

    #[test]
    fn test_text_rejects_lookalike_domain() {
        assert!(extract("info@notexample.com", "example.com").is_empty());
    }

    #[test]
    fn test_obfuscated_alias_is_normalized() {
        assert_eq!(
            extract("info (at) example [dot] com", "example.com"),
            vec!["info@example.com"]
        );
    }

    #[test]
    fn test_obfuscated_personal_address_is_dropped() {
        assert!(extract("jane (at) example [dot] com", "example.com").is_empty());
    }

    #[test]
    fn test_html_entity_at_sign() {
        assert_eq!(
            extract("<span>contact&#64;example.com</span>", "example.com"),
            vec!["contact@example.com"]
        );
    }

    #[test]
    fn test_mixed_plain_and_obfuscated_are_unioned() {
        let text = "INFO@example.com / careers [at] example [dot] com";
        assert_eq!(
            extract(text, "example.com"),
            vec!["careers@example.com", "info@example.com"]
        );
    }

    #[test]
    fn test_no_addresses() {
        assert!(extract("<html><body>Nothing to see</body></html>", "example.com").is_empty());
    }

    #[test]
    fn test_invalid_utf8_does_not_panic() {
        let mut bytes = b"info@example.com ".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, 0xfd]);
        let found = Extractor::default().extract(&bytes, "example.com");
        assert!(found.contains("info@example.com"));
    }

    #[test]
    fn test_custom_aliases() {
        let extractor = Extractor::new(["Deals"]);
        assert!(extractor.is_alias("deals"));
        let found = extractor.extract(b"deals@example.com info@example.com", "example.com");
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec!["deals@example.com"]);
    }

    #[test]
    fn test_strategy_order() {
        assert_eq!(
            ExtractionStrategy::ORDERED,
            [ExtractionStrategy::MailtoLinks, ExtractionStrategy::RoleAddresses]
        );
        let aliases = HashSet::new();
        assert!(ExtractionStrategy::MailtoLinks
            .apply("no links here", "example.com", &aliases)
            .is_none());
    }
}
