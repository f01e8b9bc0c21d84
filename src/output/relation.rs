//! The (website, email) output relation and its CSV form

use crate::crawler::SiteCrawlResult;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// CSV header columns
pub const CSV_HEADER: [&str; 2] = ["website", "email"];

/// Distinct (website, email) pairs collected by a batch, in sorted order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactRelation {
    rows: BTreeSet<(String, String)>,
}

impl ContactRelation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the relation from per-site results
    ///
    /// With `emit_empty_rows`, every site that found nothing still gets one
    /// row with an empty email so the seed list can be reconciled with the
    /// output.
    pub fn from_results(results: &[SiteCrawlResult], emit_empty_rows: bool) -> Self {
        let mut relation = Self::new();
        for site in results {
            if site.emails.is_empty() {
                if emit_empty_rows {
                    relation.insert(&site.seed, "");
                }
                continue;
            }
            for email in &site.emails {
                relation.insert(&site.seed, email);
            }
        }
        relation
    }

    /// Adds a pair; returns false if it was already present
    pub fn insert(&mut self, website: &str, email: &str) -> bool {
        self.rows.insert((website.to_string(), email.to_string()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with a non-empty email
    pub fn email_count(&self) -> usize {
        self.rows.iter().filter(|(_, email)| !email.is_empty()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rows.iter().map(|(w, e)| (w.as_str(), e.as_str()))
    }

    /// Writes the relation as CSV, header first
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(CSV_HEADER)?;
        for (website, email) in self.iter() {
            writer.write_record([website, email])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes the relation to a CSV file, creating parent directories
    pub fn write_csv_file(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        self.write_csv(file)?;
        Ok(())
    }
}
