//! Discovered records and key normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use super::meta::{Meta, MetaValue};
use crate::error::{RecordError, RecordResult};

/// One discovered entity (a domain, a site).
///
/// The key is always the canonical host-only form of whatever the source
/// handed over: `https://www.example.nl/contact` becomes `www.example.nl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Canonical unique identifier (normalized hostname)
    pub key: String,

    pub country: String,

    /// Universal category, shared by getters of all countries
    pub category: String,

    /// Free-form, category specific
    pub subcategory: String,

    /// Anything else the source knows about the entity
    #[serde(default)]
    pub meta: Meta,

    /// When the record was constructed
    pub discovered_at: DateTime<Utc>,
}

impl Record {
    /// Build a record, normalizing `key` to its hostname.
    ///
    /// Fails with [`RecordError`] if no hostname can be extracted.
    pub fn new(
        key: &str,
        country: impl Into<String>,
        category: impl Into<String>,
        subcategory: impl Into<String>,
    ) -> RecordResult<Self> {
        Ok(Self {
            key: normalize_key(key)?,
            country: country.into(),
            category: category.into(),
            subcategory: subcategory.into(),
            meta: Meta::new(),
            discovered_at: Utc::now(),
        })
    }

    /// Replace the meta map.
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    /// Add a single meta entry.
    pub fn with_meta_entry(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Set the discovery timestamp.
    pub fn with_discovered_at(mut self, discovered_at: DateTime<Utc>) -> Self {
        self.discovered_at = discovered_at;
        self
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, {}-{})",
            self.key, self.country, self.category, self.subcategory
        )
    }
}

/// Reduce a url-ish string to its hostname.
///
/// Inputs without a scheme get `http://` prepended before parsing, so bare
/// domains and `domain/path` forms are accepted.
///
/// Hosts come back in their ASCII form: letters are lowercased and
/// internationalised labels are punycode encoded (`xn--...`), so one
/// domain always maps to one key.
pub fn normalize_key(input: &str) -> RecordResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(RecordError::Empty);
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else if let Some(rest) = trimmed.strip_prefix("//") {
        format!("http://{}", rest)
    } else {
        format!("http://{}", trimmed)
    };

    let parsed = Url::parse(&candidate).map_err(|source| match source {
        url::ParseError::EmptyHost => RecordError::MissingHost {
            input: input.to_string(),
        },
        source => RecordError::InvalidUrl {
            input: input.to_string(),
            source,
        },
    })?;

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(host.to_string()),
        _ => Err(RecordError::MissingHost {
            input: input.to_string(),
        }),
    }
}

/// Keep the records that were built successfully, logging the rest.
///
/// A single malformed entry in a source must not fail the whole getter.
pub fn keep_valid<I>(candidates: I) -> Vec<Record>
where
    I: IntoIterator<Item = RecordResult<Record>>,
{
    candidates
        .into_iter()
        .filter_map(|candidate| match candidate {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "skipping malformed record");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_path_from_bare_domain() {
        let record = Record::new("example.com/path", "NL", "Government", "ministry").unwrap();
        assert_eq!(record.key, "example.com");
    }

    #[test]
    fn strips_scheme_port_and_query() {
        assert_eq!(
            normalize_key("https://www.Rijksoverheid.nl:443/onderwerpen?q=1").unwrap(),
            "www.rijksoverheid.nl"
        );
        assert_eq!(normalize_key("  //cdn.example.org/x ").unwrap(), "cdn.example.org");
        assert_eq!(normalize_key("http://10.0.0.1/admin").unwrap(), "10.0.0.1");
    }

    #[test]
    fn internationalised_host_becomes_punycode() {
        let key = normalize_key("https://Gemeente-Súdwest-Fryslân.nl/contact").unwrap();
        assert!(key.is_ascii());
        assert!(key.starts_with("xn--"));
        assert!(key.ends_with(".nl"));
        assert_eq!(normalize_key("gemeente-súdwest-fryslân.nl").unwrap(), key);
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(normalize_key(""), Err(RecordError::Empty)));
        assert!(matches!(normalize_key("   "), Err(RecordError::Empty)));
    }

    #[test]
    fn unparseable_key_is_rejected() {
        assert!(matches!(
            normalize_key("http://"),
            Err(RecordError::MissingHost { .. })
        ));
        assert!(Record::new("http://exa mple.com", "NL", "Healthcare", "x").is_err());
    }

    #[test]
    fn keep_valid_skips_malformed() {
        let records = keep_valid(vec![
            Record::new("a.nl", "NL", "Education", "university"),
            Record::new("", "NL", "Education", "university"),
            Record::new("b.nl/x", "NL", "Education", "university"),
        ]);

        let keys: Vec<_> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a.nl", "b.nl"]);
    }

    #[test]
    fn display_shows_classification() {
        let record = Record::new("a.nl", "NL", "Healthcare", "pharmacy").unwrap();
        assert_eq!(record.to_string(), "a.nl (NL, Healthcare-pharmacy)");
    }
}
