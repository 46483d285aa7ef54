use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::debug;
use url::{Host, Url};

lazy_static! {
    static ref CC_SLD: Regex = Regex::new(r"(?i)^[a-z]{2,4}\.[a-z]{2}$").unwrap();
}

/// Second-level labels registered under country-code TLDs, e.g. `co` under `uk`.
#[derive(Debug, Default, Clone)]
pub struct SuffixTable {
    by_cc: HashMap<String, HashSet<String>>,
}

impl SuffixTable {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| Error::dataset(path, e))?;
        let table = Self::parse(&data);
        debug!(path = %path.display(), entries = table.by_cc.len(), "Loaded public suffix data.");
        Ok(table)
    }

    pub fn parse(data: &str) -> Self {
        let mut by_cc: HashMap<String, HashSet<String>> = HashMap::new();
        for line in data.lines() {
            let line = line.trim();
            if !CC_SLD.is_match(line) {
                continue;
            }
            if let Some((sld, cc)) = line.split_once('.') {
                by_cc
                    .entry(cc.to_ascii_lowercase())
                    .or_default()
                    .insert(sld.to_ascii_lowercase());
            }
        }
        Self { by_cc }
    }

    pub fn contains(&self, sld: &str, cc: &str) -> bool {
        self.by_cc
            .get(cc)
            .map_or(false, |slds| slds.contains(sld))
    }
}

/// Parses the user's target as a URL, assuming `http://` when no scheme is
/// given. The host must be a domain name.
pub fn parse_target(input: &str) -> Result<Url> {
    let input = input.trim();
    let url = if input.contains("://") {
        Url::parse(input)
    } else {
        Url::parse(&format!("http://{}", input))
    }
    .map_err(|e| Error::InvalidTarget(format!("{}: {}", input, e)))?;

    match url.host() {
        Some(Host::Domain(host)) if !host.is_empty() => Ok(url),
        _ => Err(Error::InvalidTarget(format!("{}: no domain name", input))),
    }
}

/// The domain under test, split into the part we mutate and its effective TLD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub tld: String,
}

impl Target {
    /// Splits `domain`, loading the suffix file only when the domain has
    /// more than two labels.
    pub fn resolve(domain: &str, suffix_file: &Path) -> Result<Self> {
        if domain.split('.').count() == 2 {
            return Self::resolve_with(domain, &SuffixTable::default());
        }
        let table = SuffixTable::load(suffix_file)?;
        Self::resolve_with(domain, &table)
    }

    pub fn resolve_with(domain: &str, table: &SuffixTable) -> Result<Self> {
        let labels: Vec<&str> = domain.split('.').collect();
        let (name, tld) = match labels.len() {
            0 | 1 => (domain.to_string(), String::new()),
            2 => (labels[0].to_string(), labels[1].to_string()),
            n => {
                let (sld, cc) = (labels[n - 2], labels[n - 1]);
                if table.contains(sld, cc) {
                    (labels[..n - 2].join("."), format!("{}.{}", sld, cc))
                } else {
                    (labels[..n - 1].join("."), cc.to_string())
                }
            }
        };

        if name.is_empty() || tld.is_empty() {
            return Err(Error::InvalidTarget(domain.to_string()));
        }
        Ok(Self { name, tld })
    }

    pub fn domain(&self) -> String {
        format!("{}.{}", self.name, self.tld)
    }
}
