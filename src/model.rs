use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Technique that produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Fuzzer {
    #[serde(rename = "Original*")]
    Original,
    Addition,
    Bitsquatting,
    Homoglyph,
    Hyphenation,
    Insertion,
    Omission,
    Repetition,
    Replacement,
    Subdomain,
    Transposition,
    #[serde(rename = "Vowel-swap")]
    VowelSwap,
    Various,
    Dictionary,
}

impl Fuzzer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Fuzzer::Original => "Original*",
            Fuzzer::Addition => "Addition",
            Fuzzer::Bitsquatting => "Bitsquatting",
            Fuzzer::Homoglyph => "Homoglyph",
            Fuzzer::Hyphenation => "Hyphenation",
            Fuzzer::Insertion => "Insertion",
            Fuzzer::Omission => "Omission",
            Fuzzer::Repetition => "Repetition",
            Fuzzer::Replacement => "Replacement",
            Fuzzer::Subdomain => "Subdomain",
            Fuzzer::Transposition => "Transposition",
            Fuzzer::VowelSwap => "Vowel-swap",
            Fuzzer::Various => "Various",
            Fuzzer::Dictionary => "Dictionary",
        }
    }
}

impl fmt::Display for Fuzzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub fuzzer: Fuzzer,
    #[serde(rename = "domain-name")]
    pub domain_name: String,
}

impl Candidate {
    pub fn new(fuzzer: Fuzzer, domain_name: impl Into<String>) -> Self {
        Self {
            fuzzer,
            domain_name: domain_name.into(),
        }
    }
}

/// Everything learned about one candidate. Fields stay `None` unless the
/// matching probe ran and returned data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichmentRecord {
    pub fuzzer: Fuzzer,
    #[serde(rename = "domain-name")]
    pub domain_name: String,
    #[serde(rename = "domain-name-ascii", skip_serializing_if = "Option::is_none")]
    pub ascii_name: Option<String>,
    #[serde(rename = "dns-ns", skip_serializing_if = "Option::is_none")]
    pub dns_ns: Option<Vec<String>>,
    #[serde(rename = "dns-a", skip_serializing_if = "Option::is_none")]
    pub dns_a: Option<Vec<String>>,
    #[serde(rename = "dns-aaaa", skip_serializing_if = "Option::is_none")]
    pub dns_aaaa: Option<Vec<String>>,
    #[serde(rename = "dns-mx", skip_serializing_if = "Option::is_none")]
    pub dns_mx: Option<Vec<String>>,
    #[serde(rename = "geoip-country", skip_serializing_if = "Option::is_none")]
    pub geoip_country: Option<String>,
    #[serde(rename = "whois-created", skip_serializing_if = "Option::is_none")]
    pub whois_created: Option<DateTime<Utc>>,
    #[serde(rename = "whois-updated", skip_serializing_if = "Option::is_none")]
    pub whois_updated: Option<DateTime<Utc>>,
    #[serde(rename = "banner-http", skip_serializing_if = "Option::is_none")]
    pub banner_http: Option<String>,
    #[serde(rename = "banner-smtp", skip_serializing_if = "Option::is_none")]
    pub banner_smtp: Option<String>,
    #[serde(rename = "mx-spy", skip_serializing_if = "Option::is_none")]
    pub mx_spy: Option<bool>,
    #[serde(rename = "ssdeep-score", skip_serializing_if = "Option::is_none")]
    pub ssdeep_score: Option<u32>,
}

impl From<Candidate> for EnrichmentRecord {
    fn from(candidate: Candidate) -> Self {
        Self {
            fuzzer: candidate.fuzzer,
            domain_name: candidate.domain_name,
            ascii_name: None,
            dns_ns: None,
            dns_a: None,
            dns_aaaa: None,
            dns_mx: None,
            geoip_country: None,
            whois_created: None,
            whois_updated: None,
            banner_http: None,
            banner_smtp: None,
            mx_spy: None,
            ssdeep_score: None,
        }
    }
}

impl EnrichmentRecord {
    /// Name used on the wire: the ASCII form when the candidate is an IDN.
    pub fn query_name(&self) -> &str {
        self.ascii_name.as_deref().unwrap_or(&self.domain_name)
    }

    pub fn is_registered(&self) -> bool {
        self.dns_ns.is_some() || self.dns_a.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_record_serializes_two_fields() {
        let record = EnrichmentRecord::from(Candidate::new(Fuzzer::Original, "example.com"));
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"fuzzer":"Original*","domain-name":"example.com"}"#);
    }

    #[test]
    fn test_fuzzer_names() {
        assert_eq!(Fuzzer::VowelSwap.to_string(), "Vowel-swap");
        assert_eq!(
            serde_json::to_string(&Fuzzer::VowelSwap).unwrap(),
            r#""Vowel-swap""#
        );
        assert_eq!(serde_json::to_string(&Fuzzer::Various).unwrap(), r#""Various""#);
    }

    #[test]
    fn test_query_name_prefers_ascii() {
        let mut record = EnrichmentRecord::from(Candidate::new(Fuzzer::Homoglyph, "еxample.com"));
        assert_eq!(record.query_name(), "еxample.com");
        record.ascii_name = Some("xn--xample-2of.com".to_string());
        assert_eq!(record.query_name(), "xn--xample-2of.com");
    }
}
