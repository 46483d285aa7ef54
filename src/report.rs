//! Report serialization and the one-line terminal summary per candidate.

use crate::error::{Error, Result};
use crate::model::EnrichmentRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use console::style;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

/// Which records make it into the report and the summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordFilter {
    #[default]
    All,
    Registered,
    Unregistered,
}

impl RecordFilter {
    pub fn from_flags(registered: bool, unregistered: bool) -> Self {
        match (registered, unregistered) {
            (true, false) => RecordFilter::Registered,
            (false, true) => RecordFilter::Unregistered,
            _ => RecordFilter::All,
        }
    }

    pub fn keeps(&self, record: &EnrichmentRecord) -> bool {
        match self {
            RecordFilter::All => true,
            RecordFilter::Registered => record.is_registered(),
            RecordFilter::Unregistered => !record.is_registered(),
        }
    }

    pub fn apply(&self, records: Vec<EnrichmentRecord>) -> Vec<EnrichmentRecord> {
        records.into_iter().filter(|r| self.keeps(r)).collect()
    }
}

const CSV_HEADER: [&str; 10] = [
    "fuzzer",
    "domain-name",
    "dns-a",
    "dns-aaaa",
    "dns-mx",
    "dns-ns",
    "geoip-country",
    "whois-created",
    "whois-updated",
    "ssdeep-score",
];

fn join(list: &Option<Vec<String>>) -> String {
    list.as_deref().map(|items| items.join(",")).unwrap_or_default()
}

fn timestamp(value: &Option<DateTime<Utc>>) -> String {
    value
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

pub fn write_json_to<W: Write>(records: &[EnrichmentRecord], writer: W) -> Result<(), serde_json::Error> {
    serde_json::to_writer_pretty(writer, records)
}

pub fn write_csv_to<W: Write>(records: &[EnrichmentRecord], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for record in records {
        wtr.write_record([
            record.fuzzer.as_str().to_string(),
            record.domain_name.clone(),
            join(&record.dns_a),
            join(&record.dns_aaaa),
            join(&record.dns_mx),
            join(&record.dns_ns),
            record.geoip_country.clone().unwrap_or_default(),
            timestamp(&record.whois_created),
            timestamp(&record.whois_updated),
            record.ssdeep_score.map(|s| s.to_string()).unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_report(records: &[EnrichmentRecord], path: &Path, format: OutputFormat) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::output(path, e))?;
    let mut writer = BufWriter::new(file);
    match format {
        OutputFormat::Json => write_json_to(records, &mut writer).map_err(|e| Error::output(path, e))?,
        OutputFormat::Csv => write_csv_to(records, &mut writer).map_err(|e| Error::output(path, e))?,
    }
    writer.flush().map_err(|e| Error::output(path, e))?;
    info!(path = %path.display(), records = records.len(), ?format, "Report written.");
    Ok(())
}

fn label(name: &str) -> String {
    format!("{}:", style(name).yellow())
}

/// `<domain> A: <ips> (<country>) NS: ...`, or `<domain> -` when no probe
/// found anything.
pub fn summary_line(record: &EnrichmentRecord) -> String {
    let mut line = vec![style(&record.domain_name).blue().to_string()];

    if let Some(a) = &record.dns_a {
        line.push(format!("{} {}", label("A"), a.join(",")));
        if let Some(country) = &record.geoip_country {
            line.push(format!("({})", country));
        }
    }
    if let Some(aaaa) = &record.dns_aaaa {
        line.push(format!("{} {}", label("AAAA"), aaaa.join(",")));
    }
    if let Some(ns) = &record.dns_ns {
        line.push(format!("{} {}", label("NS"), ns.join(",")));
    }
    if let Some(mx) = &record.dns_mx {
        line.push(format!("{} {}", label("MX"), mx.join(",")));
    }
    if let Some(http) = &record.banner_http {
        line.push(format!("{} {}", label("HTTP"), http));
    }
    if let Some(smtp) = &record.banner_smtp {
        line.push(format!("{} {}", label("SMTP"), smtp));
    }
    if let Some(created) = &record.whois_created {
        line.push(format!("{} {}", label("WHOIS"), created.format("%Y-%m-%d")));
        if let Some(updated) = &record.whois_updated {
            line.push(updated.format("%Y-%m-%d").to_string());
        }
    }
    if let Some(score) = record.ssdeep_score {
        line.push(format!("{} {}", label("SSDEEP"), score));
    }
    if record.mx_spy == Some(true) {
        line.push(style("SPY-MX").red().bold().to_string());
    }

    if line.len() < 2 {
        line.push("-".to_string());
    }
    line.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Candidate, Fuzzer};
    use console::strip_ansi_codes;

    fn resolved() -> EnrichmentRecord {
        let mut record = EnrichmentRecord::from(Candidate::new(Fuzzer::Addition, "examplea.com"));
        record.dns_a = Some(vec!["192.0.2.1".to_string(), "192.0.2.2".to_string()]);
        record.dns_ns = Some(vec!["ns1.parking.test".to_string()]);
        record.geoip_country = Some("Netherlands".to_string());
        record.ssdeep_score = Some(87);
        record.whois_created = "2020-02-03T00:00:00Z".parse().ok();
        record
    }

    fn bare() -> EnrichmentRecord {
        EnrichmentRecord::from(Candidate::new(Fuzzer::Omission, "exampl.com"))
    }

    #[test]
    fn test_csv_layout() {
        let mut out = Vec::new();
        write_csv_to(&[resolved(), bare()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "fuzzer,domain-name,dns-a,dns-aaaa,dns-mx,dns-ns,geoip-country,whois-created,whois-updated,ssdeep-score"
        );
        assert_eq!(
            lines[1],
            "Addition,examplea.com,\"192.0.2.1,192.0.2.2\",,,ns1.parking.test,Netherlands,2020-02-03T00:00:00Z,,87"
        );
        assert_eq!(lines[2], "Omission,exampl.com,,,,,,,,");
    }

    #[test]
    fn test_json_omits_missing_fields() {
        let mut out = Vec::new();
        write_json_to(&[bare()], &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value, serde_json::json!([{"fuzzer": "Omission", "domain-name": "exampl.com"}]));
    }

    #[test]
    fn test_summary_line() {
        let line = strip_ansi_codes(&summary_line(&resolved())).to_string();
        assert_eq!(
            line,
            "examplea.com A: 192.0.2.1,192.0.2.2 (Netherlands) NS: ns1.parking.test WHOIS: 2020-02-03 SSDEEP: 87"
        );
        let line = strip_ansi_codes(&summary_line(&bare())).to_string();
        assert_eq!(line, "exampl.com -");
    }

    #[test]
    fn test_record_filter() {
        let records = vec![resolved(), bare()];
        assert_eq!(RecordFilter::from_flags(false, false).apply(records.clone()).len(), 2);
        let registered = RecordFilter::from_flags(true, false).apply(records.clone());
        assert_eq!(registered[0].domain_name, "examplea.com");
        let unregistered = RecordFilter::Unregistered.apply(records);
        assert_eq!(unregistered.len(), 1);
        assert_eq!(unregistered[0].domain_name, "exampl.com");
    }

    #[test]
    fn test_unwritable_path_is_output_error() {
        let err = write_report(&[bare()], Path::new("/nonexistent/dir/report.json"), OutputFormat::Json)
            .unwrap_err();
        assert!(matches!(err, Error::OutputWrite { .. }));
    }
}
