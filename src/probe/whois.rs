//! WHOIS (RFC 3912) over TCP port 43, reduced to the two dates we report.

use crate::error::ProbeError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

const WHOIS_PORT: u16 = 43;
const MAX_RESPONSE_BYTES: u64 = 256 * 1024;

const CREATED_KEYS: &[&str] = &[
    "creation date",
    "created",
    "created on",
    "created date",
    "registered on",
    "registration time",
    "domain registration date",
    "registered",
];

const UPDATED_KEYS: &[&str] = &[
    "updated date",
    "last updated",
    "last updated on",
    "last-update",
    "last modified",
    "changed",
    "modified",
    "updated",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y", "%d.%m.%Y", "%Y.%m.%d", "%Y/%m/%d", "%d/%m/%Y"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhoisDates {
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl WhoisDates {
    /// Fields from `self` win; gaps are filled from `fallback`.
    fn or(self, fallback: WhoisDates) -> WhoisDates {
        WhoisDates {
            created: self.created.or(fallback.created),
            updated: self.updated.or(fallback.updated),
        }
    }
}

fn get_whois_server(tld: &str) -> &'static str {
    match tld {
        "com" | "net" => "whois.verisign-grs.com",
        "org" => "whois.pir.org",
        "info" => "whois.afilias.net",
        "biz" => "whois.neulevel.biz",
        "us" => "whois.nic.us",
        "co" => "whois.nic.co",
        "io" => "whois.nic.io",
        "me" => "whois.nic.me",
        "uk" => "whois.nic.uk",
        "ca" => "whois.cira.ca",
        "de" => "whois.denic.de",
        "fr" => "whois.afnic.fr",
        "ru" => "whois.tcinet.ru",
        "cn" => "whois.cnnic.net.cn",
        "jp" => "whois.jprs.jp",
        "au" => "whois.auda.org.au",
        "br" => "whois.registro.br",
        "app" | "dev" => "whois.nic.google",
        "tech" => "whois.nic.tech",
        _ => "whois.iana.org",
    }
}

async fn query(server: &str, port: u16, domain: &str) -> Result<String, ProbeError> {
    let mut stream = TcpStream::connect((server, port)).await?;
    stream.write_all(format!("{}\r\n", domain).as_bytes()).await?;

    let mut response = Vec::new();
    stream.take(MAX_RESPONSE_BYTES).read_to_end(&mut response).await?;
    Ok(String::from_utf8_lossy(&response).into_owned())
}

/// `host[:port]` as found in a referral line.
fn split_server(server: &str, default_port: u16) -> (&str, u16) {
    match server.rsplit_once(':') {
        Some((host, port)) => match port.parse() {
            Ok(port) => (host, port),
            Err(_) => (server, default_port),
        },
        None => (server, default_port),
    }
}

/// Queries the registry for `domain` and follows one referral to the
/// registrar (or from IANA to the registry). `budget` is the time the caller
/// allows for the whole lookup.
pub async fn lookup(domain: &str, budget: Duration) -> Result<WhoisDates, ProbeError> {
    let tld = domain.rsplit('.').next().unwrap_or_default();
    lookup_at(get_whois_server(tld), WHOIS_PORT, domain, budget).await
}

async fn lookup_at(server: &str, port: u16, domain: &str, budget: Duration) -> Result<WhoisDates, ProbeError> {
    let started = Instant::now();
    let response = query(server, port, domain).await?;
    let dates = parse_dates(&response);
    debug!(domain, server, ?dates, "WHOIS query.");

    let Some(referral) = referral_server(&response) else {
        return Ok(dates);
    };
    if referral.eq_ignore_ascii_case(server) {
        return Ok(dates);
    }

    // The referral gets part of what is left, so registry dates survive a
    // registrar that never answers.
    let remaining = budget.saturating_sub(started.elapsed()) * 4 / 5;
    let (host, referral_port) = split_server(&referral, WHOIS_PORT);
    match timeout(remaining, query(host, referral_port, domain)).await {
        Ok(Ok(referred)) => {
            let referred = parse_dates(&referred);
            debug!(domain, server = %referral, dates = ?referred, "WHOIS referral query.");
            Ok(referred.or(dates))
        }
        Ok(Err(e)) => {
            debug!(domain, server = %referral, error = %e, "WHOIS referral failed.");
            Ok(dates)
        }
        Err(_) => {
            debug!(domain, server = %referral, "WHOIS referral timed out.");
            Ok(dates)
        }
    }
}

fn fields(response: &str) -> impl Iterator<Item = (String, &str)> {
    response.lines().filter_map(|line| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') || line.starts_with('#') {
            return None;
        }
        let (key, value) = line.split_once(':')?;
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        Some((key.trim().to_ascii_lowercase(), value))
    })
}

pub fn parse_dates(response: &str) -> WhoisDates {
    let mut dates = WhoisDates::default();
    for (key, value) in fields(response) {
        if dates.created.is_none() && CREATED_KEYS.contains(&key.as_str()) {
            dates.created = parse_whois_date(value);
        } else if dates.updated.is_none() && UPDATED_KEYS.contains(&key.as_str()) {
            dates.updated = parse_whois_date(value);
        }
    }
    dates
}

pub fn referral_server(response: &str) -> Option<String> {
    fields(response)
        .find(|(key, _)| key == "refer" || key == "registrar whois server" || key == "whois server")
        .map(|(_, value)| {
            value
                .trim_start_matches("whois://")
                .trim_end_matches('/')
                .to_ascii_lowercase()
        })
        .filter(|server| !server.is_empty())
}

pub fn parse_whois_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value
        .trim()
        .trim_end_matches("(UTC)")
        .trim_end_matches("UTC")
        .trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%z") {
        return Some(parsed.with_timezone(&Utc));
    }

    let candidates = [value, value.split_whitespace().next().unwrap_or(value)];
    for candidate in candidates {
        for format in DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(candidate, format) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
                return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    const VERISIGN: &str = "   Domain Name: EXAMPLE.COM\r\n\
   Registry Domain ID: 2336799_DOMAIN_COM-VRSN\r\n\
   Registrar WHOIS Server: whois.iana.org\r\n\
   Updated Date: 2024-08-14T07:01:34Z\r\n\
   Creation Date: 1995-08-14T04:00:00Z\r\n\
   Registry Expiry Date: 2025-08-13T04:00:00Z\r\n\
>>> Last update of whois database: 2024-10-01T12:00:00Z <<<\r\n";

    #[test]
    fn test_parse_verisign_dates() {
        let dates = parse_dates(VERISIGN);
        assert_eq!(dates.created.unwrap().to_rfc3339(), "1995-08-14T04:00:00+00:00");
        assert_eq!(dates.updated.unwrap().to_rfc3339(), "2024-08-14T07:01:34+00:00");
        assert_eq!(referral_server(VERISIGN).as_deref(), Some("whois.iana.org"));
    }

    #[test]
    fn test_parse_iana_referral() {
        let response = "% IANA WHOIS server\n\nrefer:        whois.nic.io\n\ndomain:       IO\n";
        assert_eq!(referral_server(response).as_deref(), Some("whois.nic.io"));
        assert_eq!(parse_dates(response), WhoisDates::default());
    }

    #[test]
    fn test_date_formats() {
        for input in [
            "2019-08-13",
            "13-Aug-2019",
            "2019-08-13 00:00:00",
            "2019-08-13T00:00:00.000Z",
            "2019-08-13 00:00:00 UTC",
            "2019-08-13 (YYYY-MM-DD)",
            "13.08.2019",
        ] {
            let parsed = parse_whois_date(input).unwrap_or_else(|| panic!("failed on {}", input));
            assert_eq!(parsed.format("%Y-%m-%d").to_string(), "2019-08-13", "{}", input);
        }
        assert!(parse_whois_date("not a date").is_none());
    }

    #[test]
    fn test_registrar_dates_win() {
        let registry = WhoisDates {
            created: parse_whois_date("1995-08-14"),
            updated: parse_whois_date("2020-01-01"),
        };
        let registrar = WhoisDates {
            created: None,
            updated: parse_whois_date("2024-01-01"),
        };
        let merged = registrar.or(registry);
        assert_eq!(merged.created, parse_whois_date("1995-08-14"));
        assert_eq!(merged.updated, parse_whois_date("2024-01-01"));
    }

    #[test]
    fn test_referral_keeps_port() {
        let response = "Registrar WHOIS Server: whois://Whois.Example.net:4343/\n";
        assert_eq!(referral_server(response).as_deref(), Some("whois.example.net:4343"));
        assert_eq!(split_server("whois.example.net:4343", 43), ("whois.example.net", 4343));
        assert_eq!(split_server("whois.example.net", 43), ("whois.example.net", 43));
    }

    #[tokio::test]
    async fn test_silent_registrar_keeps_registry_dates() {
        let registrar = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let registrar_port = registrar.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (_socket, _) = registrar.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let registry = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let registry_port = registry.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = registry.accept().await.unwrap();
            let mut buf = [0u8; 256];
            let _ = socket.read(&mut buf).await.unwrap();
            let response = format!(
                "Domain Name: EXAMP1E.COM\r\nRegistrar WHOIS Server: 127.0.0.1:{}\r\nCreation Date: 2021-05-06T00:00:00Z\r\n",
                registrar_port
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });

        let budget = Duration::from_millis(500);
        let started = Instant::now();
        let dates = timeout(budget, lookup_at("127.0.0.1", registry_port, "examp1e.com", budget))
            .await
            .expect("lookup outlived its budget")
            .unwrap();

        assert!(started.elapsed() < budget);
        assert_eq!(dates.created, parse_whois_date("2021-05-06"));
        assert_eq!(dates.updated, None);
    }

    #[tokio::test]
    async fn test_oversized_response_is_truncated() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let chunk = vec![b'x'; 64 * 1024];
            for _ in 0..8 {
                if socket.write_all(&chunk).await.is_err() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let response = query("127.0.0.1", port, "examp1e.com").await.unwrap();
        assert_eq!(response.len() as u64, MAX_RESPONSE_BYTES);
    }
}
