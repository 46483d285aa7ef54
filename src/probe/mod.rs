//! Network probes used by the enrichment pipeline. `Prober` is the seam the
//! pipeline talks to; `NetworkProber` is the real implementation.

pub mod banner;
pub mod content;
pub mod dns;
pub mod geoip;
pub mod whois;

use crate::config::user_agent;
use crate::error::ProbeError;
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use trust_dns_resolver::TokioAsyncResolver;
use url::Url;

pub use content::Page;
pub use geoip::GeoDatabase;
pub use whois::WhoisDates;

pub const HTTP_PORT: u16 = 80;
pub const SMTP_PORT: u16 = 25;

#[async_trait]
pub trait Prober: Send + Sync {
    async fn lookup_ns(&self, domain: &str) -> Result<Vec<String>, ProbeError>;
    async fn lookup_a(&self, domain: &str) -> Result<Vec<Ipv4Addr>, ProbeError>;
    async fn lookup_aaaa(&self, domain: &str) -> Result<Vec<Ipv6Addr>, ProbeError>;
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<String>, ProbeError>;
    async fn whois(&self, domain: &str) -> Result<WhoisDates, ProbeError>;
    async fn country(&self, ip: IpAddr) -> Result<Option<String>, ProbeError>;
    async fn http_banner(&self, ip: IpAddr, vhost: &str) -> Result<Option<String>, ProbeError>;
    async fn smtp_banner(&self, mx: &str) -> Result<Option<String>, ProbeError>;
    /// Whether `mx` accepts mail for a made-up mailbox at `to_domain`.
    async fn mx_accepts_any(&self, mx: &str, from_domain: &str, to_domain: &str) -> Result<bool, ProbeError>;
    async fn fetch(&self, url: &Url) -> Result<Page, ProbeError>;
}

pub struct NetworkProber {
    resolver: TokioAsyncResolver,
    geoip: Option<GeoDatabase>,
    http: reqwest::Client,
    timeout: Duration,
}

impl NetworkProber {
    /// Builds the shared resolver once. A non-empty `nameservers` list
    /// replaces the system configuration for the whole run.
    pub fn new(
        nameservers: &[IpAddr],
        timeout: Duration,
        geoip: Option<GeoDatabase>,
    ) -> Result<Self, ProbeError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent())
            .build()?;

        Ok(Self {
            resolver: dns::build_resolver(nameservers, timeout),
            geoip,
            http,
            timeout,
        })
    }
}

#[async_trait]
impl Prober for NetworkProber {
    async fn lookup_ns(&self, domain: &str) -> Result<Vec<String>, ProbeError> {
        dns::lookup_ns(&self.resolver, domain).await
    }

    async fn lookup_a(&self, domain: &str) -> Result<Vec<Ipv4Addr>, ProbeError> {
        dns::lookup_a(&self.resolver, domain).await
    }

    async fn lookup_aaaa(&self, domain: &str) -> Result<Vec<Ipv6Addr>, ProbeError> {
        dns::lookup_aaaa(&self.resolver, domain).await
    }

    async fn lookup_mx(&self, domain: &str) -> Result<Vec<String>, ProbeError> {
        dns::lookup_mx(&self.resolver, domain).await
    }

    async fn whois(&self, domain: &str) -> Result<WhoisDates, ProbeError> {
        whois::lookup(domain, self.timeout).await
    }

    async fn country(&self, ip: IpAddr) -> Result<Option<String>, ProbeError> {
        match &self.geoip {
            Some(db) => db.country(ip),
            None => Ok(None),
        }
    }

    async fn http_banner(&self, ip: IpAddr, vhost: &str) -> Result<Option<String>, ProbeError> {
        banner::http_banner(SocketAddr::new(ip, HTTP_PORT), vhost).await
    }

    async fn smtp_banner(&self, mx: &str) -> Result<Option<String>, ProbeError> {
        banner::smtp_banner(mx, SMTP_PORT).await
    }

    async fn mx_accepts_any(&self, mx: &str, from_domain: &str, to_domain: &str) -> Result<bool, ProbeError> {
        banner::mx_accepts_any(mx, SMTP_PORT, from_domain, to_domain).await
    }

    async fn fetch(&self, url: &Url) -> Result<Page, ProbeError> {
        content::fetch(&self.http, url).await
    }
}
