use crate::error::ProbeError;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use tracing::{debug, warn};
use trust_dns_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use trust_dns_resolver::system_conf::read_system_conf;
use trust_dns_resolver::TokioAsyncResolver;

const DNS_PORT: u16 = 53;

/// Resolver shared by every pipeline. Custom nameservers win over the system
/// configuration; without either we fall back to the resolver defaults.
pub fn build_resolver(nameservers: &[IpAddr], timeout: Duration) -> TokioAsyncResolver {
    let (config, mut opts) = if nameservers.is_empty() {
        read_system_conf().unwrap_or_else(|e| {
            debug!(error = %e, "No system resolver configuration, using defaults.");
            (ResolverConfig::default(), ResolverOpts::default())
        })
    } else {
        let group = NameServerConfigGroup::from_ips_clear(nameservers, DNS_PORT, true);
        (ResolverConfig::from_parts(None, vec![], group), ResolverOpts::default())
    };
    opts.timeout = timeout;
    opts.attempts = 1;

    TokioAsyncResolver::tokio(config, opts)
}

/// Nameserver list from user input. Entries that are not IP addresses are
/// reported and skipped.
pub fn parse_nameservers(entries: &[String]) -> Vec<IpAddr> {
    entries
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse::<IpAddr>() {
            Ok(ip) => Some(ip),
            Err(_) => {
                warn!(nameserver = entry, "Ignoring invalid nameserver.");
                None
            }
        })
        .collect()
}

fn fqdn(domain: &str) -> String {
    if domain.ends_with('.') {
        domain.to_string()
    } else {
        format!("{}.", domain)
    }
}

fn strip_root(name: String) -> String {
    name.trim_end_matches('.').to_string()
}

pub async fn lookup_ns(resolver: &TokioAsyncResolver, domain: &str) -> Result<Vec<String>, ProbeError> {
    let lookup = resolver.ns_lookup(fqdn(domain)).await?;
    let names: Vec<String> = lookup.iter().map(|ns| strip_root(ns.0.to_utf8())).collect();
    debug!(domain, ns = ?names, "DNS NS query.");
    Ok(names)
}

pub async fn lookup_a(resolver: &TokioAsyncResolver, domain: &str) -> Result<Vec<Ipv4Addr>, ProbeError> {
    let lookup = resolver.ipv4_lookup(fqdn(domain)).await?;
    let ips: Vec<Ipv4Addr> = lookup.iter().map(|a| a.0).collect();
    debug!(domain, a = ?ips, "DNS A query.");
    Ok(ips)
}

pub async fn lookup_aaaa(resolver: &TokioAsyncResolver, domain: &str) -> Result<Vec<Ipv6Addr>, ProbeError> {
    let lookup = resolver.ipv6_lookup(fqdn(domain)).await?;
    let ips: Vec<Ipv6Addr> = lookup.iter().map(|aaaa| aaaa.0).collect();
    debug!(domain, aaaa = ?ips, "DNS AAAA query.");
    Ok(ips)
}

pub async fn lookup_mx(resolver: &TokioAsyncResolver, domain: &str) -> Result<Vec<String>, ProbeError> {
    let lookup = resolver.mx_lookup(fqdn(domain)).await?;
    let hosts: Vec<String> = lookup
        .iter()
        .map(|mx| strip_root(mx.exchange().to_utf8()))
        .collect();
    debug!(domain, mx = ?hosts, "DNS MX query.");
    Ok(hosts)
}
