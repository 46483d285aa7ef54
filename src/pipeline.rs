//! The per-candidate probe chain. Each stage runs under its own timeout and
//! unwind guard and hands back an `Option`; the pipeline owns the record and
//! stores whatever comes back.

use crate::config::Modules;
use crate::error::ProbeError;
use crate::model::{Candidate, EnrichmentRecord};
use crate::probe::content::candidate_url;
use crate::probe::Prober;
use crate::ssdeep::FuzzyHash;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, trace, warn};
use url::Url;

/// Read-only state shared by every pipeline of a run.
pub struct PipelineContext {
    pub modules: Modules,
    pub stage_timeout: Duration,
    pub target_url: Url,
    pub baseline: Option<FuzzyHash>,
    pub prober: Arc<dyn Prober>,
}

impl PipelineContext {
    fn target_host(&self) -> &str {
        self.target_url.host_str().unwrap_or_default()
    }
}

/// Fuzzy hash of the target's own page. `None` disables content similarity
/// for the run.
pub async fn compute_baseline(prober: &dyn Prober, target_url: &Url, stage_timeout: Duration) -> Option<FuzzyHash> {
    match timeout(stage_timeout, prober.fetch(target_url)).await {
        Ok(Ok(page)) if page.status == 200 => {
            info!(url = %target_url, bytes = page.body.len(), "Fetched baseline content.");
            Some(FuzzyHash::hash(page.body.as_bytes()))
        }
        Ok(Ok(page)) => {
            warn!(url = %target_url, status = page.status, "Baseline fetch returned non-200, similarity disabled.");
            None
        }
        Ok(Err(e)) => {
            warn!(url = %target_url, error = %e, "Baseline fetch failed, similarity disabled.");
            None
        }
        Err(_) => {
            warn!(url = %target_url, "Baseline fetch timed out, similarity disabled.");
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

async fn run_stage<T, F>(ctx: &PipelineContext, stage: &'static str, domain: &str, probe: F) -> Option<T>
where
    F: Future<Output = Result<Option<T>, ProbeError>>,
{
    match timeout(ctx.stage_timeout, AssertUnwindSafe(probe).catch_unwind()).await {
        Ok(Ok(Ok(Some(value)))) => {
            trace!(domain, stage, "Stage returned data.");
            Some(value)
        }
        Ok(Ok(Ok(None))) => None,
        Ok(Ok(Err(e))) => {
            debug!(domain, stage, error = %e, "Stage failed.");
            None
        }
        Ok(Err(payload)) => {
            error!(domain, stage, panic = panic_message(payload.as_ref()), "Stage panicked.");
            None
        }
        Err(_) => {
            debug!(domain, stage, timeout_ms = ctx.stage_timeout.as_millis() as u64, "Stage timed out.");
            None
        }
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn to_strings<T: ToString>(items: &[T]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

/// ASCII-compatible encoding of `domain`, when it differs.
pub fn ascii_name(domain: &str) -> Option<String> {
    match idna::domain_to_ascii(domain) {
        Ok(ascii) if ascii != domain => Some(ascii),
        Ok(_) => None,
        Err(e) => {
            debug!(domain, error = ?e, "IDNA conversion failed.");
            None
        }
    }
}

pub async fn enrich(candidate: Candidate, ctx: &PipelineContext) -> EnrichmentRecord {
    let mut record = EnrichmentRecord::from(candidate);
    record.ascii_name = ascii_name(&record.domain_name);
    let domain = record.query_name().to_string();
    let prober = ctx.prober.as_ref();
    let modules = ctx.modules;

    record.dns_ns = run_stage(ctx, "ns", &domain, async {
        prober.lookup_ns(&domain).await.map(non_empty)
    })
    .await;

    let ipv4: Option<Vec<Ipv4Addr>> = run_stage(ctx, "a", &domain, async {
        prober.lookup_a(&domain).await.map(non_empty)
    })
    .await;
    record.dns_a = ipv4.as_deref().map(to_strings);
    let first_ip = ipv4.as_ref().and_then(|ips| ips.first()).copied().map(IpAddr::V4);

    record.dns_aaaa = run_stage(ctx, "aaaa", &domain, async {
        prober.lookup_aaaa(&domain).await.map(|ips| non_empty(to_strings(&ips)))
    })
    .await;

    record.dns_mx = run_stage(ctx, "mx", &domain, async {
        prober.lookup_mx(&domain).await.map(non_empty)
    })
    .await;
    let first_mx = record.dns_mx.as_ref().and_then(|mx| mx.first()).cloned();

    // Registered domains have nameservers; unresolvable ones may still be
    // registered but parked without DNS.
    if modules.whois && (record.dns_ns.is_some() || record.dns_a.is_none()) {
        if let Some(dates) = run_stage(ctx, "whois", &domain, async {
            prober.whois(&domain).await.map(Some)
        })
        .await
        {
            record.whois_created = dates.created;
            record.whois_updated = dates.updated;
        }
    }

    if let Some(ip) = first_ip {
        if modules.geoip {
            record.geoip_country = run_stage(ctx, "geoip", &domain, prober.country(ip)).await;
        }
        if modules.banners {
            record.banner_http = run_stage(ctx, "banner-http", &domain, prober.http_banner(ip, &domain)).await;
        }
    }

    if let Some(mx) = &first_mx {
        if modules.banners {
            record.banner_smtp = run_stage(ctx, "banner-smtp", &domain, prober.smtp_banner(mx)).await;
        }
        if modules.mxcheck {
            record.mx_spy = run_stage(ctx, "mxcheck", &domain, async {
                let accepted = prober.mx_accepts_any(mx, ctx.target_host(), &domain).await?;
                Ok::<_, ProbeError>(accepted.then_some(true))
            })
            .await;
        }
    }

    if let (true, Some(_), Some(baseline)) = (modules.ssdeep, first_ip, &ctx.baseline) {
        record.ssdeep_score = run_stage(ctx, "ssdeep", &domain, async {
            let url = candidate_url(&ctx.target_url, &domain)
                .ok_or_else(|| ProbeError::Protocol(format!("cannot build URL for {}", domain)))?;
            let page = prober.fetch(&url).await?;
            if page.status != 200 {
                return Ok(None);
            }
            Ok::<_, ProbeError>(Some(FuzzyHash::hash(page.body.as_bytes()).compare(baseline)))
        })
        .await;
    }

    debug!(domain = %record.domain_name, registered = record.is_registered(), "Pipeline finished.");
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_name_only_for_idn() {
        assert_eq!(ascii_name("example.com"), None);
        assert_eq!(ascii_name("ехаmple.com").as_deref().map(|a| a.starts_with("xn--")), Some(true));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty::<u8>(vec![]), None);
        assert_eq!(non_empty(vec![1]), Some(vec![1]));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
