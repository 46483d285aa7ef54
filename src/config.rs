use std::time::Duration;
use tracing::warn;

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_TLD_FILE: &str = "database/effective_tld_names.dat";
pub const DEFAULT_GEOIP_FILE: &str = "database/GeoLite2-Country.mmdb";

/// Longest domain name the candidate filter lets through.
pub const MAX_DOMAIN_LENGTH: usize = 255;

pub fn user_agent() -> String {
    format!("Mozilla/5.0 {}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Optional probes enabled for a run. DNS lookups always run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modules {
    pub whois: bool,
    pub banners: bool,
    pub mxcheck: bool,
    pub ssdeep: bool,
    pub geoip: bool,
}

impl Modules {
    /// Parses a module list such as `whois,geoip` or `banners ssdeep`.
    /// Any non-word character separates names; unknown names are skipped.
    pub fn parse(list: &str) -> Self {
        let mut modules = Modules::default();
        for name in list.split(|c: char| !c.is_alphanumeric() && c != '_') {
            match name.to_ascii_lowercase().as_str() {
                "" => {}
                "whois" => modules.whois = true,
                "banners" => modules.banners = true,
                "mxcheck" => modules.mxcheck = true,
                "ssdeep" => modules.ssdeep = true,
                "geoip" => modules.geoip = true,
                other => warn!(module = other, "Unknown module ignored."),
            }
        }
        modules
    }

    pub fn enabled(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.whois {
            names.push("whois");
        }
        if self.banners {
            names.push("banners");
        }
        if self.mxcheck {
            names.push("mxcheck");
        }
        if self.ssdeep {
            names.push("ssdeep");
        }
        if self.geoip {
            names.push("geoip");
        }
        names
    }
}

/// Concurrency from user input. Anything that is not a positive integer
/// falls back to the default.
pub fn parse_concurrency(input: &str) -> usize {
    match input.trim().parse::<i64>() {
        Ok(n) if n >= 1 => n as usize,
        _ => {
            warn!(input, default = DEFAULT_CONCURRENCY, "Invalid concurrency, using default.");
            DEFAULT_CONCURRENCY
        }
    }
}

/// Per-stage timeout. Zero is treated as the default.
pub fn stage_timeout(ms: u64) -> Duration {
    if ms == 0 {
        Duration::from_millis(DEFAULT_TIMEOUT_MS)
    } else {
        Duration::from_millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modules_any_separator() {
        let modules = Modules::parse("whois, geoip|SSDEEP");
        assert!(modules.whois);
        assert!(modules.geoip);
        assert!(modules.ssdeep);
        assert!(!modules.banners);
        assert!(!modules.mxcheck);
        assert_eq!(modules.enabled(), vec!["whois", "ssdeep", "geoip"]);
    }

    #[test]
    fn test_parse_modules_ignores_unknown() {
        assert_eq!(Modules::parse("nmap"), Modules::default());
        assert_eq!(Modules::parse(""), Modules::default());
    }

    #[test]
    fn test_concurrency_fallback() {
        assert_eq!(parse_concurrency("4"), 4);
        assert_eq!(parse_concurrency("0"), DEFAULT_CONCURRENCY);
        assert_eq!(parse_concurrency("-3"), DEFAULT_CONCURRENCY);
        assert_eq!(parse_concurrency("many"), DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_stage_timeout_zero_uses_default() {
        assert_eq!(stage_timeout(0), Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(stage_timeout(500), Duration::from_millis(500));
    }
}
