//! Look-alike domain discovery: generates typosquatting candidates for a
//! target domain and enriches each one with DNS, WHOIS, GeoIP, banner,
//! mail-server and page-similarity probes.

pub mod config;
pub mod dictionary;
pub mod error;
pub mod fuzzers;
pub mod glyphs;
pub mod keyboard;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod probe;
pub mod report;
pub mod scheduler;
pub mod ssdeep;
pub mod tld;

pub use error::{Error, ProbeError, Result};
pub use fuzzers::Generation;
pub use model::{Candidate, EnrichmentRecord, Fuzzer};
pub use pipeline::PipelineContext;
pub use tld::Target;
