use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run, or that the caller reports and moves past.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Target invalid: {0}")]
    InvalidTarget(String),

    #[error("Failed to load {}: {source}", path.display())]
    DatasetLoad {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to write {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    pub fn dataset<E>(path: impl Into<PathBuf>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::DatasetLoad {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn output<E>(path: impl Into<PathBuf>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::OutputWrite {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// A single probe failed. The pipeline always recovers from these.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("DNS error: {0}")]
    Dns(#[from] trust_dns_resolver::error::ResolveError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GeoIP error: {0}")]
    Geo(#[from] maxminddb::MaxMindDBError),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
