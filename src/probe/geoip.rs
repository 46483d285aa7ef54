use crate::error::{Error, ProbeError};
use maxminddb::{geoip2, MaxMindDBError, Reader};
use std::net::IpAddr;
use std::path::Path;
use tracing::debug;

/// Offline GeoIP2/GeoLite2 country database, opened once per run.
pub struct GeoDatabase {
    reader: Reader<Vec<u8>>,
}

impl GeoDatabase {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let reader = Reader::open_readfile(path).map_err(|e| Error::dataset(path, e))?;
        debug!(path = %path.display(), "Opened GeoIP database.");
        Ok(Self { reader })
    }

    /// English country name, or the ISO code when the database has no names.
    pub fn country(&self, ip: IpAddr) -> Result<Option<String>, ProbeError> {
        match self.reader.lookup::<geoip2::Country>(ip) {
            Ok(record) => Ok(record.country.and_then(|country| {
                let iso_code = country.iso_code;
                country
                    .names
                    .and_then(|names| names.get("en").map(|name| name.to_string()))
                    .or_else(|| iso_code.map(str::to_string))
            })),
            Err(MaxMindDBError::AddressNotFoundError(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_database_is_dataset_error() {
        let err = GeoDatabase::open(Path::new("/nonexistent/GeoLite2-Country.mmdb"))
            .err()
            .unwrap();
        assert!(matches!(err, Error::DatasetLoad { .. }));
    }
}
