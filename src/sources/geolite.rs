//! Local MaxMind GeoLite2-City adapter.
//!
//! Answers offline from an `.mmdb` file loaded once into memory. GeoLite2-City
//! carries no ISP data, so connection type stays `unknown`.

use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use maxminddb::Reader;

use super::types::ProviderReading;
use super::GeoProvider;
use crate::error_handling::{InitializationError, ProviderError};

/// GeoLite2-City provider.
pub struct GeoliteProvider {
    id: String,
    reader: Arc<Reader<Vec<u8>>>,
    reliability: f64,
}

impl GeoliteProvider {
    /// Opens the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::GeoliteDatabaseError` if the file cannot be
    /// read or is not a valid MaxMind database.
    pub fn open(
        id: impl Into<String>,
        path: &Path,
        reliability: f64,
    ) -> Result<Self, InitializationError> {
        let bytes = std::fs::read(path).map_err(|e| {
            InitializationError::GeoliteDatabaseError(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))
        })?;
        let reader = Reader::from_source(bytes).map_err(|e| {
            InitializationError::GeoliteDatabaseError(format!(
                "invalid database {}: {}",
                path.display(),
                e
            ))
        })?;
        log::debug!("Loaded GeoLite database from {}", path.display());
        Ok(Self {
            id: id.into(),
            reader: Arc::new(reader),
            reliability,
        })
    }

    fn read(&self, ip: IpAddr) -> Result<ProviderReading, ProviderError> {
        // maxminddb 0.27 API: lookup() returns a LookupResult; has_data() says
        // whether the address is in the database, decode() extracts the record
        let lookup = self
            .reader
            .lookup(ip)
            .map_err(|e| ProviderError::Database(e.to_string()))?;

        if !lookup.has_data() {
            return Err(ProviderError::Rejected("address not in database".to_string()));
        }

        let city: maxminddb::geoip2::City = match lookup.decode() {
            Ok(Some(city)) => city,
            Ok(None) => {
                return Err(ProviderError::Rejected("address not in database".to_string()))
            }
            Err(e) => return Err(ProviderError::Database(e.to_string())),
        };

        Ok(ProviderReading {
            lat: city.location.latitude,
            lon: city.location.longitude,
            city: city.city.names.english.map(|s| s.to_string()),
            region: city
                .subdivisions
                .first()
                .and_then(|s| s.names.english)
                .map(|s| s.to_string()),
            country: city.country.iso_code.map(|s| s.to_string()),
            zip: city.postal.code.map(|s| s.to_string()),
            ..Default::default()
        })
    }
}

#[async_trait]
impl GeoProvider for GeoliteProvider {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn reliability(&self) -> f64 {
        self.reliability
    }

    async fn lookup(&self, ip: IpAddr) -> Result<ProviderReading, ProviderError> {
        self.read(ip)
    }
}
