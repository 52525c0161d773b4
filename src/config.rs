//! Configuration management and validation.
//!
//! Provides the service configuration for a conversion run: where the geoid
//! and geocoding services live, which country the geoid service covers, and
//! how lookups are scheduled.

use crate::constants::{
    DEFAULT_GEOCODING_ENDPOINT, DEFAULT_GEOID_ENDPOINT, DEFAULT_GEONAMES_USERNAME,
    DEFAULT_TARGET_COUNTRY,
};
use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Settings for the external services and the batch runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Geoid height endpoint
    pub geoid_endpoint: String,

    /// Reverse geocoding endpoint
    pub geocoding_endpoint: String,

    /// GeoNames account name sent with geocoding requests
    pub geonames_username: String,

    /// Country every uploaded file must be located in
    pub target_country: String,

    /// Number of geoid lookups allowed in flight per record set (1 = sequential)
    pub lookup_concurrency: usize,

    /// Render progress bars while converting
    pub show_progress: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            geoid_endpoint: DEFAULT_GEOID_ENDPOINT.to_string(),
            geocoding_endpoint: DEFAULT_GEOCODING_ENDPOINT.to_string(),
            geonames_username: DEFAULT_GEONAMES_USERNAME.to_string(),
            target_country: DEFAULT_TARGET_COUNTRY.to_string(),
            lookup_concurrency: 1,
            show_progress: true,
        }
    }
}

impl ServiceConfig {
    /// Use a different geoid height endpoint
    pub fn with_geoid_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.geoid_endpoint = endpoint.into();
        self
    }

    /// Use a different reverse geocoding endpoint
    pub fn with_geocoding_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.geocoding_endpoint = endpoint.into();
        self
    }

    pub fn with_geonames_username(mut self, username: impl Into<String>) -> Self {
        self.geonames_username = username.into();
        self
    }

    pub fn with_target_country(mut self, country: impl Into<String>) -> Self {
        self.target_country = country.into();
        self
    }

    /// Allow several lookups in flight; output order is unaffected
    pub fn with_lookup_concurrency(mut self, concurrency: usize) -> Self {
        self.lookup_concurrency = concurrency;
        self
    }

    /// Disable progress bars (logging is unaffected)
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Check the configuration before any request is made
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("geoid endpoint", &self.geoid_endpoint),
            ("geocoding endpoint", &self.geocoding_endpoint),
            ("GeoNames username", &self.geonames_username),
            ("target country", &self.target_country),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConvertError::configuration(format!("{} must not be empty", name)));
            }
        }

        for (name, endpoint) in [
            ("geoid endpoint", &self.geoid_endpoint),
            ("geocoding endpoint", &self.geocoding_endpoint),
        ] {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ConvertError::configuration(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, endpoint
                )));
            }
        }

        if self.lookup_concurrency == 0 {
            return Err(ConvertError::configuration(
                "lookup concurrency must be at least 1",
            ));
        }

        debug!("Service configuration validated: {:?}", self);
        Ok(())
    }
}
