//! Clients for the external lookup services.
//!
//! The geoid height service supplies the ellipsoid/geoid separation for a
//! coordinate and geoid model; the reverse geocoding service resolves the
//! country a coordinate falls in. Both are reached over HTTP with one request
//! per call, no caching and no retries. Transport failures are classified
//! into [`LookupErrorKind`]s so callers can report what went wrong.

use crate::config::ServiceConfig;
use crate::constants::{COUNTRY_NAME_FIELD, GEOID_HEIGHT_FIELD};
use crate::error::{ConvertError, LookupError, LookupErrorKind, Result};
use crate::models::GeoidModel;
use serde::Deserialize;
use std::future::Future;
use tracing::debug;

const GEOID_SERVICE: &str = "geoid height";
const GEOCODING_SERVICE: &str = "reverse geocoding";

/// Source of geoid heights for a coordinate and geoid model
pub trait GeoidHeightService {
    /// Geoid height in meters at the given position
    fn geoid_height(
        &self,
        latitude: f64,
        longitude: f64,
        model: GeoidModel,
    ) -> impl Future<Output = std::result::Result<f64, LookupError>> + Send;
}

/// Source of country names for a coordinate
pub trait CountryResolver {
    fn resolve_country(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = std::result::Result<String, LookupError>> + Send;
}

/// Build the HTTP client shared by both services
pub fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConvertError::configuration(format!("failed to build HTTP client: {}", e)))
}

#[derive(Debug, Deserialize)]
struct GeoidHeightResponse {
    #[serde(rename = "geoidHeight")]
    geoid_height: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CountryResponse {
    #[serde(rename = "countryName")]
    country_name: Option<String>,
}

/// Extract the geoid height from a geoid service response body
pub fn parse_geoid_height(body: &str) -> std::result::Result<f64, LookupError> {
    let response: GeoidHeightResponse = serde_json::from_str(body)
        .map_err(|e| LookupError::new(GEOID_SERVICE, LookupErrorKind::OtherRequestFailure, e))?;
    response
        .geoid_height
        .ok_or_else(|| LookupError::malformed(GEOID_SERVICE, format!("no {}", GEOID_HEIGHT_FIELD)))
}

/// Extract the country name from a reverse geocoding response body
pub fn parse_country_name(body: &str) -> std::result::Result<String, LookupError> {
    let response: CountryResponse = serde_json::from_str(body).map_err(|e| {
        LookupError::new(GEOCODING_SERVICE, LookupErrorKind::OtherRequestFailure, e)
    })?;
    response.country_name.ok_or_else(|| {
        LookupError::malformed(GEOCODING_SERVICE, format!("no {}", COUNTRY_NAME_FIELD))
    })
}

/// Issue a GET request and return the body of a successful response
async fn get_body(
    client: &reqwest::Client,
    service: &'static str,
    endpoint: &str,
    query: &[(&str, String)],
) -> std::result::Result<String, LookupError> {
    let response = client
        .get(endpoint)
        .query(query)
        .send()
        .await
        .map_err(|e| LookupError::from_transport(service, e))?
        .error_for_status()
        .map_err(|e| LookupError::from_transport(service, e))?;

    response
        .text()
        .await
        .map_err(|e| LookupError::from_transport(service, e))
}

/// NGS geoid height API client
#[derive(Debug, Clone)]
pub struct NgsGeoidClient {
    client: reqwest::Client,
    endpoint: String,
}

impl NgsGeoidClient {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(client: reqwest::Client, config: &ServiceConfig) -> Self {
        Self::new(client, config.geoid_endpoint.clone())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl GeoidHeightService for NgsGeoidClient {
    async fn geoid_height(
        &self,
        latitude: f64,
        longitude: f64,
        model: GeoidModel,
    ) -> std::result::Result<f64, LookupError> {
        let query = [
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
            ("model", model.code().to_string()),
        ];
        let body = get_body(&self.client, GEOID_SERVICE, &self.endpoint, &query).await?;
        let geoid_height = parse_geoid_height(&body)?;
        debug!(
            "Geoid height at ({}, {}) with {}: {}",
            latitude, longitude, model, geoid_height
        );
        Ok(geoid_height)
    }
}

/// GeoNames `countryCode` reverse geocoding client
#[derive(Debug, Clone)]
pub struct GeoNamesClient {
    client: reqwest::Client,
    endpoint: String,
    username: String,
}

impl GeoNamesClient {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            username: username.into(),
        }
    }

    pub fn from_config(client: reqwest::Client, config: &ServiceConfig) -> Self {
        Self::new(
            client,
            config.geocoding_endpoint.clone(),
            config.geonames_username.clone(),
        )
    }
}

impl CountryResolver for GeoNamesClient {
    async fn resolve_country(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> std::result::Result<String, LookupError> {
        let query = [
            ("lat", latitude.to_string()),
            ("lng", longitude.to_string()),
            ("type", "json".to_string()),
            ("username", self.username.clone()),
        ];
        let body = get_body(&self.client, GEOCODING_SERVICE, &self.endpoint, &query).await?;
        let country = parse_country_name(&body)?;
        debug!("Resolved ({}, {}) to {}", latitude, longitude, country);
        Ok(country)
    }
}
