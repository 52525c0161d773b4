//! Tests for the batch orchestrator
//!
//! Drives complete batches through stub geoid and geocoding services.

pub mod error_handling;

use crate::config::ServiceConfig;
use crate::error::{LookupError, LookupErrorKind};
use crate::lookup::{CountryResolver, GeoidHeightService};
use crate::models::GeoidModel;
use crate::validator::Upload;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const HEADER: &str = "# image name,latitude [decimal degrees],longitude [decimal degrees],altitude [meter],omega [degrees],phi [degrees],kappa [degrees],accuracy horizontal [meter],accuracy vertical [meter]";

/// Geoid service returning a fixed height and optionally failing on one call
pub struct StubGeoid {
    geoid_height: f64,
    fail_on_call: Option<(usize, LookupErrorKind)>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(f64, f64, GeoidModel)>>,
}

impl StubGeoid {
    pub fn new(geoid_height: f64) -> Self {
        Self {
            geoid_height,
            fail_on_call: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail the `call`th lookup (1-based) with the given kind
    pub fn failing_on(mut self, call: usize, kind: LookupErrorKind) -> Self {
        self.fail_on_call = Some((call, kind));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(f64, f64, GeoidModel)> {
        self.requests.lock().unwrap().clone()
    }
}

impl GeoidHeightService for &StubGeoid {
    async fn geoid_height(
        &self,
        latitude: f64,
        longitude: f64,
        model: GeoidModel,
    ) -> Result<f64, LookupError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests
            .lock()
            .unwrap()
            .push((latitude, longitude, model));

        match self.fail_on_call {
            Some((failing, kind)) if failing == call => {
                Err(LookupError::new("geoid height", kind, "stubbed failure"))
            }
            _ => Ok(self.geoid_height),
        }
    }
}

/// Resolver answering with one country for every coordinate
pub struct StubCountry(pub &'static str);

impl CountryResolver for StubCountry {
    async fn resolve_country(&self, _latitude: f64, _longitude: f64) -> Result<String, LookupError> {
        Ok(self.0.to_string())
    }
}

pub fn quiet_config() -> ServiceConfig {
    ServiceConfig::default().without_progress()
}

/// Build a geotag upload from (image, lat, lon, altitude, accuracy_h, accuracy_v) rows
pub fn geotag_upload(name: &str, rows: &[(&str, f64, f64, f64, f64, f64)]) -> Upload {
    let mut text = format!("{}\n", HEADER);
    for (image, lat, lon, alt, acc_h, acc_v) in rows {
        text.push_str(&format!(
            "{},{},{},{},0.5,-1.5,92.25,{},{}\n",
            image, lat, lon, alt, acc_h, acc_v
        ));
    }
    Upload::new(name, text)
}

/// Upload with `count` rows at the scenario location
pub fn uniform_upload(name: &str, count: usize) -> Upload {
    let images: Vec<String> = (1..=count).map(|i| format!("IMG_{:04}.JPG", i)).collect();
    let rows: Vec<(&str, f64, f64, f64, f64, f64)> = images
        .iter()
        .enumerate()
        .map(|(i, image)| (image.as_str(), 40.0, -75.0, 100.0 + i as f64, 0.05, 0.1))
        .collect();
    geotag_upload(name, &rows)
}
