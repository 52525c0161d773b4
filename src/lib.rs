//! ellips2ortho
//!
//! Converts ellipsoidal heights in photogrammetry geotag CSV files into
//! orthometric heights using the NGS geoid height service, and packages the
//! corrected files into a single zip archive.
//!
//! This library provides tools for:
//! - Parsing and validating geotag CSV files (required columns, supported country)
//! - Looking up geoid heights per record for one of twelve geoid models
//! - Converting heights and accuracies to meters or US survey feet
//! - Running all-or-nothing batches over many files and packaging the results

pub mod archive;
pub mod cli;
pub mod config;
pub mod constants;
pub mod converter;
pub mod error;
pub mod lookup;
pub mod models;
pub mod processor;
pub mod progress;
pub mod validator;

// Re-export commonly used types
pub use config::ServiceConfig;
pub use error::{ConvertError, LookupError, LookupErrorKind, Result};
pub use lookup::{CountryResolver, GeoNamesClient, GeoidHeightService, NgsGeoidClient};
pub use models::{BatchRequest, BatchState, GeoidModel, OutputBundle, RecordSet, Unit};
pub use processor::BatchOrchestrator;
pub use validator::{RawTable, RecordSetValidator, Upload};
