//! Command-line interface components.

use crate::config::ServiceConfig;
use crate::constants::{
    ARCHIVE_FILE_NAME, DEFAULT_GEOCODING_ENDPOINT, DEFAULT_GEOID_ENDPOINT,
    DEFAULT_GEONAMES_USERNAME, DEFAULT_TARGET_COUNTRY,
};
use crate::models::{GeoidModel, Unit};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ellips2ortho")]
#[command(about = "Convert ellipsoidal heights in geotag CSV files to orthometric heights")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Geotag CSV files to convert
    #[arg(value_name = "FILES", required_unless_present = "list_geoids")]
    pub files: Vec<PathBuf>,

    /// Geoid model, e.g. GEOID18 (see --list-geoids)
    #[arg(short, long, value_name = "MODEL")]
    pub geoid: Option<GeoidModel>,

    /// Output units: meters or us-feet
    #[arg(short, long, value_name = "UNIT")]
    pub units: Option<Unit>,

    /// Path of the zip archive to write
    #[arg(short, long, default_value = ARCHIVE_FILE_NAME)]
    pub output: PathBuf,

    /// Geoid height service endpoint
    #[arg(long, default_value = DEFAULT_GEOID_ENDPOINT)]
    pub geoid_endpoint: String,

    /// Reverse geocoding service endpoint
    #[arg(long, default_value = DEFAULT_GEOCODING_ENDPOINT)]
    pub geocoding_endpoint: String,

    /// GeoNames account used for reverse geocoding
    #[arg(long, default_value = DEFAULT_GEONAMES_USERNAME)]
    pub geonames_username: String,

    /// Country all geotags must be located in
    #[arg(long, default_value = DEFAULT_TARGET_COUNTRY)]
    pub target_country: String,

    /// Geoid lookups allowed in flight per file (1 = one at a time)
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,

    /// List the supported geoid models and exit
    #[arg(long)]
    pub list_geoids: bool,

    /// Enable verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors, and hide progress bars
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Build the service configuration from the command line
    pub fn service_config(&self) -> ServiceConfig {
        let config = ServiceConfig::default()
            .with_geoid_endpoint(self.geoid_endpoint.clone())
            .with_geocoding_endpoint(self.geocoding_endpoint.clone())
            .with_geonames_username(self.geonames_username.clone())
            .with_target_country(self.target_country.clone())
            .with_lookup_concurrency(self.concurrency);

        if self.quiet {
            config.without_progress()
        } else {
            config
        }
    }

    /// Log level implied by the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}
