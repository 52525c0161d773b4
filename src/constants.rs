//! Application constants for ellips2ortho
//!
//! This module contains the required geotag column names, unit factors,
//! service endpoints, and output naming used throughout the converter.

// =============================================================================
// Geotag CSV Columns
// =============================================================================

/// Required geotag columns, in the order they are conventionally exported
pub mod columns {
    pub const IMAGE_NAME: &str = "# image name";
    pub const LATITUDE: &str = "latitude [decimal degrees]";
    pub const LONGITUDE: &str = "longitude [decimal degrees]";
    pub const ALTITUDE: &str = "altitude [meter]";
    pub const OMEGA: &str = "omega [degrees]";
    pub const PHI: &str = "phi [degrees]";
    pub const KAPPA: &str = "kappa [degrees]";
    pub const ACCURACY_HORIZONTAL: &str = "accuracy horizontal [meter]";
    pub const ACCURACY_VERTICAL: &str = "accuracy vertical [meter]";

    /// Renamed altitude column after conversion
    pub const ORTHOMETRIC_HEIGHT_METERS: &str = "orthometric height [meter]";
    pub const ORTHOMETRIC_HEIGHT_FEET: &str = "orthometric height [feet]";

    /// Renamed accuracy columns when output is in US survey feet
    pub const ACCURACY_HORIZONTAL_FEET: &str = "accuracy horizontal [feet]";
    pub const ACCURACY_VERTICAL_FEET: &str = "accuracy vertical [feet]";

    /// All columns a geotag file must expose
    pub const REQUIRED: &[&str] = &[
        IMAGE_NAME,
        LATITUDE,
        LONGITUDE,
        ALTITUDE,
        OMEGA,
        PHI,
        KAPPA,
        ACCURACY_HORIZONTAL,
        ACCURACY_VERTICAL,
    ];
}

// =============================================================================
// Units
// =============================================================================

/// US survey feet per meter
pub const FEET_PER_METER: f64 = 3.2808399;

// =============================================================================
// External Services
// =============================================================================

/// NGS geoid height endpoint (`lat`, `lon`, `model` query parameters)
pub const DEFAULT_GEOID_ENDPOINT: &str = "https://geodesy.noaa.gov/api/geoid/ght";

/// GeoNames reverse geocoding endpoint (`lat`, `lng` query parameters)
pub const DEFAULT_GEOCODING_ENDPOINT: &str = "http://api.geonames.org/countryCode";

/// GeoNames account used when none is supplied
pub const DEFAULT_GEONAMES_USERNAME: &str = "irwinamago";

/// The geoid service only covers this country
pub const DEFAULT_TARGET_COUNTRY: &str = "United States";

/// JSON field carrying the geoid height in the geoid service response
pub const GEOID_HEIGHT_FIELD: &str = "geoidHeight";

/// JSON field carrying the country name in the geocoding response
pub const COUNTRY_NAME_FIELD: &str = "countryName";

// =============================================================================
// Output
// =============================================================================

/// Name of the downloadable archive
pub const ARCHIVE_FILE_NAME: &str = "Converted_CSV.zip";

/// MIME type the archive is served with
pub const ARCHIVE_MIME_TYPE: &str = "application/zip";

/// Suffix appended to each input file stem inside the archive
pub const ORTHOMETRIC_SUFFIX: &str = "_orthometric.csv";

/// Generate the archive entry name for an uploaded file
///
/// Only the final extension is stripped, so `siteA.backup.csv` becomes
/// `siteA.backup_orthometric.csv`.
pub fn archive_entry_name(source_name: &str) -> String {
    let file_name = source_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source_name);
    let stem = match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(idx) => &file_name[..idx],
    };
    format!("{}{}", stem, ORTHOMETRIC_SUFFIX)
}
