//! Error handling for height conversion batches.
//!
//! Provides error types with context for schema validation, geography
//! checks, geoid lookups and archive packaging. Every error is fatal to the
//! batch it occurs in.

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error in file {source_name}: {source}")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("{source_name} is not in the correct format, missing columns: {}", .missing_columns.join(", "))]
    Schema {
        source_name: String,
        missing_columns: Vec<String>,
    },

    #[error(
        "Locations in {source_name} are outside the supported country (resolved to {resolved_country})"
    )]
    Geography {
        source_name: String,
        resolved_country: String,
    },

    #[error("Lookup failed for {source_name} at row {row}: {source}")]
    Lookup {
        source_name: String,
        row: usize,
        #[source]
        source: LookupError,
    },

    #[error("Invalid value in {source_name} at row {row}, column '{column}': '{value}'")]
    InvalidValue {
        source_name: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("{source_name} contains no records")]
    EmptyRecordSet { source_name: String },

    #[error("No {selection} selected")]
    MissingSelection { selection: String },

    #[error("Archive entry {entry} would be written by both {first} and {second}")]
    DuplicateArchiveEntry {
        entry: String,
        first: String,
        second: String,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl ConvertError {
    /// Create a CSV error for a named source file
    pub fn csv(source_name: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            source_name: source_name.into(),
            source,
        }
    }

    /// Create a lookup error for a row of a named source file
    pub fn lookup(source_name: impl Into<String>, row: usize, source: LookupError) -> Self {
        Self::Lookup {
            source_name: source_name.into(),
            row,
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a missing selection error
    pub fn missing_selection(selection: impl Into<String>) -> Self {
        Self::MissingSelection {
            selection: selection.into(),
        }
    }

    /// The uploaded file this error refers to, if any
    pub fn source_name(&self) -> Option<&str> {
        match self {
            Self::Csv { source_name, .. }
            | Self::Schema { source_name, .. }
            | Self::Geography { source_name, .. }
            | Self::Lookup { source_name, .. }
            | Self::InvalidValue { source_name, .. }
            | Self::EmptyRecordSet { source_name } => Some(source_name),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Classification of a failed request to an external lookup service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupErrorKind {
    ConnectionFailure,
    Timeout,
    HttpStatusFailure,
    OtherRequestFailure,
}

impl fmt::Display for LookupErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LookupErrorKind::ConnectionFailure => "connection failure",
            LookupErrorKind::Timeout => "timeout",
            LookupErrorKind::HttpStatusFailure => "HTTP status failure",
            LookupErrorKind::OtherRequestFailure => "request failure",
        };
        f.write_str(label)
    }
}

/// A failed request to the geoid or geocoding service
#[derive(Error, Debug)]
#[error("{service} {kind}: {source}")]
pub struct LookupError {
    pub service: &'static str,
    pub kind: LookupErrorKind,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl LookupError {
    pub fn new(
        service: &'static str,
        kind: LookupErrorKind,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            service,
            kind,
            source: source.into(),
        }
    }

    /// Classify a transport error by what went wrong
    pub fn from_transport(service: &'static str, error: reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            LookupErrorKind::Timeout
        } else if error.is_connect() {
            LookupErrorKind::ConnectionFailure
        } else if error.is_status() {
            LookupErrorKind::HttpStatusFailure
        } else {
            LookupErrorKind::OtherRequestFailure
        };
        Self::new(service, kind, error)
    }

    /// A response arrived but did not carry the expected payload
    pub fn malformed(service: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            service,
            LookupErrorKind::OtherRequestFailure,
            format!("malformed response: {}", message.into()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_every_missing_column() {
        let error = ConvertError::Schema {
            source_name: "flight.csv".to_string(),
            missing_columns: vec!["phi [degrees]".to_string(), "kappa [degrees]".to_string()],
        };
        let message = error.to_string();
        assert!(message.contains("flight.csv"));
        assert!(message.contains("phi [degrees], kappa [degrees]"));
    }

    #[test]
    fn test_lookup_error_message_carries_kind() {
        let lookup = LookupError::new("geoid height", LookupErrorKind::Timeout, "deadline elapsed");
        let error = ConvertError::lookup("site.csv", 5, lookup);
        let message = error.to_string();
        assert!(message.contains("site.csv"));
        assert!(message.contains("row 5"));
        assert!(message.contains("timeout"));
        assert_eq!(error.source_name(), Some("site.csv"));
    }

    #[test]
    fn test_malformed_response_is_other_failure() {
        let error = LookupError::malformed("geoid height", "missing geoidHeight");
        assert_eq!(error.kind, LookupErrorKind::OtherRequestFailure);
        assert!(error.to_string().contains("malformed response"));
    }
}
