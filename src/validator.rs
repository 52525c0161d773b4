//! Geotag CSV parsing and validation.
//!
//! Reads an uploaded delimited file into a [`RawTable`], checks that every
//! required column is present, parses the coordinates and altitude, and confirms that
//! the file's first location falls inside the country the geoid service
//! covers. Only the first row is geocoded; a file mixing locations inside and
//! outside that country passes.

use crate::error::{ConvertError, Result};
use crate::lookup::CountryResolver;
use crate::models::{Column, Field, Record, RecordSet};
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, warn};

/// An uploaded file before validation
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub contents: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// Column names and string cells of a delimited file
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Parse comma separated text whose first line holds the column names
    pub fn from_reader<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| ConvertError::csv(source_name, e))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record.map_err(|e| ConvertError::csv(source_name, e))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cells of a named column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.headers.iter().position(|h| h == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    /// Required columns absent from this table
    pub fn missing_columns(&self) -> Vec<String> {
        Field::ALL
            .iter()
            .map(Field::input_header)
            .filter(|required| !self.headers.iter().any(|h| h == required))
            .map(str::to_string)
            .collect()
    }
}

/// Checks uploaded tables and turns them into record sets
#[derive(Debug, Clone)]
pub struct RecordSetValidator<R> {
    resolver: R,
    target_country: String,
}

impl<R: CountryResolver> RecordSetValidator<R> {
    pub fn new(resolver: R, target_country: impl Into<String>) -> Self {
        Self {
            resolver,
            target_country: target_country.into(),
        }
    }

    pub fn target_country(&self) -> &str {
        &self.target_country
    }

    /// Parse and validate an upload
    pub async fn validate_upload(&self, upload: &Upload) -> Result<RecordSet> {
        let table = RawTable::from_reader(upload.contents.as_slice(), &upload.name)?;
        self.validate(&table, &upload.name).await
    }

    /// Validate a parsed table
    pub async fn validate(&self, table: &RawTable, source_name: &str) -> Result<RecordSet> {
        let record_set = build_record_set(table, source_name)?;

        let first = &record_set.records()[0];
        let country = self
            .resolver
            .resolve_country(first.latitude(), first.longitude())
            .await
            .map_err(|e| ConvertError::lookup(source_name, 1, e))?;

        if country != self.target_country {
            warn!(
                "{} resolves to {} rather than {}",
                source_name, country, self.target_country
            );
            return Err(ConvertError::Geography {
                source_name: source_name.to_string(),
                resolved_country: country,
            });
        }

        debug!(
            "Validated {}: {} records in {}",
            source_name,
            record_set.len(),
            country
        );
        Ok(record_set)
    }
}

/// Schema and value checks that need no network access
pub fn build_record_set(table: &RawTable, source_name: &str) -> Result<RecordSet> {
    let missing_columns = table.missing_columns();
    if !missing_columns.is_empty() {
        for column in &missing_columns {
            debug!("{} is not in {}", column, source_name);
        }
        return Err(ConvertError::Schema {
            source_name: source_name.to_string(),
            missing_columns,
        });
    }

    if table.row_count() == 0 {
        return Err(ConvertError::EmptyRecordSet {
            source_name: source_name.to_string(),
        });
    }

    let mut field_index: HashMap<Field, usize> = HashMap::new();
    let mut columns = Vec::with_capacity(table.headers().len());
    for (position, header) in table.headers().iter().enumerate() {
        let field = Field::ALL
            .iter()
            .copied()
            .find(|f| f.input_header() == header && !field_index.contains_key(f));
        match field {
            Some(field) => {
                field_index.insert(field, position);
                columns.push(Column::Field(field));
            }
            None => columns.push(Column::Extra(header.clone())),
        }
    }

    let records = table
        .rows()
        .iter()
        .enumerate()
        .map(|(row_index, row)| {
            let mut cells = row.clone();
            cells.resize(columns.len(), String::new());

            let cell = |field: Field| cells[field_index[&field]].as_str();
            // Coordinates feed the lookups and altitude the subtraction
            let number = |field: Field| -> Result<f64> {
                let value = cell(field).trim();
                value.parse::<f64>().map_err(|_| ConvertError::InvalidValue {
                    source_name: source_name.to_string(),
                    row: row_index + 1,
                    column: field.input_header().to_string(),
                    value: value.to_string(),
                })
            };
            let accuracy = |field: Field| cell(field).trim().parse::<f64>().ok();

            Ok(Record {
                image_name: cell(Field::ImageName).to_string(),
                latitude: number(Field::Latitude)?,
                longitude: number(Field::Longitude)?,
                altitude: number(Field::Altitude)?,
                accuracy_horizontal: accuracy(Field::AccuracyHorizontal),
                accuracy_vertical: accuracy(Field::AccuracyVertical),
                cells,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RecordSet::new(source_name.to_string(), columns, records))
}
