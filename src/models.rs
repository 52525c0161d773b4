//! Core data structures and types for height conversion.
//!
//! Defines geoid model and unit selections, geotag records and record sets,
//! the immutable batch request, and the output bundle produced by a run.

use crate::constants::{self, FEET_PER_METER, columns};
use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Geoid models supported by the NGS geoid height service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeoidModel {
    Geoid99,
    G99sss,
    Geoid03,
    Usgg2003,
    Geoid06,
    Usgg2009,
    Geoid09,
    Xushg,
    Usgg2012,
    Geoid12a,
    Geoid12b,
    Geoid18,
}

impl GeoidModel {
    /// Every model, in the order the service documents them
    pub const ALL: [GeoidModel; 12] = [
        GeoidModel::Geoid99,
        GeoidModel::G99sss,
        GeoidModel::Geoid03,
        GeoidModel::Usgg2003,
        GeoidModel::Geoid06,
        GeoidModel::Usgg2009,
        GeoidModel::Geoid09,
        GeoidModel::Xushg,
        GeoidModel::Usgg2012,
        GeoidModel::Geoid12a,
        GeoidModel::Geoid12b,
        GeoidModel::Geoid18,
    ];

    /// Integer code understood by the geoid service's `model` parameter
    pub fn code(&self) -> u8 {
        match self {
            GeoidModel::Geoid99 => 1,
            GeoidModel::G99sss => 2,
            GeoidModel::Geoid03 => 3,
            GeoidModel::Usgg2003 => 4,
            GeoidModel::Geoid06 => 5,
            GeoidModel::Usgg2009 => 6,
            GeoidModel::Geoid09 => 7,
            GeoidModel::Xushg => 9,
            GeoidModel::Usgg2012 => 11,
            GeoidModel::Geoid12a => 12,
            GeoidModel::Geoid12b => 13,
            GeoidModel::Geoid18 => 14,
        }
    }

    /// Published model name
    pub fn name(&self) -> &'static str {
        match self {
            GeoidModel::Geoid99 => "GEOID99",
            GeoidModel::G99sss => "G99SSS",
            GeoidModel::Geoid03 => "GEOID03",
            GeoidModel::Usgg2003 => "USGG2003",
            GeoidModel::Geoid06 => "GEOID06",
            GeoidModel::Usgg2009 => "USGG2009",
            GeoidModel::Geoid09 => "GEOID09",
            GeoidModel::Xushg => "XUSHG",
            GeoidModel::Usgg2012 => "USGG2012",
            GeoidModel::Geoid12a => "GEOID12A",
            GeoidModel::Geoid12b => "GEOID12B",
            GeoidModel::Geoid18 => "GEOID18",
        }
    }

    /// Human readable description for listings
    pub fn description(&self) -> &'static str {
        match self {
            GeoidModel::Xushg => "The latest experimental Geoid (XUSHG)",
            other => other.name(),
        }
    }
}

impl fmt::Display for GeoidModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GeoidModel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        GeoidModel::ALL
            .iter()
            .copied()
            .find(|model| model.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let names: Vec<&str> = GeoidModel::ALL.iter().map(|m| m.name()).collect();
                format!(
                    "unknown geoid model '{}', expected one of: {}",
                    wanted,
                    names.join(", ")
                )
            })
    }
}

/// Output unit for orthometric heights and accuracies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    Meters,
    UsFeet,
}

impl Unit {
    /// Convert a length in meters into this unit
    pub fn convert_meters(&self, meters: f64) -> f64 {
        match self {
            Unit::Meters => meters,
            Unit::UsFeet => meters * FEET_PER_METER,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Meters => f.write_str("Meters"),
            Unit::UsFeet => f.write_str("US Feet"),
        }
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "meters" | "meter" | "m" => Ok(Unit::Meters),
            "us-feet" | "us feet" | "us_feet" | "feet" | "ft" => Ok(Unit::UsFeet),
            other => Err(format!(
                "unknown unit '{}', expected 'meters' or 'us-feet'",
                other
            )),
        }
    }
}

/// Vertical reference of the altitude column in a record set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightDatum {
    /// Ellipsoidal heights in meters, as uploaded
    Ellipsoidal,
    /// Orthometric heights expressed in the given unit
    Orthometric(Unit),
}

/// The nine required geotag fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ImageName,
    Latitude,
    Longitude,
    Altitude,
    Omega,
    Phi,
    Kappa,
    AccuracyHorizontal,
    AccuracyVertical,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::ImageName,
        Field::Latitude,
        Field::Longitude,
        Field::Altitude,
        Field::Omega,
        Field::Phi,
        Field::Kappa,
        Field::AccuracyHorizontal,
        Field::AccuracyVertical,
    ];

    /// Column name expected in uploaded files
    pub fn input_header(&self) -> &'static str {
        match self {
            Field::ImageName => columns::IMAGE_NAME,
            Field::Latitude => columns::LATITUDE,
            Field::Longitude => columns::LONGITUDE,
            Field::Altitude => columns::ALTITUDE,
            Field::Omega => columns::OMEGA,
            Field::Phi => columns::PHI,
            Field::Kappa => columns::KAPPA,
            Field::AccuracyHorizontal => columns::ACCURACY_HORIZONTAL,
            Field::AccuracyVertical => columns::ACCURACY_VERTICAL,
        }
    }

    /// Column name for a record set in the given datum
    pub fn header(&self, datum: HeightDatum) -> &'static str {
        match (self, datum) {
            (Field::Altitude, HeightDatum::Orthometric(Unit::Meters)) => {
                columns::ORTHOMETRIC_HEIGHT_METERS
            }
            (Field::Altitude, HeightDatum::Orthometric(Unit::UsFeet)) => {
                columns::ORTHOMETRIC_HEIGHT_FEET
            }
            (Field::AccuracyHorizontal, HeightDatum::Orthometric(Unit::UsFeet)) => {
                columns::ACCURACY_HORIZONTAL_FEET
            }
            (Field::AccuracyVertical, HeightDatum::Orthometric(Unit::UsFeet)) => {
                columns::ACCURACY_VERTICAL_FEET
            }
            (field, _) => field.input_header(),
        }
    }
}

/// A column of a record set, in upload order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Field(Field),
    /// Any additional column, carried through unchanged
    Extra(String),
}

/// One geotag row
///
/// Keeps the uploaded cell text for every column. Only latitude, longitude
/// and altitude must be numeric; accuracies that do not parse are `None` and
/// their text is written back untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub(crate) image_name: String,
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
    pub(crate) altitude: f64,
    pub(crate) accuracy_horizontal: Option<f64>,
    pub(crate) accuracy_vertical: Option<f64>,
    pub(crate) cells: Vec<String>,
}

impl Record {
    pub fn image_name(&self) -> &str {
        &self.image_name
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Ellipsoidal height before conversion, orthometric height after
    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    pub fn accuracy_horizontal(&self) -> Option<f64> {
        self.accuracy_horizontal
    }

    pub fn accuracy_vertical(&self) -> Option<f64> {
        self.accuracy_vertical
    }

    /// Cell text in column order
    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    fn set_cell(&mut self, position: Option<usize>, value: f64) {
        if let Some(cell) = position.and_then(|p| self.cells.get_mut(p)) {
            *cell = value.to_string();
        }
    }
}

/// Converted values for a single record, folded back into its record set
///
/// Accuracies are `Some` only when they were rescaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionResult {
    pub orthometric_height: f64,
    pub accuracy_horizontal: Option<f64>,
    pub accuracy_vertical: Option<f64>,
}

/// Validated records from one uploaded file
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    source_name: String,
    columns: Vec<Column>,
    records: Vec<Record>,
    datum: HeightDatum,
}

impl RecordSet {
    pub(crate) fn new(source_name: String, columns: Vec<Column>, records: Vec<Record>) -> Self {
        Self {
            source_name,
            columns,
            records,
            datum: HeightDatum::Ellipsoidal,
        }
    }

    /// Name of the uploaded file
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn datum(&self) -> HeightDatum {
        self.datum
    }

    /// Output column names, in upload order
    pub fn headers(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| match column {
                Column::Field(field) => field.header(self.datum).to_string(),
                Column::Extra(name) => name.clone(),
            })
            .collect()
    }

    /// Archive entry this record set is written to
    pub fn archive_entry_name(&self) -> String {
        constants::archive_entry_name(&self.source_name)
    }

    /// Position of a required field among the columns
    pub fn column_position(&self, field: Field) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| *column == Column::Field(field))
    }

    /// Cell text of `field` in `record`
    pub fn field_text<'a>(&self, record: &'a Record, field: Field) -> Option<&'a str> {
        let position = self.column_position(field)?;
        record.cells.get(position).map(String::as_str)
    }

    /// Replace altitude and accuracies with converted values, row by row
    pub(crate) fn apply_conversion(&mut self, results: Vec<ConversionResult>, unit: Unit) {
        debug_assert_eq!(results.len(), self.records.len());
        let altitude = self.column_position(Field::Altitude);
        let horizontal = self.column_position(Field::AccuracyHorizontal);
        let vertical = self.column_position(Field::AccuracyVertical);

        for (record, result) in self.records.iter_mut().zip(results) {
            record.altitude = result.orthometric_height;
            record.set_cell(altitude, result.orthometric_height);
            if let Some(value) = result.accuracy_horizontal {
                record.accuracy_horizontal = Some(value);
                record.set_cell(horizontal, value);
            }
            if let Some(value) = result.accuracy_vertical {
                record.accuracy_vertical = Some(value);
                record.set_cell(vertical, value);
            }
        }
        self.datum = HeightDatum::Orthometric(unit);
    }

    /// Serialize headers and records as CSV
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(self.headers())
            .map_err(|e| ConvertError::csv(&self.source_name, e))?;
        for record in &self.records {
            writer
                .write_record(&record.cells)
                .map_err(|e| ConvertError::csv(&self.source_name, e))?;
        }
        writer
            .into_inner()
            .map_err(|e| ConvertError::Io(e.into_error()))
    }
}

/// Everything needed to run one conversion batch
///
/// Built once both selections are known; the archive entry names of all
/// record sets are checked for collisions here, before any lookup is issued.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    record_sets: Vec<RecordSet>,
    geoid_model: GeoidModel,
    unit: Unit,
}

impl BatchRequest {
    pub fn new(
        record_sets: Vec<RecordSet>,
        geoid_model: Option<GeoidModel>,
        unit: Option<Unit>,
    ) -> Result<Self> {
        let geoid_model = geoid_model.ok_or_else(|| ConvertError::missing_selection("geoid model"))?;
        let unit = unit.ok_or_else(|| ConvertError::missing_selection("unit"))?;

        let mut entries: HashMap<String, &str> = HashMap::new();
        for record_set in &record_sets {
            let entry = record_set.archive_entry_name();
            if let Some(first) = entries.insert(entry.clone(), record_set.source_name()) {
                return Err(ConvertError::DuplicateArchiveEntry {
                    entry,
                    first: first.to_string(),
                    second: record_set.source_name().to_string(),
                });
            }
        }

        Ok(Self {
            record_sets,
            geoid_model,
            unit,
        })
    }

    pub fn record_sets(&self) -> &[RecordSet] {
        &self.record_sets
    }

    pub fn geoid_model(&self) -> GeoidModel {
        self.geoid_model
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn total_rows(&self) -> usize {
        self.record_sets.iter().map(RecordSet::len).sum()
    }

    pub(crate) fn into_parts(self) -> (Vec<RecordSet>, GeoidModel, Unit) {
        (self.record_sets, self.geoid_model, self.unit)
    }
}

/// Batch statistics reported with the bundle
#[derive(Debug, Clone, Default)]
pub struct ProcessingStats {
    pub files_processed: usize,
    pub total_rows: usize,
    pub lookups_issued: usize,
    pub processing_time: Duration,
}

/// One CSV file inside the output archive
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub contents: Vec<u8>,
}

/// The downloadable result of a successful batch
#[derive(Debug, Clone)]
pub struct OutputBundle {
    pub file_name: String,
    pub mime_type: String,
    pub entries: Vec<ArchiveEntry>,
    pub data: Vec<u8>,
    pub stats: ProcessingStats,
}

/// Lifecycle of a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Validating,
    AwaitingSelections,
    Converting,
    Packaged,
    Failed,
}

impl BatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchState::Packaged | BatchState::Failed)
    }
}
