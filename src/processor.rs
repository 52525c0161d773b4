//! Batch orchestration for height conversion.
//!
//! Drives a batch through its lifecycle: uploads are validated into record
//! sets, the geoid model and unit are fixed in a [`BatchRequest`], every row of
//! every record set is converted, and the results are packaged into one
//! archive. A batch is all-or-nothing: the first failure, in file-then-row
//! order, aborts the run and nothing is packaged.

use crate::archive;
use crate::config::ServiceConfig;
use crate::converter::convert_record;
use crate::error::{ConvertError, Result};
use crate::lookup::{CountryResolver, GeoidHeightService};
use crate::models::{
    BatchRequest, BatchState, ConversionResult, GeoidModel, OutputBundle, ProcessingStats,
    RecordSet, Unit,
};
use crate::progress::ProgressReporter;
use crate::validator::{RecordSetValidator, Upload};

use futures::stream::{self, StreamExt, TryStreamExt};
use std::time::Instant;
use tracing::{debug, error, info};

#[cfg(test)]
mod tests;

/// Runs conversion batches against a geoid service and a country resolver
pub struct BatchOrchestrator<G, R> {
    geoid_service: G,
    validator: RecordSetValidator<R>,
    lookup_concurrency: usize,
    progress: ProgressReporter,
    state: BatchState,
}

impl<G, R> BatchOrchestrator<G, R>
where
    G: GeoidHeightService,
    R: CountryResolver,
{
    /// Create an orchestrator using the given services
    pub fn new(geoid_service: G, resolver: R, config: &ServiceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            geoid_service,
            validator: RecordSetValidator::new(resolver, config.target_country.clone()),
            lookup_concurrency: config.lookup_concurrency,
            progress: ProgressReporter::new(config.show_progress),
            state: BatchState::Idle,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Fraction of rows completed in the record set being converted
    pub fn progress_fraction(&self) -> f64 {
        self.progress.fraction()
    }

    /// Validate every upload, stopping at the first invalid file
    pub async fn validate_uploads(&mut self, uploads: &[Upload]) -> Result<Vec<RecordSet>> {
        self.state = BatchState::Validating;
        info!("Validating {} uploaded files", uploads.len());

        let mut record_sets = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match self.validator.validate_upload(upload).await {
                Ok(record_set) => record_sets.push(record_set),
                Err(e) => {
                    error!("Validation failed for {}: {}", upload.name, e);
                    self.state = BatchState::Failed;
                    return Err(e);
                }
            }
        }

        info!("All {} files checked and uploaded successfully", record_sets.len());
        self.state = BatchState::AwaitingSelections;
        Ok(record_sets)
    }

    /// Validate uploads, then convert and package them with the given selections
    pub async fn process(
        &mut self,
        uploads: &[Upload],
        geoid_model: Option<GeoidModel>,
        unit: Option<Unit>,
    ) -> Result<OutputBundle> {
        let record_sets = self.validate_uploads(uploads).await?;
        let request = match BatchRequest::new(record_sets, geoid_model, unit) {
            Ok(request) => request,
            Err(e) => {
                // Missing selections leave the uploads waiting for input
                if !matches!(e, ConvertError::MissingSelection { .. }) {
                    self.state = BatchState::Failed;
                }
                debug!("Batch request rejected: {}", e);
                return Err(e);
            }
        };
        self.run_batch(request).await
    }

    /// Convert every record set in the request and package the results
    pub async fn run_batch(&mut self, request: BatchRequest) -> Result<OutputBundle> {
        let start_time = Instant::now();
        self.state = BatchState::Converting;

        let total_rows = request.total_rows();
        let (mut record_sets, geoid_model, unit) = request.into_parts();
        info!(
            "Converting {} files ({} rows) with {} to {}",
            record_sets.len(),
            total_rows,
            geoid_model,
            unit
        );

        let mut lookups_issued = 0;
        for record_set in record_sets.iter_mut() {
            match self.convert_record_set(record_set, geoid_model, unit).await {
                Ok(()) => lookups_issued += record_set.len(),
                Err(e) => {
                    error!("Batch aborted: {}", e);
                    self.state = BatchState::Failed;
                    return Err(e);
                }
            }
        }

        let stats = ProcessingStats {
            files_processed: record_sets.len(),
            total_rows,
            lookups_issued,
            processing_time: start_time.elapsed(),
        };

        match archive::package(&record_sets, stats) {
            Ok(bundle) => {
                self.state = BatchState::Packaged;
                info!(
                    "Height conversion finished: {} entries in {}",
                    bundle.entries.len(),
                    bundle.file_name
                );
                Ok(bundle)
            }
            Err(e) => {
                self.state = BatchState::Failed;
                Err(e)
            }
        }
    }

    /// Convert one record set, rewriting it only once every row succeeded
    async fn convert_record_set(
        &mut self,
        record_set: &mut RecordSet,
        geoid_model: GeoidModel,
        unit: Unit,
    ) -> Result<()> {
        info!("Processing {}", record_set.source_name());
        self.progress.start(record_set.source_name(), record_set.len());

        let source_name = record_set.source_name().to_string();
        let geoid_service = &self.geoid_service;
        let progress = &self.progress;

        let results: Result<Vec<ConversionResult>> = stream::iter(
            record_set.records().iter().enumerate(),
        )
        .map(|(index, record)| {
            let source_name = source_name.as_str();
            async move {
                let geoid_height = geoid_service
                    .geoid_height(record.latitude(), record.longitude(), geoid_model)
                    .await
                    .map_err(|e| ConvertError::lookup(source_name, index + 1, e))?;
                progress.increment();
                Ok::<_, ConvertError>(convert_record(record, geoid_height, unit))
            }
        })
        .buffered(self.lookup_concurrency)
        .try_collect()
        .await;

        match results {
            Ok(results) => {
                self.progress.finish();
                record_set.apply_conversion(results, unit);
                debug!(
                    "Converted {} rows of {}",
                    record_set.len(),
                    record_set.source_name()
                );
                Ok(())
            }
            Err(e) => {
                self.progress.finish_with_error(&e.to_string());
                Err(e)
            }
        }
    }
}
