//! Packaging of converted record sets into the downloadable zip archive.

use crate::constants::{ARCHIVE_FILE_NAME, ARCHIVE_MIME_TYPE};
use crate::error::Result;
use crate::models::{ArchiveEntry, OutputBundle, ProcessingStats, RecordSet};
use std::io::{Cursor, Write};
use tracing::debug;
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

/// Render every record set as CSV and zip them, one entry per record set
pub fn package(record_sets: &[RecordSet], stats: ProcessingStats) -> Result<OutputBundle> {
    let entries = record_sets
        .iter()
        .map(|record_set| {
            Ok(ArchiveEntry {
                name: record_set.archive_entry_name(),
                contents: record_set.to_csv()?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let data = write_zip(&entries)?;
    debug!(
        "Packaged {} entries into {} ({} bytes)",
        entries.len(),
        ARCHIVE_FILE_NAME,
        data.len()
    );

    Ok(OutputBundle {
        file_name: ARCHIVE_FILE_NAME.to_string(),
        mime_type: ARCHIVE_MIME_TYPE.to_string(),
        entries,
        data,
        stats,
    })
}

/// Write entries into an in-memory zip archive
pub fn write_zip(entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        writer.start_file(entry.name.as_str(), options)?;
        writer.write_all(&entry.contents)?;
    }

    Ok(writer.finish()?.into_inner())
}
