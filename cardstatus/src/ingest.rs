use std::io;
use std::path::Path;
use std::sync::Arc;

use cardstatus_telemetry::metrics::record_ingested_row;
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, error, info, warn};

use crate::error::{IngestionError, RowError};
use crate::mapping::ColumnMapping;
use crate::reconcile::{Reconciler, Reconciliation};
use crate::store::CardStatusStore;

/// Row counts for one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReport {
    pub file: String,
    pub inserted: u64,
    pub comment_updated: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl FileReport {
    fn new(file: &str) -> Self {
        Self {
            file: file.to_owned(),
            ..Default::default()
        }
    }

    fn record(&mut self, outcome: Reconciliation) {
        match outcome {
            Reconciliation::Inserted => self.inserted += 1,
            Reconciliation::CommentUpdated => self.comment_updated += 1,
            Reconciliation::Skipped => self.skipped += 1,
        }
    }

    /// Number of data rows read from the file.
    pub fn rows(&self) -> u64 {
        self.inserted + self.comment_updated + self.skipped + self.failed
    }
}

/// Outcome of a full ingestion run, one entry per file in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionReport {
    pub files: Vec<FileReport>,
}

impl IngestionReport {
    /// Sums the counts of every file.
    pub fn totals(&self) -> FileReport {
        self.files.iter().fold(FileReport::new("total"), |mut acc, file| {
            acc.inserted += file.inserted;
            acc.comment_updated += file.comment_updated;
            acc.skipped += file.skipped;
            acc.failed += file.failed;
            acc
        })
    }
}

/// Streams CSV files through the [`Reconciler`] one row at a time.
///
/// Files are processed strictly in the given order and each row's storage work finishes
/// before the next row is read. Row failures are logged and counted; file failures stop
/// the run.
#[derive(Clone)]
pub struct BatchIngestor {
    reconciler: Reconciler,
    mapping: ColumnMapping,
}

impl BatchIngestor {
    pub fn new(store: Arc<dyn CardStatusStore>, mapping: ColumnMapping) -> Self {
        Self {
            reconciler: Reconciler::new(store),
            mapping,
        }
    }

    /// Ingests every file in order, stopping at the first file-level failure.
    pub async fn ingest_files<P>(&self, files: &[P]) -> Result<IngestionReport, IngestionError>
    where
        P: AsRef<Path>,
    {
        let mut report = IngestionReport::default();

        for path in files {
            let file_report = self.ingest_file(path.as_ref()).await?;
            report.files.push(file_report);
        }

        let totals = report.totals();
        info!(
            files = report.files.len(),
            inserted = totals.inserted,
            comment_updated = totals.comment_updated,
            skipped = totals.skipped,
            failed = totals.failed,
            "ingestion completed"
        );

        Ok(report)
    }

    pub async fn ingest_file(&self, path: &Path) -> Result<FileReport, IngestionError> {
        let reader = csv_reader_builder().from_path(path).map_err(|source| {
            error!(file = %path.display(), error = %source, "failed to open source file");
            IngestionError::Open {
                path: path.to_path_buf(),
                source,
            }
        })?;

        self.ingest_csv(&path.display().to_string(), reader).await
    }

    /// Ingests CSV data from any reader. `file` is only used for logs and reports.
    pub async fn ingest_reader<R>(
        &self,
        file: &str,
        reader: R,
    ) -> Result<FileReport, IngestionError>
    where
        R: io::Read,
    {
        self.ingest_csv(file, csv_reader_builder().from_reader(reader)).await
    }

    async fn ingest_csv<R>(
        &self,
        file: &str,
        mut reader: csv::Reader<R>,
    ) -> Result<FileReport, IngestionError>
    where
        R: io::Read,
    {
        let headers = reader
            .headers()
            .map_err(|source| {
                error!(file, error = %source, "failed to read the header of the source file");
                IngestionError::Header {
                    file: file.to_owned(),
                    source,
                }
            })?
            .clone();

        // A zero-byte file has no header and no rows.
        if headers.is_empty() {
            warn!(file, "source file is empty, nothing to ingest");
            info!(file, "{file} processed");
            return Ok(FileReport::new(file));
        }

        let mapping = self.mapping.resolve(&headers).map_err(|source| {
            error!(file, error = %source, "source file header does not match the column mapping");
            IngestionError::Mapping {
                file: file.to_owned(),
                source,
            }
        })?;

        if !mapping.unmapped().is_empty() {
            warn!(file, ignored = ?mapping.unmapped(), "ignoring unmapped columns");
        }

        let mut report = FileReport::new(file);
        let mut row = StringRecord::new();

        loop {
            match reader.read_record(&mut row) {
                Ok(true) => {}
                Ok(false) => break,
                Err(source) => {
                    let line = source.position().map(|position| position.line());
                    error!(file, line, error = %source, "failed to read source file");
                    return Err(IngestionError::Read {
                        file: file.to_owned(),
                        line,
                        source,
                    });
                }
            }

            let line = row.position().map(|position| position.line());
            let record = mapping.project(&row);

            match self.reconciler.reconcile(&record).await {
                Ok(outcome) => {
                    match outcome {
                        Reconciliation::Inserted => {
                            debug!(file, line, card_id = %record.card_id, "card inserted");
                        }
                        Reconciliation::CommentUpdated => {
                            info!(file, line, card_id = %record.card_id, "comment added");
                        }
                        Reconciliation::Skipped => {
                            info!(
                                file,
                                line,
                                card_id = %record.card_id,
                                "card already exists, skipping"
                            );
                        }
                    }
                    record_ingested_row(outcome.as_str());
                    report.record(outcome);
                }
                Err(err) => {
                    log_row_error(file, line, &record.card_id, &err);
                    record_ingested_row("failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            file,
            inserted = report.inserted,
            comment_updated = report.comment_updated,
            skipped = report.skipped,
            failed = report.failed,
            "{file} processed"
        );

        Ok(report)
    }
}

fn csv_reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.has_headers(true).flexible(true);
    builder
}

fn log_row_error(file: &str, line: Option<u64>, card_id: &str, err: &RowError) {
    error!(file, line, card_id, error = %err, "failed to process row, skipping it");
}
