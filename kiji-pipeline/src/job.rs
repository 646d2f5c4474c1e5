//! Job runner: one output target, one run state, many archive files.

use std::path::Path;

use anyhow::Context;
use kiji_archive::{discover_archives, ArchiveReader};
use kiji_common::RunState;
use kiji_config::JobSpec;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::pipeline::{Outcome, Pipeline};
use crate::sink::RecordWriter;

/// Counters for one job.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub files_processed: usize,
    pub files_failed: usize,
    /// WARC records of any type, including the ones that are not HTML responses.
    pub warc_records: u64,
    pub records_read: u64,
    pub empty_dropped: u64,
    pub exact_duplicates: u64,
    pub near_lines_collapsed: u64,
    pub retained: u64,
    /// Set when cancellation stopped the job before its last file.
    pub cancelled: bool,
}

/// Run one job to completion or cancellation.
///
/// Archives that cannot be opened, or whose record stream turns malformed,
/// are logged and skipped; records already retained from them stay written.
/// A sink failure ends the job with an error.
pub fn run_job(
    job: &JobSpec,
    pipeline: &Pipeline,
    cancel: &CancellationToken,
) -> anyhow::Result<JobReport> {
    let archives = discover_archives(&job.inputs);
    info!(job = %job.name, files = archives.len(), output = %job.output.display(), "pipeline.job.start");

    let mut writer = RecordWriter::open(job.format, &job.output)
        .with_context(|| format!("opening output {}", job.output.display()))?;
    let mut state = RunState::new();
    let mut report = JobReport::default();

    for path in &archives {
        if cancel.is_cancelled() {
            warn!(job = %job.name, "pipeline.job.cancelled");
            report.cancelled = true;
            break;
        }
        run_file(path, pipeline, &mut state, &mut writer, &mut report)
            .with_context(|| format!("job {}: writing records from {}", job.name, path.display()))?;
    }

    writer
        .finish()
        .with_context(|| format!("flushing output {}", job.output.display()))?;

    info!(
        job = %job.name,
        files_processed = report.files_processed,
        files_failed = report.files_failed,
        warc_records = report.warc_records,
        records_read = report.records_read,
        empty_dropped = report.empty_dropped,
        exact_duplicates = report.exact_duplicates,
        near_lines_collapsed = report.near_lines_collapsed,
        retained = report.retained,
        cancelled = report.cancelled,
        "pipeline.job.done"
    );
    Ok(report)
}

/// Process one archive. Only sink errors are returned.
fn run_file(
    path: &Path,
    pipeline: &Pipeline,
    state: &mut RunState,
    writer: &mut RecordWriter,
    report: &mut JobReport,
) -> kiji_common::Result<()> {
    let mut reader = match ArchiveReader::open(path) {
        Ok(reader) => reader,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "pipeline.file.open_failed");
            report.files_failed += 1;
            return Ok(());
        }
    };

    let mut retained = 0u64;
    while let Some(record) = reader.next() {
        let raw = match record {
            Ok(raw) => raw,
            Err(err) => {
                error!(path = %path.display(), error = %err, "pipeline.file.abandoned");
                report.warc_records += reader.records_seen();
                report.files_failed += 1;
                return Ok(());
            }
        };
        report.records_read += 1;

        match pipeline.process(raw, state) {
            Outcome::Empty => report.empty_dropped += 1,
            Outcome::Duplicate => report.exact_duplicates += 1,
            Outcome::Retained { doc, lines_dropped } => {
                report.near_lines_collapsed += lines_dropped as u64;
                writer.write(state, &doc)?;
                report.retained += 1;
                retained += 1;
            }
        }
    }

    report.warc_records += reader.records_seen();
    report.files_processed += 1;
    info!(
        path = %path.display(),
        records = reader.records_seen(),
        retained,
        written_total = writer.written(),
        "pipeline.file.done"
    );
    Ok(())
}
