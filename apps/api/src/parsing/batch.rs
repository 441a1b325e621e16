//! Batch coordinator: sequential multi-file upload/parse orchestration.
//!
//! Files are processed strictly one at a time, in input order. Each file is
//! staged, sent to the remote parser, and persisted as exactly one result
//! record before the next file starts. A file's failure is recorded and never
//! affects any other file in the batch.

use std::time::Instant;

use tracing::{error, info};

use crate::parser_client::ResumeParser;
use crate::parsing::staging::FileStore;
use crate::parsing::store::ResultStore;
use crate::parsing::{
    BatchProgress, BatchSummary, FailedFile, FileStatus, ParseResult, ParsingMethod, UploadedFile,
};

struct FileFailure {
    /// Staging URL obtained before the failure point, if any.
    file_url: Option<String>,
    message: String,
}

/// Processes every file in order and produces one persisted record per file,
/// success or failure. The next file is not started until the previous file's
/// record has been persisted (or its persistence attempt has failed and been
/// logged). There is no mid-batch abort path and no automatic retry.
pub async fn process_batch(
    parser: &dyn ResumeParser,
    files: &dyn FileStore,
    results: &dyn ResultStore,
    batch: &[UploadedFile],
    method: ParsingMethod,
) -> BatchSummary {
    let mut progress = BatchProgress::new(batch.len());
    let mut successful = Vec::new();
    let mut failed = Vec::new();

    for (i, file) in batch.iter().enumerate() {
        progress.set(i, FileStatus::Processing);
        info!(
            "Processing '{}' ({}/{}, method: {})",
            file.filename,
            i + 1,
            batch.len(),
            method.as_str()
        );

        match process_file(parser, files, results, file, method).await {
            Ok(result) => {
                progress.set(i, FileStatus::Completed);
                successful.push(result);
            }
            Err(failure) => {
                error!("Failed to process '{}': {}", file.filename, failure.message);

                let record = ParseResult::failed(
                    file.filename.clone(),
                    failure.file_url,
                    method,
                    failure.message.clone(),
                );
                // Failure records are best-effort: a store error here must
                // not take the rest of the batch down with it.
                if let Err(e) = results.create(&record).await {
                    error!("Failed to save error record for '{}': {e}", file.filename);
                }

                progress.set(i, FileStatus::Failed);
                failed.push(FailedFile {
                    filename: file.filename.clone(),
                    error: failure.message,
                });
            }
        }
    }

    let summary = BatchSummary {
        total_processed: batch.len(),
        success_count: successful.len(),
        failure_count: failed.len(),
        successful,
        failed,
    };

    info!(
        "Batch complete: {} succeeded, {} failed of {}",
        summary.success_count, summary.failure_count, summary.total_processed
    );

    summary
}

/// Stages, parses, and persists one file. Any error at any step becomes a
/// `FileFailure` carrying whatever staging URL was obtained before the
/// failure point. Elapsed time is measured here, against our own clock, not
/// taken from the remote service's self-reported figure.
async fn process_file(
    parser: &dyn ResumeParser,
    files: &dyn FileStore,
    results: &dyn ResultStore,
    file: &UploadedFile,
    method: ParsingMethod,
) -> Result<ParseResult, FileFailure> {
    let start = Instant::now();

    let file_url = files.stage(file).await.map_err(|e| FileFailure {
        file_url: None,
        message: format!("Failed to stage '{}': {e}", file.filename),
    })?;

    let parsed_data = parser.parse(file, method).await.map_err(|e| FileFailure {
        file_url: Some(file_url.clone()),
        message: e.to_string(),
    })?;

    let processing_time = start.elapsed().as_secs_f64();
    let result = ParseResult::completed(
        file.filename.clone(),
        file_url,
        method,
        parsed_data,
        processing_time,
    );

    if let Err(e) = results.create(&result).await {
        return Err(FileFailure {
            file_url: result.file_url,
            message: format!("Failed to save result for '{}': {e}", file.filename),
        });
    }

    Ok(result)
}
