//! Bounded worker pool for batch extraction.
//!
//! Each record runs on tokio's blocking pool; a `Semaphore` caps how many run
//! at once. The permit travels with the blocking work, so a record that hit
//! its timeout still holds its slot until the work actually finishes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinError;

use super::error::DiagnosisTimeError;
use super::runner::{log_summary, DiagnosisTimeRunner, RecordExtraction};
use super::types::{BatchOutput, RecordOutcome};
use crate::models::DiagnosisRecord;

/// Process `records` with at most `workers` in flight. Output position `i`
/// always corresponds to input record `i`.
pub async fn run_concurrent(
    runner: Arc<DiagnosisTimeRunner>,
    records: Vec<DiagnosisRecord>,
    workers: usize,
    record_timeout: Option<Duration>,
) -> BatchOutput {
    let start = Instant::now();
    let workers = workers.max(1);
    tracing::info!(
        records = records.len(),
        workers,
        timeout_secs = record_timeout.map(|t| t.as_secs()),
        method = runner.method().as_str(),
        "Starting concurrent diagnosis time extraction"
    );

    let semaphore = Arc::new(Semaphore::new(workers));
    let mut handles = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        let runner = runner.clone();
        let semaphore = semaphore.clone();
        handles.push(tokio::spawn(async move {
            let permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::warn!(record = index, error = %e, "Worker pool closed");
                    return RecordExtraction::empty(RecordOutcome::Skipped);
                }
            };

            let work = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                runner.extract_record(index, &record)
            });

            match record_timeout {
                Some(limit) => match tokio::time::timeout(limit, work).await {
                    Ok(joined) => joined_extraction(index, joined),
                    Err(_) => {
                        let error = DiagnosisTimeError::Timeout(limit.as_secs());
                        tracing::warn!(record = index, error = %error, "Skipping record");
                        RecordExtraction::empty(RecordOutcome::Skipped)
                    }
                },
                None => joined_extraction(index, work.await),
            }
        }));
    }

    let mut output = BatchOutput::default();
    for (index, handle) in handles.into_iter().enumerate() {
        let extraction = match handle.await {
            Ok(extraction) => extraction,
            Err(e) => joined_extraction(index, Err(e)),
        };
        output.push(extraction);
    }
    output.summary.duration_ms = start.elapsed().as_millis() as u64;

    log_summary(&output.summary);
    output
}

fn joined_extraction(index: usize, joined: Result<RecordExtraction, JoinError>) -> RecordExtraction {
    joined.unwrap_or_else(|e| {
        tracing::warn!(record = index, error = %e, "Record task failed");
        RecordExtraction::empty(RecordOutcome::Skipped)
    })
}
