//! Batch analysis host.
//!
//! Every file is checked (extension, size) up front, then decoded and
//! analysed on the blocking pool under a per-file timeout. Files run
//! concurrently; results come back in input order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};
use voicing_core::{
    audio::{self, resample::resample, SUPPORTED_EXTENSIONS},
    report::display_name,
    AnalysisReport, Analyzer, VoicingError,
};

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub timeout: Duration,
    pub max_file_bytes: u64,
    pub analysis_sample_rate: Option<u32>,
}

/// Error body for a file that could not be analysed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureBody {
    pub filename: String,
    pub error: String,
    pub message: String,
}

/// Result of one input file, serialised as either a report or a failure body.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FileOutcome {
    Report(AnalysisReport),
    Failed(FailureBody),
}

impl FileOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, FileOutcome::Failed(_))
    }
}

fn failure(path: &Path, error: &str, message: impl Into<String>) -> FileOutcome {
    FileOutcome::Failed(FailureBody {
        filename: display_name(&path.to_string_lossy()).to_string(),
        error: error.into(),
        message: message.into(),
    })
}

/// Map a core error to the `error` / `message` pair of a failure body.
fn describe(path: &Path, err: &VoicingError) -> FileOutcome {
    match err {
        VoicingError::UnsupportedFormat { extension } => failure(
            path,
            "Unsupported file format",
            format!(
                "File format .{extension} is not supported. Supported formats: {}",
                SUPPORTED_EXTENSIONS
                    .iter()
                    .map(|e| format!(".{e}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ),
        VoicingError::FileNotFound { .. } => failure(path, "File not found", err.to_string()),
        VoicingError::InvalidConfiguration(_) => {
            failure(path, "Invalid configuration", err.to_string())
        }
        _ => failure(
            path,
            "Analysis failed",
            format!("Failed to process audio file: {err}"),
        ),
    }
}

/// Pre-decode checks: supported extension and size limit.
pub fn check_upload(path: &Path, max_file_bytes: u64) -> Result<(), FileOutcome> {
    audio::check_supported(path).map_err(|e| describe(path, &e))?;
    let size = std::fs::metadata(path)
        .map_err(|_| {
            describe(
                path,
                &VoicingError::FileNotFound {
                    path: path.to_path_buf(),
                },
            )
        })?
        .len();
    if size > max_file_bytes {
        return Err(failure(
            path,
            "File too large",
            format!("File is {size} bytes; the limit is {max_file_bytes} bytes"),
        ));
    }
    Ok(())
}

/// Decode, optionally resample, and analyse one file. Blocking.
pub fn analyze_path(
    analyzer: &Analyzer,
    path: &Path,
    analysis_sample_rate: Option<u32>,
) -> voicing_core::error::Result<AnalysisReport> {
    let mut signal = audio::decode_file(path)?;
    if let Some(rate) = analysis_sample_rate {
        if rate != signal.sample_rate {
            signal = resample(&signal, rate)?;
        }
    }
    analyzer.analyze(&signal, &path.to_string_lossy())
}

async fn run_one(analyzer: Arc<Analyzer>, path: PathBuf, opts: BatchOptions) -> FileOutcome {
    if let Err(rejected) = check_upload(&path, opts.max_file_bytes) {
        warn!(path = %path.display(), "rejected before analysis");
        return rejected;
    }

    let worker_path = path.clone();
    let task = tokio::task::spawn_blocking(move || {
        analyze_path(&analyzer, &worker_path, opts.analysis_sample_rate)
    });

    match tokio::time::timeout(opts.timeout, task).await {
        Ok(Ok(Ok(report))) => {
            info!(
                path = %path.display(),
                segments = report.total_segments(),
                "analysis completed"
            );
            FileOutcome::Report(report)
        }
        Ok(Ok(Err(e))) => {
            error!(path = %path.display(), "analysis failed: {e}");
            describe(&path, &e)
        }
        Ok(Err(join_err)) => {
            error!(path = %path.display(), "analysis task died: {join_err}");
            failure(&path, "Analysis failed", "analysis task died unexpectedly")
        }
        Err(_) => {
            // The blocking thread keeps running; its result is discarded.
            warn!(path = %path.display(), timeout_secs = opts.timeout.as_secs(), "analysis timed out");
            failure(
                &path,
                "Analysis timed out",
                format!("Analysis did not finish within {} s", opts.timeout.as_secs()),
            )
        }
    }
}

/// Analyse every path concurrently, returning outcomes in input order.
pub async fn analyze_files(
    analyzer: Arc<Analyzer>,
    paths: Vec<PathBuf>,
    opts: BatchOptions,
) -> Vec<FileOutcome> {
    let handles: Vec<_> = paths
        .into_iter()
        .map(|path| {
            let analyzer = Arc::clone(&analyzer);
            let fallback = path.clone();
            (fallback, tokio::spawn(run_one(analyzer, path, opts)))
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (path, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(path = %path.display(), "batch task died: {e}");
                failure(&path, "Analysis failed", "analysis task died unexpectedly")
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}
