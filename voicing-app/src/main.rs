//! `voicing` command-line entry point.
//!
//! ```text
//! voicing [--config <file>] [--output <file>] [--timeout-secs <n>] <file>...
//! voicing stats [--config <file>]
//! ```
//!
//! Reports go to stdout (or `--output`); logs go to stderr.

mod batch;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Serialize;
use tracing::info;
use voicing_core::{audio::SUPPORTED_EXTENSIONS, AnalysisConfig, Analyzer, FrameLabel};

use batch::{analyze_files, BatchOptions};
use settings::{default_settings_path, load_settings};

const USAGE: &str = "Usage: voicing [--config <file>] [--output <file>] [--timeout-secs <n>] <file>...
       voicing stats [--config <file>]";

#[derive(Debug, Default)]
struct Args {
    stats: bool,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    timeout_secs: Option<u64>,
    files: Vec<PathBuf>,
}

fn parse_args<I: IntoIterator<Item = String>>(raw: I) -> anyhow::Result<Args> {
    let mut args = Args::default();
    let mut it = raw.into_iter().peekable();

    if it.peek().map(String::as_str) == Some("stats") {
        it.next();
        args.stats = true;
    }

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --config");
                };
                args.config = Some(PathBuf::from(v));
            }
            "--output" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --output");
                };
                args.output = Some(PathBuf::from(v));
            }
            "--timeout-secs" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --timeout-secs");
                };
                let secs = v
                    .parse::<u64>()
                    .with_context(|| format!("invalid value for --timeout-secs: {v}"))?;
                args.timeout_secs = Some(secs.clamp(1, 3_600));
            }
            "--help" | "-h" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("unknown argument: {other}"),
            file => args.files.push(PathBuf::from(file)),
        }
    }

    if !args.stats && args.files.is_empty() {
        bail!("no input files\n{USAGE}");
    }
    Ok(args)
}

#[derive(Serialize)]
struct Stats<'a> {
    supported_formats: &'a [&'a str],
    max_file_bytes: u64,
    frame_classification: [FrameLabel; 3],
    analysis: AnalysisConfig,
}

fn write_output(json: &str, output: Option<&PathBuf>) -> anyhow::Result<()> {
    match output {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            std::fs::write(out, json).with_context(|| format!("writing {}", out.display()))?;
            info!(path = %out.display(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Tracing ───────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("voicing=info,voicing_core=info")),
        )
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    let settings_path = args.config.clone().unwrap_or_else(default_settings_path);
    let mut settings = load_settings(&settings_path);
    settings.apply_env_overrides();
    if let Some(secs) = args.timeout_secs {
        settings.timeout_secs = secs;
    }
    settings.normalize();

    if args.stats {
        let stats = Stats {
            supported_formats: SUPPORTED_EXTENSIONS,
            max_file_bytes: settings.max_file_bytes,
            frame_classification: FrameLabel::ALL,
            analysis: settings.analysis,
        };
        let json = serde_json::to_string_pretty(&stats)?;
        return write_output(&json, args.output.as_ref());
    }

    let analyzer = Analyzer::new(settings.analysis).context("invalid analysis configuration")?;
    info!(
        settings = %settings_path.display(),
        files = args.files.len(),
        "voicing starting"
    );

    let opts = BatchOptions {
        timeout: Duration::from_secs(settings.timeout_secs),
        max_file_bytes: settings.max_file_bytes,
        analysis_sample_rate: settings.analysis_sample_rate,
    };
    let outcomes = analyze_files(Arc::new(analyzer), args.files, opts).await;
    let failures = outcomes.iter().filter(|o| o.is_failure()).count();

    let json = if outcomes.len() == 1 {
        serde_json::to_string_pretty(&outcomes[0])?
    } else {
        serde_json::to_string_pretty(&outcomes)?
    };
    write_output(&json, args.output.as_ref())?;

    if failures > 0 {
        bail!("{failures} of {} file(s) failed", outcomes.len());
    }
    Ok(())
}
