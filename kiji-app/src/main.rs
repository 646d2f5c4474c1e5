use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use kiji_common::observability::{LogConfig, init_logging};
use kiji_config::{JobSpec, KijiConfig, KijiConfigLoader, OutputFormat};
use kiji_pipeline::{JobReport, Pipeline, run_job};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "kiji",
    version,
    about = "Turn web archives into a cleaned, deduplicated text corpus"
)]
struct Cli {
    /// YAML config file; a missing file means built-in defaults
    #[arg(short, long, env = "KIJI_CONFIG", default_value = "kiji.yaml")]
    config: PathBuf,

    /// Output for an ad-hoc job over INPUTS (replaces the configured jobs)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format for the ad-hoc job
    #[arg(long, default_value = "csv", value_parser = parse_format)]
    format: OutputFormat,

    /// Archive files or directories of archives
    inputs: Vec<PathBuf>,
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    match s.to_ascii_lowercase().as_str() {
        "csv" => Ok(OutputFormat::Csv),
        "text" | "txt" => Ok(OutputFormat::Text),
        other => Err(format!("unknown format {other:?} (expected csv or text)")),
    }
}

fn select_jobs(cli: &Cli, cfg: &KijiConfig) -> Result<Vec<JobSpec>> {
    match (&cli.output, cli.inputs.is_empty()) {
        (Some(output), false) => Ok(vec![JobSpec {
            name: "cli".into(),
            inputs: cli.inputs.clone(),
            output: output.clone(),
            format: cli.format,
        }]),
        (Some(_), true) => bail!("--output needs at least one input path"),
        (None, false) => bail!("input paths need --output"),
        (None, true) => Ok(cfg.jobs.clone()),
    }
}

/// Runs every job on the calling thread. Returns the reports and the number
/// of jobs that failed.
fn run_jobs(
    jobs: &[JobSpec],
    pipeline: &Pipeline,
    cancel: &CancellationToken,
) -> (Vec<JobReport>, usize) {
    let mut reports = Vec::with_capacity(jobs.len());
    let mut failed = 0;
    for job in jobs {
        if cancel.is_cancelled() {
            warn!(job = %job.name, "app.job.skipped");
            continue;
        }
        match run_job(job, pipeline, cancel) {
            Ok(report) => reports.push(report),
            Err(err) => {
                error!(job = %job.name, error = %format!("{err:#}"), "app.job.failed");
                failed += 1;
            }
        }
    }
    (reports, failed)
}

/// Wait for the worker. A delivered interrupt flips `cancel` and keeps
/// waiting so the worker can wind down; a failed signal listener is logged
/// and ignored.
async fn supervise<T, F>(
    mut worker: JoinHandle<T>,
    interrupt: F,
    cancel: &CancellationToken,
) -> Result<T, JoinError>
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        joined = &mut worker => joined,
        signal = interrupt => {
            match signal {
                Ok(()) => {
                    warn!("app.interrupted");
                    cancel.cancel();
                }
                Err(err) => warn!(error = %err, "app.signal.unavailable"),
            }
            worker.await
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Config (env wins over file)
    let cfg = KijiConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    // 2) Logging
    let log_path = init_logging(LogConfig {
        app_name: "kiji",
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })?;
    info!(log = %log_path.display(), config = %cli.config.display(), "app.start");

    let jobs = select_jobs(&cli, &cfg)?;
    if jobs.is_empty() {
        warn!("app.no_jobs");
        bail!("nothing to do: configure `jobs` or pass --output with input paths");
    }

    // 3) Work runs on the blocking pool; Ctrl-C only flips the token.
    let pipeline = Pipeline::from_config(&cfg.pipeline)?;
    let cancel = CancellationToken::new();
    let worker_cancel = cancel.clone();
    let worker = tokio::task::spawn_blocking(move || run_jobs(&jobs, &pipeline, &worker_cancel));

    let joined = supervise(worker, tokio::signal::ctrl_c(), &cancel).await;
    let (reports, failed) = joined.context("job worker panicked")?;

    let retained: u64 = reports.iter().map(|r| r.retained).sum();
    info!(jobs = reports.len(), failed, retained, "app.done");
    if failed > 0 {
        bail!("{failed} job(s) failed; see {}", log_path.display());
    }
    Ok(())
}
