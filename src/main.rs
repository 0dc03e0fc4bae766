//! News Guardian CLI entrypoint.
//!
//! ```text
//! guardian <news text...>
//! guardian --image <path>
//! guardian --compare <n> <news text...>
//! guardian --health-check
//! ```
//!
//! Runs one verification session and prints the final snapshot as JSON.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use mimalloc::MiMalloc;

use guardian::config::Config;
use guardian::model::{ImageUpload, InputSource};
use guardian::services::{Collaborators, HttpServices, StatusProbe};
use guardian::workflow::{Workflow, WorkflowSnapshot};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Parsed command line.
struct Args {
    source: InputSource,
    /// 1-based candidate to compare against instead of the full fan-out.
    compare: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    if std::env::args().any(|arg| arg == "--health-check") {
        return Ok(run_health_check().await);
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let args = parse_args(std::env::args().skip(1).collect()).await?;

    tracing::info!(
        search_url = %config.endpoints.search_url,
        analysis_url = %config.endpoints.analysis_url,
        fanout_limit = config.fanout_limit,
        entity_refinement = config.entity_refinement,
        "News Guardian starting"
    );

    let services = Arc::new(HttpServices::new(&config)?);
    let workflow = Workflow::new(Collaborators::from_shared(services), &config);

    let outcome = run(&workflow, args).await;
    let snapshot = workflow.snapshot();
    print_snapshot(&snapshot)?;

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::error!(error = %e, unauthorized = snapshot.unauthorized, "verification failed");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(workflow: &Workflow, args: Args) -> anyhow::Result<()> {
    let searched = workflow.submit(args.source).await?;
    let candidates = searched.candidates.unwrap_or_default();
    if candidates.is_empty() {
        tracing::warn!("no similar articles found, nothing to compare");
        return Ok(());
    }

    match args.compare {
        Some(n) => {
            let candidate = n
                .checked_sub(1)
                .and_then(|i| candidates.get(i))
                .cloned()
                .with_context(|| format!("candidate {n} out of range 1..={}", candidates.len()))?;
            workflow.compare(candidate).await?;
        }
        None => {
            workflow.analyze_all().await?;
        }
    }
    Ok(())
}

async fn parse_args(raw: Vec<String>) -> anyhow::Result<Args> {
    let mut image = None;
    let mut compare = None;
    let mut words = Vec::new();

    let mut iter = raw.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--image" => {
                let path = iter.next().context("--image requires a path")?;
                image = Some(path);
            }
            "--compare" => {
                let n = iter.next().context("--compare requires a candidate number")?;
                compare = Some(
                    n.parse::<usize>()
                        .with_context(|| format!("invalid candidate number '{n}'"))?,
                );
            }
            _ => words.push(arg),
        }
    }

    let source = match image {
        Some(path) => {
            if !words.is_empty() {
                bail!("pass either news text or --image, not both");
            }
            let upload = ImageUpload::from_path(&path)
                .await
                .with_context(|| format!("failed to read image '{path}'"))?;
            InputSource::Image(upload)
        }
        None => {
            if words.is_empty() {
                bail!("usage: guardian [--compare <n>] (<news text...> | --image <path>)");
            }
            InputSource::Text(words.join(" "))
        }
    };

    Ok(Args { source, compare })
}

fn print_snapshot(snapshot: &WorkflowSnapshot) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    println!("{json}");
    Ok(())
}

/// Probes the backend status endpoint. Exit code 0 when it reports up.
async fn run_health_check() -> ExitCode {
    let mut config = Config::from_env().unwrap_or_default();
    config.request_timeout = HEALTH_CHECK_TIMEOUT;

    let services = match HttpServices::new(&config) {
        Ok(services) => services,
        Err(_) => return ExitCode::FAILURE,
    };

    match services.status().await {
        Ok(status) if status.is_up() => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
