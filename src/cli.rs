use crate::{
    config::Config,
    health::HealthView,
    intake::FileCandidate,
    render::render_text,
    report::SubmissionReport,
    service::HttpService,
    util::{ensure_dir, now_rfc3339},
    workflow::{SubmitOutcome, UploadWorkflow},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "leaf-check")]
#[command(about = "Classify leaf images against a remote prediction service")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./leaf-check.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override api.base_url.
    #[arg(long)]
    pub base_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Query the service health endpoint.
    Health {},
    /// Validate input files without uploading them.
    Validate {
        #[arg(long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
    },
    /// Upload an image and print the classification.
    Classify {
        /// Only the first file is classified.
        #[arg(long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
        /// Print the result view as JSON instead of text.
        #[arg(long)]
        json: bool,
        /// Write a JSON submission report to this path.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print the effective configuration.
    Config {},
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = resolve_config(&args)?;
    let _guard = init_logging(&args, &cfg)?;

    match &args.cmd {
        Command::Health {} => runtime()?.block_on(health(&cfg)),
        Command::Validate { input } => runtime()?.block_on(validate(&cfg, input)),
        Command::Classify {
            input,
            json,
            report,
        } => runtime()?.block_on(classify(&cfg, input, *json, report.as_deref())),
        Command::Config {} => {
            println!("{}", toml::to_string(&cfg)?);
            Ok(())
        }
    }
}

fn resolve_config(args: &Args) -> Result<Config> {
    let mut cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    cfg.apply_overrides(|key| std::env::var(key).ok())?;
    if let Some(base_url) = &args.base_url {
        cfg.api.base_url = base_url.clone();
    }
    cfg.validate()?;
    Ok(cfg)
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("leaf-check.toml");
    default.exists().then_some(default)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .with_context(|| "building tokio runtime")
}

fn init_logging(args: &Args, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = resolve_log_path(cfg) {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
        let file = std::fs::File::create(&path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file || cfg.logging.file_path.is_empty() {
        return None;
    }
    Some(PathBuf::from(&cfg.logging.file_path))
}

fn workflow(cfg: &Config) -> Result<UploadWorkflow<HttpService>> {
    let service = HttpService::new(&cfg.api)?;
    Ok(UploadWorkflow::new(cfg, service))
}

async fn health(cfg: &Config) -> Result<()> {
    let wf = workflow(cfg)?;
    let view = wf.check_health().await;
    println!("{}", serde_json::to_string_pretty(&view)?);
    match view {
        HealthView::Healthy(_) => Ok(()),
        HealthView::Failed { message } => Err(anyhow!("health check failed: {message}")),
    }
}

fn load_candidates(inputs: &[PathBuf]) -> Result<Vec<FileCandidate>> {
    inputs
        .iter()
        .map(|p| FileCandidate::from_path(p))
        .collect()
}

async fn validate(cfg: &Config, inputs: &[PathBuf]) -> Result<()> {
    let wf = workflow(cfg)?;
    let mut rejected = 0usize;
    for (path, candidate) in inputs.iter().zip(load_candidates(inputs)?) {
        match wf.select_file(candidate).await {
            Ok(_) => {
                let view = wf.view();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "input": path,
                        "file": view.file,
                        "preview": view.preview,
                    }))?
                );
            }
            Err(err) => {
                rejected += 1;
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "input": path,
                        "rejected": err.to_string(),
                    }))?
                );
            }
        }
    }
    if rejected > 0 {
        return Err(anyhow!("{rejected} of {} inputs rejected", inputs.len()));
    }
    Ok(())
}

async fn classify(
    cfg: &Config,
    inputs: &[PathBuf],
    json: bool,
    report_path: Option<&Path>,
) -> Result<()> {
    let wf = Arc::new(workflow(cfg)?);

    if cfg.workflow.probe_on_start {
        let probe_wf = wf.clone();
        tokio::spawn(async move {
            let status = probe_wf.probe_connection().await;
            debug!(?status, "startup probe finished");
        });
    }

    if inputs.len() > 1 {
        warn!(
            "{} inputs given; only {} is classified",
            inputs.len(),
            inputs[0].display()
        );
    }
    let candidates = load_candidates(&inputs[..1.min(inputs.len())])?;
    let file = wf
        .select_dropped(candidates)
        .await?
        .ok_or_else(|| anyhow!("no input given"))?;

    let mut progress_rx = wf.subscribe_progress();
    let progress_log = tokio::spawn(async move {
        while progress_rx.changed().await.is_ok() {
            let pct = *progress_rx.borrow_and_update();
            debug!(progress = pct, "upload progress");
        }
    });

    let started = now_rfc3339();
    let outcome = wf.submit().await;
    let finished = now_rfc3339();
    progress_log.abort();

    if let Some(path) = report_path {
        let report = SubmissionReport::new(&file, &cfg.api.base_url, started, finished, &outcome);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("writing report: {}", path.display()))?;
        info!("report written to {}", path.display());
    }

    match outcome {
        SubmitOutcome::Succeeded(view) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{}", render_text(&view));
            }
            Ok(())
        }
        SubmitOutcome::Failed(message) => Err(anyhow!("{message}")),
        SubmitOutcome::Cancelled => Err(anyhow!("submission cancelled")),
        SubmitOutcome::Ignored(reason) => Err(anyhow!("submission not started: {reason:?}")),
    }
}
