use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sequent_bench::BenchHarness;
use sequent_config::{BenchConfig, Technique};
use sequent_fetch::{
  DEMO_URLS, JsonSink, ValidationDocument, ValidationKind, ValidatorEndpoints, fetch_chain,
  validation_chain,
};
use sequent_runner::{RunCallbacks, RunOutcome, RunReport, RunnerConfig, SequentialRunner, TaskList};

/// Sequent - run asynchronous work items strictly one after another
#[derive(Parser)]
#[command(name = "sequent")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Time sequencing techniques over a synthetic task list
  Bench {
    /// Path to a benchmark config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of tasks per technique
    #[arg(long)]
    tasks: Option<usize>,

    /// Delay of each task in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Pause between techniques in milliseconds
    #[arg(long)]
    pause_ms: Option<u64>,

    /// Technique to time; repeat to select several (default: all)
    #[arg(long = "technique")]
    techniques: Vec<Technique>,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    json: bool,
  },

  /// Fetch JSON documents one after another
  Fetch {
    /// URLs to fetch, in order (default: three sample posts)
    urls: Vec<String>,
  },

  /// Submit HTML, CSS or SVG files to the W3C validators one after another
  Validate {
    /// Files to validate; the kind is taken from the extension
    #[arg(required = true)]
    files: Vec<PathBuf>,
  },
}

fn main() -> Result<()> {
  init_tracing();
  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Bench {
      config,
      tasks,
      delay_ms,
      pause_ms,
      techniques,
      json,
    }) => {
      let mut bench = match config {
        Some(path) => BenchConfig::load(&path)
          .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => BenchConfig::default(),
      };
      if let Some(tasks) = tasks {
        bench.task_count = tasks;
      }
      if let Some(delay_ms) = delay_ms {
        bench.task_delay_ms = delay_ms;
      }
      if let Some(pause_ms) = pause_ms {
        bench.pause_between_ms = pause_ms;
      }
      if !techniques.is_empty() {
        bench.techniques = techniques;
      }
      run_bench(bench, json)?;
    }
    Some(Commands::Fetch { urls }) => {
      run_fetch(urls)?;
    }
    Some(Commands::Validate { files }) => {
      run_validate(files)?;
    }
    None => {
      println!("sequent - use --help to see available commands");
    }
  }

  Ok(())
}

fn init_tracing() {
  // RUST_LOG=debug shows every item transition
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .try_init();
}

fn run_bench(config: BenchConfig, json: bool) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_bench_async(config, json).await })
}

async fn run_bench_async(config: BenchConfig, json: bool) -> Result<()> {
  let harness = BenchHarness::new(config).context("invalid benchmark config")?;

  eprintln!(
    "Timing {} techniques over {} tasks",
    harness.config().techniques.len(),
    harness.config().task_count
  );

  let cancel = CancellationToken::new();
  cancel_on_ctrl_c(cancel.clone());

  let report = harness.run(cancel).await.context("benchmark failed")?;

  if json {
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else {
    println!("{}", report);
    if let Some(fastest) = report.fastest() {
      eprintln!(
        "Fastest: {} ({:.2}ms)",
        fastest.technique,
        fastest.elapsed_ms()
      );
    }
  }

  Ok(())
}

fn run_fetch(urls: Vec<String>) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_fetch_async(urls).await })
}

async fn run_fetch_async(urls: Vec<String>) -> Result<()> {
  let urls = if urls.is_empty() {
    DEMO_URLS.iter().map(|url| url.to_string()).collect()
  } else {
    urls
  };
  eprintln!("Fetching {} documents", urls.len());

  let client = reqwest::Client::new();
  let tasks = fetch_chain(&client, urls, printing_sink());
  let report = run_chain(tasks, "fetch").await?;

  eprintln!(
    "Started {} of {} fetches in {:.2}ms",
    report.items_invoked,
    report.item_count,
    report.elapsed.as_secs_f64() * 1000.0
  );
  check_outcome(report.outcome, "document")
}

fn run_validate(files: Vec<PathBuf>) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_validate_async(files).await })
}

async fn run_validate_async(files: Vec<PathBuf>) -> Result<()> {
  let mut documents = Vec::with_capacity(files.len());
  for path in files {
    let Some(kind) = ValidationKind::from_path(&path) else {
      bail!(
        "cannot tell the document kind of {} (expected .html, .htm, .css or .svg)",
        path.display()
      );
    };
    let source = tokio::fs::read_to_string(&path)
      .await
      .with_context(|| format!("failed to read {}", path.display()))?;
    documents.push(ValidationDocument::new(path.display().to_string(), kind, source));
  }
  eprintln!("Validating {} documents", documents.len());

  let client = reqwest::Client::new();
  let endpoints = ValidatorEndpoints::default();
  let tasks = validation_chain(&client, &endpoints, documents, printing_sink());
  let report = run_chain(tasks, "validate").await?;

  eprintln!(
    "Submitted {} of {} documents in {:.2}ms",
    report.items_invoked,
    report.item_count,
    report.elapsed.as_secs_f64() * 1000.0
  );
  check_outcome(report.outcome, "validation")
}

/// Print each received body as pretty JSON, headed by where it came from.
fn printing_sink() -> JsonSink {
  Arc::new(|origin: &str, body: serde_json::Value| {
    match serde_json::to_string_pretty(&body) {
      Ok(pretty) => println!("# {}\n{}", origin, pretty),
      Err(e) => error!(origin, error = %e, "failed to render document"),
    }
  })
}

/// Run `tasks` until done, stopping on the first error or on Ctrl-C.
async fn run_chain(tasks: TaskList, label: &'static str) -> Result<RunReport> {
  let cancel = CancellationToken::new();
  let runner = SequentialRunner::new(RunnerConfig {
    parent_cancel: Some(cancel.clone()),
  });
  let handle = runner.run(
    tasks,
    RunCallbacks::new(move || info!(label, "all items finished"))
      .on_error(move |err, index| error!(label, index, error = %err, "item failed")),
  )?;
  cancel_on_ctrl_c(cancel);

  handle
    .wait()
    .await
    .with_context(|| format!("{} run failed", label))
}

fn check_outcome(outcome: RunOutcome, noun: &str) -> Result<()> {
  match outcome {
    RunOutcome::Completed => Ok(()),
    RunOutcome::Failed { index, error } => bail!("{} {} failed: {}", noun, index, error),
    RunOutcome::Cancelled { next_index } => bail!("cancelled before {} {}", noun, next_index),
  }
}

fn cancel_on_ctrl_c(cancel: CancellationToken) {
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      info!("interrupt received, cancelling");
      cancel.cancel();
    }
  });
}
