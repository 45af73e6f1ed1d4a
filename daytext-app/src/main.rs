use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use daytext_common::observability::{LogConfig, init_logging};
use daytext_common::{DaytextError, RunStatus};
use daytext_config::{DaytextConfig, DaytextConfigLoader, SourceDetails, discover_config_file};
use daytext_present::Presenter;
use daytext_runtime::DaytextRuntime;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod daily;
mod listing;
mod wiring;

use daily::{DailyArgs, run_daily};
use listing::{ListArgs, run_listing};
use wiring::{RunContext, build_speaker};

#[derive(Debug, Parser)]
#[command(name = "daytext", version, about = "Print (and optionally speak) the text for a day from a web page")]
struct Cli {
    /// Configuration file (default: ./daytext.yaml, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Mirror logs to stderr at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Look up a day's text (the default)
    Today(DailyArgs),
    /// Print the matches of a listing source
    List(ListArgs),
    /// Show configured sources
    Sources,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = init_logging(LogConfig::for_cli(cli.verbose))?;
    tracing::debug!(log = %log_path.display(), "logging.ready");

    let cfg = load_config(cli.config.as_deref()).context("loading configuration")?;
    let runtime = DaytextRuntime::build()?;
    let ctx = RunContext {
        config: &cfg,
        today: Local::now().date_naive(),
        cancel: runtime.cancellation(),
    };

    let command = cli.command.unwrap_or(Command::Today(DailyArgs::default()));
    let outcome = runtime.block_on_until_ctrl_c(dispatch(&ctx, command));
    runtime.shutdown(Duration::from_millis(250));

    let status = match outcome {
        Ok(()) => RunStatus::Completed,
        Err(err) => {
            tracing::error!(error = %err, "run.failed");
            eprintln!("{err}");
            RunStatus::from_error(&err)
        }
    };
    tracing::info!(?status, "run.finished");
    if status != RunStatus::Completed {
        std::process::exit(status.exit_code());
    }
    Ok(())
}

async fn dispatch(ctx: &RunContext<'_>, command: Command) -> daytext_common::Result<()> {
    match command {
        Command::Today(args) => {
            let speaker = build_speaker(&ctx.config.speech, args.speak_override());
            let mut out = Presenter::new(io::stdout()).with_speaker(speaker);
            let mut notices = Presenter::new(io::stderr());
            run_daily(ctx, &args, &mut out, &mut notices).await?;
        }
        Command::List(args) => {
            let speaker = build_speaker(&ctx.config.speech, None);
            let mut out = Presenter::new(io::stdout()).with_speaker(speaker);
            run_listing(ctx, &args, &mut out).await?;
        }
        Command::Sources => {
            let mut out = Presenter::new(io::stdout());
            for line in describe_sources(ctx.config) {
                out.write_raw(&line)?;
            }
        }
    }
    Ok(())
}

/// Explicit path, else the discovered file, else built-in defaults; env always applies.
fn load_config(explicit: Option<&Path>) -> std::result::Result<DaytextConfig, DaytextError> {
    let loader = DaytextConfigLoader::new();
    let loader = match explicit.map(Path::to_path_buf).or_else(discover_config_file) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "config.file");
            loader.with_file(path)
        }
        None => loader,
    };
    loader
        .load()
        .map_err(|e| DaytextError::Config(e.to_string()))
}

/// One line per source: `id<TAB>kind<TAB>url`, disabled ones marked.
fn describe_sources(cfg: &DaytextConfig) -> Vec<String> {
    cfg.sources
        .iter()
        .map(|s| {
            let (kind, url) = match &s.details {
                SourceDetails::DailyText { config } => ("daily_text", config.url.as_str()),
                SourceDetails::Listing { config } => ("listing", config.url.as_str()),
            };
            let mut line = format!("{}\t{kind}\t{url}", s.id);
            if !s.is_enabled() {
                line.push_str("\t(disabled)");
            }
            line
        })
        .collect()
}
