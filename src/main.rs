mod api;
mod app;
mod cache;
mod cli;
mod commands;
mod config;
mod dispatch;
mod event;
mod listing;
mod logging;
mod optimistic;
mod query;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fieldops")]
#[command(about = "A terminal dashboard for field-operations dispatch and billing")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/fieldops/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<cli::Command>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let config = config::Config::load(args.config.as_deref())?;

  // Keep the guard alive so buffered log lines are flushed on exit
  let _log_guard = logging::init(&config.log, config.log_file().as_deref())?;
  tracing::info!(api = %config.api.url, "starting fieldops");

  let services = app::Services::from_config(&config)?;

  match args.command {
    Some(command) => cli::run(command, &services).await,
    None => app::App::new(&config, services).run().await,
  }
}
