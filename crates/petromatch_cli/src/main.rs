mod config;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use engine_logging::{engine_info, engine_warn, LogDestination};
use petromatch_core::{BoardId, DashboardView, MatchPhase, MatchStart, ScanView, TaskId};
use petromatch_engine::{EventStream, Orchestrator, ReqwestTaskClient, TaskClient};

use crate::config::Config;

#[derive(Parser)]
#[command(author, version, about = "Scrape job boards and rank the results", long_about = None)]
struct Cli {
    /// RON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Backend root URL, overriding config and environment
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Bearer token for the backend
    #[arg(long, global = true)]
    token: Option<String>,
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the job boards available for scraping
    Boards,
    /// Scrape the given boards and show matched jobs
    Scan {
        #[arg(required = true)]
        board_ids: Vec<BoardId>,
        /// Start matching only after the scrape has completed
        #[arg(long)]
        match_after_scan: bool,
    },
    /// Show results for an existing scrape task, starting matching if needed
    Matches { task_id: TaskId },
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(token) = &self.token {
            config.auth_token = Some(token.clone());
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Commands::Scan {
            match_after_scan: true,
            ..
        } = self.command
        {
            config.match_start = MatchStart::OnCompletion;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env(|name| std::env::var(name).ok());
    cli.apply_overrides(&mut config);

    let destination = match &config.log_file {
        Some(path) => LogDestination::File(path.clone()),
        None => LogDestination::Terminal,
    };
    engine_logging::initialize(destination, engine_logging::parse_level(&config.log_level));
    engine_info!("Using backend {}", config.api_url);

    let client: Arc<dyn TaskClient> = Arc::new(ReqwestTaskClient::new(
        &config.client_settings(),
        Arc::new(config.credentials()),
    )?);

    match cli.command {
        Commands::Boards => {
            let boards = client.list_boards().await?;
            print_lines(render::boards(&boards));
            Ok(())
        }
        Commands::Scan { board_ids, .. } => {
            let (orchestrator, mut events) =
                Orchestrator::new(client, config.dashboard_settings())?;
            orchestrator.start_scan(&board_ids)?;
            finish(&orchestrator, &mut events).await
        }
        Commands::Matches { task_id } => {
            let (orchestrator, mut events) =
                Orchestrator::new(client, config.dashboard_settings())?;
            orchestrator.activate(task_id);
            finish(&orchestrator, &mut events).await
        }
    }
}

/// Follows events until the scan and matching have both settled, then prints the results.
async fn finish(orchestrator: &Orchestrator, events: &mut EventStream) -> Result<()> {
    loop {
        tokio::select! {
            event = events.next() => {
                let event = event.ok_or_else(|| anyhow!("event stream closed"))?;
                if let Some(line) = render::event(&event) {
                    println!("{line}");
                }
                if is_settled(&orchestrator.view()) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                engine_warn!("Interrupted, cancelling outstanding requests");
                orchestrator.dispose();
                bail!("interrupted");
            }
        }
    }

    if let Err(err) = orchestrator.refresh_results().await {
        engine_warn!("Could not refresh results: {}", err);
    }
    let view = orchestrator.view();
    println!();
    print_lines(render::dashboard(&view));

    if let ScanView::Failed { .. } = view.scan {
        bail!("scan did not complete");
    }
    Ok(())
}

fn is_settled(view: &DashboardView) -> bool {
    !view.scan.is_scanning() && !view.loading && view.matching != MatchPhase::AwaitingScan
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}
