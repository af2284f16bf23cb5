mod analysis;
mod api;
mod cache;
mod config;
mod display;
mod error;
mod job;
mod rate_limit;
mod store;
mod telemetry;
#[cfg(test)]
mod testing;

use analysis::global::GlobalStatsOrchestrator;
use anyhow::Context;
use api::client::RiotApiClient;
use api::transport::{RetryingTransport, UreqBackend};
use clap::{Parser, Subcommand};
use config::Config;
use display::output::{display_error, display_info, display_record, display_success, display_summary};
use indicatif::{ProgressBar, ProgressStyle};
use job::{JobOutcome, JobRunner};
use rate_limit::RateGovernor;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use store::{ChampionRecord, ResultStore};

#[derive(Parser, Debug)]
#[command(name = "League Stats")]
#[command(about = "Champion build, rune and role statistics from high-rank ranked games", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate statistics for one champion now
    Stats {
        /// Champion name, e.g. "Ahri" or "kai'sa"
        champion: String,

        /// Platform region (default: RIOT_REGION or la2)
        #[arg(short, long)]
        region: Option<String>,

        /// Maximum match ids read across all seed accounts
        #[arg(short, long)]
        budget: Option<usize>,

        /// Also fetch timelines to rank skill orders
        #[arg(long)]
        timelines: bool,

        /// Print the summary as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Process newline-delimited JSON jobs and store each result
    Worker {
        /// Read jobs from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Show the stored result for a champion
    Show {
        champion: String,
    },
}

fn main() {
    telemetry::init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    match args.command {
        Command::Stats {
            champion,
            region,
            budget,
            timelines,
            json,
        } => {
            let mut config = Config::from_env()?;
            if let Some(region) = region {
                config.region = config::parse_region(&region)?;
            }
            if let Some(budget) = budget {
                config.match_budget = budget;
            }
            config.include_timelines |= timelines;
            run_stats(&config, &champion, json)
        }
        Command::Worker { input } => {
            let config = Config::from_env()?;
            match input {
                Some(path) => {
                    let file = File::open(&path)
                        .with_context(|| format!("failed to open {}", path.display()))?;
                    run_worker(&config, BufReader::new(file))
                }
                None => run_worker(&config, io::stdin().lock()),
            }
        }
        Command::Show { champion } => {
            let store = ResultStore::open(config::data_dir_from_env())?;
            match store.load(&champion)? {
                Some(record) => display_record(&champion, &record),
                None => display_info(&format!(
                    "No stored result for {} in {}",
                    champion,
                    store.root().display()
                )),
            }
            Ok(())
        }
    }
}

fn build_client(config: &Config) -> Arc<RiotApiClient> {
    let governor = Arc::new(RateGovernor::new(config.per_10sec, config.per_10min));
    let transport = RetryingTransport::new(
        Arc::new(UreqBackend::new()),
        governor,
        config.api_key.clone(),
    )
    .with_pacing(config.per_second);
    Arc::new(RiotApiClient::new(transport))
}

fn run_stats(config: &Config, champion: &str, json: bool) -> anyhow::Result<()> {
    display_info(&format!(
        "Aggregating {} in region {} (budget {} matches)",
        champion, config.region, config.match_budget
    ));

    let client = build_client(config);
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{bar:30}] {pos}/{len} accounts")
            .context("invalid progress template")?,
    );
    let orchestrator = GlobalStatsOrchestrator::new(Arc::clone(&client))
        .with_timelines(config.include_timelines)
        .with_progress(pb);

    let summary = orchestrator
        .get_champion_global_stats(champion, &config.region, config.match_budget)?
        .ok_or_else(|| error::AppError::ChampionNotFound(champion.to_string()))?;

    let store = ResultStore::open(&config.data_dir)?;
    store.save(champion, &ChampionRecord::ready(summary.clone()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    // Item names come from static data the run already downloaded.
    let static_data = match client.latest_version() {
        Ok(version) => client
            .resolve_champion(champion, &version.version)?
            .map(|found| client.static_data(&version.version, &found.file_name))
            .transpose()?,
        Err(e) => {
            tracing::warn!(error = %e, "item names unavailable");
            None
        }
    };
    display_summary(&summary, static_data.as_deref());
    display_success(&format!("Saved to {}", store.root().display()));
    Ok(())
}

fn run_worker(config: &Config, input: impl BufRead) -> anyhow::Result<()> {
    let client = build_client(config);
    let orchestrator = GlobalStatsOrchestrator::new(client).with_timelines(config.include_timelines);
    let store = ResultStore::open(&config.data_dir)?;
    let runner = JobRunner::new(&orchestrator, &store, config.region.clone(), config.match_budget);

    tracing::info!(region = %config.region, dir = %store.root().display(), "worker started");

    let (mut ready, mut failed, mut discarded) = (0usize, 0usize, 0usize);
    for line in input.lines() {
        let line = line.context("failed to read job input")?;
        if line.trim().is_empty() {
            continue;
        }
        match runner.process(&line) {
            JobOutcome::Ready { champion_name } => {
                ready += 1;
                tracing::debug!(champion = %champion_name, "job acknowledged");
            }
            JobOutcome::Failed { champion_name, message } => {
                failed += 1;
                tracing::debug!(champion = %champion_name, error = %message, "job acknowledged");
            }
            JobOutcome::Discarded { reason } => {
                discarded += 1;
                tracing::debug!(reason = %reason, "job acknowledged");
            }
        }
    }

    tracing::info!(ready, failed, discarded, "worker finished");
    display_success(&format!(
        "Processed {} jobs ({} ready, {} failed, {} discarded)",
        ready + failed + discarded,
        ready,
        failed,
        discarded
    ));
    Ok(())
}
