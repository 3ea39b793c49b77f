use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};

use e2_patch_pk::config::settings;
use e2_patch_pk::dosing::generate_patch_windows;
use e2_patch_pk::output;
use e2_patch_pk::{Config, PatchHistory, ScheduleParams, Simulator};

#[derive(Parser)]
#[command(name = "e2-patch-pk")]
#[command(about = "Transdermal estradiol patch serum level simulation")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate a hypothetical regular schedule
    Whatif {
        /// Patches applied together at each change
        #[arg(long)]
        patches: Option<u32>,

        /// Hours between application events
        #[arg(long)]
        spread: f64,

        /// Hours each patch is worn
        #[arg(long)]
        worn: Option<f64>,

        /// Simulated period in hours
        #[arg(long, default_value = "672")]
        period: f64,

        /// Dose per patch in mg/day
        #[arg(long)]
        dose: Option<f64>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Estimate levels and guidance from a recorded patch history
    Personal {
        /// Patch history file (export document or array of records)
        #[arg(long)]
        history: PathBuf,

        /// Configuration file path; defaults to the settings in the history file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Evaluation instant (RFC 3339), defaults to the current time
        #[arg(long)]
        now: Option<DateTime<Utc>>,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    match cli.command {
        Command::Whatif { patches, spread, worn, period, dose, config, output } => {
            let config = load_config(config.as_deref())?;
            let params = ScheduleParams::new(
                patches.unwrap_or(config.patches_per_change),
                spread,
                worn.unwrap_or(config.default_wear_hours),
                period,
            )
            .with_dose(dose.unwrap_or(config.default_dose_mg_per_day));

            info!(
                "Simulating {} patch(es) every {}h, worn {}h, over {}h",
                params.patches, params.spread_hours, params.worn_hours, params.period_hours
            );

            let simulator = Simulator::new(config.tuning)?;
            let windows = generate_patch_windows(&params)?;
            let series = simulator.schedule_series(&params)?;

            std::fs::create_dir_all(&output)
                .with_context(|| format!("creating output directory {:?}", output))?;
            output::save_schedule_results(&params, &windows, &series, &output)?;
        },
        Command::Personal { history, config, now, output } => {
            let history = PatchHistory::from_file(&history)
                .with_context(|| format!("loading patch history {:?}", history))?;
            let config = match config {
                Some(path) => load_config(Some(path.as_path()))?,
                None => settings::from_settings(&history.settings)?,
            };
            let now = now.unwrap_or_else(Utc::now);

            if history.patches.is_empty() {
                warn!("No patch records found; results will be empty");
            }

            let simulator = Simulator::new(config.tuning.clone())?;
            let snapshot = simulator.snapshot(&history.patches, &config.target, now);
            info!(
                "Estimated serum E2 at {}: {} pg/mL ({} recommendations)",
                now, snapshot.current_level, snapshot.recommendations.len()
            );

            std::fs::create_dir_all(&output)
                .with_context(|| format!("creating output directory {:?}", output))?;
            output::save_personal_results(&snapshot, &config.target, &output)?;
        },
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            let config = Config::from_file(path)
                .with_context(|| format!("loading configuration {:?}", path))?;
            info!("Loaded configuration from {:?}", path);
            Ok(config)
        },
        None => Ok(Config::default()),
    }
}
