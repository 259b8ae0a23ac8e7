//! PSC risk command-line tool
//!
//! Scores a fleet loaded from JSON and prints results as JSON on stdout.
//! Logs go to stderr.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};
use psc_risk_engine::config::TelemetryConfig;
use psc_risk_engine::matrix::{PROBABILITY_LABELS, SERIOUSNESS_LABELS};
use psc_risk_engine::{
    Config, Fleet, FleetReporter, RiskMatrix, RiskMatrixBuilder, Scenario, ScenarioSimulator,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "psc-risk",
    about = "Port State Control inspection risk scoring",
    version
)]
struct Cli {
    /// TOML configuration file (defaults to PSC_RISK_* environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fleet JSON file, overrides the configured path
    #[arg(long, global = true)]
    fleet: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score one vessel
    Score {
        /// Vessel id
        vessel_id: String,
    },
    /// Score and rank the whole fleet, highest risk first
    Rank,
    /// Build the 5x5 risk matrix
    Matrix {
        /// Print JSON instead of a text grid
        #[arg(long)]
        json: bool,
    },
    /// Run a what-if scenario for one vessel or the whole fleet
    Simulate {
        /// Scenario to apply
        #[arg(value_enum)]
        scenario: ScenarioArg,
        /// Restrict to one vessel
        #[arg(long)]
        vessel: Option<String>,
        /// Years added by the aging scenario
        #[arg(long, default_value_t = 1.0)]
        years: f64,
    },
    /// Risk profile, recommendations and peer comparison for one vessel
    Assess {
        /// Vessel id
        vessel_id: String,
    },
    /// Full fleet risk report
    Report {
        /// Write the report to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ScenarioArg {
    Training,
    Maintenance,
    RegulatoryStricter,
    RegulatoryRelaxed,
    Aging,
}

impl ScenarioArg {
    fn into_scenario(self, years: f64) -> Scenario {
        match self {
            ScenarioArg::Training => Scenario::Training,
            ScenarioArg::Maintenance => Scenario::Maintenance,
            ScenarioArg::RegulatoryStricter => Scenario::Regulatory { stricter: true },
            ScenarioArg::RegulatoryRelaxed => Scenario::Regulatory { stricter: false },
            ScenarioArg::Aging => Scenario::Aging { delta_years: years },
        }
    }
}

fn init_tracing(config: &TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .with_context(|| format!("invalid log filter '{}'", config.log_level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    result.map_err(|e| anyhow!(e))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_matrix(matrix: &RiskMatrix) -> String {
    let mut out = String::from("5x5 PSC Risk Matrix\n");
    out.push_str(&format!("{:>15} |", "Seriousness"));
    for label in PROBABILITY_LABELS {
        out.push_str(&format!(" {:>9}", label));
    }
    out.push('\n');
    out.push_str(&"-".repeat(17 + 10 * PROBABILITY_LABELS.len()));
    out.push('\n');

    for seriousness in (1..=5u8).rev() {
        out.push_str(&format!(
            "{:>15} |",
            SERIOUSNESS_LABELS[usize::from(seriousness - 1)]
        ));
        for probability in 1..=5u8 {
            let cell = matrix.cell(probability, seriousness);
            let text = cell
                .map(|c| format!("{}v({})", c.vessel_ids.len(), c.risk_rating))
                .unwrap_or_default();
            out.push_str(&format!(" {:>9}", text));
        }
        out.push('\n');
    }

    out.push_str("\nNv(R) = N vessels, rating R | 1-5 low, 6-15 medium, 16-25 high\n");
    out
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::from_env().context("failed to load config from environment")?,
    };
    if let Some(path) = cli.fleet.clone() {
        config.fleet_path = Some(path);
    }

    init_tracing(&config.telemetry)?;
    info!("Starting PSC risk engine");

    let fleet_path = config
        .fleet_path
        .clone()
        .ok_or_else(|| anyhow!("no fleet file: pass --fleet or set PSC_RISK_FLEET_PATH"))?;
    let fleet = Fleet::from_path(&fleet_path)
        .with_context(|| format!("failed to load fleet from {}", fleet_path.display()))?;

    let engine = config.build_engine()?;

    match cli.command {
        Command::Score { vessel_id } => {
            let vessel = fleet.get(&vessel_id)?;
            print_json(&engine.compute_score(vessel, None))?;
        }
        Command::Rank => {
            print_json(&engine.rank_fleet(fleet.vessels()))?;
        }
        Command::Matrix { json } => {
            let builder = RiskMatrixBuilder::new(engine.calculator().flags().clone());
            let matrix = builder.build_matrix(fleet.vessels())?;
            if json {
                print_json(&matrix)?;
            } else {
                print!("{}", render_matrix(&matrix));
            }
        }
        Command::Simulate {
            scenario,
            vessel,
            years,
        } => {
            let simulator = ScenarioSimulator::new(engine, config.roi.clone());
            let scenario = scenario.into_scenario(years);
            match vessel {
                Some(vessel_id) => {
                    print_json(&simulator.simulate(fleet.get(&vessel_id)?, scenario)?)?
                }
                None => print_json(&simulator.simulate_fleet(fleet.vessels(), scenario)?)?,
            }
        }
        Command::Assess { vessel_id } => {
            let reporter = FleetReporter::new(engine, config.report.clone());
            print_json(&reporter.assess_vessel(&fleet, &vessel_id)?)?;
        }
        Command::Report { output } => {
            let reporter = FleetReporter::new(engine, config.report.clone());
            let report = reporter.fleet_report(&fleet)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, serde_json::to_string_pretty(&report)?)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!("Fleet report saved to {}", path.display());
                }
                None => print_json(&report)?,
            }
        }
    }

    Ok(())
}
