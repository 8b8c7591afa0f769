use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde_json::json;

use orca_config::{load_config, OrcaConfig};
use orca_core::building::layout;
use orca_core::fire::{build_spread_timeline, predict, seed_rooms};
use orca_core::reports::{FireSeverityReport, StructuralReport};
use orca_core::routing::RouteSolver;
use orca_runtime::{OfflineVisionBackend, RuntimeApp};

const DEFAULT_CONFIG_PATH: &str = "configs/orca.yaml";

#[derive(Debug, Parser)]
#[command(name = "orca", about = "ORCA incident analysis CLI")]
pub struct Cli {
    /// Config file; built-in defaults when omitted and configs/orca.yaml is absent
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the four teams in hybrid parallel mode over frames
    Simulate(SimulateArgs),
    /// Run the four teams sequentially on one frame
    Analyze(AnalyzeArgs),
    /// Optimized path, survivability window and heat exposure
    Metrics(MetricsArgs),
    /// Per-room fire spread projection
    Spread(SpreadArgs),
    /// Safest route between two rooms
    Route(RouteArgs),
    /// Routes from a room to every exit, safest first
    Exits(ExitsArgs),
}

#[derive(Debug, Args, Clone)]
struct SimulateArgs {
    #[arg(long = "frame", required = true)]
    frames: Vec<String>,
    /// Remove stored state after printing results
    #[arg(long)]
    cleanup: bool,
}

#[derive(Debug, Args, Clone)]
struct AnalyzeArgs {
    frame: String,
    #[arg(long)]
    simulation_id: Option<String>,
}

#[derive(Debug, Args, Clone)]
struct HazardArgs {
    /// Fire severity result (JSON)
    #[arg(long)]
    fire: Option<PathBuf>,
    /// Structural result (JSON)
    #[arg(long)]
    structural: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
struct MetricsArgs {
    #[arg(long)]
    fire: PathBuf,
    #[arg(long)]
    structural: Option<PathBuf>,
    #[arg(long)]
    origin: Option<String>,
    #[arg(long)]
    destination: Option<String>,
}

#[derive(Debug, Args, Clone)]
struct SpreadArgs {
    #[arg(long)]
    fire: PathBuf,
    /// Minutes to project; defaults to simulation.horizon_minutes
    #[arg(long)]
    horizon: Option<u32>,
}

#[derive(Debug, Args, Clone)]
struct RouteArgs {
    from: String,
    to: String,
    #[command(flatten)]
    hazards: HazardArgs,
    /// Layout name; defaults to metrics.layout
    #[arg(long)]
    layout: Option<String>,
}

#[derive(Debug, Args, Clone)]
struct ExitsArgs {
    from: String,
    #[command(flatten)]
    hazards: HazardArgs,
    #[arg(long)]
    layout: Option<String>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        ensure_log_filter(self.verbose);
        let config = resolve_config(self.config.as_deref())?;
        let app = RuntimeApp::from_config(config, Arc::new(OfflineVisionBackend))?;
        tracing::debug!(command = ?self.command, "running command");

        let output = match self.command {
            Command::Simulate(args) => {
                let orchestrator = &app.orchestrator;
                let simulation_id = orchestrator.register_simulation(&args.frames).await?;
                orchestrator
                    .run_simulation(&simulation_id, &args.frames)
                    .await?;
                let view = orchestrator
                    .get_simulation_results(&simulation_id)
                    .await?
                    .to_value();
                if args.cleanup {
                    orchestrator.cleanup_simulation(&simulation_id).await?;
                }
                view
            }
            Command::Analyze(args) => {
                let simulation_id = args
                    .simulation_id
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                let analysis = app
                    .orchestrator
                    .run_full_analysis(&simulation_id, &args.frame)
                    .await;
                serde_json::to_value(analysis)?
            }
            Command::Metrics(args) => {
                let fire: FireSeverityReport = read_json(&args.fire)?;
                let structural = args
                    .structural
                    .as_deref()
                    .map(read_json::<StructuralReport>)
                    .transpose()?;
                let snapshot = app.metrics.compute_all(
                    &fire,
                    structural.as_ref(),
                    args.origin.as_deref(),
                    args.destination.as_deref(),
                );
                serde_json::to_value(snapshot)?
            }
            Command::Spread(args) => {
                let fire: FireSeverityReport = read_json(&args.fire)?;
                let rooms = layout::by_name(&app.config.simulation.layout)?;
                let horizon = args
                    .horizon
                    .unwrap_or(app.config.simulation.horizon_minutes);
                json!({
                    "timeline": build_spread_timeline(&fire, Some(rooms.as_slice())),
                    "predictions": predict(&seed_rooms(&fire, &rooms), horizon),
                })
            }
            Command::Route(args) => {
                let (fire, structural) = read_hazards(&args.hazards)?;
                let solver = solver_for(&app.config, args.layout.as_deref())?;
                let route = solver.solve(&args.from, &args.to, fire.as_ref(), structural.as_ref());
                serde_json::to_value(route)?
            }
            Command::Exits(args) => {
                let (fire, structural) = read_hazards(&args.hazards)?;
                let solver = solver_for(&app.config, args.layout.as_deref())?;
                let routes = solver.find_all_exits(&args.from, fire.as_ref(), structural.as_ref());
                serde_json::to_value(routes)?
            }
        };

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

fn resolve_config(path: Option<&Path>) -> anyhow::Result<OrcaConfig> {
    match path {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config '{}'", path.display())),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                load_config(default_path)
                    .with_context(|| format!("failed to load config '{}'", DEFAULT_CONFIG_PATH))
            } else {
                Ok(OrcaConfig::default())
            }
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in '{}'", path.display()))
}

fn read_hazards(
    args: &HazardArgs,
) -> anyhow::Result<(Option<FireSeverityReport>, Option<StructuralReport>)> {
    let fire = args
        .fire
        .as_deref()
        .map(read_json::<FireSeverityReport>)
        .transpose()?;
    let structural = args
        .structural
        .as_deref()
        .map(read_json::<StructuralReport>)
        .transpose()?;
    Ok((fire, structural))
}

fn solver_for(config: &OrcaConfig, layout_name: Option<&str>) -> anyhow::Result<RouteSolver> {
    let rooms = layout::by_name(layout_name.unwrap_or(config.metrics.layout.as_str()))?;
    Ok(RouteSolver::new(Some(rooms.as_slice()))?)
}

fn ensure_log_filter(verbose: bool) {
    if verbose {
        return;
    }
    if env::var("RUST_LOG").is_ok() {
        return;
    }
    env::set_var("RUST_LOG", "warn");
}
