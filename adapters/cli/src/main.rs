#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for planning paths and simulating chases on ASCII maps.

mod config;
mod layout_transfer;

use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use glam::Vec2;
use serde::Serialize;
use stealth_nav_core::{AgentBody, MovementMode};
use stealth_nav_system_movement::{MovementController, Surroundings};
use stealth_nav_system_pathfinding::{OptimalPlanner, PathPlanner, Planner, PlannerKind};
use stealth_nav_world::{GridProbe, WalkabilityGrid};
use tracing::info;

use crate::{config::CliConfig, layout_transfer::GridLayout};

/// Path planning and movement tools for stealth agents.
#[derive(Debug, Parser)]
#[command(name = "stealth-nav", version, long_about = None)]
struct Cli {
    /// TOML file with `[planner]` and `[movement]` tables
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plan a path between two points and print it as JSON
    Plan(PlanArgs),
    /// Simulate an agent chasing a target and print the outcome as JSON
    Chase(ChaseArgs),
    /// Print the layout transfer string for a grid
    Export(GridSource),
    /// Print a grid as an ASCII map
    Show(GridSource),
}

/// Where the walkability grid comes from.
#[derive(Debug, Args)]
struct GridSource {
    /// ASCII map file using '.' for walkable and '#' for blocked cells
    #[arg(long, value_name = "FILE", conflicts_with = "layout")]
    map: Option<PathBuf>,

    /// Layout transfer string produced by `export`
    #[arg(long, value_name = "LAYOUT")]
    layout: Option<String>,

    /// Cell edge length used when reading an ASCII map
    #[arg(long, value_name = "UNITS", default_value_t = 1.0)]
    cell_size: f32,
}

#[derive(Debug, Args)]
struct PlanArgs {
    #[command(flatten)]
    grid: GridSource,

    /// Start position as X,Y
    #[arg(long, value_name = "X,Y", value_parser = parse_point, allow_hyphen_values = true)]
    from: Vec2,

    /// Goal position as X,Y
    #[arg(long, value_name = "X,Y", value_parser = parse_point, allow_hyphen_values = true)]
    to: Vec2,

    /// Planner strategy, overriding the config file
    #[arg(long, value_enum)]
    planner: Option<PlannerChoice>,

    /// Print the optimal planner's path before smoothing
    #[arg(long)]
    raw: bool,
}

#[derive(Debug, Args)]
struct ChaseArgs {
    #[command(flatten)]
    grid: GridSource,

    /// Agent start position as X,Y
    #[arg(long, value_name = "X,Y", value_parser = parse_point, allow_hyphen_values = true)]
    from: Vec2,

    /// Target position as X,Y
    #[arg(long, value_name = "X,Y", value_parser = parse_point, allow_hyphen_values = true)]
    to: Vec2,

    /// Planner strategy, overriding the config file
    #[arg(long, value_enum)]
    planner: Option<PlannerChoice>,

    /// Maximum number of ticks to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Tick length in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Caller-owned speed multiplier
    #[arg(long, default_value_t = 1.0)]
    speed_context: f32,

    /// Simulate an injured agent
    #[arg(long)]
    injured: bool,

    /// Print every tick as a JSON line before the summary
    #[arg(long)]
    trace: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PlannerChoice {
    /// A* search with line-of-sight smoothing
    Optimal,
    /// Greedy best-first search with bounded backtracking
    Fallback,
}

impl From<PlannerChoice> for PlannerKind {
    fn from(choice: PlannerChoice) -> Self {
        match choice {
            PlannerChoice::Optimal => PlannerKind::Optimal,
            PlannerChoice::Fallback => PlannerKind::Fallback,
        }
    }
}

#[derive(Debug, Serialize)]
struct PlanReport {
    planner: PlannerKind,
    raw: bool,
    start: Vec2,
    goal: Vec2,
    waypoints: Vec<Vec2>,
    length: f32,
}

#[derive(Debug, Serialize)]
struct TickReport {
    tick: u32,
    position: Vec2,
    velocity: Vec2,
    mode: MovementMode,
    path_index: usize,
    stuck: bool,
}

#[derive(Debug, Serialize)]
struct ChaseReport {
    planner: PlannerKind,
    ticks: u32,
    arrived: bool,
    position: Vec2,
    mode: MovementMode,
    committed: bool,
    stuck: bool,
    facing: f32,
}

/// Entry point for the stealth navigation command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Plan(args) => plan(&config, args),
        Command::Chase(args) => chase(&config, args),
        Command::Export(source) => {
            let grid = source.load()?;
            println!("{}", GridLayout::capture(&grid).encode()?);
            Ok(())
        }
        Command::Show(source) => {
            let grid = source.load()?;
            print!("{}", grid.to_ascii());
            Ok(())
        }
    }
}

fn plan(config: &CliConfig, args: PlanArgs) -> Result<()> {
    let grid = args.grid.load()?;
    let kind = args.planner.map_or(config.planner_kind, PlannerKind::from);
    info!(
        planner = ?kind,
        columns = grid.columns(),
        rows = grid.rows(),
        "planning path"
    );

    let planned = if args.raw {
        if kind != PlannerKind::Optimal {
            bail!("--raw is only available with the optimal planner");
        }
        OptimalPlanner::new(config.planner.clone()).search(&grid, args.from, args.to)
    } else {
        let planner = Planner::new(kind, config.planner.clone());
        planner.find_path(&grid, &GridProbe::new(&grid), args.from, args.to)
    };
    let path = planned.with_context(|| format!("no path from {} to {}", args.from, args.to))?;

    let report = PlanReport {
        planner: kind,
        raw: args.raw,
        start: args.from,
        goal: args.to,
        length: path.length_from(args.from),
        waypoints: path.into_vec(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn chase(config: &CliConfig, args: ChaseArgs) -> Result<()> {
    if !args.dt.is_finite() || args.dt <= 0.0 {
        bail!("--dt must be a positive number of seconds");
    }

    let grid = args.grid.load()?;
    let probe = GridProbe::new(&grid);
    let kind = args.planner.map_or(config.planner_kind, PlannerKind::from);
    let injured = args.injured;
    let mut controller = MovementController::new(
        config.movement.clone(),
        Planner::new(kind, config.planner.clone()),
        move || injured,
    );
    controller.set_speed_context(args.speed_context);

    let mut body = AgentBody::at(args.from);
    let arrival = config.movement.arrival_distance;
    let mut ticks = 0;
    info!(planner = ?kind, from = %args.from, to = %args.to, "starting chase");

    while ticks < args.ticks {
        controller.advance(Surroundings::new(&grid, &probe), &mut body, args.to, args.dt);
        body.integrate(args.dt);
        let _ = controller.update_facing(&body);
        ticks += 1;

        if args.trace {
            let tick = TickReport {
                tick: ticks,
                position: body.position,
                velocity: body.velocity,
                mode: controller.mode(),
                path_index: controller.path_index(),
                stuck: controller.is_stuck_or_hitting_wall(),
            };
            println!("{}", serde_json::to_string(&tick)?);
        }

        if controller.is_settled() || controller.has_arrived_at(&body, args.to, arrival) {
            break;
        }
    }

    let report = ChaseReport {
        planner: kind,
        ticks,
        arrived: controller.has_arrived_at(&body, args.to, arrival),
        position: body.position,
        mode: controller.mode(),
        committed: controller.is_committed(),
        stuck: controller.is_stuck_or_hitting_wall(),
        facing: controller.facing(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

impl GridSource {
    fn load(&self) -> Result<WalkabilityGrid> {
        match (&self.map, &self.layout) {
            (Some(path), _) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("failed to read map file at {}", path.display()))?;
                WalkabilityGrid::from_ascii(&contents, self.cell_size, Vec2::ZERO)
                    .with_context(|| format!("invalid map file at {}", path.display()))
            }
            (None, Some(layout)) => GridLayout::decode(layout)
                .and_then(|layout| layout.to_grid())
                .context("invalid layout string"),
            (None, None) => bail!("either --map or --layout is required"),
        }
    }
}

fn parse_point(value: &str) -> Result<Vec2, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{value}'"))?;
    let x = x
        .trim()
        .parse::<f32>()
        .map_err(|_| format!("invalid x coordinate '{x}'"))?;
    let y = y
        .trim()
        .parse::<f32>()
        .map_err(|_| format!("invalid y coordinate '{y}'"))?;
    if !x.is_finite() || !y.is_finite() {
        return Err(format!("coordinates must be finite, got '{value}'"));
    }
    Ok(Vec2::new(x, y))
}
