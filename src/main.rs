use std::{io, path::PathBuf};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use civsim::{
    engine::{EngineBuilder, EngineSettings},
    render::{JsonPresenter, NullPresenter, Presenter, TextPresenter},
    scenario::{Scenario, ScenarioLoader},
    scheduler::{Cadence, SystemClock, TickScheduler},
    systems::{MovementSystem, RegrowthSystem},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Output {
    Text,
    Json,
    None,
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Grid civilization random-walk simulator")]
struct Cli {
    /// Path to a scenario YAML file (built-in frontier scenario when omitted)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the grid edge length (10..=100, multiple of 10)
    #[arg(long)]
    grid_size: Option<usize>,

    /// Override the number of agents
    #[arg(long)]
    agents: Option<usize>,

    /// Stop after this many ticks (runs until killed when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the nominal tick interval in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Override the tick spacing policy
    #[arg(long, value_enum)]
    cadence: Option<Cadence>,

    /// Frame output format
    #[arg(long, value_enum, default_value_t = Output::Text)]
    output: Output,

    /// Let empty tiles regrow resources each tick
    #[arg(long)]
    regrowth: bool,
}

impl Cli {
    fn apply(&self, scenario: &mut Scenario) {
        if let Some(seed) = self.seed {
            scenario.seed = seed;
        }
        if let Some(size) = self.grid_size {
            scenario.grid_size = size;
        }
        if let Some(agents) = self.agents {
            scenario.agents = agents;
        }
        if let Some(ms) = self.tick_ms {
            scenario.tick_interval_ms = ms;
        }
        if let Some(cadence) = self.cadence {
            scenario.cadence = cadence;
        }
        if self.regrowth {
            scenario.regrowth_enabled = true;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut scenario = match &cli.scenario {
        Some(path) => ScenarioLoader::new(".").load(path)?,
        None => Scenario::frontier(),
    };
    cli.apply(&mut scenario);
    scenario.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&scenario.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
    };
    let mut builder = EngineBuilder::new(settings).with_system(MovementSystem::new());
    if scenario.regrowth_enabled {
        builder.push_system(RegrowthSystem::new());
    } else {
        tracing::warn!("tile regrowth is disabled; harvested tiles will stay empty");
    }
    let mut engine = builder.build();
    let mut world = scenario.build_world(engine.rng_mut());
    tracing::info!(
        scenario = %scenario.name,
        seed = scenario.seed,
        grid_size = world.size(),
        agents = world.agents().len(),
        factions = world.factions().len(),
        systems = ?engine.system_names(),
        "world created"
    );

    let mut presenter: Box<dyn Presenter> = match cli.output {
        Output::Text => Box::new(TextPresenter::new(io::stdout().lock())),
        Output::Json => Box::new(JsonPresenter::new(io::stdout().lock())),
        Output::None => Box::new(NullPresenter),
    };
    let mut scheduler = TickScheduler::new(scenario.tick_interval(), scenario.cadence, SystemClock);
    let ticks = engine.run_paced(
        &mut world,
        &mut scheduler,
        scenario.ticks(cli.ticks),
        presenter.as_mut(),
    )?;

    tracing::info!(
        ticks,
        average_tick = ?scheduler.average_tick_time(),
        log_entries = world.action_log().total(),
        "simulation finished"
    );
    Ok(())
}
