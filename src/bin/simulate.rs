use clap::Parser;
use dino_sim::config::SimConfig;
use dino_sim::engine::SimEngine;
use dino_sim::error::{SimError, SimResult};
use dino_sim::hooks::EventLog;
use dino_sim::rng::Rng;
use dino_sim::scheduler::{self, TickControl};
use dino_sim::terrain::{Terrain, TerrainGrid};
use dino_sim::types::{SimEvent, Vec2};
use serde::Serialize;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_MAP: &str = include_str!("../../maps/default.map");

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless creature behaviour simulation")]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    #[arg(long)]
    population: Option<usize>,
    #[arg(long)]
    map: Option<PathBuf>,
    #[arg(long)]
    realtime: bool,
    #[arg(long)]
    tick_ms: Option<u64>,
    #[arg(long)]
    log_json: bool,
    #[arg(long)]
    no_player: bool,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Serialize)]
struct RunSummary {
    seed: u32,
    ticks: u64,
    captures: u32,
    deaths: u32,
    disturbances: u32,
    alive: usize,
    anomalies: Vec<String>,
    started_at: String,
}

struct RunTracker {
    log: EventLog,
    pilot: Rng,
    summary: RunSummary,
    anomaly_seen: HashSet<String>,
}

impl RunTracker {
    fn new(log: EventLog, seed: u32) -> Self {
        Self {
            log,
            pilot: Rng::new(seed ^ 0x9e37_79b9),
            summary: RunSummary {
                seed,
                started_at: chrono::Utc::now().to_rfc3339(),
                ..RunSummary::default()
            },
            anomaly_seen: HashSet::new(),
        }
    }

    fn steer<T: Terrain>(&mut self, engine: &mut SimEngine<T>) {
        if engine.player_alive() && self.pilot.bool(0.5) {
            engine.press(self.pilot.direction());
        }
    }

    fn after_tick<T: Terrain>(&mut self, engine: &mut SimEngine<T>) {
        self.summary.ticks = engine.tick();
        for event in self.log.drain() {
            match event {
                SimEvent::Captured { .. } => self.summary.captures += 1,
                SimEvent::Disturbed { .. } => self.summary.disturbances += 1,
                SimEvent::PlayerDied { cause } => info!(?cause, tick = engine.tick(), "player lost"),
                SimEvent::PlayerLevelUp { .. } | SimEvent::ActorBurned { .. } => {}
            }
        }
        for message in engine.check_invariants() {
            if self.anomaly_seen.insert(message.clone()) {
                self.summary
                    .anomalies
                    .push(format!("tick {}: {message}", engine.tick()));
            }
        }
        self.steer(engine);
    }

    fn finish<T: Terrain>(mut self, engine: &SimEngine<T>) -> RunSummary {
        self.summary.alive = engine.alive_count();
        self.summary.deaths = (engine.actors().len() - self.summary.alive) as u32;
        self.summary
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let summary = match run(&cli) {
        Ok(summary) => summary,
        Err(err) => {
            error!(%err, "simulation setup failed");
            std::process::exit(2);
        }
    };

    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(err) = write_summary(path, &summary) {
            error!(path = %path.display(), %err, "summary write failed");
            std::process::exit(2);
        }
    }

    match serde_json::to_string(&summary) {
        Ok(line) => println!("{line}"),
        Err(err) => error!(%err, "summary serialization failed"),
    }

    if !summary.anomalies.is_empty() {
        warn!(count = summary.anomalies.len(), "anomalies detected");
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn resolve_config(cli: &Cli) -> SimResult<SimConfig> {
    let mut config = match cli.config.as_deref() {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(count) = cli.population {
        config.population.count = count;
    }
    if let Some(tick_ms) = cli.tick_ms {
        config.tick.tick_ms = tick_ms;
    }
    Ok(config)
}

fn load_map(path: Option<&Path>) -> SimResult<TerrainGrid> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            TerrainGrid::parse(&text)
        }
        None => TerrainGrid::parse(DEFAULT_MAP),
    }
}

fn build_engine(cli: &Cli, seed: u32, log: &EventLog) -> SimResult<SimEngine> {
    let config = resolve_config(cli)?;
    let terrain = load_map(cli.map.as_deref())?;
    let population = config.population.count;
    let mut engine = SimEngine::new(config, terrain, seed).with_hooks(log.clone());
    if !cli.no_player {
        let centre = Vec2::new(engine.terrain().width() / 2, engine.terrain().height() / 2);
        let spot = free_cell_near(&engine, centre)
            .ok_or_else(|| SimError::InvalidMap("no free cell for the player".to_string()))?;
        engine.spawn_player(spot)?;
    }
    engine.seed_population(population);
    Ok(engine)
}

fn free_cell_near<T: Terrain>(engine: &SimEngine<T>, centre: Vec2) -> Option<Vec2> {
    let terrain = engine.terrain();
    let mut cells: Vec<Vec2> = (0..terrain.height())
        .flat_map(|y| (0..terrain.width()).map(move |x| Vec2::new(x, y)))
        .filter(|cell| {
            let kind = terrain.terrain_at(cell.x, cell.y);
            kind.is_passable() && !kind.is_hazard() && engine.spatial().at(*cell).is_none()
        })
        .collect();
    cells.sort_by_key(|cell| (cell.dist2(centre), *cell));
    cells.first().copied()
}

fn run(cli: &Cli) -> SimResult<RunSummary> {
    let seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    let log = EventLog::new();
    let mut engine = build_engine(cli, seed, &log)?;
    let mut tracker = RunTracker::new(log, seed);
    info!(
        seed,
        ticks = cli.ticks,
        actors = engine.actors().len(),
        realtime = cli.realtime,
        "simulation started"
    );
    tracker.steer(&mut engine);

    if cli.realtime {
        let tick_ms = engine.config.tick.tick_ms;
        let runtime = tokio::runtime::Runtime::new()?;
        let shared = Mutex::new(engine);
        let control = TickControl::new(tick_ms);
        runtime.block_on(scheduler::run(&shared, &control, Some(cli.ticks), |engine| {
            tracker.after_tick(engine)
        }));
        let engine = shared.into_inner();
        return Ok(tracker.finish(&engine));
    }

    for _ in 0..cli.ticks {
        engine.step();
        tracker.after_tick(&mut engine);
    }
    let summary = tracker.finish(&engine);
    info!(
        ticks = summary.ticks,
        captures = summary.captures,
        alive = summary.alive,
        "simulation finished"
    );
    Ok(summary)
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, text)
}
