#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner that plays one Waypoint Defence level to completion.

mod scenario;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use waypoint_defence_core::{
    Command, Difficulty, Event, WaveMode, PERMANENT_MAP_LEVEL, TOTAL_LEVELS,
};
use waypoint_defence_system_session::{InMemoryProgress, LevelStatus, Session, SessionConfig};
use waypoint_defence_world::query;

use scenario::{Scenario, TowerPlan};

/// Command-line arguments accepted by the runner.
#[derive(Debug, Parser)]
#[command(name = "waypoint-defence", about = "Play a Waypoint Defence level headlessly")]
struct Args {
    /// Level to play; ignored in permanent mode.
    #[arg(long, default_value_t = 1)]
    level: u32,

    /// Difficulty: easy, normal or hard.
    #[arg(long, default_value = "normal")]
    difficulty: Difficulty,

    /// Wave mode: standard or permanent.
    #[arg(long, default_value = "standard")]
    mode: WaveMode,

    /// Seed for wave composition and junction decisions.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// TOML scenario with paths and an opening build; a built-in layout is used otherwise.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Simulated seconds after which the run stops.
    #[arg(long, default_value_t = 600.0)]
    max_seconds: f32,

    /// Simulation steps per simulated second.
    #[arg(long, default_value_t = 60)]
    tick_hz: u32,

    /// Time scale, e.g. 2 for fast-forward; at most 16.
    #[arg(long, default_value_t = 1.0)]
    speed: f32,
}

/// Event tallies reported at the end of a run.
#[derive(Debug, Default)]
struct Summary {
    waves: u32,
    spawned: u32,
    killed: u32,
    escaped: u32,
    shots: u32,
    rejected: u32,
}

impl Summary {
    fn observe(&mut self, event: &Event) {
        match event {
            Event::WaveStarted { wave, boss } => {
                self.waves = *wave;
                if *boss {
                    tracing::info!(wave, "boss wave incoming");
                }
            }
            Event::EnemySpawned { .. } => self.spawned += 1,
            Event::EnemyDied { .. } => self.killed += 1,
            Event::EnemyEscaped { kind, .. } => {
                self.escaped += 1;
                tracing::warn!(kind = %kind, "enemy escaped");
            }
            Event::TowerFired { .. } => self.shots += 1,
            Event::TowerPlacementRejected { kind, cell, reason } => {
                self.rejected += 1;
                tracing::warn!(
                    kind = %kind,
                    column = cell.column(),
                    row = cell.row(),
                    ?reason,
                    "tower placement rejected"
                );
            }
            Event::TowerUpgradeRejected { tower, reason } => {
                self.rejected += 1;
                tracing::warn!(tower = tower.get(), ?reason, "tower upgrade rejected");
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if args.tick_hz == 0 {
        bail!("--tick-hz must be at least 1");
    }
    if !args.max_seconds.is_finite() || args.max_seconds <= 0.0 {
        bail!("--max-seconds must be a positive number of seconds");
    }
    let limit = Duration::try_from_secs_f32(args.max_seconds)
        .with_context(|| format!("--max-seconds {} is too large", args.max_seconds))?;
    let level = match args.mode {
        WaveMode::Permanent => PERMANENT_MAP_LEVEL,
        WaveMode::Standard if (1..=TOTAL_LEVELS).contains(&args.level) => args.level,
        WaveMode::Standard => bail!("--level must be between 1 and {TOTAL_LEVELS}"),
    };

    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::builtin()?,
    };

    let config = SessionConfig {
        level,
        difficulty: args.difficulty,
        mode: args.mode,
        paths: scenario.paths.clone(),
        blocked: scenario.blocked.clone(),
        seed: args.seed,
        time_scale: args.speed,
        ..SessionConfig::default()
    };
    let mut session =
        Session::new(config, InMemoryProgress::new()).context("failed to start session")?;

    let mut summary = Summary::default();
    build_defences(&mut session, &scenario.towers, &mut summary);

    let step = Duration::from_secs_f64(1.0 / f64::from(args.tick_hz));
    let mut events = Vec::new();
    while session.status() == LevelStatus::InProgress && query::elapsed(session.world()) < limit {
        events.clear();
        session.step(step, &mut events);
        for event in &events {
            summary.observe(event);
        }
    }

    report(&session, &summary);
    Ok(())
}

fn build_defences(
    session: &mut Session<InMemoryProgress>,
    towers: &[TowerPlan],
    summary: &mut Summary,
) {
    for plan in towers {
        let mut events = Vec::new();
        session.submit(
            Command::PlaceTower {
                kind: plan.kind,
                cell: plan.cell,
            },
            &mut events,
        );
        let placed = events.iter().find_map(|event| match event {
            Event::TowerPlaced { tower, .. } => Some(*tower),
            _ => None,
        });
        for event in &events {
            summary.observe(event);
        }
        let Some(tower) = placed else {
            continue;
        };

        for _ in 0..plan.upgrades {
            events.clear();
            session.submit(Command::UpgradeTower { tower }, &mut events);
            for event in &events {
                summary.observe(event);
            }
        }
    }
}

fn report(session: &Session<InMemoryProgress>, summary: &Summary) {
    let world = session.world();
    let outcome = match session.status() {
        LevelStatus::InProgress => "stopped".to_owned(),
        LevelStatus::Cleared => "cleared".to_owned(),
        LevelStatus::Defeated(cause) => format!("defeated ({cause:?})"),
    };

    println!("level {}: {outcome}", session.level());
    println!(
        "  simulated {:.1}s over {} wave(s)",
        query::elapsed(world).as_secs_f32(),
        summary.waves
    );
    println!(
        "  enemies: {} spawned, {} killed, {} escaped",
        summary.spawned, summary.killed, summary.escaped
    );
    println!(
        "  towers: {} standing, {} shots fired, {} rejected orders",
        query::tower_view(world).len(),
        summary.shots,
        summary.rejected
    );
    println!(
        "  money {}, lives {}, kills {}",
        query::money(world),
        query::lives(world),
        query::kills(world)
    );
}
