#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Simulation driver that runs one level from its first wave to a clear or a defeat.
//!
//! The session owns the authoritative world and the wave scheduler, feeds the
//! scheduler's spawn commands into the world ahead of every tick and decides
//! when the next wave starts or the level resolves.

mod progress;

use std::time::Duration;

use waypoint_defence_core::{
    Command, DefeatCause, Difficulty, Event, GridCell, PathSpec, Playfield, RandomSource,
    SeededRandom, StatTableError, StatTables, WaveMode,
};
use waypoint_defence_system_waves::{WaveConfig, WaveManager};
use waypoint_defence_world::{self as world, query, World, WorldConfig};

pub use progress::{InMemoryProgress, LevelResult, ProgressStore};

const WAVE_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// Largest accepted time scale.
pub const MAX_TIME_SCALE: f32 = 16.0;

/// Everything needed to start a level.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Level to play.
    pub level: u32,
    /// Difficulty providing multipliers and starting resources.
    pub difficulty: Difficulty,
    /// Campaign level or endless map.
    pub mode: WaveMode,
    /// Path polylines of the level layout.
    pub paths: Vec<PathSpec>,
    /// Cells that cannot hold towers besides the ones the paths cross.
    pub blocked: Vec<GridCell>,
    /// Enemy, tower and upgrade definitions.
    pub tables: StatTables,
    /// Bounds used to discard stray projectiles.
    pub playfield: Playfield,
    /// Seed for junction decisions and wave composition.
    pub seed: u64,
    /// Multiplier applied to every step's duration.
    pub time_scale: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            level: 1,
            difficulty: Difficulty::default(),
            mode: WaveMode::default(),
            paths: Vec::new(),
            blocked: Vec::new(),
            tables: StatTables::standard(),
            playfield: Playfield::default(),
            seed: 0,
            time_scale: 1.0,
        }
    }
}

/// Failures raised while starting or configuring a session.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// The stat tables failed validation.
    #[error("stat tables rejected")]
    Tables(#[from] StatTableError),
    /// No path of the layout has enough waypoints to walk.
    #[error("level {level} has no usable path")]
    NoPaths {
        /// Level whose layout was rejected.
        level: u32,
    },
    /// The requested time scale is not positive or exceeds [`MAX_TIME_SCALE`].
    #[error("time scale must be positive and at most {}, got {0}", MAX_TIME_SCALE)]
    TimeScale(f32),
}

/// Resolution state of the level being played.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LevelStatus {
    /// Waves are still running.
    InProgress,
    /// Every wave was survived.
    Cleared,
    /// The level was lost.
    Defeated(DefeatCause),
}

/// Drives the world and wave scheduler through one level.
pub struct Session<P> {
    level: u32,
    difficulty: Difficulty,
    world: World,
    waves: WaveManager,
    wave_random: Box<dyn RandomSource>,
    time_scale: f32,
    paused: bool,
    status: LevelStatus,
    progress: P,
}

impl<P: ProgressStore> Session<P> {
    /// Starts a level whose random decisions derive from the configured seed.
    pub fn new(config: SessionConfig, progress: P) -> Result<Self, SessionError> {
        let world_random = Box::new(SeededRandom::from_seed(config.seed));
        let wave_random = Box::new(SeededRandom::from_seed(config.seed ^ WAVE_STREAM));
        Self::with_random(config, progress, world_random, wave_random)
    }

    /// Starts a level drawing junction decisions from `world_random` and wave
    /// composition from `wave_random`.
    pub fn with_random(
        config: SessionConfig,
        progress: P,
        world_random: Box<dyn RandomSource>,
        wave_random: Box<dyn RandomSource>,
    ) -> Result<Self, SessionError> {
        config.tables.validate()?;
        let time_scale = checked_time_scale(config.time_scale)?;

        let params = config.difficulty.params();
        let world = World::new(
            WorldConfig {
                tables: config.tables.clone(),
                mode: params,
                paths: config.paths,
                blocked: config.blocked,
                playfield: config.playfield,
            },
            world_random,
        );
        let network = query::paths(&world);
        if network.is_empty() {
            return Err(SessionError::NoPaths {
                level: config.level,
            });
        }
        let all_paths: Vec<_> = network.ids().collect();

        let mut wave_config = WaveConfig::new(
            config.level,
            config.mode,
            params.hp_multiplier,
            params.speed_multiplier,
        );
        wave_config.tables = config.tables;
        let waves = WaveManager::new(wave_config, network.entrances(), &all_paths);

        tracing::info!(
            level = config.level,
            difficulty = %config.difficulty,
            mode = %config.mode,
            paths = all_paths.len(),
            "session started"
        );

        Ok(Self {
            level: config.level,
            difficulty: config.difficulty,
            world,
            waves,
            wave_random,
            time_scale,
            paused: false,
            status: LevelStatus::InProgress,
            progress,
        })
    }

    /// Applies a player command such as a tower placement or a powerup.
    ///
    /// Commands submitted after the level resolved are ignored.
    pub fn submit(&mut self, command: Command, out: &mut Vec<Event>) {
        if self.status != LevelStatus::InProgress {
            tracing::debug!(?command, "command ignored after level end");
            return;
        }
        world::apply(&mut self.world, command, out);
        let _ = self.check_defeat();
    }

    /// Advances the level by `dt` of wall time scaled by the time scale.
    ///
    /// The first step starts wave one. Steps are skipped while paused, once
    /// the level resolved, or when the scaled step does not fit a `Duration`.
    pub fn step(&mut self, dt: Duration, out: &mut Vec<Event>) {
        if self.paused || self.status != LevelStatus::InProgress {
            return;
        }
        let Ok(scaled) = Duration::try_from_secs_f32(dt.as_secs_f32() * self.time_scale) else {
            tracing::warn!(?dt, scale = self.time_scale, "step too long to simulate; skipped");
            return;
        };
        if self.waves.wave() == 0 {
            self.waves.start_next_wave(out);
        }

        let mut spawns = Vec::new();
        self.waves
            .update(scaled.as_secs_f32(), self.wave_random.as_mut(), &mut spawns);
        for command in spawns {
            world::apply(&mut self.world, command, out);
        }
        world::apply(&mut self.world, Command::Tick { dt: scaled }, out);

        if self.check_defeat() {
            return;
        }

        let drained = !self.waves.is_active()
            && self.waves.cooldown() <= 0.0
            && query::enemy_count(&self.world) == 0;
        if !drained {
            return;
        }
        match self.waves.max_waves() {
            Some(max) if self.waves.wave() >= max => {
                tracing::info!(
                    level = self.level,
                    kills = query::kills(&self.world),
                    "level cleared"
                );
                self.status = LevelStatus::Cleared;
                out.push(Event::LevelCleared { level: self.level });
                self.record(true);
            }
            _ => self.waves.start_next_wave(out),
        }
    }

    fn check_defeat(&mut self) -> bool {
        if self.status != LevelStatus::InProgress {
            return true;
        }
        let Some(cause) = query::defeat(&self.world) else {
            return false;
        };
        tracing::info!(
            level = self.level,
            wave = self.waves.wave(),
            ?cause,
            "level lost"
        );
        self.status = LevelStatus::Defeated(cause);
        self.record(false);
        true
    }

    fn record(&mut self, cleared: bool) {
        self.progress.record(LevelResult {
            level: self.level,
            difficulty: self.difficulty,
            cleared,
            wave: self.waves.wave(),
            kills: query::kills(&self.world),
            money: query::money(&self.world),
        });
    }

    /// Pauses or resumes the simulation.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Changes the multiplier applied to every step, e.g. `2.0` for fast-forward.
    pub fn set_time_scale(&mut self, scale: f32) -> Result<(), SessionError> {
        self.time_scale = checked_time_scale(scale)?;
        Ok(())
    }

    /// Whether the simulation is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current time scale.
    #[must_use]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Resolution state of the level.
    #[must_use]
    pub fn status(&self) -> LevelStatus {
        self.status
    }

    /// Level being played.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Read access to the world for the `query` functions.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Read access to the wave scheduler.
    #[must_use]
    pub fn waves(&self) -> &WaveManager {
        &self.waves
    }

    /// Store receiving finished level results.
    #[must_use]
    pub fn progress(&self) -> &P {
        &self.progress
    }
}

fn checked_time_scale(scale: f32) -> Result<f32, SessionError> {
    if scale > 0.0 && scale <= MAX_TIME_SCALE {
        Ok(scale)
    } else {
        Err(SessionError::TimeScale(scale))
    }
}
