#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduler that sequences spawns within a wave and waves within a level.
//!
//! The scheduler is a pure system: it never touches the world directly and
//! instead emits [`Command::SpawnEnemy`] values for the driver to apply.

use waypoint_defence_core::{
    is_boss_level, waves_in_level, Command, EnemyKind, Event, PathId, RandomSource, StatTables,
    WaveMode, BOSS_HP_MULTIPLIER, BOSS_REWARD_MULTIPLIER, SPAWN_GAP, WAVE_COOLDOWN,
};

const MAX_WAVE_SIZE: u32 = 15;
const FIRST_TANK_LEVEL: u32 = 6;
const MAX_TANKS: u32 = 13;
const PERMANENT_BOSS_INTERVAL: u32 = 5;
const FIRST_FAST_WAVE: u32 = 4;
const FAST_CHANCE: f32 = 0.45;

/// Configuration parameters required to construct the wave scheduler.
#[derive(Clone, Debug)]
pub struct WaveConfig {
    /// Level whose waves are scheduled.
    pub level: u32,
    /// Whether the level is a campaign level or the endless map.
    pub mode: WaveMode,
    /// Difficulty multiplier applied to enemy hit points.
    pub hp_multiplier: f32,
    /// Difficulty multiplier applied to enemy speed.
    pub speed_multiplier: f32,
    /// Seconds between consecutive spawns.
    pub spawn_gap: f32,
    /// Seconds to wait after a wave finished spawning.
    pub cooldown: f32,
    /// Base enemy definitions.
    pub tables: StatTables,
}

impl WaveConfig {
    /// Creates a configuration with the standard pacing for a level.
    #[must_use]
    pub fn new(level: u32, mode: WaveMode, hp_multiplier: f32, speed_multiplier: f32) -> Self {
        Self {
            level,
            mode,
            hp_multiplier,
            speed_multiplier,
            spawn_gap: SPAWN_GAP,
            cooldown: WAVE_COOLDOWN,
            tables: StatTables::standard(),
        }
    }
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self::new(1, WaveMode::Standard, 1.0, 1.0)
    }
}

/// Coarse lifecycle of the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WavePhase {
    /// No wave has been started yet.
    Idle,
    /// The current wave is still emitting spawns.
    Spawning,
    /// The current wave finished spawning; waiting for the cooldown and the field to clear.
    Draining,
}

/// Number of enemies in a regular wave.
#[must_use]
pub fn wave_size(wave: u32) -> u32 {
    (2 + wave.saturating_sub(1)).min(MAX_WAVE_SIZE)
}

/// Fixed composition of a boss wave, boss first.
#[must_use]
pub fn boss_group(level: u32) -> Vec<EnemyKind> {
    if level == 3 {
        vec![EnemyKind::Boss, EnemyKind::Normal]
    } else {
        vec![EnemyKind::Boss, EnemyKind::Normal, EnemyKind::Fast]
    }
}

/// Waves of a level whose first spawn is a guaranteed tank.
///
/// Tanks are spread evenly across the level, rounding each slot up.
#[must_use]
pub fn tank_schedule(level: u32) -> Vec<u32> {
    if level < FIRST_TANK_LEVEL {
        return Vec::new();
    }
    let tanks = (level - 2).min(MAX_TANKS);
    let waves = waves_in_level(level);
    if tanks >= waves {
        return (1..=waves).collect();
    }
    (1..=tanks)
        .map(|slot| (slot * waves).div_ceil(tanks))
        .collect()
}

/// State machine sequencing enemy spawns for one level.
#[derive(Debug)]
pub struct WaveManager {
    config: WaveConfig,
    entrances: Vec<PathId>,
    all_paths: Vec<PathId>,
    wave: u32,
    enemies_left: u32,
    spawn_timer: f32,
    cooldown: f32,
    active: bool,
    boss_group: Option<Vec<EnemyKind>>,
    tank_waves: Option<Vec<u32>>,
    tank_wave: bool,
    hp_scale: f32,
    speed_scale: f32,
    spawned: u64,
}

impl WaveManager {
    /// Creates an idle scheduler spawning on `entrances`, or on any of `all_paths` when
    /// the level has no entrance.
    #[must_use]
    pub fn new(config: WaveConfig, entrances: &[PathId], all_paths: &[PathId]) -> Self {
        Self {
            config,
            entrances: entrances.to_vec(),
            all_paths: all_paths.to_vec(),
            wave: 0,
            enemies_left: 0,
            spawn_timer: 0.0,
            cooldown: 0.0,
            active: false,
            boss_group: None,
            tank_waves: None,
            tank_wave: false,
            hp_scale: 1.0,
            speed_scale: 1.0,
            spawned: 0,
        }
    }

    /// Begins the next wave and announces it.
    pub fn start_next_wave(&mut self, out: &mut Vec<Event>) {
        self.wave += 1;
        let wave = self.wave;
        let level = self.config.level;

        let boss = match self.config.mode {
            WaveMode::Permanent => wave % PERMANENT_BOSS_INTERVAL == 0,
            WaveMode::Standard => is_boss_level(level) && wave == waves_in_level(level),
        };

        let tank_waves = self.tank_waves.get_or_insert_with(|| tank_schedule(level));
        self.tank_wave = tank_waves.contains(&wave);

        if boss {
            let group = boss_group(level);
            self.enemies_left = group.len() as u32;
            self.boss_group = Some(group);
        } else {
            self.boss_group = None;
            self.enemies_left = wave_size(wave);
        }

        self.spawn_timer = 0.0;
        self.active = true;
        self.hp_scale = (1.0 + 0.2 * (wave - 1) as f32) * self.config.hp_multiplier;
        self.speed_scale = match self.config.mode {
            WaveMode::Permanent if wave < 5 => self.config.speed_multiplier,
            WaveMode::Permanent => (1.0 + 0.12 * (wave - 4) as f32) * self.config.speed_multiplier,
            WaveMode::Standard => (1.0 + 0.05 * (wave - 1) as f32) * self.config.speed_multiplier,
        };

        tracing::info!(
            level,
            wave,
            boss,
            tank_wave = self.tank_wave,
            enemies = self.enemies_left,
            "wave started"
        );
        out.push(Event::WaveStarted { wave, boss });
    }

    /// Advances the spawn countdown and emits any spawn that became due.
    pub fn update(&mut self, dt: f32, random: &mut dyn RandomSource, out: &mut Vec<Command>) {
        if !self.active {
            self.cooldown = (self.cooldown - dt).max(0.0);
            return;
        }
        if self.enemies_left == 0 {
            self.active = false;
            self.cooldown = self.config.cooldown;
            return;
        }

        self.spawn_timer -= dt;
        if self.spawn_timer > 0.0 {
            return;
        }
        self.spawn_timer = self.config.spawn_gap;
        self.enemies_left -= 1;

        let kind = self.pick_kind(random);
        let spec = self.config.tables.enemy(kind);
        let (max_hp, reward) = if kind == EnemyKind::Boss {
            (
                spec.max_hp * BOSS_HP_MULTIPLIER * self.hp_scale,
                spec.reward * BOSS_REWARD_MULTIPLIER,
            )
        } else {
            (spec.max_hp * self.hp_scale, spec.reward)
        };
        let speed = spec.speed * self.speed_scale;

        let Some(path) = self.pick_path(random) else {
            tracing::warn!(kind = %kind, "no path available for spawn");
            return;
        };
        tracing::debug!(wave = self.wave, kind = %kind, path = path.get(), "spawn due");
        out.push(Command::SpawnEnemy {
            kind,
            path,
            max_hp,
            speed,
            reward,
        });
    }

    fn pick_kind(&self, random: &mut dyn RandomSource) -> EnemyKind {
        if let Some(group) = &self.boss_group {
            let left = self.enemies_left as usize;
            if left < group.len() {
                return group[group.len() - 1 - left];
            }
        }

        if self.tank_wave && wave_size(self.wave) - self.enemies_left - 1 == 0 {
            return EnemyKind::Tank;
        }

        let roll = random.next_unit();
        if self.wave >= FIRST_FAST_WAVE && roll < FAST_CHANCE {
            EnemyKind::Fast
        } else {
            EnemyKind::Normal
        }
    }

    fn pick_path(&mut self, random: &mut dyn RandomSource) -> Option<PathId> {
        if self.entrances.is_empty() {
            if self.all_paths.is_empty() {
                return None;
            }
            return Some(self.all_paths[random.next_index(self.all_paths.len())]);
        }
        let index = (self.spawned % self.entrances.len() as u64) as usize;
        self.spawned += 1;
        Some(self.entrances[index])
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> WavePhase {
        if self.active {
            WavePhase::Spawning
        } else if self.wave == 0 {
            WavePhase::Idle
        } else {
            WavePhase::Draining
        }
    }

    /// One-based number of the current wave, zero before the first.
    #[must_use]
    pub fn wave(&self) -> u32 {
        self.wave
    }

    /// Waves the level consists of, or `None` for the endless map.
    #[must_use]
    pub fn max_waves(&self) -> Option<u32> {
        match self.config.mode {
            WaveMode::Standard => Some(waves_in_level(self.config.level)),
            WaveMode::Permanent => None,
        }
    }

    /// Whether the current wave is still emitting spawns.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Seconds left before the next wave may start.
    #[must_use]
    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    /// Whether the scheduler is waiting out the pause between waves.
    #[must_use]
    pub fn is_between_waves(&self) -> bool {
        !self.active && self.cooldown > 0.0
    }

    /// Spawns still due in the current wave.
    #[must_use]
    pub fn enemies_left(&self) -> u32 {
        self.enemies_left
    }

    /// Whether the current wave is a boss wave.
    #[must_use]
    pub fn is_boss_wave(&self) -> bool {
        self.boss_group.is_some()
    }

    /// Whether the current wave opens with a guaranteed tank.
    #[must_use]
    pub fn is_tank_wave(&self) -> bool {
        self.tank_wave
    }

    /// Tank waves of the level, known once the first wave started.
    #[must_use]
    pub fn tank_waves(&self) -> &[u32] {
        self.tank_waves.as_deref().unwrap_or(&[])
    }

    /// Hit point scale applied to the current wave.
    #[must_use]
    pub fn hp_scale(&self) -> f32 {
        self.hp_scale
    }

    /// Speed scale applied to the current wave.
    #[must_use]
    pub fn speed_scale(&self) -> f32 {
        self.speed_scale
    }
}
