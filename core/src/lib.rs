#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Waypoint Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that renderers, audio and statistics collaborators observe. Immutable
//! per-type stat tables and the injectable [`RandomSource`] also live here so
//! every crate agrees on the same definitions.

mod random;
mod stats;

use std::{fmt, str::FromStr, time::Duration};

pub use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use random::{RandomSource, ScriptedRandom, SeededRandom};
pub use stats::{
    is_boss_level, waves_in_level, Difficulty, EnemyTypeSpec, ModeParams, PoisonEffect,
    ProjectileProfile, SlowEffect, StatTableError, StatTables, TowerTypeSpec, UpgradeStep, WaveMode,
    BOSS_HP_MULTIPLIER, BOSS_LEVELS, BOSS_REWARD_MULTIPLIER, PERMANENT_MAP_LEVEL, TOTAL_LEVELS,
};

/// Side length of a single square tile measured in pixels.
pub const TILE_SIZE: f32 = 64.0;

/// Number of tile columns in the placement grid.
pub const GRID_COLUMNS: u32 = 15;

/// Number of tile rows in the placement grid.
pub const GRID_ROWS: u32 = 10;

/// Horizontal half-extent of every tower's rectangular engagement envelope.
pub const HORIZONTAL_RANGE: f32 = 4.0 * TILE_SIZE;

/// Base projectile speed in pixels per second before per-type multipliers.
pub const PROJECTILE_SPEED: f32 = 420.0;

/// Fraction of direct damage dealt to enemies caught in a splash.
pub const SPLASH_DAMAGE_FACTOR: f32 = 0.8;

/// Radius around an enemy within which a junction path start is considered.
pub const JUNCTION_RADIUS: f32 = 96.0;

/// Fraction of a tower's base cost returned when it is removed.
pub const SELL_REFUND_RATE: f32 = 0.5;

/// Delay between consecutive spawns inside a wave, in seconds.
pub const SPAWN_GAP: f32 = 0.8;

/// Pause after a wave finishes spawning before the next may start, in seconds.
pub const WAVE_COOLDOWN: f32 = 3.0;

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the projectile identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of a polyline inside a level's path network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathId(u32);

impl PathId {
    /// Creates a new path identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the path identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single placement tile expressed as column and row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    column: u32,
    row: u32,
}

impl GridCell {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Reports whether the cell lies inside the placement grid.
    #[must_use]
    pub const fn in_grid(&self) -> bool {
        self.column < GRID_COLUMNS && self.row < GRID_ROWS
    }

    /// Pixel coordinate of the cell's centre.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.column as f32 * TILE_SIZE + TILE_SIZE / 2.0,
            self.row as f32 * TILE_SIZE + TILE_SIZE / 2.0,
        )
    }

    /// Returns the cell containing the provided pixel coordinate, if any.
    #[must_use]
    pub fn containing(point: Vec2) -> Option<Self> {
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let cell = Self::new(
            (point.x / TILE_SIZE).floor() as u32,
            (point.y / TILE_SIZE).floor() as u32,
        );
        cell.in_grid().then_some(cell)
    }
}

/// Axis-aligned bounds outside of which projectiles are discarded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Playfield {
    width: f32,
    height: f32,
}

impl Playfield {
    /// Creates playfield bounds spanning `[0, width] x [0, height]`.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width of the playfield in pixels.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Height of the playfield in pixels.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Reports whether the point lies inside the inclusive bounds.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }
}

impl Default for Playfield {
    /// Map area plus the side and bottom UI panels, matching the full window.
    fn default() -> Self {
        Self::new(
            GRID_COLUMNS as f32 * TILE_SIZE + 280.0,
            GRID_ROWS as f32 * TILE_SIZE + 100.0,
        )
    }
}

/// Error returned when a string does not name a known kind.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown {category} kind `{name}`")]
pub struct ParseKindError {
    category: &'static str,
    name: String,
}

impl ParseKindError {
    pub(crate) fn new(category: &'static str, name: &str) -> Self {
        Self {
            category,
            name: name.to_owned(),
        }
    }
}

/// Types of enemies that waves may spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Balanced soldier forming the backbone of every wave.
    Normal,
    /// Fragile scout that moves quickly.
    Fast,
    /// Durable heavy that shrugs off half of every slow.
    Tank,
    /// Regenerating commander whose escape ends the level.
    Boss,
}

impl EnemyKind {
    /// Every enemy kind in table order.
    pub const ALL: [EnemyKind; 4] = [Self::Normal, Self::Fast, Self::Tank, Self::Boss];

    /// Position of the kind inside per-kind tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Normal => 0,
            Self::Fast => 1,
            Self::Tank => 2,
            Self::Boss => 3,
        }
    }

    /// Stable string identifier of the kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Fast => "fast",
            Self::Tank => "tank",
            Self::Boss => "boss",
        }
    }

    /// Maximum number of junction reroutes an enemy of this kind may take.
    #[must_use]
    pub const fn max_switches(self) -> u32 {
        match self {
            Self::Tank => 3,
            Self::Normal | Self::Fast | Self::Boss => 2,
        }
    }

    /// Probability of committing to a reroute once a junction is in reach.
    #[must_use]
    pub const fn switch_chance(self) -> f32 {
        match self {
            Self::Tank => 0.8,
            Self::Fast => 0.6,
            Self::Normal | Self::Boss => 0.5,
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EnemyKind {
    type Err = ParseKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == value)
            .ok_or_else(|| ParseKindError::new("enemy", value))
    }
}

/// Types of towers the player can place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Entry-level machine gun.
    Gun,
    /// Long-range, slow-firing marksman.
    Sniper,
    /// Cannon that damages everything around its target.
    Splash,
    /// Frost tower that slows its targets.
    Slow,
    /// Rapid energy beam with short-lived projectiles.
    Laser,
    /// Heavy rocket with a wide blast.
    Rocket,
    /// Tesla coil.
    Electric,
    /// Dart tower applying damage over time.
    Poison,
    /// Very rapid short-range gun.
    Minigun,
    /// Artillery with the widest blast and slowest shells.
    Mortar,
    /// Strong, long-lasting slow.
    Ice,
    /// Flamethrower that sets targets burning.
    Flame,
}

impl TowerKind {
    /// Every tower kind in table order.
    pub const ALL: [TowerKind; 12] = [
        Self::Gun,
        Self::Sniper,
        Self::Splash,
        Self::Slow,
        Self::Laser,
        Self::Rocket,
        Self::Electric,
        Self::Poison,
        Self::Minigun,
        Self::Mortar,
        Self::Ice,
        Self::Flame,
    ];

    /// Position of the kind inside per-kind tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Gun => 0,
            Self::Sniper => 1,
            Self::Splash => 2,
            Self::Slow => 3,
            Self::Laser => 4,
            Self::Rocket => 5,
            Self::Electric => 6,
            Self::Poison => 7,
            Self::Minigun => 8,
            Self::Mortar => 9,
            Self::Ice => 10,
            Self::Flame => 11,
        }
    }

    /// Stable string identifier of the kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gun => "gun",
            Self::Sniper => "sniper",
            Self::Splash => "splash",
            Self::Slow => "slow",
            Self::Laser => "laser",
            Self::Rocket => "rocket",
            Self::Electric => "electric",
            Self::Poison => "poison",
            Self::Minigun => "minigun",
            Self::Mortar => "mortar",
            Self::Ice => "ice",
            Self::Flame => "flame",
        }
    }
}

impl fmt::Display for TowerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TowerKind {
    type Err = ParseKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == value)
            .ok_or_else(|| ParseKindError::new("tower", value))
    }
}

/// Visual family of a projectile. Only rendering and lifetime depend on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProjectileStyle {
    /// Plain bullet used by gun, splash and slow towers.
    Basic,
    /// Sniper round.
    Sniper,
    /// Laser bolt.
    Laser,
    /// Rocket.
    Rocket,
    /// Electric spark.
    Electric,
    /// Poison dart.
    Poison,
    /// Flame burst.
    Flame,
    /// Ice shard.
    Ice,
    /// Minigun tracer.
    Minigun,
    /// Mortar shell.
    Mortar,
}

/// Whether a polyline introduces enemies or serves as a reroute target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    /// Polyline beginning outside the grid, used for spawning.
    Entrance,
    /// Polyline beginning at an interior point, reachable mid-route.
    Junction,
}

/// Polyline supplied by the map provider for a level.
#[derive(Clone, Debug, PartialEq)]
pub struct PathSpec {
    /// Role of the polyline.
    pub kind: PathKind,
    /// Ordered waypoints in pixel coordinates.
    pub waypoints: Vec<Vec2>,
}

impl PathSpec {
    /// Creates a path with an explicit role.
    #[must_use]
    pub fn new(kind: PathKind, waypoints: Vec<Vec2>) -> Self {
        Self { kind, waypoints }
    }

    /// Tags an untagged polyline: it is an entrance when it starts left of the map.
    #[must_use]
    pub fn classify(waypoints: Vec<Vec2>) -> Self {
        let kind = match waypoints.first() {
            Some(start) if start.x < 0.0 => PathKind::Entrance,
            _ => PathKind::Junction,
        };
        Self { kind, waypoints }
    }
}

/// One-shot abilities purchasable during a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Powerup {
    /// Slows every living enemy by half for five seconds.
    Freeze,
    /// Deals heavy damage to every living enemy.
    Airstrike,
}

impl Powerup {
    /// Money required to activate the powerup.
    #[must_use]
    pub const fn cost(self) -> u32 {
        match self {
            Self::Freeze => 500,
            Self::Airstrike => 1000,
        }
    }

    /// Slow applied to every enemy, if any.
    #[must_use]
    pub const fn slow(self) -> Option<SlowEffect> {
        match self {
            Self::Freeze => Some(SlowEffect::new(0.5, 5.0)),
            Self::Airstrike => None,
        }
    }

    /// Damage dealt to every enemy.
    #[must_use]
    pub const fn damage(self) -> f32 {
        match self {
            Self::Freeze => 0.0,
            Self::Airstrike => 120.0,
        }
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances every entity by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Introduces a new enemy at the start of an entrance path.
    SpawnEnemy {
        /// Kind of enemy to create.
        kind: EnemyKind,
        /// Path whose first waypoint becomes the spawn position.
        path: PathId,
        /// Scaled maximum hit points.
        max_hp: f32,
        /// Scaled movement speed in pixels per second.
        speed: f32,
        /// Money awarded when the enemy is killed.
        reward: u32,
    },
    /// Requests placement of a tower on the provided cell.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Cell the tower occupies.
        cell: GridCell,
    },
    /// Requests removal of an existing tower for a partial refund.
    RemoveTower {
        /// Identifier of the tower targeted for removal.
        tower: TowerId,
    },
    /// Requests the next upgrade level for a tower.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
    },
    /// Requests activation of a powerup.
    ActivatePowerup {
        /// Powerup to activate.
        powerup: Powerup,
    },
}

/// Events broadcast by the world and systems after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy entered the map.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Spawn position.
        position: Vec2,
    },
    /// Reports damage applied to a living enemy.
    EnemyDamaged {
        /// Enemy that took damage.
        enemy: EnemyId,
        /// Amount of damage applied.
        amount: f32,
        /// Hit points remaining after the damage, possibly negative.
        hp: f32,
    },
    /// Reports that an enemy switched onto a junction path.
    EnemyRerouted {
        /// Enemy that switched.
        enemy: EnemyId,
        /// Junction path it now follows.
        path: PathId,
        /// Waypoint index it resumes from.
        waypoint: usize,
    },
    /// Reports that an enemy was killed and its reward collected.
    EnemyDied {
        /// Enemy that died.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Position where it died.
        position: Vec2,
        /// Money awarded for the kill.
        reward: u32,
    },
    /// Reports that an enemy walked past its final waypoint.
    EnemyEscaped {
        /// Enemy that escaped.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
    },
    /// Reports that the player lost lives.
    LivesLost {
        /// Number of lives lost.
        lost: u32,
        /// Lives remaining afterwards.
        remaining: u32,
    },
    /// Confirms that a tower was placed.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Kind of the tower.
        kind: TowerKind,
        /// Cell the tower occupies.
        cell: GridCell,
        /// Money spent.
        cost: u32,
    },
    /// Confirms that a tower was removed.
    TowerRemoved {
        /// Identifier of the removed tower.
        tower: TowerId,
        /// Cell the tower previously occupied.
        cell: GridCell,
        /// Money refunded.
        refund: u32,
    },
    /// Confirms that a tower advanced one upgrade level.
    TowerUpgraded {
        /// Identifier of the tower.
        tower: TowerId,
        /// Level reached.
        level: u8,
        /// Money spent.
        cost: u32,
    },
    /// Reports that a placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower requested.
        kind: TowerKind,
        /// Cell provided in the request.
        cell: GridCell,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that an upgrade request was rejected.
    TowerUpgradeRejected {
        /// Identifier of the tower targeted for upgrade.
        tower: TowerId,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Reports that a removal request was rejected.
    TowerRemovalRejected {
        /// Identifier of the tower targeted for removal.
        tower: TowerId,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
    /// Reports that a tower launched a projectile.
    TowerFired {
        /// Tower that fired.
        tower: TowerId,
        /// Projectile that was spawned.
        projectile: ProjectileId,
        /// Enemy the projectile homes onto.
        target: EnemyId,
    },
    /// Reports that a projectile left play.
    ProjectileResolved {
        /// Projectile that was resolved.
        projectile: ProjectileId,
        /// How the projectile ended.
        outcome: ProjectileOutcome,
    },
    /// Confirms that a powerup was activated.
    PowerupActivated {
        /// Powerup that fired.
        powerup: Powerup,
    },
    /// Reports that a powerup could not be afforded.
    PowerupRejected {
        /// Powerup requested.
        powerup: Powerup,
        /// Money required.
        cost: u32,
        /// Money available.
        available: u32,
    },
    /// Announces that a new wave began spawning.
    WaveStarted {
        /// One-based wave number within the level.
        wave: u32,
        /// Whether the wave is a fixed boss composition.
        boss: bool,
    },
    /// Announces that every wave of the level was defeated.
    LevelCleared {
        /// Level that was cleared.
        level: u32,
    },
    /// Announces that the level was lost.
    GameOver {
        /// What ended the level.
        cause: DefeatCause,
    },
}

/// How a projectile left play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProjectileOutcome {
    /// The projectile reached its target and applied its payload.
    Hit {
        /// Enemy that took the direct hit.
        target: EnemyId,
    },
    /// The projectile exceeded its maximum lifetime.
    Expired,
    /// The projectile left the playfield.
    OutOfBounds,
}

/// Reasons a level can be lost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DefeatCause {
    /// Escaping enemies drained every life.
    LivesExhausted,
    /// A boss reached the end of its path.
    BossEscaped,
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested cell lies outside the grid.
    OutOfBounds,
    /// The requested cell is part of an enemy path.
    Blocked,
    /// Another tower already occupies the cell.
    Occupied,
    /// The player cannot afford the tower.
    InsufficientFunds,
}

/// Reasons a tower upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeError {
    /// No tower with the provided identifier exists.
    MissingTower,
    /// The tower already reached its final level.
    MaxLevel,
    /// The player cannot afford the upgrade.
    InsufficientFunds,
}

/// Reasons a tower removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalError {
    /// No tower with the provided identifier exists.
    MissingTower,
}
