//! Immutable per-type stat tables, difficulty modes and level pacing.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{EnemyKind, ParseKindError, ProjectileStyle, TowerKind, TILE_SIZE};

/// Number of hand-authored levels in the campaign.
pub const TOTAL_LEVELS: u32 = 15;

/// Level identifier reserved for the endless map.
pub const PERMANENT_MAP_LEVEL: u32 = 999;

/// Levels whose final wave is a fixed boss composition.
pub const BOSS_LEVELS: [u32; 7] = [3, 5, 7, 9, 11, 13, 15];

/// Hit point multiplier applied to boss enemies on spawn.
pub const BOSS_HP_MULTIPLIER: f32 = 4.0;

/// Reward multiplier applied to boss enemies on spawn.
pub const BOSS_REWARD_MULTIPLIER: u32 = 2;

/// Number of waves a level consists of.
#[must_use]
pub const fn waves_in_level(level: u32) -> u32 {
    if level <= TOTAL_LEVELS {
        level
    } else {
        TOTAL_LEVELS + (level - TOTAL_LEVELS) / 5
    }
}

/// Reports whether the level ends with a boss wave.
#[must_use]
pub fn is_boss_level(level: u32) -> bool {
    BOSS_LEVELS.contains(&level)
}

/// Slow applied on hit: movement speed is multiplied for a duration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlowEffect {
    multiplier: f32,
    duration: f32,
}

impl SlowEffect {
    /// Creates a slow scaling speed by `multiplier` for `duration` seconds.
    #[must_use]
    pub const fn new(multiplier: f32, duration: f32) -> Self {
        Self {
            multiplier,
            duration,
        }
    }

    /// Speed multiplier while the slow is active.
    #[must_use]
    pub const fn multiplier(&self) -> f32 {
        self.multiplier
    }

    /// Duration of the slow in seconds.
    #[must_use]
    pub const fn duration(&self) -> f32 {
        self.duration
    }
}

/// Damage over time applied on hit, ticking once per second.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoisonEffect {
    damage: f32,
    duration: f32,
}

impl PoisonEffect {
    /// Creates a poison dealing `damage` each second for `duration` seconds.
    #[must_use]
    pub const fn new(damage: f32, duration: f32) -> Self {
        Self { damage, duration }
    }

    /// Damage dealt on every one-second tick.
    #[must_use]
    pub const fn damage(&self) -> f32 {
        self.damage
    }

    /// Duration of the poison in seconds.
    #[must_use]
    pub const fn duration(&self) -> f32 {
        self.duration
    }
}

/// Flight characteristics of the projectiles a tower type launches.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileProfile {
    /// Visual family of the projectile.
    pub style: ProjectileStyle,
    /// Multiplier applied to the base projectile speed.
    pub speed_multiplier: f32,
    /// Seconds the projectile may fly before it expires.
    pub max_lifetime: f32,
}

impl ProjectileProfile {
    const fn new(style: ProjectileStyle, speed_multiplier: f32, max_lifetime: f32) -> Self {
        Self {
            style,
            speed_multiplier,
            max_lifetime,
        }
    }
}

/// Immutable definition of an enemy type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyTypeSpec {
    /// Base hit points before wave and mode scaling.
    pub max_hp: f32,
    /// Base speed in pixels per second before scaling.
    pub speed: f32,
    /// Money awarded for a kill.
    pub reward: u32,
    /// Display size multiplier.
    pub size: f32,
    /// Fraction by which incoming slows are dampened.
    pub slow_resist: f32,
    /// Hit points regenerated per second.
    pub regen: f32,
}

/// Immutable definition of a tower type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerTypeSpec {
    /// Money required to build the tower.
    pub cost: u32,
    /// Vertical half-extent of the engagement envelope in pixels.
    pub range: f32,
    /// Shots per second.
    pub fire_rate: f32,
    /// Damage dealt by a direct hit.
    pub damage: f32,
    /// Radius of the splash around the target, zero when absent.
    pub splash_radius: f32,
    /// Slow carried by each projectile.
    pub slow: Option<SlowEffect>,
    /// Damage over time carried by each projectile.
    pub poison: Option<PoisonEffect>,
    /// Projectile flight characteristics.
    pub projectile: ProjectileProfile,
}

/// Multipliers and price of one upgrade level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpgradeStep {
    /// Money required to buy the upgrade.
    pub cost: u32,
    /// Factor applied to range, truncated to whole pixels.
    pub range_factor: f32,
    /// Factor applied to fire rate.
    pub fire_rate_factor: f32,
    /// Factor applied to damage, truncated to whole points.
    pub damage_factor: f32,
}

/// Failure raised when a stat table holds values the simulation cannot run with.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum StatTableError {
    /// An enemy definition holds an invalid value.
    #[error("enemy `{kind}` has invalid {field}: {value}")]
    Enemy {
        /// Offending enemy type.
        kind: EnemyKind,
        /// Name of the invalid field.
        field: &'static str,
        /// Value found in the table.
        value: f32,
    },
    /// A tower definition holds an invalid value.
    #[error("tower `{kind}` has invalid {field}: {value}")]
    Tower {
        /// Offending tower type.
        kind: TowerKind,
        /// Name of the invalid field.
        field: &'static str,
        /// Value found in the table.
        value: f32,
    },
    /// An upgrade step holds an invalid value.
    #[error("upgrade to level {level} has invalid {field}: {value}")]
    Upgrade {
        /// Level the step upgrades to.
        level: u8,
        /// Name of the invalid field.
        field: &'static str,
        /// Value found in the table.
        value: f32,
    },
}

/// Strongly typed lookup of every enemy, tower and upgrade definition.
#[derive(Clone, Debug, PartialEq)]
pub struct StatTables {
    enemies: [EnemyTypeSpec; 4],
    towers: [TowerTypeSpec; 12],
    upgrades: [UpgradeStep; 2],
}

impl StatTables {
    /// Balancing shipped with the game.
    #[must_use]
    pub fn standard() -> Self {
        let enemy = |max_hp, speed, reward, size, slow_resist, regen| EnemyTypeSpec {
            max_hp,
            speed,
            reward,
            size,
            slow_resist,
            regen,
        };
        let tower = |cost, range, fire_rate, damage, projectile| TowerTypeSpec {
            cost,
            range,
            fire_rate,
            damage,
            splash_radius: 0.0,
            slow: None,
            poison: None,
            projectile,
        };
        let step = |cost| UpgradeStep {
            cost,
            range_factor: 1.15,
            fire_rate_factor: 1.25,
            damage_factor: 1.4,
        };

        Self {
            enemies: [
                enemy(100.0, 60.0, 22, 1.0, 0.0, 0.0),
                enemy(50.0, 150.0, 15, 0.8, 0.0, 0.0),
                enemy(300.0, 40.0, 45, 1.3, 0.5, 0.0),
                enemy(600.0, 45.0, 120, 1.6, 0.0, 5.0),
            ],
            towers: [
                tower(
                    120,
                    2.0 * TILE_SIZE,
                    1.2,
                    18.0,
                    ProjectileProfile::new(ProjectileStyle::Basic, 1.0, 3.0),
                ),
                tower(
                    200,
                    8.0 * TILE_SIZE,
                    0.4,
                    85.0,
                    ProjectileProfile::new(ProjectileStyle::Sniper, 1.1, 3.0),
                ),
                TowerTypeSpec {
                    splash_radius: 75.0,
                    ..tower(
                        250,
                        2.0 * TILE_SIZE,
                        0.6,
                        25.0,
                        ProjectileProfile::new(ProjectileStyle::Basic, 1.0, 3.0),
                    )
                },
                TowerTypeSpec {
                    slow: Some(SlowEffect::new(0.5, 3.0)),
                    ..tower(
                        180,
                        2.0 * TILE_SIZE,
                        0.8,
                        12.0,
                        ProjectileProfile::new(ProjectileStyle::Basic, 1.0, 3.0),
                    )
                },
                tower(
                    400,
                    2.6 * TILE_SIZE,
                    2.5,
                    22.0,
                    ProjectileProfile::new(ProjectileStyle::Laser, 2.0, 1.5),
                ),
                TowerTypeSpec {
                    splash_radius: 100.0,
                    ..tower(
                        600,
                        3.2 * TILE_SIZE,
                        0.35,
                        120.0,
                        ProjectileProfile::new(ProjectileStyle::Rocket, 0.7, 4.0),
                    )
                },
                tower(
                    350,
                    1.8 * TILE_SIZE,
                    0.9,
                    45.0,
                    ProjectileProfile::new(ProjectileStyle::Electric, 1.3, 3.0),
                ),
                TowerTypeSpec {
                    poison: Some(PoisonEffect::new(12.0, 5.0)),
                    ..tower(
                        280,
                        2.4 * TILE_SIZE,
                        0.7,
                        5.0,
                        ProjectileProfile::new(ProjectileStyle::Poison, 0.9, 3.0),
                    )
                },
                tower(
                    500,
                    1.6 * TILE_SIZE,
                    2.0,
                    15.0,
                    ProjectileProfile::new(ProjectileStyle::Minigun, 1.4, 3.0),
                ),
                TowerTypeSpec {
                    splash_radius: 120.0,
                    ..tower(
                        800,
                        4.4 * TILE_SIZE,
                        0.3,
                        100.0,
                        ProjectileProfile::new(ProjectileStyle::Mortar, 0.5, 5.0),
                    )
                },
                TowerTypeSpec {
                    slow: Some(SlowEffect::new(0.75, 5.0)),
                    ..tower(
                        450,
                        2.2 * TILE_SIZE,
                        0.5,
                        30.0,
                        ProjectileProfile::new(ProjectileStyle::Ice, 0.8, 3.0),
                    )
                },
                TowerTypeSpec {
                    poison: Some(PoisonEffect::new(5.0, 3.0)),
                    ..tower(
                        320,
                        1.4 * TILE_SIZE,
                        1.8,
                        12.0,
                        ProjectileProfile::new(ProjectileStyle::Flame, 1.1, 3.0),
                    )
                },
            ],
            upgrades: [step(120), step(180)],
        }
    }

    /// Definition of the provided enemy type.
    #[must_use]
    pub fn enemy(&self, kind: EnemyKind) -> &EnemyTypeSpec {
        &self.enemies[kind.index()]
    }

    /// Definition of the provided tower type.
    #[must_use]
    pub fn tower(&self, kind: TowerKind) -> &TowerTypeSpec {
        &self.towers[kind.index()]
    }

    /// Upgrade that takes a tower from `current_level` to the next level.
    #[must_use]
    pub fn upgrade(&self, current_level: u8) -> Option<&UpgradeStep> {
        usize::from(current_level)
            .checked_sub(1)
            .and_then(|index| self.upgrades.get(index))
    }

    /// Highest level a tower can reach.
    #[must_use]
    pub fn max_level(&self) -> u8 {
        self.upgrades.len() as u8 + 1
    }

    /// Replaces the definition of an enemy type.
    #[must_use]
    pub fn with_enemy(mut self, kind: EnemyKind, spec: EnemyTypeSpec) -> Self {
        self.enemies[kind.index()] = spec;
        self
    }

    /// Replaces the definition of a tower type.
    #[must_use]
    pub fn with_tower(mut self, kind: TowerKind, spec: TowerTypeSpec) -> Self {
        self.towers[kind.index()] = spec;
        self
    }

    /// Checks every definition once so the tick path can trust the tables.
    pub fn validate(&self) -> Result<(), StatTableError> {
        for kind in EnemyKind::ALL {
            let spec = self.enemy(kind);
            let check = |valid: bool, field: &'static str, value: f32| {
                if valid {
                    Ok(())
                } else {
                    Err(StatTableError::Enemy { kind, field, value })
                }
            };
            check(spec.max_hp > 0.0, "max hp", spec.max_hp)?;
            check(spec.speed >= 0.0, "speed", spec.speed)?;
            check(
                (0.0..=1.0).contains(&spec.slow_resist),
                "slow resistance",
                spec.slow_resist,
            )?;
            check(spec.regen >= 0.0, "regeneration", spec.regen)?;
        }

        for kind in TowerKind::ALL {
            let spec = self.tower(kind);
            let check = |valid: bool, field: &'static str, value: f32| {
                if valid {
                    Ok(())
                } else {
                    Err(StatTableError::Tower { kind, field, value })
                }
            };
            check(spec.range > 0.0, "range", spec.range)?;
            check(spec.fire_rate > 0.0, "fire rate", spec.fire_rate)?;
            check(spec.damage >= 0.0, "damage", spec.damage)?;
            check(spec.splash_radius >= 0.0, "splash radius", spec.splash_radius)?;
            if let Some(slow) = spec.slow {
                check(
                    slow.multiplier() > 0.0 && slow.multiplier() <= 1.0,
                    "slow multiplier",
                    slow.multiplier(),
                )?;
                check(slow.duration() >= 0.0, "slow duration", slow.duration())?;
            }
            if let Some(poison) = spec.poison {
                check(poison.damage() >= 0.0, "poison damage", poison.damage())?;
                check(poison.duration() >= 0.0, "poison duration", poison.duration())?;
            }
            check(
                spec.projectile.speed_multiplier > 0.0,
                "projectile speed multiplier",
                spec.projectile.speed_multiplier,
            )?;
            check(
                spec.projectile.max_lifetime > 0.0,
                "projectile lifetime",
                spec.projectile.max_lifetime,
            )?;
        }

        for (index, step) in self.upgrades.iter().enumerate() {
            let level = index as u8 + 2;
            let check = |valid: bool, field: &'static str, value: f32| {
                if valid {
                    Ok(())
                } else {
                    Err(StatTableError::Upgrade {
                        level,
                        field,
                        value,
                    })
                }
            };
            check(step.range_factor >= 1.0, "range factor", step.range_factor)?;
            check(
                step.fire_rate_factor >= 1.0,
                "fire rate factor",
                step.fire_rate_factor,
            )?;
            check(step.damage_factor >= 1.0, "damage factor", step.damage_factor)?;
        }

        Ok(())
    }
}

impl Default for StatTables {
    fn default() -> Self {
        Self::standard()
    }
}

/// Difficulty selected for a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Weaker, slower enemies with extra money and lives.
    Easy,
    /// Baseline balancing.
    #[default]
    Normal,
    /// Tougher, faster enemies and a single life.
    Hard,
}

/// Numbers a difficulty mode feeds into the simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModeParams {
    /// Multiplier applied to every enemy's hit points.
    pub hp_multiplier: f32,
    /// Multiplier applied to every enemy's speed.
    pub speed_multiplier: f32,
    /// Money available at the start of a level.
    pub starting_money: u32,
    /// Lives available at the start of a level.
    pub starting_lives: u32,
}

impl Difficulty {
    /// Every difficulty from easiest to hardest.
    pub const ALL: [Difficulty; 3] = [Self::Easy, Self::Normal, Self::Hard];

    /// Stable string identifier of the difficulty.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
        }
    }

    /// Balancing parameters of the difficulty.
    #[must_use]
    pub const fn params(self) -> ModeParams {
        match self {
            Self::Easy => ModeParams {
                hp_multiplier: 0.85,
                speed_multiplier: 0.95,
                starting_money: 10_100,
                starting_lives: 10,
            },
            Self::Normal => ModeParams {
                hp_multiplier: 1.0,
                speed_multiplier: 1.0,
                starting_money: 10_000,
                starting_lives: 5,
            },
            Self::Hard => ModeParams {
                hp_multiplier: 1.3,
                speed_multiplier: 1.15,
                starting_money: 9_700,
                starting_lives: 1,
            },
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = ParseKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.name() == value)
            .ok_or_else(|| ParseKindError::new("difficulty", value))
    }
}

/// Whether a level has a fixed number of waves or runs forever.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveMode {
    /// Campaign level with a boss on its final wave where applicable.
    #[default]
    Standard,
    /// Endless map: a boss every fifth wave and faster speed ramp-up.
    Permanent,
}

impl WaveMode {
    /// Every wave mode.
    pub const ALL: [WaveMode; 2] = [Self::Standard, Self::Permanent];

    /// Stable string identifier of the mode.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Permanent => "permanent",
        }
    }
}

impl fmt::Display for WaveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WaveMode {
    type Err = ParseKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == value)
            .ok_or_else(|| ParseKindError::new("wave mode", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_tables_validate() {
        assert_eq!(StatTables::standard().validate(), Ok(()));
    }

    #[test]
    fn validation_reports_the_offending_field() {
        let tables = StatTables::standard().with_enemy(
            EnemyKind::Fast,
            EnemyTypeSpec {
                max_hp: 0.0,
                ..*StatTables::standard().enemy(EnemyKind::Fast)
            },
        );
        let error = tables.validate().unwrap_err();
        assert_eq!(error.to_string(), "enemy `fast` has invalid max hp: 0");
    }

    #[test]
    fn slow_multiplier_above_one_is_rejected() {
        let base = *StatTables::standard().tower(TowerKind::Ice);
        let tables = StatTables::standard().with_tower(
            TowerKind::Ice,
            TowerTypeSpec {
                slow: Some(SlowEffect::new(1.5, 2.0)),
                ..base
            },
        );
        assert!(matches!(
            tables.validate(),
            Err(StatTableError::Tower {
                kind: TowerKind::Ice,
                field: "slow multiplier",
                ..
            })
        ));
    }

    #[test]
    fn upgrade_steps_stop_at_level_three() {
        let tables = StatTables::standard();
        assert_eq!(tables.max_level(), 3);
        assert_eq!(tables.upgrade(1).map(|step| step.cost), Some(120));
        assert_eq!(tables.upgrade(2).map(|step| step.cost), Some(180));
        assert_eq!(tables.upgrade(3), None);
        assert_eq!(tables.upgrade(0), None);
    }

    #[test]
    fn level_lengths_follow_the_campaign_curve() {
        assert_eq!(waves_in_level(1), 1);
        assert_eq!(waves_in_level(15), 15);
        assert_eq!(waves_in_level(20), 16);
        assert_eq!(waves_in_level(29), 17);
        assert!(is_boss_level(3));
        assert!(!is_boss_level(4));
    }

    #[test]
    fn difficulties_parse_and_scale() {
        assert_eq!("hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!("permanent".parse::<WaveMode>(), Ok(WaveMode::Permanent));
        assert!("brutal".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::Easy.params().starting_lives, 10);
        assert_eq!(Difficulty::Hard.params().hp_multiplier, 1.3);
    }
}
