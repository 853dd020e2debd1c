#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Waypoint Defence.
//!
//! The world owns every live enemy, tower and projectile together with the
//! player's economy. All mutations flow through [`apply`]; read access goes
//! through the [`query`] module.

mod enemy;
mod paths;
mod projectile;
mod targeting;
mod tower;

use std::{collections::BTreeSet, time::Duration};

use waypoint_defence_core::{
    Command, DefeatCause, EnemyId, EnemyKind, Event, GridCell, ModeParams, PathId, PathSpec,
    PlacementError, Playfield, Powerup, ProjectileId, RandomSource, RemovalError, StatTables,
    TowerId, TowerKind, UpgradeError, SELL_REFUND_RATE,
};

use enemy::{Enemy, SpawnStats};
use projectile::Projectile;
use tower::TowerRegistry;

pub use paths::PathNetwork;

/// Everything needed to build the world for one level.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Enemy, tower and upgrade definitions.
    pub tables: StatTables,
    /// Multipliers and starting resources of the chosen difficulty.
    pub mode: ModeParams,
    /// Polylines provided by the level layout.
    pub paths: Vec<PathSpec>,
    /// Cells that cannot hold towers in addition to those the paths cross.
    pub blocked: Vec<GridCell>,
    /// Bounds outside of which projectiles are discarded.
    pub playfield: Playfield,
}

/// Represents the authoritative Waypoint Defence world state.
pub struct World {
    tables: StatTables,
    playfield: Playfield,
    paths: PathNetwork,
    blocked: BTreeSet<GridCell>,
    enemies: Vec<Enemy>,
    towers: TowerRegistry,
    projectiles: Vec<Projectile>,
    pending_projectiles: Vec<Projectile>,
    money: u32,
    lives: u32,
    kills: u32,
    defeat: Option<DefeatCause>,
    random: Box<dyn RandomSource>,
    next_enemy_id: EnemyId,
    next_projectile_id: ProjectileId,
    elapsed: Duration,
}

impl World {
    /// Creates a world for one level, drawing junction decisions from `random`.
    #[must_use]
    pub fn new(config: WorldConfig, random: Box<dyn RandomSource>) -> Self {
        let paths = PathNetwork::new(config.paths);
        if paths.entrances().is_empty() {
            tracing::warn!(
                paths = paths.len(),
                "level has no entrance path; spawns fall back to random paths"
            );
        }
        let mut blocked = paths.traced_cells();
        blocked.extend(config.blocked);

        Self {
            tables: config.tables,
            playfield: config.playfield,
            paths,
            blocked,
            enemies: Vec::new(),
            towers: TowerRegistry::new(),
            projectiles: Vec::new(),
            pending_projectiles: Vec::new(),
            money: config.mode.starting_money,
            lives: config.mode.starting_lives,
            kills: 0,
            defeat: None,
            random,
            next_enemy_id: EnemyId::new(0),
            next_projectile_id: ProjectileId::new(0),
            elapsed: Duration::ZERO,
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.elapsed = self.elapsed.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });
        let seconds = dt.as_secs_f32();

        for enemy in &mut self.enemies {
            enemy.update(seconds, &self.paths, self.random.as_mut(), out_events);
        }

        self.resolve_escapes(out_events);

        for tower in self.towers.iter_mut() {
            tower.cool_down(seconds);
            tower.aim(&self.enemies);
            if let Some(shot) = tower.try_fire(&self.enemies) {
                let id = self.next_projectile_id;
                self.next_projectile_id = ProjectileId::new(id.get() + 1);
                self.pending_projectiles.push(Projectile::launch(id, shot));
                out_events.push(Event::TowerFired {
                    tower: tower.id,
                    projectile: id,
                    target: shot.target,
                });
            }
        }
        self.projectiles.append(&mut self.pending_projectiles);

        for projectile in &mut self.projectiles {
            if let Some(outcome) =
                projectile.update(seconds, &mut self.enemies, &self.playfield, out_events)
            {
                out_events.push(Event::ProjectileResolved {
                    projectile: projectile.id,
                    outcome,
                });
            }
        }

        self.harvest_rewards(out_events);
        self.enemies.retain(|enemy| enemy.alive);
        self.projectiles.retain(|projectile| projectile.alive);
    }

    fn resolve_escapes(&mut self, out_events: &mut Vec<Event>) {
        for enemy in &mut self.enemies {
            if !(enemy.alive && enemy.reached_end) {
                continue;
            }
            enemy.alive = false;
            out_events.push(Event::EnemyEscaped {
                enemy: enemy.id,
                kind: enemy.kind,
            });

            if enemy.kind == EnemyKind::Boss {
                if self.defeat.is_none() {
                    tracing::info!(enemy = enemy.id.get(), "boss escaped; level lost");
                    self.defeat = Some(DefeatCause::BossEscaped);
                    out_events.push(Event::GameOver {
                        cause: DefeatCause::BossEscaped,
                    });
                }
                continue;
            }

            self.lives = self.lives.saturating_sub(1);
            out_events.push(Event::LivesLost {
                lost: 1,
                remaining: self.lives,
            });
            if self.lives == 0 && self.defeat.is_none() {
                tracing::info!("no lives left; level lost");
                self.defeat = Some(DefeatCause::LivesExhausted);
                out_events.push(Event::GameOver {
                    cause: DefeatCause::LivesExhausted,
                });
            }
        }
    }

    fn harvest_rewards(&mut self, out_events: &mut Vec<Event>) {
        for enemy in &mut self.enemies {
            if enemy.alive || enemy.hp > 0.0 || enemy.reward_claimed {
                continue;
            }
            enemy.reward_claimed = true;
            self.money = self.money.saturating_add(enemy.reward);
            self.kills += 1;
            out_events.push(Event::EnemyDied {
                enemy: enemy.id,
                kind: enemy.kind,
                position: enemy.position,
                reward: enemy.reward,
            });
        }
    }

    fn spawn_enemy(
        &mut self,
        kind: EnemyKind,
        path: PathId,
        stats: SpawnStats,
        out_events: &mut Vec<Event>,
    ) {
        let Some(&start) = self.paths.waypoints(path).and_then(|points| points.first()) else {
            tracing::warn!(path = path.get(), kind = %kind, "spawn requested on unknown path");
            return;
        };

        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get() + 1);
        let spec = self.tables.enemy(kind);
        self.enemies.push(Enemy::spawn(id, kind, spec, path, start, stats));
        tracing::debug!(
            enemy = id.get(),
            kind = %kind,
            path = path.get(),
            max_hp = stats.max_hp,
            speed = stats.speed,
            "enemy spawned"
        );
        out_events.push(Event::EnemySpawned {
            enemy: id,
            kind,
            position: start,
        });
    }

    fn place_tower(
        &mut self,
        kind: TowerKind,
        cell: GridCell,
    ) -> Result<(TowerId, u32), PlacementError> {
        if !cell.in_grid() {
            return Err(PlacementError::OutOfBounds);
        }
        if self.blocked.contains(&cell) {
            return Err(PlacementError::Blocked);
        }
        if self.towers.is_occupied(cell) {
            return Err(PlacementError::Occupied);
        }
        let spec = self.tables.tower(kind);
        if self.money < spec.cost {
            return Err(PlacementError::InsufficientFunds);
        }
        self.money -= spec.cost;
        Ok((self.towers.insert(kind, cell, spec), spec.cost))
    }

    fn remove_tower(&mut self, id: TowerId) -> Result<(GridCell, u32), RemovalError> {
        let tower = self.towers.remove(id).ok_or(RemovalError::MissingTower)?;
        let refund = (tower.base_cost as f32 * SELL_REFUND_RATE).floor() as u32;
        self.money = self.money.saturating_add(refund);
        Ok((tower.cell, refund))
    }

    fn upgrade_tower(&mut self, id: TowerId) -> Result<(u8, u32), UpgradeError> {
        let tower = self.towers.get_mut(id).ok_or(UpgradeError::MissingTower)?;
        let step = self
            .tables
            .upgrade(tower.level)
            .ok_or(UpgradeError::MaxLevel)?;
        if self.money < step.cost {
            return Err(UpgradeError::InsufficientFunds);
        }
        self.money -= step.cost;
        tower.apply_upgrade(step);
        Ok((tower.level, step.cost))
    }

    fn activate_powerup(&mut self, powerup: Powerup, out_events: &mut Vec<Event>) {
        let cost = powerup.cost();
        if self.money < cost {
            out_events.push(Event::PowerupRejected {
                powerup,
                cost,
                available: self.money,
            });
            return;
        }
        self.money -= cost;
        out_events.push(Event::PowerupActivated { powerup });

        let damage = powerup.damage();
        for enemy in self.enemies.iter_mut().filter(|enemy| enemy.alive) {
            if let Some(slow) = powerup.slow() {
                enemy.apply_slow(slow);
            }
            if damage > 0.0 {
                let _ = enemy.strike(damage, out_events);
            }
        }

        self.harvest_rewards(out_events);
        self.enemies.retain(|enemy| enemy.alive);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SpawnEnemy {
            kind,
            path,
            max_hp,
            speed,
            reward,
        } => world.spawn_enemy(
            kind,
            path,
            SpawnStats {
                max_hp,
                speed,
                reward,
            },
            out_events,
        ),
        Command::PlaceTower { kind, cell } => match world.place_tower(kind, cell) {
            Ok((tower, cost)) => out_events.push(Event::TowerPlaced {
                tower,
                kind,
                cell,
                cost,
            }),
            Err(reason) => out_events.push(Event::TowerPlacementRejected { kind, cell, reason }),
        },
        Command::RemoveTower { tower } => match world.remove_tower(tower) {
            Ok((cell, refund)) => out_events.push(Event::TowerRemoved {
                tower,
                cell,
                refund,
            }),
            Err(reason) => out_events.push(Event::TowerRemovalRejected { tower, reason }),
        },
        Command::UpgradeTower { tower } => match world.upgrade_tower(tower) {
            Ok((level, cost)) => out_events.push(Event::TowerUpgraded { tower, level, cost }),
            Err(reason) => out_events.push(Event::TowerUpgradeRejected { tower, reason }),
        },
        Command::ActivatePowerup { powerup } => world.activate_powerup(powerup, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use glam::Vec2;
    use waypoint_defence_core::{
        DefeatCause, EnemyId, EnemyKind, GridCell, PathId, ProjectileId, ProjectileStyle,
        StatTables, TowerId, TowerKind,
    };

    use super::{tower::Tower, PathNetwork, World};

    /// Money currently available to the player.
    #[must_use]
    pub fn money(world: &World) -> u32 {
        world.money
    }

    /// Lives remaining before the level is lost.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.lives
    }

    /// Number of enemies killed so far.
    #[must_use]
    pub fn kills(world: &World) -> u32 {
        world.kills
    }

    /// Reason the level was lost, if it was.
    #[must_use]
    pub fn defeat(world: &World) -> Option<DefeatCause> {
        world.defeat
    }

    /// Total simulated time.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Stat tables the world was built with.
    #[must_use]
    pub fn tables(world: &World) -> &StatTables {
        &world.tables
    }

    /// Path network of the level.
    #[must_use]
    pub fn paths(world: &World) -> &PathNetwork {
        &world.paths
    }

    /// Number of living enemies.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.iter().filter(|enemy| enemy.alive).count()
    }

    /// Reports whether towers may not be built on the cell.
    #[must_use]
    pub fn is_blocked(world: &World, cell: GridCell) -> bool {
        world.blocked.contains(&cell)
    }

    /// Tower occupying the cell, if any.
    #[must_use]
    pub fn tower_at(world: &World, cell: GridCell) -> Option<TowerId> {
        world.towers.occupant(cell)
    }

    /// Snapshot of a single tower.
    #[must_use]
    pub fn tower(world: &World, tower: TowerId) -> Option<TowerSnapshot> {
        world.towers.get(tower).map(tower_snapshot)
    }

    /// Snapshots of every enemy in spawn order.
    #[must_use]
    pub fn enemy_view(world: &World) -> Vec<EnemySnapshot> {
        world
            .enemies
            .iter()
            .map(|enemy| EnemySnapshot {
                id: enemy.id,
                kind: enemy.kind,
                position: enemy.position,
                hp: enemy.hp,
                max_hp: enemy.max_hp,
                speed: enemy.speed,
                size: enemy.size,
                reward: enemy.reward,
                path: enemy.path,
                waypoint: enemy.waypoint,
                slow_multiplier: enemy.slow_multiplier,
                slow_remaining: enemy.slow_timer.max(0.0),
                poison_damage: enemy.poison_damage,
                poison_remaining: enemy.poison_timer.max(0.0),
                switch_count: enemy.switch_count,
                alive: enemy.alive,
                reached_end: enemy.reached_end,
            })
            .collect()
    }

    /// Snapshots of every tower ordered by identifier.
    #[must_use]
    pub fn tower_view(world: &World) -> Vec<TowerSnapshot> {
        world.towers.iter().map(tower_snapshot).collect()
    }

    /// Snapshots of every projectile in flight.
    #[must_use]
    pub fn projectile_view(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .iter()
            .map(|projectile| ProjectileSnapshot {
                id: projectile.id,
                style: projectile.style,
                position: projectile.position,
                velocity: projectile.velocity,
                target: projectile.target,
                lifetime: projectile.lifetime,
            })
            .collect()
    }

    /// Immutable representation of a single enemy.
    #[derive(Clone, Debug, PartialEq)]
    pub struct EnemySnapshot {
        /// Unique identifier of the enemy.
        pub id: EnemyId,
        /// Kind of the enemy.
        pub kind: EnemyKind,
        /// Current position in pixels.
        pub position: Vec2,
        /// Current hit points.
        pub hp: f32,
        /// Maximum hit points.
        pub max_hp: f32,
        /// Unslowed speed in pixels per second.
        pub speed: f32,
        /// Display size multiplier.
        pub size: f32,
        /// Money awarded on death.
        pub reward: u32,
        /// Path currently followed.
        pub path: PathId,
        /// Index of the waypoint the enemy is heading for.
        pub waypoint: usize,
        /// Active speed multiplier from slows.
        pub slow_multiplier: f32,
        /// Seconds of slow remaining.
        pub slow_remaining: f32,
        /// Poison damage per tick.
        pub poison_damage: f32,
        /// Seconds of poison remaining.
        pub poison_remaining: f32,
        /// Number of junction reroutes taken.
        pub switch_count: u32,
        /// Whether the enemy is alive.
        pub alive: bool,
        /// Whether the enemy walked past its last waypoint.
        pub reached_end: bool,
    }

    /// Immutable representation of a single tower.
    #[derive(Clone, Debug, PartialEq)]
    pub struct TowerSnapshot {
        /// Unique identifier of the tower.
        pub id: TowerId,
        /// Kind of the tower.
        pub kind: TowerKind,
        /// Cell the tower occupies.
        pub cell: GridCell,
        /// Upgrade level, starting at one.
        pub level: u8,
        /// Current vertical reach.
        pub range: f32,
        /// Current shots per second.
        pub fire_rate: f32,
        /// Current damage per hit.
        pub damage: f32,
        /// Seconds until the next shot is allowed.
        pub cooldown: f32,
        /// Barrel angle in radians.
        pub angle: f32,
    }

    fn tower_snapshot(tower: &Tower) -> TowerSnapshot {
        TowerSnapshot {
            id: tower.id,
            kind: tower.kind,
            cell: tower.cell,
            level: tower.level,
            range: tower.range,
            fire_rate: tower.fire_rate,
            damage: tower.damage,
            cooldown: tower.cooldown,
            angle: tower.angle,
        }
    }

    /// Immutable representation of a projectile in flight.
    #[derive(Clone, Debug, PartialEq)]
    pub struct ProjectileSnapshot {
        /// Unique identifier of the projectile.
        pub id: ProjectileId,
        /// Visual family of the projectile.
        pub style: ProjectileStyle,
        /// Current position in pixels.
        pub position: Vec2,
        /// Current velocity in pixels per second.
        pub velocity: Vec2,
        /// Enemy the projectile homes onto.
        pub target: Option<EnemyId>,
        /// Seconds the projectile has been flying.
        pub lifetime: f32,
    }
}
