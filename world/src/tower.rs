//! Authoritative tower state: stats, cooldown, aim and upgrades.

use std::collections::BTreeMap;

use glam::Vec2;
use waypoint_defence_core::{
    EnemyId, GridCell, PoisonEffect, ProjectileProfile, SlowEffect, TowerId, TowerKind,
    TowerTypeSpec, UpgradeStep, PROJECTILE_SPEED,
};

use crate::{enemy::Enemy, projectile::Payload, targeting};

/// Projectile launch decided by a tower this tick.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Shot {
    pub(crate) target: EnemyId,
    pub(crate) origin: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) payload: Payload,
    pub(crate) profile: ProjectileProfile,
}

#[derive(Clone, Debug)]
pub(crate) struct Tower {
    pub(crate) id: TowerId,
    pub(crate) kind: TowerKind,
    pub(crate) cell: GridCell,
    pub(crate) level: u8,
    pub(crate) base_cost: u32,
    pub(crate) range: f32,
    pub(crate) fire_rate: f32,
    pub(crate) damage: f32,
    pub(crate) splash_radius: f32,
    pub(crate) slow: Option<SlowEffect>,
    pub(crate) poison: Option<PoisonEffect>,
    pub(crate) profile: ProjectileProfile,
    pub(crate) cooldown: f32,
    pub(crate) angle: f32,
}

impl Tower {
    pub(crate) fn new(id: TowerId, kind: TowerKind, cell: GridCell, spec: &TowerTypeSpec) -> Self {
        Self {
            id,
            kind,
            cell,
            level: 1,
            base_cost: spec.cost,
            range: spec.range,
            fire_rate: spec.fire_rate,
            damage: spec.damage,
            splash_radius: spec.splash_radius,
            slow: spec.slow,
            poison: spec.poison,
            profile: spec.projectile,
            cooldown: 0.0,
            angle: 0.0,
        }
    }

    pub(crate) fn center(&self) -> Vec2 {
        self.cell.center()
    }

    pub(crate) fn cool_down(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
    }

    /// Turns the barrel toward the vertically nearest enemy in reach.
    pub(crate) fn aim(&mut self, enemies: &[Enemy]) {
        let center = self.center();
        if let Some(point) = targeting::aim_point(center, self.range, enemies) {
            let offset = point - center;
            self.angle = offset.y.atan2(offset.x);
        }
    }

    /// Launches at the most advanced enemy in reach once the cooldown allows it.
    pub(crate) fn try_fire(&mut self, enemies: &[Enemy]) -> Option<Shot> {
        if self.cooldown > 0.0 {
            return None;
        }
        let center = self.center();
        let (target, position) = targeting::fire_target(center, self.range, enemies)?;

        let speed = PROJECTILE_SPEED * self.profile.speed_multiplier;
        let velocity = (position - center).normalize_or_zero() * speed;
        self.cooldown = 1.0 / self.fire_rate;

        Some(Shot {
            target,
            origin: center,
            velocity,
            payload: self.payload(),
            profile: self.profile,
        })
    }

    /// Snapshot of the current combat stats carried by each projectile.
    pub(crate) fn payload(&self) -> Payload {
        Payload {
            damage: self.damage,
            splash_radius: self.splash_radius,
            slow: self.slow.filter(|slow| slow.duration() > 0.0),
            poison: self.poison.filter(|poison| poison.duration() > 0.0),
        }
    }

    /// Compounds one upgrade step onto the current stats.
    pub(crate) fn apply_upgrade(&mut self, step: &UpgradeStep) {
        self.level += 1;
        self.range = (self.range * step.range_factor).trunc();
        self.fire_rate *= step.fire_rate_factor;
        self.damage = (self.damage * step.damage_factor).trunc();
    }
}

/// Towers keyed by identifier plus the cells they occupy.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, Tower>,
    occupancy: BTreeMap<GridCell, TowerId>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            occupancy: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    pub(crate) fn is_occupied(&self, cell: GridCell) -> bool {
        self.occupancy.contains_key(&cell)
    }

    pub(crate) fn occupant(&self, cell: GridCell) -> Option<TowerId> {
        self.occupancy.get(&cell).copied()
    }

    pub(crate) fn insert(
        &mut self,
        kind: TowerKind,
        cell: GridCell,
        spec: &TowerTypeSpec,
    ) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get() + 1);
        let _ = self.occupancy.insert(cell, id);
        let _ = self.entries.insert(id, Tower::new(id, kind, cell, spec));
        id
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<Tower> {
        let tower = self.entries.remove(&id)?;
        let _ = self.occupancy.remove(&tower.cell);
        Some(tower)
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&Tower> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Tower> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tower> {
        self.entries.values_mut()
    }
}
