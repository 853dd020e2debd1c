//! Homing projectiles and hit resolution.

use glam::Vec2;
use waypoint_defence_core::{
    EnemyId, Event, Playfield, PoisonEffect, ProjectileId, ProjectileOutcome, ProjectileStyle,
    SlowEffect, PROJECTILE_SPEED, SPLASH_DAMAGE_FACTOR,
};

use crate::{enemy::Enemy, tower::Shot};

const CONTACT_DISTANCE: f32 = 10.0;

/// Combat values copied from the tower at launch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Payload {
    pub(crate) damage: f32,
    pub(crate) splash_radius: f32,
    pub(crate) slow: Option<SlowEffect>,
    pub(crate) poison: Option<PoisonEffect>,
}

impl Payload {
    fn afflict(&self, enemy: &mut Enemy, damage: f32, out: &mut Vec<Event>) {
        let _ = enemy.strike(damage, out);
        if let Some(slow) = self.slow {
            enemy.apply_slow(slow);
        }
        if let Some(poison) = self.poison {
            enemy.apply_poison(poison);
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) style: ProjectileStyle,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) target: Option<EnemyId>,
    pub(crate) payload: Payload,
    pub(crate) lifetime: f32,
    pub(crate) max_lifetime: f32,
    pub(crate) alive: bool,
}

impl Projectile {
    pub(crate) fn launch(id: ProjectileId, shot: Shot) -> Self {
        Self {
            id,
            style: shot.profile.style,
            position: shot.origin,
            velocity: shot.velocity,
            target: Some(shot.target),
            payload: shot.payload,
            lifetime: 0.0,
            max_lifetime: shot.profile.max_lifetime,
            alive: true,
        }
    }

    /// Advances the projectile, returning how it left play if it did.
    ///
    /// `enemies` must be ordered by identifier so the homing handle can be
    /// resolved by binary search.
    pub(crate) fn update(
        &mut self,
        dt: f32,
        enemies: &mut [Enemy],
        playfield: &Playfield,
        out: &mut Vec<Event>,
    ) -> Option<ProjectileOutcome> {
        if !self.alive {
            return None;
        }

        self.lifetime += dt;
        if self.lifetime > self.max_lifetime {
            self.alive = false;
            return Some(ProjectileOutcome::Expired);
        }

        let target = self
            .target
            .and_then(|id| enemies.binary_search_by_key(&id, |enemy| enemy.id).ok())
            .filter(|&index| enemies[index].alive);

        if let Some(index) = target {
            let aim = enemies[index].position;
            let offset = aim - self.position;
            let distance = offset.length();
            let speed = match self.velocity.length() {
                speed if speed > 1e-6 => speed,
                _ => PROJECTILE_SPEED,
            };

            if distance <= CONTACT_DISTANCE.max(speed * dt) {
                self.alive = false;
                self.resolve_hit(index, aim, enemies, out);
                return Some(ProjectileOutcome::Hit {
                    target: enemies[index].id,
                });
            }
            self.velocity = offset / distance * speed;
        }

        self.position += self.velocity * dt;
        if !playfield.contains(self.position) {
            self.alive = false;
            return Some(ProjectileOutcome::OutOfBounds);
        }
        None
    }

    fn resolve_hit(&self, index: usize, aim: Vec2, enemies: &mut [Enemy], out: &mut Vec<Event>) {
        self.payload
            .afflict(&mut enemies[index], self.payload.damage, out);

        if self.payload.splash_radius <= 0.0 {
            return;
        }
        let radius_squared = self.payload.splash_radius * self.payload.splash_radius;
        let splash_damage = self.payload.damage * SPLASH_DAMAGE_FACTOR;
        for (other, enemy) in enemies.iter_mut().enumerate() {
            if other == index || !enemy.alive {
                continue;
            }
            if enemy.position.distance_squared(aim) <= radius_squared {
                self.payload.afflict(enemy, splash_damage, out);
            }
        }
    }
}
