//! Enemy state: movement along waypoints, status effects and rerouting.

use glam::Vec2;
use waypoint_defence_core::{
    EnemyId, EnemyKind, EnemyTypeSpec, Event, PathId, PoisonEffect, RandomSource, SlowEffect,
    JUNCTION_RADIUS,
};

use crate::paths::{closest_waypoint, PathNetwork};

const ARRIVAL_EPSILON: f32 = 1e-6;
const REGEN_DELAY: f32 = 1.0;
const POISON_TICK: f32 = 1.0;

/// Scaled values a wave hands to a freshly spawned enemy.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SpawnStats {
    pub(crate) max_hp: f32,
    pub(crate) speed: f32,
    pub(crate) reward: u32,
}

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    pub(crate) path: PathId,
    pub(crate) waypoint: usize,
    pub(crate) position: Vec2,
    pub(crate) max_hp: f32,
    pub(crate) hp: f32,
    pub(crate) speed: f32,
    pub(crate) size: f32,
    pub(crate) reward: u32,
    pub(crate) slow_resist: f32,
    pub(crate) slow_multiplier: f32,
    pub(crate) slow_timer: f32,
    pub(crate) poison_damage: f32,
    pub(crate) poison_timer: f32,
    pub(crate) poison_tick: f32,
    pub(crate) regen: f32,
    pub(crate) regen_timer: f32,
    pub(crate) alive: bool,
    pub(crate) reached_end: bool,
    pub(crate) reward_claimed: bool,
    pub(crate) switch_count: u32,
    pub(crate) last_switch_waypoint: Option<usize>,
}

impl Enemy {
    /// Places a new enemy on the first waypoint of `path`, heading for the second.
    pub(crate) fn spawn(
        id: EnemyId,
        kind: EnemyKind,
        spec: &EnemyTypeSpec,
        path: PathId,
        start: Vec2,
        stats: SpawnStats,
    ) -> Self {
        Self {
            id,
            kind,
            path,
            waypoint: 1,
            position: start,
            max_hp: stats.max_hp,
            hp: stats.max_hp,
            speed: stats.speed,
            size: spec.size,
            reward: stats.reward,
            slow_resist: spec.slow_resist,
            slow_multiplier: 1.0,
            slow_timer: 0.0,
            poison_damage: 0.0,
            poison_timer: 0.0,
            poison_tick: 0.0,
            regen: spec.regen,
            regen_timer: REGEN_DELAY,
            alive: true,
            reached_end: false,
            reward_claimed: false,
            switch_count: 0,
            last_switch_waypoint: None,
        }
    }

    /// Subtracts `damage` and reports whether this call killed the enemy.
    pub(crate) fn hit(&mut self, damage: f32) -> bool {
        if !self.alive {
            return false;
        }
        self.hp -= damage;
        if self.hp <= 0.0 {
            self.alive = false;
            return true;
        }
        false
    }

    /// Same as [`Enemy::hit`], announcing the damage when it landed.
    pub(crate) fn strike(&mut self, damage: f32, out: &mut Vec<Event>) -> bool {
        if !self.alive {
            return false;
        }
        let killed = self.hit(damage);
        out.push(Event::EnemyDamaged {
            enemy: self.id,
            amount: damage,
            hp: self.hp,
        });
        killed
    }

    /// Combines a slow with the active one, keeping the stronger and longer.
    pub(crate) fn apply_slow(&mut self, slow: SlowEffect) {
        if !self.alive {
            return;
        }
        let (multiplier, duration) = if self.slow_resist > 0.0 {
            (
                1.0 - (1.0 - slow.multiplier()) * (1.0 - self.slow_resist),
                slow.duration() * (1.0 - self.slow_resist * 0.5),
            )
        } else {
            (slow.multiplier(), slow.duration())
        };
        self.slow_multiplier = self.slow_multiplier.min(multiplier);
        self.slow_timer = self.slow_timer.max(duration);
    }

    /// Refreshes the poison, keeping the larger rate and the longer remainder.
    pub(crate) fn apply_poison(&mut self, poison: PoisonEffect) {
        if !self.alive {
            return;
        }
        if self.poison_timer > 0.0 {
            self.poison_damage = self.poison_damage.max(poison.damage());
            self.poison_timer = self.poison_timer.max(poison.duration());
        } else {
            self.poison_damage = poison.damage();
            self.poison_timer = poison.duration();
        }
        self.poison_tick = POISON_TICK;
    }

    /// Advances regeneration, status effects and movement by `dt` seconds.
    pub(crate) fn update(
        &mut self,
        dt: f32,
        paths: &PathNetwork,
        random: &mut dyn RandomSource,
        out: &mut Vec<Event>,
    ) {
        if !self.alive || self.reached_end {
            return;
        }

        if self.regen > 0.0 {
            self.regen_timer -= dt;
            if self.regen_timer <= 0.0 && self.hp > 0.0 && self.hp < self.max_hp {
                self.hp = self.max_hp.min(self.hp + self.regen * dt);
            }
        }

        if self.slow_timer > 0.0 {
            self.slow_timer -= dt;
            if self.slow_timer <= 0.0 {
                self.slow_multiplier = 1.0;
            }
        }

        if self.poison_timer > 0.0 {
            self.poison_timer -= dt;
            self.poison_tick -= dt;
            if self.poison_tick <= 0.0 {
                let _ = self.strike(self.poison_damage, out);
                self.poison_tick = POISON_TICK;
            }
            if self.poison_timer <= 0.0 {
                self.poison_damage = 0.0;
                self.poison_tick = 0.0;
            }
            if !self.alive {
                return;
            }
        }

        self.advance(dt, paths, random, out);
    }

    fn advance(
        &mut self,
        dt: f32,
        paths: &PathNetwork,
        random: &mut dyn RandomSource,
        out: &mut Vec<Event>,
    ) {
        let Some(waypoints) = paths.waypoints(self.path) else {
            self.reached_end = true;
            return;
        };
        let Some(&target) = waypoints.get(self.waypoint) else {
            self.reached_end = true;
            return;
        };

        let offset = target - self.position;
        let distance = offset.length();
        if distance < ARRIVAL_EPSILON {
            self.waypoint += 1;
            if self.waypoint >= waypoints.len() {
                self.reached_end = true;
            }
            return;
        }

        let step = self.speed * self.slow_multiplier * dt;
        if step >= distance {
            self.position = target;
            self.waypoint += 1;
            if self.waypoint < waypoints.len() {
                self.consider_junction(paths, random, out);
            } else {
                self.reached_end = true;
            }
        } else {
            self.position += offset / distance * step;
        }
    }

    fn consider_junction(
        &mut self,
        paths: &PathNetwork,
        random: &mut dyn RandomSource,
        out: &mut Vec<Event>,
    ) {
        if paths.junctions().is_empty()
            || self.last_switch_waypoint == Some(self.waypoint)
            || !self.alive
            || self.switch_count >= self.kind.max_switches()
        {
            return;
        }

        let Some(junction) = paths.nearest_junction(self.position, JUNCTION_RADIUS) else {
            return;
        };
        if random.next_unit() >= self.kind.switch_chance() {
            return;
        }
        let Some(waypoints) = paths.waypoints(junction) else {
            return;
        };

        let closest = closest_waypoint(waypoints, self.position);
        self.path = junction;
        self.waypoint = (closest + 1).min(waypoints.len() - 1);
        self.switch_count += 1;
        self.last_switch_waypoint = Some(self.waypoint);

        tracing::debug!(
            enemy = self.id.get(),
            kind = %self.kind,
            path = junction.get(),
            waypoint = self.waypoint,
            "enemy rerouted onto junction"
        );
        out.push(Event::EnemyRerouted {
            enemy: self.id,
            path: junction,
            waypoint: self.waypoint,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_defence_core::{PathSpec, ScriptedRandom, StatTables};

    fn straight_network() -> PathNetwork {
        PathNetwork::new(vec![PathSpec::classify(vec![
            Vec2::new(-32.0, 96.0),
            Vec2::new(2000.0, 96.0),
        ])])
    }

    fn enemy(kind: EnemyKind, speed: f32) -> Enemy {
        let tables = StatTables::standard();
        let spec = tables.enemy(kind);
        Enemy::spawn(
            EnemyId::new(0),
            kind,
            spec,
            PathId::new(0),
            Vec2::new(-32.0, 96.0),
            SpawnStats {
                max_hp: spec.max_hp,
                speed,
                reward: spec.reward,
            },
        )
    }

    #[test]
    fn hit_reports_the_killing_blow_once() {
        let mut enemy = enemy(EnemyKind::Normal, 0.0);
        assert!(!enemy.hit(60.0));
        assert_eq!(enemy.hp, 40.0);
        assert!(enemy.hit(50.0));
        assert_eq!(enemy.hp, -10.0);
        assert!(!enemy.alive);
        assert!(!enemy.hit(50.0));
        assert_eq!(enemy.hp, -10.0);
    }

    #[test]
    fn hit_never_raises_hp() {
        let mut enemy = enemy(EnemyKind::Tank, 0.0);
        for damage in [0.0, 0.5, 12.0, 40.0, 100.0] {
            let before = enemy.hp;
            let killed = enemy.hit(damage);
            assert_eq!(enemy.hp, before - damage);
            assert_eq!(killed, enemy.hp <= 0.0);
        }
    }

    #[test]
    fn regeneration_waits_one_second_then_accrues_continuously() {
        let network = straight_network();
        let mut random = ScriptedRandom::new(vec![]);
        let mut out = Vec::new();
        let mut boss = enemy(EnemyKind::Boss, 0.0);
        let _ = boss.hit(100.0);

        for _ in 0..4 {
            boss.update(0.5, &network, &mut random, &mut out);
        }

        assert_eq!(boss.hp, 507.5);
    }

    #[test]
    fn regeneration_never_exceeds_max_hp() {
        let network = straight_network();
        let mut random = ScriptedRandom::new(vec![]);
        let mut out = Vec::new();
        let mut boss = enemy(EnemyKind::Boss, 0.0);
        let _ = boss.hit(3.0);

        for _ in 0..20 {
            boss.update(0.5, &network, &mut random, &mut out);
            assert!(boss.hp <= boss.max_hp);
        }
        assert_eq!(boss.hp, boss.max_hp);
    }

    #[test]
    fn repeated_identical_slow_is_idempotent() {
        let mut once = enemy(EnemyKind::Normal, 60.0);
        once.apply_slow(SlowEffect::new(0.5, 3.0));
        let mut twice = enemy(EnemyKind::Normal, 60.0);
        twice.apply_slow(SlowEffect::new(0.5, 3.0));
        twice.apply_slow(SlowEffect::new(0.5, 3.0));

        assert_eq!(once.slow_multiplier, twice.slow_multiplier);
        assert_eq!(once.slow_timer, twice.slow_timer);
    }

    #[test]
    fn slows_keep_the_stronger_multiplier_and_longer_timer() {
        let mut enemy = enemy(EnemyKind::Normal, 60.0);
        enemy.apply_slow(SlowEffect::new(0.5, 3.0));
        enemy.apply_slow(SlowEffect::new(0.75, 5.0));
        assert_eq!(enemy.slow_multiplier, 0.5);
        assert_eq!(enemy.slow_timer, 5.0);
    }

    #[test]
    fn tank_resistance_dampens_magnitude_and_duration() {
        let mut tank = enemy(EnemyKind::Tank, 40.0);
        tank.apply_slow(SlowEffect::new(0.5, 3.0));
        assert_eq!(tank.slow_multiplier, 0.75);
        assert_eq!(tank.slow_timer, 2.25);
    }

    #[test]
    fn slow_expires_back_to_full_speed() {
        let network = straight_network();
        let mut random = ScriptedRandom::new(vec![]);
        let mut out = Vec::new();
        let mut enemy = enemy(EnemyKind::Normal, 60.0);
        enemy.apply_slow(SlowEffect::new(0.5, 1.0));

        enemy.update(0.5, &network, &mut random, &mut out);
        assert_eq!(enemy.slow_multiplier, 0.5);
        enemy.update(0.5, &network, &mut random, &mut out);
        assert_eq!(enemy.slow_multiplier, 1.0);
    }

    #[test]
    fn poison_refresh_keeps_maximum_rate_and_duration() {
        let mut enemy = enemy(EnemyKind::Normal, 60.0);
        enemy.apply_poison(PoisonEffect::new(10.0, 5.0));
        enemy.apply_poison(PoisonEffect::new(6.0, 8.0));
        assert_eq!(enemy.poison_damage, 10.0);
        assert_eq!(enemy.poison_timer, 8.0);
        assert_eq!(enemy.poison_tick, 1.0);
    }

    #[test]
    fn poison_ticks_once_per_second_regardless_of_frame_rate() {
        let network = straight_network();
        let mut random = ScriptedRandom::new(vec![]);
        let mut out = Vec::new();
        let mut enemy = enemy(EnemyKind::Tank, 0.0);
        enemy.apply_poison(PoisonEffect::new(12.0, 5.0));

        for _ in 0..8 {
            enemy.update(0.125, &network, &mut random, &mut out);
        }
        assert_eq!(enemy.hp, 288.0);

        for _ in 0..8 {
            enemy.update(0.125, &network, &mut random, &mut out);
        }
        assert_eq!(enemy.hp, 276.0);
    }

    #[test]
    fn status_effects_skip_dead_enemies() {
        let mut enemy = enemy(EnemyKind::Normal, 60.0);
        let _ = enemy.hit(500.0);
        enemy.apply_slow(SlowEffect::new(0.5, 3.0));
        enemy.apply_poison(PoisonEffect::new(10.0, 5.0));
        assert_eq!(enemy.slow_multiplier, 1.0);
        assert_eq!(enemy.poison_timer, 0.0);
    }

    #[test]
    fn reaching_the_last_waypoint_flags_the_end_once() {
        let network = PathNetwork::new(vec![PathSpec::classify(vec![
            Vec2::new(-32.0, 96.0),
            Vec2::new(28.0, 96.0),
        ])]);
        let mut random = ScriptedRandom::new(vec![]);
        let mut out = Vec::new();
        let mut enemy = enemy(EnemyKind::Normal, 60.0);
        assert_eq!(enemy.position, network.waypoints(PathId::new(0)).unwrap()[0]);

        enemy.update(0.5, &network, &mut random, &mut out);
        assert!(!enemy.reached_end);
        enemy.update(0.5, &network, &mut random, &mut out);
        assert!(enemy.reached_end);
        assert_eq!(enemy.position, Vec2::new(28.0, 96.0));

        enemy.update(0.5, &network, &mut random, &mut out);
        assert!(enemy.reached_end);
        assert_eq!(enemy.position, Vec2::new(28.0, 96.0));
    }

    #[test]
    fn arriving_does_not_carry_movement_into_the_next_segment() {
        let network = PathNetwork::new(vec![PathSpec::classify(vec![
            Vec2::new(-32.0, 96.0),
            Vec2::new(0.0, 96.0),
            Vec2::new(200.0, 96.0),
        ])]);
        let mut random = ScriptedRandom::new(vec![]);
        let mut out = Vec::new();
        let mut enemy = enemy(EnemyKind::Normal, 60.0);

        enemy.update(1.0, &network, &mut random, &mut out);
        assert_eq!(enemy.position, Vec2::new(0.0, 96.0));
        assert_eq!(enemy.waypoint, 2);
    }
}
