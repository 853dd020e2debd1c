//! Target selection inside a tower's rectangular engagement envelope.

use glam::Vec2;
use waypoint_defence_core::{EnemyId, HORIZONTAL_RANGE};

use crate::enemy::Enemy;

/// Reports whether `position` lies inside the envelope centred on `center`.
///
/// The envelope spans `range` vertically and a fixed horizontal reach.
#[must_use]
pub(crate) fn in_envelope(center: Vec2, range: f32, position: Vec2) -> bool {
    (position.y - center.y).abs() <= range && (position.x - center.x).abs() <= HORIZONTAL_RANGE
}

/// Position of the living enemy vertically closest to the tower, used for aiming.
#[must_use]
pub(crate) fn aim_point(center: Vec2, range: f32, enemies: &[Enemy]) -> Option<Vec2> {
    let mut best: Option<(Vec2, f32)> = None;
    for enemy in enemies.iter().filter(|enemy| enemy.alive) {
        if !in_envelope(center, range, enemy.position) {
            continue;
        }
        let vertical = (enemy.position.y - center.y).abs();
        if best.map_or(true, |(_, nearest)| vertical < nearest) {
            best = Some((enemy.position, vertical));
        }
    }
    best.map(|(position, _)| position)
}

/// Living enemy furthest along its path; ties keep the earliest spawned.
#[must_use]
pub(crate) fn fire_target(center: Vec2, range: f32, enemies: &[Enemy]) -> Option<(EnemyId, Vec2)> {
    let mut best: Option<(&Enemy, usize)> = None;
    for enemy in enemies.iter().filter(|enemy| enemy.alive) {
        if !in_envelope(center, range, enemy.position) {
            continue;
        }
        if best.map_or(true, |(_, progress)| enemy.waypoint > progress) {
            best = Some((enemy, enemy.waypoint));
        }
    }
    best.map(|(enemy, _)| (enemy.id, enemy.position))
}
