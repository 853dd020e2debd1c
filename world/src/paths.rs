//! Entrance and junction polylines plus the lookups the router needs.

use std::collections::BTreeSet;

use glam::Vec2;
use waypoint_defence_core::{GridCell, PathId, PathKind, PathSpec, TILE_SIZE};

const TRACE_STEP: f32 = TILE_SIZE / 8.0;

/// Every usable polyline of a level, split by role.
#[derive(Clone, Debug, Default)]
pub struct PathNetwork {
    paths: Vec<PathSpec>,
    entrances: Vec<PathId>,
    junctions: Vec<PathId>,
}

impl PathNetwork {
    /// Builds the network, discarding polylines with fewer than two waypoints.
    #[must_use]
    pub fn new(specs: Vec<PathSpec>) -> Self {
        let mut network = Self::default();
        for spec in specs {
            if spec.waypoints.len() < 2 {
                tracing::warn!(
                    waypoints = spec.waypoints.len(),
                    "dropping degenerate path"
                );
                continue;
            }
            let id = PathId::new(network.paths.len() as u32);
            match spec.kind {
                PathKind::Entrance => network.entrances.push(id),
                PathKind::Junction => network.junctions.push(id),
            }
            network.paths.push(spec);
        }
        network
    }

    /// Paths on which enemies may be spawned, in declaration order.
    #[must_use]
    pub fn entrances(&self) -> &[PathId] {
        &self.entrances
    }

    /// Paths enemies may switch onto mid-route, in declaration order.
    #[must_use]
    pub fn junctions(&self) -> &[PathId] {
        &self.junctions
    }

    /// Identifiers of every path regardless of role.
    pub fn ids(&self) -> impl Iterator<Item = PathId> + '_ {
        (0..self.paths.len()).map(|index| PathId::new(index as u32))
    }

    /// Number of usable paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Reports whether the level has no usable path at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Waypoints of the provided path.
    #[must_use]
    pub fn waypoints(&self, path: PathId) -> Option<&[Vec2]> {
        self.paths
            .get(path.get() as usize)
            .map(|spec| spec.waypoints.as_slice())
    }

    /// Junction whose first waypoint is nearest to `position` and strictly within `radius`.
    ///
    /// Ties keep the junction declared first.
    #[must_use]
    pub fn nearest_junction(&self, position: Vec2, radius: f32) -> Option<PathId> {
        let mut best: Option<(PathId, f32)> = None;
        for &id in &self.junctions {
            let Some(start) = self.waypoints(id).and_then(|points| points.first()) else {
                continue;
            };
            let distance = position.distance(*start);
            if distance < radius && best.map_or(true, |(_, nearest)| distance < nearest) {
                best = Some((id, distance));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Grid cells crossed by any path segment.
    #[must_use]
    pub fn traced_cells(&self) -> BTreeSet<GridCell> {
        let mut cells = BTreeSet::new();
        for spec in &self.paths {
            for segment in spec.waypoints.windows(2) {
                let (from, to) = (segment[0], segment[1]);
                let samples = (from.distance(to) / TRACE_STEP).ceil().max(1.0) as u32;
                for sample in 0..=samples {
                    let point = from.lerp(to, sample as f32 / samples as f32);
                    if let Some(cell) = GridCell::containing(point) {
                        let _ = cells.insert(cell);
                    }
                }
            }
        }
        cells
    }
}

/// Index of the waypoint closest to `position`; ties keep the earliest.
#[must_use]
pub(crate) fn closest_waypoint(waypoints: &[Vec2], position: Vec2) -> usize {
    let mut closest = 0;
    let mut best = f32::INFINITY;
    for (index, point) in waypoints.iter().enumerate() {
        let distance = position.distance(*point);
        if distance < best {
            best = distance;
            closest = index;
        }
    }
    closest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> PathNetwork {
        PathNetwork::new(vec![
            PathSpec::classify(vec![Vec2::new(-32.0, 96.0), Vec2::new(480.0, 96.0)]),
            PathSpec::classify(vec![Vec2::new(160.0, 96.0), Vec2::new(160.0, 400.0)]),
            PathSpec::classify(vec![Vec2::new(200.0, 96.0)]),
            PathSpec::classify(vec![Vec2::new(220.0, 96.0), Vec2::new(220.0, 400.0)]),
        ])
    }

    #[test]
    fn degenerate_paths_are_dropped_and_roles_split() {
        let network = network();
        assert_eq!(network.len(), 3);
        assert_eq!(network.entrances(), &[PathId::new(0)]);
        assert_eq!(network.junctions(), &[PathId::new(1), PathId::new(2)]);
    }

    #[test]
    fn nearest_junction_requires_strict_proximity() {
        let network = network();
        assert_eq!(
            network.nearest_junction(Vec2::new(180.0, 96.0), 96.0),
            Some(PathId::new(1))
        );
        assert_eq!(
            network.nearest_junction(Vec2::new(200.0, 96.0), 96.0),
            Some(PathId::new(2))
        );
        assert_eq!(network.nearest_junction(Vec2::new(160.0, 192.0), 96.0), None);
    }

    #[test]
    fn closest_waypoint_keeps_first_on_ties() {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 0.0),
        ];
        assert_eq!(closest_waypoint(&points, Vec2::new(1.0, 0.0)), 0);
        assert_eq!(closest_waypoint(&points, Vec2::new(9.0, 0.0)), 1);
    }

    #[test]
    fn traced_cells_follow_segments_inside_the_grid() {
        let network = PathNetwork::new(vec![PathSpec::classify(vec![
            Vec2::new(-32.0, 32.0),
            Vec2::new(160.0, 32.0),
            Vec2::new(160.0, 160.0),
        ])]);
        let cells = network.traced_cells();
        assert!(cells.contains(&GridCell::new(0, 0)));
        assert!(cells.contains(&GridCell::new(2, 0)));
        assert!(cells.contains(&GridCell::new(2, 2)));
        assert!(!cells.contains(&GridCell::new(0, 1)));
    }
}
