//! Scenario files describing a level layout and an opening build.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use glam::Vec2;
use waypoint_defence_core::{GridCell, PathKind, PathSpec, StatTables, TowerKind};

const SUPPORTED_SCENARIO_VERSION: u32 = 1;
const BUILTIN_SCENARIO: &str = include_str!("../scenarios/default.toml");

/// Tower the runner places before the first wave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TowerPlan {
    pub(crate) kind: TowerKind,
    pub(crate) cell: GridCell,
    pub(crate) upgrades: u8,
}

/// Validated scenario ready to seed a session.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Scenario {
    pub(crate) paths: Vec<PathSpec>,
    pub(crate) blocked: Vec<GridCell>,
    pub(crate) towers: Vec<TowerPlan>,
}

impl Scenario {
    /// Reads and validates the scenario stored at `path`.
    pub(crate) fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid scenario at {}", path.display()))
    }

    /// Scenario used when none is supplied on the command line.
    pub(crate) fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_SCENARIO).context("built-in scenario is invalid")
    }

    fn parse(contents: &str) -> Result<Self> {
        let raw: RawScenario =
            toml::from_str(contents).context("failed to parse scenario toml contents")?;
        if raw.version != SUPPORTED_SCENARIO_VERSION {
            bail!(
                "unsupported scenario version {}; expected {}",
                raw.version,
                SUPPORTED_SCENARIO_VERSION
            );
        }
        if raw.paths.is_empty() {
            bail!("scenario defines no paths");
        }

        let mut paths = Vec::with_capacity(raw.paths.len());
        for (index, path) in raw.paths.into_iter().enumerate() {
            if path.points.len() < 2 {
                bail!(
                    "path {index} has {} waypoint(s); at least 2 are required",
                    path.points.len()
                );
            }
            let waypoints = path.points.into_iter().map(Vec2::from).collect();
            paths.push(match path.kind {
                Some(kind) => PathSpec::new(kind, waypoints),
                None => PathSpec::classify(waypoints),
            });
        }

        let blocked = raw
            .blocked
            .into_iter()
            .map(|[column, row]| grid_cell(column, row))
            .collect::<Result<Vec<_>>>()?;

        let max_upgrades = StatTables::standard().max_level() - 1;
        let mut towers = Vec::with_capacity(raw.towers.len());
        for tower in raw.towers {
            let [column, row] = tower.cell;
            let cell = grid_cell(column, row)
                .with_context(|| format!("invalid cell for {} tower", tower.kind))?;
            if towers.iter().any(|plan: &TowerPlan| plan.cell == cell) {
                bail!("scenario places two towers on cell ({column}, {row})");
            }
            if tower.upgrades > max_upgrades {
                bail!(
                    "{} tower at ({column}, {row}) wants {} upgrades; at most {max_upgrades} exist",
                    tower.kind,
                    tower.upgrades
                );
            }
            towers.push(TowerPlan {
                kind: tower.kind,
                cell,
                upgrades: tower.upgrades,
            });
        }

        Ok(Self {
            paths,
            blocked,
            towers,
        })
    }
}

fn grid_cell(column: u32, row: u32) -> Result<GridCell> {
    let cell = GridCell::new(column, row);
    if !cell.in_grid() {
        bail!("cell ({column}, {row}) lies outside the placement grid");
    }
    Ok(cell)
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScenario {
    version: u32,
    #[serde(default)]
    paths: Vec<RawPath>,
    #[serde(default)]
    blocked: Vec<[u32; 2]>,
    #[serde(default)]
    towers: Vec<RawTower>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPath {
    #[serde(default)]
    kind: Option<PathKind>,
    points: Vec<[f32; 2]>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTower {
    kind: TowerKind,
    cell: [u32; 2],
    #[serde(default)]
    upgrades: u8,
}
