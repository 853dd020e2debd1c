//! Recording of finished levels.

use waypoint_defence_core::Difficulty;

/// Summary of a level that ended in a clear or a defeat.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelResult {
    /// Level that was played.
    pub level: u32,
    /// Difficulty the level was played on.
    pub difficulty: Difficulty,
    /// Whether every wave was survived.
    pub cleared: bool,
    /// Last wave that started.
    pub wave: u32,
    /// Enemies killed with a reward.
    pub kills: u32,
    /// Money held when the level ended.
    pub money: u32,
}

/// Destination for finished level results.
pub trait ProgressStore {
    /// Stores the outcome of a finished level.
    fn record(&mut self, result: LevelResult);
}

/// Progress store that keeps every result in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryProgress {
    results: Vec<LevelResult>,
}

impl InMemoryProgress {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Results in the order they were recorded.
    #[must_use]
    pub fn results(&self) -> &[LevelResult] {
        &self.results
    }

    /// Reports whether `level` has been cleared on `difficulty` at least once.
    #[must_use]
    pub fn is_cleared(&self, level: u32, difficulty: Difficulty) -> bool {
        self.results.iter().any(|result| {
            result.cleared && result.level == level && result.difficulty == difficulty
        })
    }
}

impl ProgressStore for InMemoryProgress {
    fn record(&mut self, result: LevelResult) {
        self.results.push(result);
    }
}
