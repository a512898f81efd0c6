//! Pipe-side back-references to the pumps whose networks include each pipe.
//!
//! Pumps and pipes only ever hold each other's positions. A pipe that changes
//! hands its pump-set back to the caller, which invalidates those pumps.

use std::collections::{BTreeMap, BTreeSet};

use pipeflow_core::pos::BlockPos;
use serde::{Deserialize, Serialize};

/// The pump-set carried by a single pipe tile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeTile {
    pumps: BTreeSet<BlockPos>,
}

impl PipeTile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `pump` routes through this pipe. Idempotent.
    pub fn add_pump(&mut self, pump: BlockPos) {
        self.pumps.insert(pump);
    }

    /// Forget `pump`. Idempotent; returns whether it was present.
    pub fn remove_pump(&mut self, pump: BlockPos) -> bool {
        self.pumps.remove(&pump)
    }

    pub fn pumps(&self) -> &BTreeSet<BlockPos> {
        &self.pumps
    }

    pub fn contains(&self, pump: BlockPos) -> bool {
        self.pumps.contains(&pump)
    }

    pub fn is_empty(&self) -> bool {
        self.pumps.is_empty()
    }

    /// Empty the pump-set, returning the pumps that must be invalidated.
    pub fn notify_invalidated(&mut self) -> BTreeSet<BlockPos> {
        std::mem::take(&mut self.pumps)
    }
}

/// All pipe tiles known to the pump system, keyed by position.
///
/// Entries are created lazily the first time a pump registers with a pipe, so
/// pipes that existed before the system started need no explicit placement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeRegistry {
    tiles: BTreeMap<BlockPos, PipeTile>,
}

impl PipeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a tile entry exists at `pos`.
    pub fn insert(&mut self, pos: BlockPos) -> &mut PipeTile {
        self.tiles.entry(pos).or_default()
    }

    /// Drop the tile at `pos`, returning it.
    pub fn remove(&mut self, pos: BlockPos) -> Option<PipeTile> {
        self.tiles.remove(&pos)
    }

    pub fn get(&self, pos: BlockPos) -> Option<&PipeTile> {
        self.tiles.get(&pos)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn add_pump(&mut self, pipe: BlockPos, pump: BlockPos) {
        self.insert(pipe).add_pump(pump);
    }

    /// Remove `pump` from the pipe at `pipe`. A missing tile is a no-op.
    pub fn remove_pump(&mut self, pipe: BlockPos, pump: BlockPos) -> bool {
        self.tiles
            .get_mut(&pipe)
            .is_some_and(|tile| tile.remove_pump(pump))
    }

    /// The pumps depending on the pipe at `pipe` (empty if unknown).
    pub fn pumps_at(&self, pipe: BlockPos) -> impl Iterator<Item = BlockPos> + '_ {
        self.tiles
            .get(&pipe)
            .into_iter()
            .flat_map(|tile| tile.pumps().iter().copied())
    }

    /// Drain the pump-set of the pipe at `pipe`.
    pub fn notify_invalidated(&mut self, pipe: BlockPos) -> BTreeSet<BlockPos> {
        self.tiles
            .get_mut(&pipe)
            .map(PipeTile::notify_invalidated)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32) -> BlockPos {
        BlockPos::new(x, 0, 0)
    }

    #[test]
    fn add_pump_is_idempotent() {
        let mut tile = PipeTile::new();
        tile.add_pump(p(1));
        tile.add_pump(p(1));
        assert_eq!(tile.pumps().len(), 1);
        assert!(tile.contains(p(1)));
    }

    #[test]
    fn remove_pump_is_idempotent() {
        let mut tile = PipeTile::new();
        tile.add_pump(p(1));
        assert!(tile.remove_pump(p(1)));
        assert!(!tile.remove_pump(p(1)));
        assert!(tile.is_empty());
    }

    #[test]
    fn notify_returns_and_clears() {
        let mut tile = PipeTile::new();
        tile.add_pump(p(1));
        tile.add_pump(p(7));
        let pumps = tile.notify_invalidated();
        assert_eq!(pumps.into_iter().collect::<Vec<_>>(), vec![p(1), p(7)]);
        assert!(tile.is_empty());
    }

    #[test]
    fn notify_on_empty_pipe_does_nothing() {
        let mut registry = PipeRegistry::new();
        registry.insert(p(2));
        assert!(registry.notify_invalidated(p(2)).is_empty());
        assert!(registry.notify_invalidated(p(99)).is_empty());
    }

    #[test]
    fn registry_creates_tiles_lazily() {
        let mut registry = PipeRegistry::new();
        assert!(registry.is_empty());
        registry.add_pump(p(2), p(1));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.pumps_at(p(2)).collect::<Vec<_>>(), vec![p(1)]);
    }

    #[test]
    fn remove_pump_from_missing_tile_is_noop() {
        let mut registry = PipeRegistry::new();
        assert!(!registry.remove_pump(p(2), p(1)));
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_tile_returns_pump_set() {
        let mut registry = PipeRegistry::new();
        registry.add_pump(p(2), p(1));
        let tile = registry.remove(p(2)).unwrap();
        assert!(tile.contains(p(1)));
        assert!(registry.get(p(2)).is_none());
    }
}
