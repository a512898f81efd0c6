//! Pipe network discovery.
//!
//! A network is rebuilt from world state by a breadth-first walk outward from
//! a pump. Membership needs both neighbours to claim the shared face; a
//! powered pipe is still a member (so toggling it is noticed through the
//! registry) but the walk does not continue through it and it exposes no
//! consumers.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use pipeflow_core::block::{BlockState, TileKind};
use pipeflow_core::id::HandlerRef;
use pipeflow_core::pos::{BlockPos, Direction};
use pipeflow_core::world::World;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::registry::PipeRegistry;

/// A pipe that belongs to a pump's network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeNode {
    /// Whether a pipe tile was present at discovery and received the pump's
    /// back-reference.
    pub linked: bool,
}

/// A boundary tile touching the network. `face` is the consumer's own side
/// that faces the pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Consumer {
    pub pos: BlockPos,
    pub face: Direction,
}

impl Consumer {
    pub fn handler(&self) -> HandlerRef {
        HandlerRef::new(self.pos, self.face)
    }
}

/// The pipes reachable from one pump and the consumers along its boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pipes: BTreeMap<BlockPos, PipeNode>,
    consumers: Vec<Consumer>,
    /// Round-robin position for the single-unit remainder phase.
    pub(crate) cursor: usize,
}

impl Network {
    /// Discover the network rooted at the pump at `root` and register `root`
    /// with every pipe tile found.
    pub fn discover<W: World + ?Sized>(
        world: &W,
        root: BlockPos,
        registry: &mut PipeRegistry,
    ) -> Self {
        let visited = find_pipes(world, root);

        let mut pipes = BTreeMap::new();
        let mut consumers = Vec::new();
        for &pos in &visited {
            let linked = world.tile(pos) == Some(TileKind::Pipe);
            if linked {
                registry.add_pump(pos, root);
            }
            pipes.insert(pos, PipeNode { linked });

            let BlockState::Pipe {
                connections,
                powered: false,
            } = world.block_state(pos)
            else {
                continue;
            };
            for direction in connections.iter() {
                let neighbor = pos.relative(direction);
                if visited.contains(&neighbor) || world.block_state(neighbor).is_pipe() {
                    continue;
                }
                let face = direction.opposite();
                if world.fluid_handler(neighbor, face).is_some() {
                    consumers.push(Consumer {
                        pos: neighbor,
                        face,
                    });
                }
            }
        }

        debug!(
            pump = %root,
            pipes = pipes.len(),
            consumers = consumers.len(),
            "generated fluid network"
        );

        Self {
            pipes,
            consumers,
            cursor: 0,
        }
    }

    /// Remove `root` from every linked pipe and clear the network.
    pub fn teardown(&mut self, root: BlockPos, registry: &mut PipeRegistry) {
        for (&pos, node) in &self.pipes {
            if node.linked {
                registry.remove_pump(pos, root);
            }
        }
        self.pipes.clear();
        self.consumers.clear();
        self.cursor = 0;
    }

    pub fn pipes(&self) -> &BTreeMap<BlockPos, PipeNode> {
        &self.pipes
    }

    pub fn contains_pipe(&self, pos: BlockPos) -> bool {
        self.pipes.contains_key(&pos)
    }

    /// Consumers in discovery order (pipe position, then face index).
    pub fn consumers(&self) -> &[Consumer] {
        &self.consumers
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }
}

/// Phase one of discovery: the set of pipe positions reachable from `root`.
///
/// The root itself is treated as open on all six faces; every other node must
/// be an unpowered pipe claiming the outgoing face, and the neighbour must be
/// a pipe claiming the opposite face.
pub fn find_pipes<W: World + ?Sized>(world: &W, root: BlockPos) -> BTreeSet<BlockPos> {
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::from([root]);

    while let Some(pos) = queue.pop_front() {
        let state = world.block_state(pos);
        for direction in Direction::ALL {
            let next = pos.relative(direction);
            if next == root || visited.contains(&next) {
                continue;
            }
            if let BlockState::Pipe {
                connections,
                powered,
            } = state
            {
                if powered || !connections.contains(direction) {
                    continue;
                }
            }
            if world.block_state(next).is_connected(direction.opposite()) {
                visited.insert(next);
                queue.push_back(next);
            }
        }
    }

    visited
}
