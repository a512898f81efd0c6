//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available to every crate in the workspace through the `test-utils`
//! feature. [`TestWorld`] is an in-memory [`World`] backed by [`FluidTank`]s.

use std::collections::{BTreeMap, BTreeSet};

use crate::block::{BlockState, Connections, TileKind};
use crate::fluid::{FluidAction, FluidStack, FluidTank};
use crate::id::{FluidId, HandlerRef};
use crate::pos::{BlockPos, Direction};
use crate::world::World;

// ===========================================================================
// Fluid constructors
// ===========================================================================

pub fn water() -> FluidId {
    FluidId(0)
}
pub fn lava() -> FluidId {
    FluidId(1)
}
pub fn fuel() -> FluidId {
    FluidId(2)
}

// ===========================================================================
// TestWorld
// ===========================================================================

#[derive(Debug, Clone)]
struct TankSlot {
    tank: FluidTank,
    faces: Connections,
}

/// An in-memory world: a sparse block map plus tanks exposed on chosen faces.
#[derive(Debug, Clone, Default)]
pub struct TestWorld {
    blocks: BTreeMap<BlockPos, BlockState>,
    tiles: BTreeMap<BlockPos, TileKind>,
    tanks: BTreeMap<BlockPos, TankSlot>,
    unloaded: BTreeSet<BlockPos>,
    client_side: bool,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Placement --

    /// Place an unpowered pipe with its own pipe tile.
    pub fn set_pipe(&mut self, pos: BlockPos, connections: Connections) {
        self.remove(pos);
        self.blocks.insert(pos, BlockState::pipe(connections));
        self.tiles.insert(pos, TileKind::Pipe);
    }

    /// Place a powered (closed) pipe.
    pub fn set_closed_pipe(&mut self, pos: BlockPos, connections: Connections) {
        self.set_pipe(pos, connections);
        self.set_powered(pos, true);
    }

    /// Place a pipe block without a pipe tile behind it.
    pub fn set_pipe_block_only(&mut self, pos: BlockPos, connections: Connections) {
        self.remove(pos);
        self.blocks.insert(pos, BlockState::pipe(connections));
    }

    /// Place a fully connected pipe at each position.
    pub fn set_pipes(&mut self, positions: &[BlockPos]) {
        for &pos in positions {
            self.set_pipe(pos, Connections::ALL);
        }
    }

    pub fn set_pump(&mut self, pos: BlockPos, facing: Direction) {
        self.remove(pos);
        self.blocks.insert(pos, BlockState::Pump { facing });
        self.tiles.insert(pos, TileKind::Pump);
    }

    /// Place a tank exposing its handler on every face.
    pub fn set_tank(&mut self, pos: BlockPos, tank: FluidTank) {
        self.set_tank_on_faces(pos, tank, Connections::ALL);
    }

    /// Place a tank exposing its handler only on `faces`.
    pub fn set_tank_on_faces(&mut self, pos: BlockPos, tank: FluidTank, faces: Connections) {
        self.remove(pos);
        self.blocks.insert(pos, BlockState::Other);
        self.tiles.insert(pos, TileKind::Consumer);
        self.tanks.insert(pos, TankSlot { tank, faces });
    }

    /// Place a plain block with no tile.
    pub fn set_solid(&mut self, pos: BlockPos) {
        self.remove(pos);
        self.blocks.insert(pos, BlockState::Other);
    }

    /// Clear a position entirely (block, tile, tank).
    pub fn remove(&mut self, pos: BlockPos) {
        self.blocks.remove(&pos);
        self.tiles.remove(&pos);
        self.tanks.remove(&pos);
    }

    // -- Mutation --

    /// Toggle the powered flag of a pipe. No-op on other blocks.
    pub fn set_powered(&mut self, pos: BlockPos, value: bool) {
        if let Some(BlockState::Pipe { powered, .. }) = self.blocks.get_mut(&pos) {
            *powered = value;
        }
    }

    /// Set a single connection flag of a pipe. No-op on other blocks.
    pub fn set_connection(&mut self, pos: BlockPos, direction: Direction, connected: bool) {
        if let Some(BlockState::Pipe { connections, .. }) = self.blocks.get_mut(&pos) {
            *connections = connections.set(direction, connected);
        }
    }

    pub fn set_loaded(&mut self, pos: BlockPos, loaded: bool) {
        if loaded {
            self.unloaded.remove(&pos);
        } else {
            self.unloaded.insert(pos);
        }
    }

    pub fn set_client_side(&mut self, client_side: bool) {
        self.client_side = client_side;
    }

    // -- Inspection --

    pub fn tank(&self, pos: BlockPos) -> Option<&FluidTank> {
        self.tanks.get(&pos).map(|slot| &slot.tank)
    }

    pub fn tank_mut(&mut self, pos: BlockPos) -> Option<&mut FluidTank> {
        self.tanks.get_mut(&pos).map(|slot| &mut slot.tank)
    }

    /// Amount held by the tank at `pos`, or 0 when there is none.
    pub fn amount(&self, pos: BlockPos) -> u32 {
        self.tank(pos).map_or(0, FluidTank::amount)
    }

    /// Sum of all tank contents, for conservation checks.
    pub fn total_fluid(&self) -> u64 {
        self.tanks.values().map(|s| u64::from(s.tank.amount())).sum()
    }

    fn slot_mut(&mut self, handler: HandlerRef) -> Option<&mut TankSlot> {
        self.tanks
            .get_mut(&handler.pos)
            .filter(|slot| slot.faces.contains(handler.face))
    }
}

impl World for TestWorld {
    fn block_state(&self, pos: BlockPos) -> BlockState {
        self.blocks.get(&pos).copied().unwrap_or_default()
    }

    fn tile(&self, pos: BlockPos) -> Option<TileKind> {
        self.tiles.get(&pos).copied()
    }

    fn is_loaded(&self, pos: BlockPos) -> bool {
        !self.unloaded.contains(&pos)
    }

    fn fluid_handler(&self, pos: BlockPos, face: Direction) -> Option<HandlerRef> {
        self.tanks
            .get(&pos)
            .filter(|slot| slot.faces.contains(face))
            .map(|_| HandlerRef::new(pos, face))
    }

    fn tank_amount(&self, handler: HandlerRef, tank: usize) -> u32 {
        if tank != 0 {
            return 0;
        }
        self.tanks
            .get(&handler.pos)
            .filter(|slot| slot.faces.contains(handler.face))
            .map_or(0, |slot| slot.tank.amount())
    }

    fn fill(&mut self, handler: HandlerRef, stack: FluidStack, action: FluidAction) -> u32 {
        self.slot_mut(handler)
            .map_or(0, |slot| slot.tank.fill(stack, action))
    }

    fn drain(&mut self, handler: HandlerRef, max: u32, action: FluidAction) -> Option<FluidStack> {
        self.slot_mut(handler)
            .and_then(|slot| slot.tank.drain(max, action))
    }

    fn is_client_side(&self) -> bool {
        self.client_side
    }
}

// ===========================================================================
// Layout helpers
// ===========================================================================

/// Positions `start + direction * i` for `i` in `0..len`.
pub fn run(start: BlockPos, direction: Direction, len: usize) -> Vec<BlockPos> {
    let mut out = Vec::with_capacity(len);
    let mut pos = start;
    for _ in 0..len {
        out.push(pos);
        pos = pos.relative(direction);
    }
    out
}

/// A pump at `pump` facing `facing`, a filled source tank behind it, and a
/// straight run of `pipes` fully connected pipes in front of it.
///
/// Returns the pipe positions; the first free position past the run is
/// `pump.relative(facing)` advanced `pipes` times.
pub fn pump_line(
    world: &mut TestWorld,
    pump: BlockPos,
    facing: Direction,
    source_amount: u32,
    pipes: usize,
) -> Vec<BlockPos> {
    world.set_tank(
        pump.relative(facing.opposite()),
        FluidTank::filled(source_amount.max(1), water(), source_amount),
    );
    world.set_pump(pump, facing);
    let positions = run(pump.relative(facing), facing, pipes);
    world.set_pipes(&positions);
    positions
}
