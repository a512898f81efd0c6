//! The host world as seen by the pipe network.
//!
//! The network never owns world state. Everything it needs (block states,
//! tiles, chunk residency, fluid capabilities) is queried through [`World`],
//! which the host implements over its own block and tile storage.

use crate::block::{BlockState, TileKind};
use crate::fluid::{FluidAction, FluidStack};
use crate::id::HandlerRef;
use crate::pos::{BlockPos, Direction};

pub trait World {
    /// The block state at `pos`. Unloaded positions report [`BlockState::Other`].
    fn block_state(&self, pos: BlockPos) -> BlockState;

    /// The tile entity at `pos`, if any.
    fn tile(&self, pos: BlockPos) -> Option<TileKind>;

    /// Whether the chunk containing `pos` is loaded.
    fn is_loaded(&self, pos: BlockPos) -> bool;

    /// The fluid handler exposed by the tile at `pos` on `face`, if any.
    fn fluid_handler(&self, pos: BlockPos, face: Direction) -> Option<HandlerRef>;

    /// Current volume in the given tank of a handler. Unknown handlers report 0.
    fn tank_amount(&self, handler: HandlerRef, tank: usize) -> u32;

    /// Offer `stack` to a handler; returns the accepted amount.
    fn fill(&mut self, handler: HandlerRef, stack: FluidStack, action: FluidAction) -> u32;

    /// Take up to `max` units from a handler.
    fn drain(&mut self, handler: HandlerRef, max: u32, action: FluidAction) -> Option<FluidStack>;

    /// Client-side worlds mirror state only; pumps do no work there.
    fn is_client_side(&self) -> bool {
        false
    }
}
