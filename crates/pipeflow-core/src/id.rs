use serde::{Deserialize, Serialize};

use crate::pos::{BlockPos, Direction};

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Identifies a fluid type (water, lava, fuel, ...). Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FluidId(pub u32);

/// Addresses a fluid handler capability: the tile at `pos`, accessed from `face`.
///
/// Handles are plain values; the world resolves them again on every call, so a
/// handle whose tile has since disappeared simply accepts and yields nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HandlerRef {
    pub pos: BlockPos,
    pub face: Direction,
}

impl HandlerRef {
    pub const fn new(pos: BlockPos, face: Direction) -> Self {
        Self { pos, face }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fluid_id_equality() {
        assert_eq!(FluidId(0), FluidId(0));
        assert_ne!(FluidId(0), FluidId(1));
    }

    #[test]
    fn handler_refs_differ_by_face() {
        let pos = BlockPos::new(4, 0, 0);
        let a = HandlerRef::new(pos, Direction::West);
        let b = HandlerRef::new(pos, Direction::East);
        assert_ne!(a, b);
        assert_eq!(a, HandlerRef::new(pos, Direction::West));
    }
}
