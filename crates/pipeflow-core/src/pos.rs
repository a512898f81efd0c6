use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Block position
// ---------------------------------------------------------------------------

/// An integer block coordinate in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const ORIGIN: BlockPos = BlockPos { x: 0, y: 0, z: 0 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Offset this position by a raw delta.
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The neighbouring position one block towards `direction`.
    pub const fn relative(self, direction: Direction) -> Self {
        let (dx, dy, dz) = direction.offset();
        self.offset(dx, dy, dz)
    }

    /// All six face-adjacent neighbours, in [`Direction::ALL`] order.
    pub fn neighbors(self) -> impl Iterator<Item = BlockPos> {
        Direction::ALL.into_iter().map(move |d| self.relative(d))
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// One of the six axis-aligned block faces.
///
/// The discriminant is the dense face index used to address per-face state
/// such as pipe connections. Iteration order ([`Direction::ALL`]) follows the
/// index, which keeps consumer discovery order deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// -Y
    Down = 0,
    /// +Y
    Up = 1,
    /// -Z
    North = 2,
    /// +Z
    South = 3,
    /// -X
    West = 4,
    /// +X
    East = 5,
}

impl Direction {
    pub const COUNT: usize = 6;

    /// All six directions in index order.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Dense index in `0..6`.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`index`](Direction::index).
    pub const fn from_index(index: usize) -> Option<Direction> {
        match index {
            0 => Some(Direction::Down),
            1 => Some(Direction::Up),
            2 => Some(Direction::North),
            3 => Some(Direction::South),
            4 => Some(Direction::West),
            5 => Some(Direction::East),
            _ => None,
        }
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
        }
    }

    /// Unit offset `(dx, dy, dz)` for this face.
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Direction::Down => (0, -1, 0),
            Direction::Up => (0, 1, 0),
            Direction::North => (0, 0, -1),
            Direction::South => (0, 0, 1),
            Direction::West => (-1, 0, 0),
            Direction::East => (1, 0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
            assert_ne!(d.opposite(), d);
        }
    }

    #[test]
    fn opposite_offsets_cancel() {
        for d in Direction::ALL {
            let (x, y, z) = d.offset();
            let (ox, oy, oz) = d.opposite().offset();
            assert_eq!((x + ox, y + oy, z + oz), (0, 0, 0));
        }
    }

    #[test]
    fn index_round_trips() {
        for (i, d) in Direction::ALL.iter().enumerate() {
            assert_eq!(d.index(), i);
            assert_eq!(Direction::from_index(i), Some(*d));
        }
        assert_eq!(Direction::from_index(6), None);
    }

    #[test]
    fn relative_moves_one_block() {
        let pos = BlockPos::new(1, 0, 0);
        assert_eq!(pos.relative(Direction::East), BlockPos::new(2, 0, 0));
        assert_eq!(pos.relative(Direction::West), BlockPos::ORIGIN);
        assert_eq!(pos.relative(Direction::Up), BlockPos::new(1, 1, 0));
        assert_eq!(pos.relative(Direction::North), BlockPos::new(1, 0, -1));
    }

    #[test]
    fn neighbors_are_distinct() {
        let all: std::collections::BTreeSet<_> = BlockPos::ORIGIN.neighbors().collect();
        assert_eq!(all.len(), 6);
        assert!(!all.contains(&BlockPos::ORIGIN));
    }

    #[test]
    fn positions_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(BlockPos::new(1, 2, 3), "pipe");
        assert_eq!(map[&BlockPos::new(1, 2, 3)], "pipe");
    }
}
