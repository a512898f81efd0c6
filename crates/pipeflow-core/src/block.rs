//! Block states and tile kinds as seen by the pipe network.
//!
//! Only the attributes the network logic reads are modelled: whether a block
//! is a pipe, pump, or anything else; a pipe's per-face connections and its
//! powered (closed valve) flag; a pump's facing.

use serde::{Deserialize, Serialize};

use crate::pos::Direction;

// ---------------------------------------------------------------------------
// Connections
// ---------------------------------------------------------------------------

/// Per-face connection flags of a pipe, one bit per [`Direction::index`].
///
/// Connections are claimed independently by each block; two neighbouring
/// pipes are only joined when both claim the shared face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Connections(u8);

impl Connections {
    pub const NONE: Connections = Connections(0);
    pub const ALL: Connections = Connections(0b11_1111);

    /// Build a set from a list of faces.
    pub fn of(faces: &[Direction]) -> Self {
        faces.iter().fold(Self::NONE, |acc, &d| acc.with(d))
    }

    pub const fn contains(self, direction: Direction) -> bool {
        self.0 & (1 << direction.index()) != 0
    }

    #[must_use]
    pub const fn with(self, direction: Direction) -> Self {
        Self(self.0 | (1 << direction.index()))
    }

    #[must_use]
    pub const fn without(self, direction: Direction) -> Self {
        Self(self.0 & !(1 << direction.index()))
    }

    /// Return a copy with `direction` set to `connected`.
    #[must_use]
    pub const fn set(self, direction: Direction, connected: bool) -> Self {
        if connected {
            self.with(direction)
        } else {
            self.without(direction)
        }
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Connected faces in index order.
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |&d| self.contains(d))
    }

    /// The flags as an array indexed by [`Direction::index`].
    pub fn to_array(self) -> [bool; Direction::COUNT] {
        Direction::ALL.map(|d| self.contains(d))
    }
}

impl From<[bool; Direction::COUNT]> for Connections {
    fn from(flags: [bool; Direction::COUNT]) -> Self {
        Direction::ALL
            .into_iter()
            .fold(Self::NONE, |acc, d| acc.set(d, flags[d.index()]))
    }
}

// ---------------------------------------------------------------------------
// Block state
// ---------------------------------------------------------------------------

/// Coarse classification of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    Pipe,
    Pump,
    Other,
}

/// The state of the block occupying a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlockState {
    /// A fluid pipe. A powered pipe is closed: it stays part of the network
    /// but neither propagates flow nor exposes consumers.
    Pipe {
        connections: Connections,
        powered: bool,
    },
    /// A pump. It pulls from the block behind it (`facing.opposite()`).
    Pump { facing: Direction },
    /// Anything else, including air and unloaded positions.
    #[default]
    Other,
}

impl BlockState {
    /// An unpowered pipe with the given connections.
    pub const fn pipe(connections: Connections) -> Self {
        BlockState::Pipe {
            connections,
            powered: false,
        }
    }

    pub const fn kind(&self) -> BlockKind {
        match self {
            BlockState::Pipe { .. } => BlockKind::Pipe,
            BlockState::Pump { .. } => BlockKind::Pump,
            BlockState::Other => BlockKind::Other,
        }
    }

    pub const fn is_pipe(&self) -> bool {
        matches!(self, BlockState::Pipe { .. })
    }

    /// `true` for a powered pipe; always `false` for other blocks.
    pub const fn is_powered(&self) -> bool {
        matches!(self, BlockState::Pipe { powered: true, .. })
    }

    /// Whether this block is a pipe claiming a connection on `direction`.
    pub const fn is_connected(&self, direction: Direction) -> bool {
        match self {
            BlockState::Pipe { connections, .. } => connections.contains(direction),
            _ => false,
        }
    }

    /// The pump facing, if this is a pump.
    pub const fn pump_facing(&self) -> Option<Direction> {
        match self {
            BlockState::Pump { facing } => Some(*facing),
            _ => None,
        }
    }
}

/// The tile entity attached to a position, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Pipe,
    Pump,
    /// Any tile that may expose a fluid handler (tanks, machines, vehicles).
    Consumer,
}
