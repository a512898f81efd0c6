//! Pipeflow Core -- shared types for block-based fluid pipe networks.
//!
//! This crate holds the vocabulary every other pipeflow crate speaks: block
//! positions and faces, pipe and pump block states, fluid stacks and tanks,
//! pump configuration, and the [`world::World`] trait through which the host
//! game exposes its blocks, tiles, and fluid capabilities.
//!
//! # Key Types
//!
//! - [`pos::BlockPos`] / [`pos::Direction`] -- integer coordinates and the six
//!   block faces, each with an opposite and a dense index.
//! - [`block::BlockState`] -- pipe (connections + powered), pump (facing), or
//!   anything else.
//! - [`world::World`] -- host collaborator: block/tile lookup, chunk
//!   residency, and fluid handler access with simulate/execute semantics.
//! - [`fluid::transfer`] -- moves fluid between two handlers atomically.
//! - [`config::PumpConfig`] -- per-tick transfer limit.

pub mod block;
pub mod config;
pub mod fluid;
pub mod id;
pub mod pos;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
