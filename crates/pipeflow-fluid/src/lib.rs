//! Pump-driven fluid pipe networks.
//!
//! A pump pulls fluid from the tile behind it and spreads it over every fluid
//! handler touching the pipes reachable from it. Networks are never stored;
//! they are derived from world state on demand and thrown away whenever a
//! pipe they depend on changes.
//!
//! # Design
//!
//! - Each [`Pump`] owns its [`Network`]: the member pipes and the boundary
//!   [`Consumer`]s, discovered lazily on the first tick after invalidation.
//! - Each pipe keeps a pump-set in the [`PipeRegistry`]. Pumps and pipes
//!   only hold each other's positions; tiles are resolved through the world.
//! - Pipe placement, removal, and state changes fan out through the registry
//!   and mark dependent pumps stale. No work happens eagerly.
//! - Each tick, a pump moves at most [`PumpConfig::per_tick_transfer`] units
//!   split so that handlers with room never differ by more than one unit.
//! - Failures at tick time (unloaded consumers, a missing source, an empty
//!   network) are absorbed: the tick simply does less work.
//! - Events fire on rebuilds, on flow, and on the source going missing
//!   (transition only).

pub mod network;
pub mod pump;
pub mod registry;

pub use network::{Consumer, Network, PipeNode};
pub use pump::{Pump, TickReport, distribute};
pub use registry::{PipeRegistry, PipeTile};

use std::collections::{BTreeMap, BTreeSet};

use pipeflow_core::config::{ConfigError, PumpConfig};
use pipeflow_core::id::Ticks;
use pipeflow_core::pos::BlockPos;
use pipeflow_core::world::World;
use tracing::debug;

// ---------------------------------------------------------------------------
// Events and errors
// ---------------------------------------------------------------------------

/// Events emitted by pumps during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpEvent {
    /// A pump rediscovered its network.
    NetworkRebuilt {
        pump: BlockPos,
        pipes: usize,
        consumers: usize,
        tick: Ticks,
    },
    /// A pump moved fluid this tick.
    FluidPumped {
        pump: BlockPos,
        amount: u32,
        tick: Ticks,
    },
    /// A pump's source handler disappeared. Fires once per outage.
    SourceMissing { pump: BlockPos, tick: Ticks },
}

/// Errors from registering or removing pumps.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("a pump is already registered at {0}")]
    PumpAlreadyPlaced(BlockPos),
    #[error("no pump registered at {0}")]
    UnknownPump(BlockPos),
}

// ---------------------------------------------------------------------------
// Pump module
// ---------------------------------------------------------------------------

/// Owns every pump and the pipe registry, and routes host notifications.
///
/// The host calls [`tick`](PumpModule::tick) once per server tick and the
/// `on_*` hooks whenever blocks change. The config is read on every tick, so
/// [`set_config`](PumpModule::set_config) takes effect immediately.
#[derive(Debug, Clone, Default)]
pub struct PumpModule {
    pumps: BTreeMap<BlockPos, Pump>,
    registry: PipeRegistry,
    config: PumpConfig,
    current_tick: Ticks,
}

impl PumpModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PumpConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &PumpConfig {
        &self.config
    }

    /// Replace the config. A rejected config leaves the current one in place.
    pub fn set_config(&mut self, config: PumpConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Ticks run so far.
    pub fn current_tick(&self) -> Ticks {
        self.current_tick
    }

    pub fn registry(&self) -> &PipeRegistry {
        &self.registry
    }

    // -- Pumps --

    /// Register a pump placed (or loaded) at `pos`.
    pub fn add_pump(&mut self, pos: BlockPos) -> Result<&mut Pump, NetworkError> {
        if self.pumps.contains_key(&pos) {
            return Err(NetworkError::PumpAlreadyPlaced(pos));
        }
        Ok(self.pumps.entry(pos).or_insert_with(|| Pump::new(pos)))
    }

    /// Unregister the pump at `pos`, releasing its pipe back-references.
    pub fn remove_pump(&mut self, pos: BlockPos) -> Result<Pump, NetworkError> {
        let mut pump = self
            .pumps
            .remove(&pos)
            .ok_or(NetworkError::UnknownPump(pos))?;
        pump.on_removed(&mut self.registry);
        Ok(pump)
    }

    pub fn pump(&self, pos: BlockPos) -> Option<&Pump> {
        self.pumps.get(&pos)
    }

    pub fn pump_mut(&mut self, pos: BlockPos) -> Option<&mut Pump> {
        self.pumps.get_mut(&pos)
    }

    pub fn pumps(&self) -> impl Iterator<Item = &Pump> {
        self.pumps.values()
    }

    /// Snapshot of the pipes in the network of the pump at `pos`.
    pub fn network_view(&self, pos: BlockPos) -> Option<BTreeSet<BlockPos>> {
        self.pumps.get(&pos).map(Pump::network_view)
    }

    /// Mark the pump at `pos` stale. Returns whether a pump was there.
    pub fn invalidate(&mut self, pos: BlockPos) -> bool {
        match self.pumps.get_mut(&pos) {
            Some(pump) => {
                pump.invalidate();
                true
            }
            None => false,
        }
    }

    /// Mark every pump stale, e.g. after the world was reloaded.
    pub fn invalidate_all(&mut self) {
        for pump in self.pumps.values_mut() {
            pump.invalidate();
        }
    }

    // -- Host notifications --

    /// A pipe was placed at `pos`.
    pub fn on_pipe_placed(&mut self, pos: BlockPos) {
        self.registry.insert(pos);
        self.invalidate_around(pos);
    }

    /// A pipe's connections or powered flag changed.
    pub fn on_pipe_changed(&mut self, pos: BlockPos) {
        self.invalidate_around(pos);
    }

    /// A pipe was broken or unloaded.
    pub fn on_pipe_removed(&mut self, pos: BlockPos) {
        self.invalidate_around(pos);
        self.registry.remove(pos);
    }

    /// Any block at `pos` changed. Conservative: every pump that might route
    /// through or next to `pos` is invalidated.
    pub fn on_neighbor_changed(&mut self, pos: BlockPos) {
        self.invalidate_around(pos);
    }

    /// Invalidate the pump-sets of the pipe at `pos` and its six neighbours,
    /// plus any pump sitting at one of those positions.
    fn invalidate_around(&mut self, pos: BlockPos) {
        let mut stale = BTreeSet::new();
        for at in std::iter::once(pos).chain(pos.neighbors()) {
            stale.extend(self.registry.notify_invalidated(at));
            if self.pumps.contains_key(&at) {
                stale.insert(at);
            }
        }
        if stale.is_empty() {
            return;
        }
        debug!(at = %pos, pumps = stale.len(), "invalidating pump networks");
        for pump in stale {
            self.invalidate(pump);
        }
    }

    // -- Tick --

    /// Run one cycle of every pump, in position order.
    pub fn tick<W: World + ?Sized>(&mut self, world: &mut W) -> Vec<PumpEvent> {
        let tick = self.current_tick;
        let mut events = Vec::new();
        for pump in self.pumps.values_mut() {
            events.extend(pump.tick(world, &mut self.registry, &self.config, tick));
        }
        self.current_tick += 1;
        events
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pipeflow_core::block::Connections;
    use pipeflow_core::fluid::FluidTank;
    use pipeflow_core::pos::Direction;
    use pipeflow_core::test_utils::*;

    fn p(x: i32, y: i32, z: i32) -> BlockPos {
        BlockPos::new(x, y, z)
    }

    const PUMP: BlockPos = BlockPos::new(1, 0, 0);

    fn line_module(world: &mut TestWorld, pipes: usize) -> PumpModule {
        pump_line(world, PUMP, Direction::East, 1000, pipes);
        let mut module = PumpModule::with_config(PumpConfig::new(10).unwrap()).unwrap();
        module.add_pump(PUMP).unwrap();
        module
    }

    #[test]
    fn duplicate_pump_rejected() {
        let mut module = PumpModule::new();
        module.add_pump(PUMP).unwrap();
        assert_eq!(
            module.add_pump(PUMP).unwrap_err(),
            NetworkError::PumpAlreadyPlaced(PUMP)
        );
    }

    #[test]
    fn removing_unknown_pump_errors() {
        let mut module = PumpModule::new();
        assert_eq!(
            module.remove_pump(PUMP).unwrap_err(),
            NetworkError::UnknownPump(PUMP)
        );
    }

    #[test]
    fn tick_counter_advances() {
        let mut world = TestWorld::new();
        let mut module = line_module(&mut world, 1);
        module.tick(&mut world);
        module.tick(&mut world);
        assert_eq!(module.current_tick(), 2);
    }

    #[test]
    fn events_carry_tick_number() {
        let mut world = TestWorld::new();
        let mut module = line_module(&mut world, 1);
        world.set_tank(p(3, 0, 0), FluidTank::new(100));
        module.tick(&mut world);
        let events = module.tick(&mut world);
        assert_eq!(
            events,
            vec![PumpEvent::FluidPumped {
                pump: PUMP,
                amount: 10,
                tick: 1
            }]
        );
    }

    #[test]
    fn pipe_change_invalidates_dependent_pumps() {
        let mut world = TestWorld::new();
        let mut module = line_module(&mut world, 3);
        module.tick(&mut world);
        assert!(module.pump(PUMP).unwrap().is_valid());

        world.set_powered(p(3, 0, 0), true);
        module.on_pipe_changed(p(3, 0, 0));
        assert!(!module.pump(PUMP).unwrap().is_valid());
    }

    #[test]
    fn unrelated_pipe_change_leaves_pump_valid() {
        let mut world = TestWorld::new();
        let mut module = line_module(&mut world, 2);
        world.set_pipe(p(20, 0, 0), Connections::ALL);
        module.tick(&mut world);

        module.on_pipe_changed(p(20, 0, 0));
        assert!(module.pump(PUMP).unwrap().is_valid());
    }

    #[test]
    fn placing_pipe_next_to_empty_pump_invalidates_it() {
        let mut world = TestWorld::new();
        let mut module = line_module(&mut world, 0);
        module.tick(&mut world);
        assert!(module.network_view(PUMP).unwrap().is_empty());

        world.set_pipe(p(2, 0, 0), Connections::ALL);
        module.on_pipe_placed(p(2, 0, 0));
        assert!(!module.pump(PUMP).unwrap().is_valid());

        module.tick(&mut world);
        assert_eq!(
            module.network_view(PUMP).unwrap().into_iter().collect::<Vec<_>>(),
            vec![p(2, 0, 0)]
        );
    }

    #[test]
    fn extending_the_run_is_picked_up() {
        let mut world = TestWorld::new();
        let mut module = line_module(&mut world, 2);
        module.tick(&mut world);

        world.set_pipe(p(4, 0, 0), Connections::ALL);
        module.on_pipe_placed(p(4, 0, 0));
        module.tick(&mut world);
        assert!(module.network_view(PUMP).unwrap().contains(&p(4, 0, 0)));
    }

    #[test]
    fn new_consumer_next_to_pipe_is_picked_up() {
        let mut world = TestWorld::new();
        let mut module = line_module(&mut world, 2);
        module.tick(&mut world);
        assert!(module.pump(PUMP).unwrap().network().consumers().is_empty());

        world.set_tank(p(4, 0, 0), FluidTank::new(100));
        module.on_neighbor_changed(p(4, 0, 0));
        module.tick(&mut world);
        assert_eq!(module.pump(PUMP).unwrap().network().consumers().len(), 1);
        assert_eq!(world.amount(p(4, 0, 0)), 10);
    }

    #[test]
    fn removed_pipe_drops_registry_entry() {
        let mut world = TestWorld::new();
        let mut module = line_module(&mut world, 2);
        module.tick(&mut world);

        world.remove(p(3, 0, 0));
        module.on_pipe_removed(p(3, 0, 0));
        assert!(module.registry().get(p(3, 0, 0)).is_none());
        assert!(!module.pump(PUMP).unwrap().is_valid());

        module.tick(&mut world);
        assert_eq!(
            module.network_view(PUMP).unwrap().into_iter().collect::<Vec<_>>(),
            vec![p(2, 0, 0)]
        );
    }

    #[test]
    fn remove_pump_releases_backrefs() {
        let mut world = TestWorld::new();
        let mut module = line_module(&mut world, 2);
        module.tick(&mut world);
        assert!(module.registry().get(p(2, 0, 0)).unwrap().contains(PUMP));

        let pump = module.remove_pump(PUMP).unwrap();
        assert!(pump.network_view().is_empty());
        assert!(module.registry().get(p(2, 0, 0)).unwrap().is_empty());
        assert!(module.pump(PUMP).is_none());
    }

    #[test]
    fn config_change_applies_next_tick() {
        let mut world = TestWorld::new();
        let mut module = line_module(&mut world, 1);
        world.set_tank(p(3, 0, 0), FluidTank::new(1000));
        module.tick(&mut world);
        assert_eq!(world.amount(p(3, 0, 0)), 10);

        module.set_config(PumpConfig::new(25).unwrap()).unwrap();
        module.tick(&mut world);
        assert_eq!(world.amount(p(3, 0, 0)), 35);
    }

    #[test]
    fn invalidate_all_marks_every_pump() {
        let mut world = TestWorld::new();
        let mut module = line_module(&mut world, 1);
        module.add_pump(p(50, 0, 0)).unwrap();
        module.tick(&mut world);
        assert!(module.pumps().all(Pump::is_valid));

        module.invalidate_all();
        assert!(module.pumps().all(|pump| !pump.is_valid()));
        assert!(!module.invalidate(p(99, 0, 0)));
    }

    #[test]
    fn two_pumps_share_a_pipe() {
        let mut world = TestWorld::new();
        // Pumps at both ends of a two-pipe run, each with its own source.
        pump_line(&mut world, PUMP, Direction::East, 1000, 2);
        world.set_tank(p(5, 0, 0), FluidTank::filled(1000, water(), 1000));
        world.set_pump(p(4, 0, 0), Direction::West);
        world.set_tank(p(2, 1, 0), FluidTank::new(1000));

        let mut module = PumpModule::with_config(PumpConfig::new(10).unwrap()).unwrap();
        module.add_pump(PUMP).unwrap();
        module.add_pump(p(4, 0, 0)).unwrap();
        module.tick(&mut world);

        let tile = module.registry().get(p(2, 0, 0)).unwrap();
        assert!(tile.contains(PUMP));
        assert!(tile.contains(p(4, 0, 0)));
        assert_eq!(world.amount(p(2, 1, 0)), 20);

        module.on_pipe_changed(p(2, 0, 0));
        assert!(module.pumps().all(|pump| !pump.is_valid()));
    }
}
