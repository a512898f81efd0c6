//! The per-pump engine: lazy network discovery plus the per-tick fair split.

use std::collections::{BTreeMap, BTreeSet};

use pipeflow_core::config::PumpConfig;
use pipeflow_core::fluid::{FluidAction, transfer};
use pipeflow_core::id::{HandlerRef, Ticks};
use pipeflow_core::pos::BlockPos;
use pipeflow_core::world::World;
use tracing::trace;

use crate::PumpEvent;
use crate::network::Network;
use crate::registry::PipeRegistry;

// ---------------------------------------------------------------------------
// Tick report
// ---------------------------------------------------------------------------

/// What one pump cycle moved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Units the pump was allowed to pull this tick.
    pub pull_cap: u32,
    /// Units delivered per handler. Handlers that received nothing are absent.
    pub delivered: BTreeMap<HandlerRef, u32>,
}

impl TickReport {
    fn credit(&mut self, handler: HandlerRef, amount: u32) {
        if amount > 0 {
            *self.delivered.entry(handler).or_default() += amount;
        }
    }

    /// Total units moved out of the source.
    pub fn total(&self) -> u32 {
        self.delivered.values().sum()
    }

    pub fn delivered_to(&self, handler: HandlerRef) -> u32 {
        self.delivered.get(&handler).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

/// Split `pull_cap` units from `source` across `handlers`.
///
/// Each handler is first asked how much of the source fluid it would take.
/// Handlers whose room is below the equal share are filled completely and
/// the rest is shared evenly by those left; units that do not divide evenly
/// go one each to consecutive handlers starting at `cursor`, which advances
/// past them. Handlers with room left after a cycle never differ by more than
/// one unit.
///
/// The total moved never exceeds `pull_cap`.
pub fn distribute<W: World + ?Sized>(
    world: &mut W,
    source: HandlerRef,
    handlers: Vec<HandlerRef>,
    pull_cap: u32,
    cursor: &mut usize,
) -> TickReport {
    let mut report = TickReport {
        pull_cap,
        delivered: BTreeMap::new(),
    };
    if handlers.is_empty() || pull_cap == 0 {
        return report;
    }
    let Some(offered) = world.drain(source, pull_cap, FluidAction::Simulate) else {
        return report;
    };

    let (mut live, rooms): (Vec<HandlerRef>, Vec<u32>) = handlers
        .into_iter()
        .map(|handler| (handler, world.fill(handler, offered, FluidAction::Simulate)))
        .filter(|&(_, room)| room > 0)
        .unzip();

    let mut remaining = offered.amount;
    for (&handler, quota) in live.iter().zip(fair_shares(&rooms, remaining, cursor)) {
        let moved = transfer(world, source, handler, quota);
        report.credit(handler, moved);
        remaining -= moved;
    }

    // Handlers on one tank share its room, so a quota can come up short.
    // Top up whoever has received least, one unit at a time.
    while remaining > 0 && !live.is_empty() {
        let Some(index) = (0..live.len()).min_by_key(|&i| report.delivered_to(live[i])) else {
            break;
        };
        let moved = transfer(world, source, live[index], 1);
        if moved == 0 {
            live.remove(index);
        } else {
            report.credit(live[index], moved);
            remaining -= moved;
        }
    }

    report
}

/// Max-min fair quotas for `amount` units over handlers with the given room.
fn fair_shares(rooms: &[u32], amount: u32, cursor: &mut usize) -> Vec<u32> {
    let mut quotas = vec![0; rooms.len()];
    let mut settled = vec![false; rooms.len()];
    let mut remaining = amount;
    let mut open = rooms.len();

    // Raising the level only ever settles more handlers.
    loop {
        if open == 0 {
            return quotas;
        }
        let level = remaining / open as u32;
        let mut changed = false;
        for (i, &room) in rooms.iter().enumerate() {
            if !settled[i] && room <= level {
                quotas[i] = room;
                settled[i] = true;
                remaining -= room;
                open -= 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let open: Vec<usize> = (0..rooms.len()).filter(|&i| !settled[i]).collect();
    let level = remaining / open.len() as u32;
    for &i in &open {
        quotas[i] = level;
    }
    let extra = (remaining - level * open.len() as u32) as usize;
    for k in 0..extra {
        quotas[open[cursor.wrapping_add(k) % open.len()]] += 1;
    }
    *cursor = cursor.wrapping_add(extra);
    quotas
}

// ---------------------------------------------------------------------------
// Pump
// ---------------------------------------------------------------------------

/// A pump tile: pulls from the handler behind it and feeds its network.
#[derive(Debug, Clone)]
pub struct Pump {
    pos: BlockPos,
    valid: bool,
    network: Network,
    /// Whether the source handler was present last time it was looked up.
    source_present: bool,
    last_report: Option<TickReport>,
}

impl Pump {
    /// A pump at `pos` whose network will be discovered on its first tick.
    pub fn new(pos: BlockPos) -> Self {
        Self {
            pos,
            valid: false,
            network: Network::default(),
            source_present: true,
            last_report: None,
        }
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    /// `true` once discovery has run since the last invalidation.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Mark the network stale; it is rediscovered on the next tick.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Snapshot of the pipe positions in this pump's network.
    pub fn network_view(&self) -> BTreeSet<BlockPos> {
        self.network.pipes().keys().copied().collect()
    }

    /// The report of the most recent tick that reached the transfer stage.
    pub fn last_report(&self) -> Option<&TickReport> {
        self.last_report.as_ref()
    }

    /// The handler this pump pulls from: the tile behind the pump, accessed
    /// from the face pointing at the pump.
    pub fn source_handler<W: World + ?Sized>(&self, world: &W) -> Option<HandlerRef> {
        let facing = world.block_state(self.pos).pump_facing()?;
        world.fluid_handler(self.pos.relative(facing.opposite()), facing)
    }

    /// Consumers that can be reached this tick, in discovery order.
    pub fn live_handlers<W: World + ?Sized>(&self, world: &W) -> Vec<HandlerRef> {
        self.network
            .consumers()
            .iter()
            .filter(|c| world.is_loaded(c.pos))
            .filter_map(|c| world.fluid_handler(c.pos, c.face))
            .collect()
    }

    /// Tear down the current network and discover it again.
    pub fn rebuild<W: World + ?Sized>(&mut self, world: &W, registry: &mut PipeRegistry) {
        self.network.teardown(self.pos, registry);
        self.network = Network::discover(world, self.pos, registry);
        self.valid = true;
    }

    /// Release every pipe back-reference. Called when the pump is removed
    /// or unloaded.
    pub fn on_removed(&mut self, registry: &mut PipeRegistry) {
        self.network.teardown(self.pos, registry);
        self.valid = false;
        self.last_report = None;
    }

    /// Run one pump cycle: rediscover if stale, then move fluid.
    pub fn tick<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        registry: &mut PipeRegistry,
        config: &PumpConfig,
        current_tick: Ticks,
    ) -> Vec<PumpEvent> {
        let mut events = Vec::new();
        if world.is_client_side() {
            return events;
        }

        if !self.valid {
            self.rebuild(world, registry);
            events.push(PumpEvent::NetworkRebuilt {
                pump: self.pos,
                pipes: self.network.pipes().len(),
                consumers: self.network.consumers().len(),
                tick: current_tick,
            });
        }

        self.last_report = None;
        if self.network.consumers().is_empty() {
            return events;
        }

        let handlers = self.live_handlers(world);
        if handlers.is_empty() {
            return events;
        }

        let Some(source) = self.source_handler(world) else {
            if self.source_present {
                self.source_present = false;
                events.push(PumpEvent::SourceMissing {
                    pump: self.pos,
                    tick: current_tick,
                });
            }
            return events;
        };
        self.source_present = true;

        let pull_cap = world.tank_amount(source, 0).min(config.per_tick_transfer());
        if pull_cap == 0 {
            return events;
        }

        let report = distribute(world, source, handlers, pull_cap, &mut self.network.cursor);
        let amount = report.total();
        if amount > 0 {
            trace!(pump = %self.pos, amount, targets = report.delivered.len(), "pumped fluid");
            events.push(PumpEvent::FluidPumped {
                pump: self.pos,
                amount,
                tick: current_tick,
            });
        }
        self.last_report = Some(report);
        events
    }
}
