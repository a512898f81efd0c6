//! Fluid stacks, the simulate/execute action flag, a reference tank, and the
//! [`transfer`] helper every pump uses to move fluid between two handlers.

use serde::{Deserialize, Serialize};

use crate::id::{FluidId, HandlerRef};
use crate::world::World;

/// An amount of one fluid type. Amounts are whole units (millibuckets).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FluidStack {
    pub fluid: FluidId,
    pub amount: u32,
}

impl FluidStack {
    pub const fn new(fluid: FluidId, amount: u32) -> Self {
        Self { fluid, amount }
    }

    pub const fn is_empty(&self) -> bool {
        self.amount == 0
    }
}

/// Whether a fill/drain call only reports what would happen or performs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FluidAction {
    Simulate,
    Execute,
}

impl FluidAction {
    pub const fn execute(self) -> bool {
        matches!(self, FluidAction::Execute)
    }
}

// ---------------------------------------------------------------------------
// Tank
// ---------------------------------------------------------------------------

/// A single-fluid tank with a fixed capacity.
///
/// Holds at most one fluid type at a time; an empty tank accepts any fluid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluidTank {
    fluid: Option<FluidId>,
    amount: u32,
    capacity: u32,
}

impl FluidTank {
    pub fn new(capacity: u32) -> Self {
        Self {
            fluid: None,
            amount: 0,
            capacity,
        }
    }

    /// A tank pre-filled with `amount` of `fluid`, clamped to capacity.
    pub fn filled(capacity: u32, fluid: FluidId, amount: u32) -> Self {
        let amount = amount.min(capacity);
        Self {
            fluid: (amount > 0).then_some(fluid),
            amount,
            capacity,
        }
    }

    pub fn fluid(&self) -> Option<FluidId> {
        self.fluid
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn space(&self) -> u32 {
        self.capacity - self.amount
    }

    /// Accept up to `stack.amount`; returns the amount accepted.
    pub fn fill(&mut self, stack: FluidStack, action: FluidAction) -> u32 {
        if stack.is_empty() {
            return 0;
        }
        if self.fluid.is_some_and(|f| f != stack.fluid) {
            return 0;
        }
        let accepted = stack.amount.min(self.space());
        if action.execute() && accepted > 0 {
            self.amount += accepted;
            self.fluid = Some(stack.fluid);
        }
        accepted
    }

    /// Remove up to `max`; returns what was (or would be) removed.
    pub fn drain(&mut self, max: u32, action: FluidAction) -> Option<FluidStack> {
        let fluid = self.fluid?;
        let drained = max.min(self.amount);
        if drained == 0 {
            return None;
        }
        if action.execute() {
            self.amount -= drained;
            if self.amount == 0 {
                self.fluid = None;
            }
        }
        Some(FluidStack::new(fluid, drained))
    }
}

// ---------------------------------------------------------------------------
// Transfer
// ---------------------------------------------------------------------------

/// Move up to `requested` units from `source` into `dest`.
///
/// Simulates the drain and the fill first, then executes only the amount the
/// destination agreed to take. Returns the amount moved, which never exceeds
/// `requested`.
pub fn transfer<W: World + ?Sized>(
    world: &mut W,
    source: HandlerRef,
    dest: HandlerRef,
    requested: u32,
) -> u32 {
    if requested == 0 || source == dest {
        return 0;
    }
    let Some(offered) = world.drain(source, requested, FluidAction::Simulate) else {
        return 0;
    };
    let accepted = world.fill(dest, offered, FluidAction::Simulate);
    if accepted == 0 {
        return 0;
    }
    let Some(drained) = world.drain(source, accepted, FluidAction::Execute) else {
        return 0;
    };
    world.fill(dest, drained, FluidAction::Execute)
}
