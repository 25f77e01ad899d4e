//! Function-pointer finite state machine for the experiment phases.
//!
//! Classic embedded FSM pattern:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  PhaseTable                                             │
//! │  ┌───────────────┬──────────┬─────────┬───────────────┐ │
//! │  │ PhaseId       │ on_enter │ on_exit │ on_update      │ │
//! │  ├───────────────┼──────────┼─────────┼───────────────┤ │
//! │  │ Idle          │ fn(ctx)  │ —       │ fn(ctx)->Opt<>│ │
//! │  │ CoolMeasuring │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Opt<>│ │
//! │  │ HotMeasuring  │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Opt<>│ │
//! │  └───────────────┴──────────┴─────────┴───────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! On each measurement tick the engine calls `on_update` for the
//! current phase. If it returns `Some(next)`, the engine runs
//! `on_exit` for the current phase, then `on_enter` for the next.
//! All handlers receive `&mut PhaseContext`, which carries the sample
//! input, counters, config and the effect commands; the service maps
//! the commands onto hardware ports after every step. Operator-driven
//! transitions (button presses) go through `force_transition`, which
//! runs the same exit/enter pair.

pub mod context;
pub mod states;

use context::PhaseContext;
use log::info;

// ---------------------------------------------------------------------------
// Phase identity
// ---------------------------------------------------------------------------

/// Enumeration of the experiment phases.
/// Must stay in sync with the table built in [`states::build_phase_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PhaseId {
    Idle = 0,
    CoolMeasuring = 1,
    HotMeasuring = 2,
}

impl PhaseId {
    /// Total number of phases — sizes the table array.
    pub const COUNT: usize = 3;

    /// Convert an index back to `PhaseId`. Panics on out-of-range in
    /// debug builds; returns `Idle` in release (safe fallback).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::CoolMeasuring,
            2 => Self::HotMeasuring,
            _ => {
                debug_assert!(false, "invalid phase index: {idx}");
                Self::Idle
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each transition.
pub type PhaseActionFn = fn(&mut PhaseContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type PhaseUpdateFn = fn(&mut PhaseContext) -> Option<PhaseId>;

// ---------------------------------------------------------------------------
// Phase descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single phase.
/// Stored in a fixed-size array — no heap, no `dyn`.
pub struct PhaseDescriptor {
    pub id: PhaseId,
    pub name: &'static str,
    pub on_enter: Option<PhaseActionFn>,
    pub on_exit: Option<PhaseActionFn>,
    pub on_update: PhaseUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The phase state machine engine.
///
/// Owns the phase table and steps a caller-provided [`PhaseContext`]
/// through it. At most one phase is active at a time by construction.
pub struct Fsm {
    /// Fixed-size table indexed by `PhaseId as usize`.
    table: [PhaseDescriptor; PhaseId::COUNT],
    /// Index of the currently active phase.
    current: usize,
}

impl Fsm {
    /// Construct a new FSM with the given table, starting in `initial`.
    pub fn new(table: [PhaseDescriptor; PhaseId::COUNT], initial: PhaseId) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter` for the starting phase.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut PhaseContext) {
        info!("FSM starting in phase: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one measurement tick.
    pub fn tick(&mut self, ctx: &mut PhaseContext) {
        let next = (self.table[self.current].on_update)(ctx);
        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Operator/command-driven transition (button press, manual stop).
    /// Runs the same exit/enter pair as a tick-driven transition.
    pub fn force_transition(&mut self, next: PhaseId, ctx: &mut PhaseContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    /// The current phase's identity.
    pub fn current_phase(&self) -> PhaseId {
        PhaseId::from_index(self.current)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: PhaseId, ctx: &mut PhaseContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
