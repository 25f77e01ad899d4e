//! Concrete phase handler functions and table builder.
//!
//! Each phase is defined by plain `fn` pointers — no closures, no
//! dynamic dispatch, no heap. Handlers consume the measurement input
//! from the context and write effect commands back into it; the
//! service maps those onto hardware after every step.
//!
//! ```text
//!  IDLE ──[cool button]──▶ COOL_MEASURING ──[target count]──▶ IDLE
//!  IDLE ──[hot button]───▶ HOT_MEASURING ──[equilibrium]────▶ IDLE
//!
//!  Either phase ──[manual stop]──▶ IDLE (exit teardown, no beep)
//! ```
//!
//! Button-driven entries are forced by the service (which owns the
//! mount/open preconditions); tick-driven completions come from the
//! `on_update` handlers below.

use log::{debug, info};

use super::context::PhaseContext;
use super::{PhaseDescriptor, PhaseId};
use crate::drivers::buzzer::{PATTERN_PHASE_DONE, PATTERN_WINDOW_FULL};
use crate::record::{LABEL_COOL, MeasurementSample, PhaseTag, vessel_label};
use crate::timers::TimerId;
use crate::window::equilibrium_reached;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static phase table. Called once at startup.
pub fn build_phase_table() -> [PhaseDescriptor; PhaseId::COUNT] {
    [
        // Index 0 — Idle
        PhaseDescriptor {
            id: PhaseId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1 — CoolMeasuring
        PhaseDescriptor {
            id: PhaseId::CoolMeasuring,
            name: "CoolMeasuring",
            on_enter: Some(cool_enter),
            on_exit: Some(cool_exit),
            on_update: cool_update,
        },
        // Index 2 — HotMeasuring
        PhaseDescriptor {
            id: PhaseId::HotMeasuring,
            name: "HotMeasuring",
            on_enter: Some(hot_enter),
            on_exit: Some(hot_exit),
            on_update: hot_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE phase
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut PhaseContext) {
    ctx.commands.led_on = Some(false);
    info!("IDLE: waiting for operator");
}

fn idle_update(_ctx: &mut PhaseContext) -> Option<PhaseId> {
    // Phase entries are operator-driven; a stray measurement tick
    // after a cancellation is ignored here.
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  COOL_MEASURING phase — reference bath at measurement cadence
// ═══════════════════════════════════════════════════════════════════════════

fn cool_enter(ctx: &mut PhaseContext) {
    ctx.cool_count = 0;
    ctx.commands.led_on = Some(true);
    info!(
        "COOL: measuring reference bath, target {} samples",
        ctx.config.cool_target_count
    );
}

fn cool_exit(ctx: &mut PhaseContext) {
    ctx.commands.cancel_timer = Some(TimerId::CoolMeasure);
    ctx.commands.unmount_storage = true;
}

fn cool_update(ctx: &mut PhaseContext) -> Option<PhaseId> {
    let temp = ctx.reading_c?;
    ctx.cool_count += 1;

    // The first sample reflects probe settling, not the bath.
    if ctx.cool_count == 1 {
        debug!("COOL: settling sample discarded ({temp:.2} C)");
        return None;
    }

    ctx.write_seq += 1;
    ctx.commands.append = Some(MeasurementSample {
        seq: ctx.write_seq,
        phase: PhaseTag::Cool,
        label: LABEL_COOL,
        timestamp_ms: ctx.now_ms,
        temperature_c: temp,
    });

    if ctx.cool_count >= ctx.config.cool_target_count {
        info!("COOL: target count reached, phase complete");
        ctx.commands.beep = Some(PATTERN_PHASE_DONE);
        return Some(PhaseId::Idle);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  HOT_MEASURING phase — hot vessel until thermal equilibrium
// ═══════════════════════════════════════════════════════════════════════════

fn hot_enter(ctx: &mut PhaseContext) {
    ctx.hot_count = 0;
    ctx.window.clear();
    ctx.window_alerted = false;
    ctx.last_rate = None;
    ctx.commands.led_on = Some(true);
    info!(
        "HOT: measuring vessel, loss constant {} C/ms",
        ctx.config.hot_loss_const()
    );
}

fn hot_exit(ctx: &mut PhaseContext) {
    ctx.commands.cancel_timer = Some(TimerId::HotMeasure);
    ctx.commands.close_log = true;
    ctx.commands.unmount_storage = true;
    ctx.window.clear();
}

fn hot_update(ctx: &mut PhaseContext) -> Option<PhaseId> {
    let temp = ctx.reading_c?;
    ctx.hot_count += 1;

    if ctx.hot_count == 1 {
        debug!("HOT: settling sample discarded ({temp:.2} C)");
        return None;
    }

    ctx.window.push(temp);
    ctx.write_seq += 1;
    ctx.commands.append = Some(MeasurementSample {
        seq: ctx.write_seq,
        phase: PhaseTag::Hot,
        label: vessel_label(ctx.config.hot_vessel),
        timestamp_ms: ctx.now_ms,
        temperature_c: temp,
    });

    if !ctx.window.is_full() {
        return None;
    }

    if !ctx.window_alerted {
        ctx.window_alerted = true;
        ctx.commands.beep = Some(PATTERN_WINDOW_FULL);
        info!("HOT: equilibrium window full, rate tracking live");
    }

    // Rate is defined from here on: the window spans its full width.
    let rate = ctx.window.cooling_rate(ctx.config.hot_period_ms)?;
    ctx.last_rate = Some(rate);

    let loss_const = ctx.config.hot_loss_const();
    if equilibrium_reached(rate, loss_const, ctx.config.equilibrium_tolerance) {
        info!(
            "HOT: equilibrium at rate {:.8} C/ms (loss constant {:.8})",
            rate, loss_const
        );
        ctx.run_complete = true;
        ctx.commands.beep = Some(PATTERN_PHASE_DONE);
        return Some(PhaseId::Idle);
    }
    None
}
