//! Shared mutable context threaded through every phase handler.
//!
//! `PhaseContext` is the single struct that phase handlers read from
//! and write to: the latest sensor reading, measurement counters, the
//! equilibrium window, configuration, and the effect commands the
//! service applies to the ports after each tick.

use crate::config::{EQUILIBRIUM_WINDOW_SAMPLES, ExperimentConfig};
use crate::drivers::buzzer::PulsePattern;
use crate::record::MeasurementSample;
use crate::timers::TimerId;
use crate::window::EquilibriumWindow;

// ---------------------------------------------------------------------------
// Effect commands (written by phase handlers; applied by the service)
// ---------------------------------------------------------------------------

/// Effects requested by phase handlers. The service drains these after
/// every FSM step and maps them onto the storage, buzzer, timer and LED
/// ports — handlers themselves never touch hardware.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PhaseCommands {
    /// Record to append to the data file.
    pub append: Option<MeasurementSample>,
    /// Buzzer pattern to start.
    pub beep: Option<PulsePattern>,
    /// Timer to cancel.
    pub cancel_timer: Option<TimerId>,
    /// Close the held log file handle.
    pub close_log: bool,
    /// Unmount the storage medium.
    pub unmount_storage: bool,
    /// Status LED change request.
    pub led_on: Option<bool>,
}

impl PhaseCommands {
    /// Move the accumulated commands out, leaving a clean slate.
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }
}

// ---------------------------------------------------------------------------
// PhaseContext
// ---------------------------------------------------------------------------

/// The shared context passed to every phase handler function.
pub struct PhaseContext {
    // -- Timing --
    /// Milliseconds since the monotonic epoch, set before each step.
    pub now_ms: u64,

    // -- Input --
    /// Temperature read for this measurement tick, if any.
    pub reading_c: Option<f32>,

    // -- Measurement state --
    /// Samples taken this cool phase (including the discarded first).
    pub cool_count: u16,
    /// Samples taken this hot phase (including the discarded first).
    pub hot_count: u16,
    /// Record sequence number, shared across phases, monotonic.
    pub write_seq: u32,
    /// Recent hot-vessel history for rate estimation.
    pub window: EquilibriumWindow<EQUILIBRIUM_WINDOW_SAMPLES>,
    /// Whether the window-full blip has sounded this phase.
    pub window_alerted: bool,
    /// Latest cooling-rate estimate (degrees C per millisecond).
    pub last_rate: Option<f32>,
    /// Set once equilibrium is declared; the hot phase is terminal
    /// for the run.
    pub run_complete: bool,

    // -- Configuration --
    pub config: ExperimentConfig,

    // -- Outputs --
    /// Effects to apply after this step.
    pub commands: PhaseCommands,
}

impl PhaseContext {
    pub fn new(config: ExperimentConfig) -> Self {
        Self {
            now_ms: 0,
            reading_c: None,
            cool_count: 0,
            hot_count: 0,
            write_seq: 0,
            window: EquilibriumWindow::new(),
            window_alerted: false,
            last_rate: None,
            run_complete: false,
            config,
            commands: PhaseCommands::default(),
        }
    }
}
