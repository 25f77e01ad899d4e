//! Outbound application events.
//!
//! The [`ExperimentService`](super::service::ExperimentService) emits
//! these through the [`EventSink`](super::ports::EventSink) port.
//! Adapters on the other side decide what to do with them — log to the
//! console, drive a display, or record them in a test.

use crate::error::Error;
use crate::fsm::PhaseId;
use crate::sensors::SensorId;

/// Why a phase-start request was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefusalReason {
    /// Another phase is already active.
    NotIdle,
    /// The hot phase already ran to equilibrium this run.
    RunComplete,
    /// The phase's sensor has not finished initialising.
    SensorNotReady,
    /// The phase's sensor exhausted its init retry budget.
    SensorFailed,
    /// The storage medium could not be mounted.
    StorageMount,
    /// The data file could not be opened.
    LogOpen,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the initial phase).
    Started(PhaseId),

    /// The phase machine moved.
    PhaseChanged { from: PhaseId, to: PhaseId },

    /// A phase-start request was refused.
    PhaseRefused { phase: PhaseId, reason: RefusalReason },

    /// A sample was appended to the data file.
    SampleRecorded { seq: u32, temperature_c: f32 },

    /// The hot-vessel cooling rate matched the vessel's loss constant.
    EquilibriumReached { rate_c_per_ms: f32 },

    /// A sensor finished initialising.
    SensorReady(SensorId),

    /// A sensor exhausted its init retry budget.
    SensorInitFailed(SensorId),

    /// A fault was caught at the callback boundary.
    Fault(Error),
}
