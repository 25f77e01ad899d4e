//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events
//! to the logger. A display adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(phase) => {
                info!("START | initial_phase={:?}", phase);
            }
            AppEvent::PhaseChanged { from, to } => {
                info!("PHASE | {:?} -> {:?}", from, to);
            }
            AppEvent::PhaseRefused { phase, reason } => {
                warn!("PHASE | {:?} refused: {:?}", phase, reason);
            }
            AppEvent::SampleRecorded { seq, temperature_c } => {
                info!("SAMPLE | #{} {:.2} C", seq, temperature_c);
            }
            AppEvent::EquilibriumReached { rate_c_per_ms } => {
                info!("EQUILIBRIUM | rate={:.8} C/ms", rate_c_per_ms);
            }
            AppEvent::SensorReady(sensor) => {
                info!("SENSOR | {:?} ready", sensor);
            }
            AppEvent::SensorInitFailed(sensor) => {
                warn!("SENSOR | {:?} init failed", sensor);
            }
            AppEvent::Fault(e) => {
                warn!("FAULT | {}", e);
            }
        }
    }
}
