//! Measurement records and their persisted text form.
//!
//! One record per sample, formatted as a semicolon-delimited line with
//! CRLF termination:
//!
//! ```text
//! <seq>;<phaseLabel>;<sampleLabel>;<timestampMillis>;<temperature.2f>;\r\n
//! ```

use core::fmt::Write as _;

use crate::config::VesselId;

/// Phase a sample was taken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTag {
    /// Reference-bath measurement (experiment phase 2).
    Cool,
    /// Hot-vessel measurement (experiment phase 3).
    Hot,
}

impl PhaseTag {
    /// Label written to the log file.
    pub fn label(self) -> &'static str {
        match self {
            Self::Cool => "Phase2",
            Self::Hot => "Phase3",
        }
    }
}

/// Sample label for the reference bath.
pub const LABEL_COOL: &str = "Cool----";

/// Sample label for a hot vessel.
pub fn vessel_label(vessel: VesselId) -> &'static str {
    match vessel {
        VesselId::Vessel1 => "Thermos1",
        VesselId::Vessel2 => "Thermos2",
    }
}

/// One immutable measurement sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementSample {
    /// Monotonically increasing record number, shared across phases.
    pub seq: u32,
    pub phase: PhaseTag,
    /// Which probe the sample came from.
    pub label: &'static str,
    /// Milliseconds since the monotonic epoch.
    pub timestamp_ms: u64,
    pub temperature_c: f32,
}

impl MeasurementSample {
    /// Render the persisted line, CRLF included.
    pub fn format_line(&self) -> heapless::String<64> {
        let mut line = heapless::String::new();
        // 64 bytes hold the widest line: u32 seq, two 8-char labels,
        // u64 timestamp, signed temperature with 2 decimals.
        let _ = write!(
            line,
            "{};{};{};{};{:.2};\r\n",
            self.seq,
            self.phase.label(),
            self.label,
            self.timestamp_ms,
            self.temperature_c,
        );
        line
    }
}
