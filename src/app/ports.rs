//! Port traits — the hexagonal boundary between the controller and the
//! board.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ExperimentService (domain)
//! ```
//!
//! Driven adapters (sensor buses, the storage medium, the radio, the
//! buzzer/LED) implement these traits. The service consumes them via
//! generics, so the domain core never touches hardware directly. The
//! low-level protocols themselves (single-wire transfers, storage
//! mount primitives, tone synthesis) live entirely on the adapter side.

use crate::error::MediaError;
use crate::sensors::SensorId;

// ───────────────────────────────────────────────────────────────
// Sensor bus port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Error from the low-level sensor connect/identify primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// No device answered the presence pulse.
    NoPresence,
    /// The device's identity register did not match.
    BadIdentity,
}

impl core::fmt::Display for LinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoPresence => write!(f, "no presence pulse"),
            Self::BadIdentity => write!(f, "identity mismatch"),
        }
    }
}

/// Low-level access to the single-wire temperature probes.
pub trait SensorBusPort {
    /// Probe and identify the sensor. Called repeatedly by the
    /// driver's retry protocol until it succeeds or the budget runs out.
    fn connect(&mut self, sensor: SensorId) -> Result<(), LinkError>;

    /// Push the conversion resolution (9-12 bits) to a connected sensor.
    fn set_resolution(&mut self, sensor: SensorId, bits: u8) -> Result<(), LinkError>;

    /// Raw temperature read. `None` signals a checksum failure — the
    /// driver decides how to recover.
    fn read_celsius(&mut self, sensor: SensorId) -> Option<f32>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain → storage medium)
// ───────────────────────────────────────────────────────────────

/// Opaque handle to a file opened for appending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileId(pub u8);

/// The storage medium behind the shared serial bus.
pub trait StoragePort {
    /// Attach the medium. Fails if the underlying mount primitive fails.
    fn mount(&mut self) -> Result<(), MediaError>;

    /// Flush and detach the medium.
    fn unmount(&mut self);

    /// Open `name` in append mode.
    fn open_append(&mut self, name: &str) -> Result<FileId, MediaError>;

    /// Append raw bytes to an open file.
    fn append(&mut self, file: FileId, data: &[u8]) -> Result<(), MediaError>;

    /// Close an open file. Closing an unknown handle is a no-op.
    fn close(&mut self, file: FileId);

    /// Names of the files present on the medium.
    fn file_names(&self) -> Result<Vec<String>, MediaError>;
}

// ───────────────────────────────────────────────────────────────
// Radio port (coexistence control)
// ───────────────────────────────────────────────────────────────

/// Control over the radio peripheral whose interrupt activity corrupts
/// single-wire bus timing. See [`crate::radio::RadioQuiesce`] for the
/// guard that brackets bus operations.
pub trait RadioPort {
    /// Disable the radio's background activity.
    fn sleep(&mut self);

    /// Re-enable the radio.
    fn wake(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Signal port (driven adapter: domain → operator feedback)
// ───────────────────────────────────────────────────────────────

/// Audible and visual operator feedback outputs.
pub trait SignalPort {
    /// Start the buzzer at the given frequency.
    fn tone_on(&mut self, freq_hz: u16);

    /// Silence the buzzer.
    fn tone_off(&mut self);

    /// Drive the status LED.
    fn set_led(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log,
/// display, a test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
