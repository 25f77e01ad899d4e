//! Unified error types for the calorimetry controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping
//! error handling in the control loop uniform. All variants are `Copy`
//! so they can be passed through the phase machine without allocation.

use core::fmt;

use crate::sensors::SensorId;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A required construction parameter was missing or malformed.
    /// Fatal to the call, never retried.
    Argument(&'static str),
    /// A bus or pin resource could not be claimed.
    Resource(ResourceError),
    /// A sensor exhausted its initialisation retry budget.
    SensorInit(SensorId),
    /// A read was issued against a sensor that is not `Ready`.
    SensorNotReady(SensorId),
    /// The hold-last-value substitution exceeded its staleness bound.
    SensorStale(SensorId),
    /// A single raw read failed its checksum (surfaced only under the
    /// fail-fast read policy).
    TransientRead(SensorId),
    /// A storage-medium operation failed.
    Media(MediaError),
    /// Read/write attempted while the medium is unmounted. Programmer
    /// error — callers must not retry.
    UnmountedAccess,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argument(msg) => write!(f, "argument: {msg}"),
            Self::Resource(e) => write!(f, "resource: {e}"),
            Self::SensorInit(id) => write!(f, "sensor {id:?}: init retry budget exhausted"),
            Self::SensorNotReady(id) => write!(f, "sensor {id:?}: read before READY"),
            Self::SensorStale(id) => write!(f, "sensor {id:?}: staleness bound exceeded"),
            Self::TransientRead(id) => write!(f, "sensor {id:?}: checksum failure"),
            Self::Media(e) => write!(f, "storage: {e}"),
            Self::UnmountedAccess => write!(f, "access to unmounted storage"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Bus / pin resource errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceError {
    /// The supplied pin number is outside the board's bus-capable range.
    PinNotBusCapable,
    /// The pin is already claimed by a previously allocated bus.
    PinAlreadyClaimed,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinNotBusCapable => write!(f, "pin is not bus-capable"),
            Self::PinAlreadyClaimed => write!(f, "pin already claimed"),
        }
    }
}

impl From<ResourceError> for Error {
    fn from(e: ResourceError) -> Self {
        Self::Resource(e)
    }
}

// ---------------------------------------------------------------------------
// Storage-medium errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaError {
    /// The underlying mount primitive failed.
    MountFailed,
    /// Opening the data file in append mode failed.
    OpenFailed,
    /// A write to an open file handle failed.
    WriteFailed,
    /// The referenced file handle is not open.
    FileNotOpen,
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MountFailed => write!(f, "mount failed"),
            Self::OpenFailed => write!(f, "file open failed"),
            Self::WriteFailed => write!(f, "file write failed"),
            Self::FileNotOpen => write!(f, "file handle not open"),
        }
    }
}

impl From<MediaError> for Error {
    fn from(e: MediaError) -> Self {
        Self::Media(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
