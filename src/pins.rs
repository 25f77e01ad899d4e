//! Pin assignments for the logger board.
//!
//! Single source of truth — the wiring code references this module
//! rather than hard-coding pin numbers. The numbering follows the
//! board's logical pin map; `PIN_COUNT` bounds the bus-capable range.

use crate::bus::Pin;

/// Number of bus-capable pins on the board.
pub const PIN_COUNT: u8 = 32;

// ---------------------------------------------------------------------------
// Shared serial bus (storage medium)
// ---------------------------------------------------------------------------

pub const SPI_MOSI: Pin = Pin(7);
pub const SPI_MISO: Pin = Pin(2);
pub const SPI_SCK: Pin = Pin(21);

/// Chip-select line for the storage medium.
pub const STORAGE_CS: Pin = Pin(20);

// ---------------------------------------------------------------------------
// Single-wire temperature sensors (one line each)
// ---------------------------------------------------------------------------

/// Reference-bath sensor (cool water).
pub const OW_COOL: Pin = Pin(0);
/// Hot-vessel sensor.
pub const OW_HOT: Pin = Pin(1);

// ---------------------------------------------------------------------------
// Operator controls and indicators
// ---------------------------------------------------------------------------

/// Momentary button starting/stopping the hot-vessel phase.
pub const BUTTON_HOT: Pin = Pin(18);
/// Momentary button starting/stopping the reference-bath phase.
pub const BUTTON_COOL: Pin = Pin(12);

/// Status LED — lit while a measurement phase is running.
pub const STATUS_LED: Pin = Pin(17);
/// Piezo buzzer.
pub const BUZZER: Pin = Pin(16);
