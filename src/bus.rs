//! Communication-bus registry.
//!
//! Allocates and tracks handles to the board's digital buses: the
//! shared serial (SPI-style) bus reaching the storage medium, and one
//! single-wire bus per temperature sensor. The registry is the sole
//! path through which the wiring code obtains a bus handle; it owns
//! the name counters and the claimed-pin set, so a pin can never end
//! up on two buses.
//!
//! There is exactly one registry per run: it is constructed once in
//! `main` and passed explicitly to the code that needs it, rather than
//! living in a process-wide global.

use core::fmt::Write as _;

use log::info;

use crate::error::{Error, ResourceError, Result};
use crate::pins::PIN_COUNT;

/// A logical pin on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pin(pub u8);

impl Pin {
    /// Whether this pin can carry a digital bus line.
    pub fn is_bus_capable(self) -> bool {
        self.0 < PIN_COUNT
    }
}

/// The kind of bus a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusKind {
    /// Synchronous multi-line bus (clock + data lines).
    Serial,
    /// Half-duplex single-data-line bus.
    SingleWire,
}

/// Pin roles for a serial bus. All three are required; `allocate_serial`
/// rejects a missing role with an argument error.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialBusPins {
    pub mosi: Option<Pin>,
    pub miso: Option<Pin>,
    pub sck: Option<Pin>,
}

/// An exclusive handle to an initialised bus.
///
/// Handles are marked in-use at creation and live for the rest of the
/// program — there is no multiplexing within a run, so no release path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusHandle {
    pub kind: BusKind,
    /// Generated name, `<prefix><index>` (e.g. `SPI10`, `OW1`).
    pub name: heapless::String<8>,
    in_use: bool,
}

impl BusHandle {
    pub fn in_use(&self) -> bool {
        self.in_use
    }
}

/// Name prefix and first index for serial buses.
const SERIAL_PREFIX: &str = "SPI";
const SERIAL_FIRST_INDEX: u8 = 10;

/// Name prefix and first index for single-wire buses.
const SINGLE_WIRE_PREFIX: &str = "OW";
const SINGLE_WIRE_FIRST_INDEX: u8 = 1;

/// Registry of every bus allocated during this run.
pub struct BusRegistry {
    serial_index: u8,
    single_wire_index: u8,
    /// Bitmask of claimed pin numbers (`PIN_COUNT` <= 32).
    claimed: u32,
}

impl BusRegistry {
    pub fn new() -> Self {
        Self {
            serial_index: SERIAL_FIRST_INDEX,
            single_wire_index: SINGLE_WIRE_FIRST_INDEX,
            claimed: 0,
        }
    }

    /// Allocate the shared serial bus.
    ///
    /// Fails with [`Error::Argument`] when a pin role is missing and
    /// with [`Error::Resource`] when a supplied pin is not bus-capable
    /// or already claimed.
    pub fn allocate_serial(&mut self, pins: SerialBusPins) -> Result<BusHandle> {
        let (Some(mosi), Some(miso), Some(sck)) = (pins.mosi, pins.miso, pins.sck) else {
            return Err(Error::Argument("mosi, miso and sck are all required"));
        };

        for pin in [mosi, miso, sck] {
            self.check_pin(pin)?;
        }
        for pin in [mosi, miso, sck] {
            self.claim(pin);
        }

        // The allocation counter increments even across notional
        // failures downstream, so a name is never reused in-process.
        let name = make_name(SERIAL_PREFIX, self.serial_index);
        self.serial_index += 1;

        info!("bus registry: serial bus '{}' allocated", name);
        Ok(BusHandle {
            kind: BusKind::Serial,
            name,
            in_use: true,
        })
    }

    /// Allocate a single-wire bus on one data pin.
    pub fn allocate_single_wire(&mut self, pin: Pin) -> Result<BusHandle> {
        self.check_pin(pin)?;
        self.claim(pin);

        let name = make_name(SINGLE_WIRE_PREFIX, self.single_wire_index);
        self.single_wire_index += 1;

        info!("bus registry: single-wire bus '{}' allocated", name);
        Ok(BusHandle {
            kind: BusKind::SingleWire,
            name,
            in_use: true,
        })
    }

    /// Number of pins currently claimed by allocated buses.
    pub fn claimed_count(&self) -> u32 {
        self.claimed.count_ones()
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn check_pin(&self, pin: Pin) -> Result<()> {
        if !pin.is_bus_capable() {
            return Err(ResourceError::PinNotBusCapable.into());
        }
        if self.claimed & (1 << pin.0) != 0 {
            return Err(ResourceError::PinAlreadyClaimed.into());
        }
        Ok(())
    }

    fn claim(&mut self, pin: Pin) {
        self.claimed |= 1 << pin.0;
    }
}

fn make_name(prefix: &str, index: u8) -> heapless::String<8> {
    let mut name = heapless::String::new();
    // Prefix + two-digit index always fits in 8 bytes.
    let _ = write!(name, "{prefix}{index}");
    name
}
