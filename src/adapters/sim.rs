//! In-memory simulation of the rig's peripherals.
//!
//! Lets the full controller run end-to-end on a development host: the
//! hot vessel follows an exponential cooling curve toward ambient, the
//! storage medium is a `HashMap` of files, and the buzzer/LED/radio
//! just track state. Board-specific adapters replace this when the
//! firmware targets real hardware.

use std::collections::HashMap;

use log::{debug, info};

use crate::app::ports::{FileId, LinkError, RadioPort, SensorBusPort, SignalPort, StoragePort};
use crate::error::MediaError;
use crate::sensors::SensorId;

// ---------------------------------------------------------------------------
// SimBench — sensors, storage, buzzer, LED
// ---------------------------------------------------------------------------

/// Simulated rig: both probes, the storage medium, buzzer and LED.
pub struct SimBench {
    /// Simulation time, advanced by the main loop.
    now_ms: u64,
    /// Ambient (reference bath) temperature.
    ambient_c: f32,
    /// Hot-vessel temperature at the epoch.
    hot_start_c: f32,
    /// Exponential cooling time constant (milliseconds).
    tau_ms: f32,

    mounted: bool,
    next_file: u8,
    open_file: Option<FileId>,
    files: HashMap<String, Vec<u8>>,

    led_on: bool,
    tone_hz: Option<u16>,
}

impl SimBench {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            ambient_c: 24.8,
            hot_start_c: 72.0,
            tau_ms: 1_800_000.0, // ~30 min to 1/e
            mounted: false,
            next_file: 0,
            open_file: None,
            files: HashMap::new(),
            led_on: false,
            tone_hz: None,
        }
    }

    /// Override the thermal profile (demo runs use a faster vessel).
    pub fn with_profile(mut self, ambient_c: f32, hot_start_c: f32, tau_ms: f32) -> Self {
        self.ambient_c = ambient_c;
        self.hot_start_c = hot_start_c;
        self.tau_ms = tau_ms;
        self
    }

    /// Advance the simulated rig to `now_ms`.
    pub fn advance_to(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    /// Contents of a simulated file, for inspection.
    pub fn file_bytes(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    fn hot_temperature(&self) -> f32 {
        let decay = (-(self.now_ms as f32) / self.tau_ms).exp();
        self.ambient_c + (self.hot_start_c - self.ambient_c) * decay
    }
}

impl Default for SimBench {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorBusPort for SimBench {
    fn connect(&mut self, sensor: SensorId) -> Result<(), LinkError> {
        debug!("sim: sensor {:?} connected", sensor);
        Ok(())
    }

    fn set_resolution(&mut self, _sensor: SensorId, _bits: u8) -> Result<(), LinkError> {
        Ok(())
    }

    fn read_celsius(&mut self, sensor: SensorId) -> Option<f32> {
        match sensor {
            SensorId::CoolBath => Some(self.ambient_c),
            SensorId::HotVessel => Some(self.hot_temperature()),
        }
    }
}

impl StoragePort for SimBench {
    fn mount(&mut self) -> Result<(), MediaError> {
        self.mounted = true;
        Ok(())
    }

    fn unmount(&mut self) {
        self.mounted = false;
    }

    fn open_append(&mut self, name: &str) -> Result<FileId, MediaError> {
        if !self.mounted {
            return Err(MediaError::OpenFailed);
        }
        self.files.entry(name.to_owned()).or_default();
        let id = FileId(self.next_file);
        self.next_file = self.next_file.wrapping_add(1);
        self.open_file = Some(id);
        Ok(id)
    }

    fn append(&mut self, file: FileId, data: &[u8]) -> Result<(), MediaError> {
        if self.open_file != Some(file) {
            return Err(MediaError::FileNotOpen);
        }
        // The bench keeps a single data file; appends always land there.
        self.files
            .values_mut()
            .next()
            .ok_or(MediaError::FileNotOpen)?
            .extend_from_slice(data);
        Ok(())
    }

    fn close(&mut self, file: FileId) {
        if self.open_file == Some(file) {
            self.open_file = None;
        }
    }

    fn file_names(&self) -> Result<Vec<String>, MediaError> {
        Ok(self.files.keys().cloned().collect())
    }
}

impl SignalPort for SimBench {
    fn tone_on(&mut self, freq_hz: u16) {
        self.tone_hz = Some(freq_hz);
        info!("sim: tone on at {} Hz", freq_hz);
    }

    fn tone_off(&mut self) {
        self.tone_hz = None;
        info!("sim: tone off");
    }

    fn set_led(&mut self, on: bool) {
        if self.led_on != on {
            info!("sim: LED {}", if on { "on" } else { "off" });
        }
        self.led_on = on;
    }
}

// ---------------------------------------------------------------------------
// SimRadio — coexistence peer
// ---------------------------------------------------------------------------

/// Simulated radio peripheral; only tracks the sleep/wake state the
/// coexistence guard toggles around bus operations.
pub struct SimRadio {
    sleeping: bool,
}

impl SimRadio {
    pub fn new() -> Self {
        Self { sleeping: false }
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }
}

impl Default for SimRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl RadioPort for SimRadio {
    fn sleep(&mut self) {
        self.sleeping = true;
    }

    fn wake(&mut self) {
        self.sleeping = false;
    }
}
