//! Mock rig for integration tests.
//!
//! Records every storage and signal call so tests can assert on the
//! full interaction history, and serves scripted sensor behaviour
//! (connect failures, reading sequences, checksum faults).

use std::collections::{HashMap, VecDeque};

use calorilog::MediaError;
use calorilog::app::events::AppEvent;
use calorilog::app::ports::{
    EventSink, FileId, LinkError, RadioPort, SensorBusPort, SignalPort, StoragePort,
};
use calorilog::sensors::SensorId;

// ── MockBench ─────────────────────────────────────────────────

pub struct MockBench {
    // Sensor scripting: number of connect attempts that fail before
    // one succeeds, and queued readings (None = checksum fault).
    pub cool_connect_fails: u32,
    pub hot_connect_fails: u32,
    pub cool_connects: u32,
    pub hot_connects: u32,
    pub cool_readings: VecDeque<Option<f32>>,
    pub hot_readings: VecDeque<Option<f32>>,
    pub cool_default: f32,
    pub hot_default: f32,

    // Storage state and call counters.
    pub fail_mount: bool,
    pub mounted: bool,
    pub mounts: u32,
    pub unmounts: u32,
    pub opens: u32,
    pub closes: u32,
    next_file: u8,
    open_file: Option<FileId>,
    pub files: HashMap<String, Vec<u8>>,

    // Signal state.
    pub tone_events: Vec<Option<u16>>,
    pub led_on: bool,
}

impl MockBench {
    pub fn new() -> Self {
        Self {
            cool_connect_fails: 0,
            hot_connect_fails: 0,
            cool_connects: 0,
            hot_connects: 0,
            cool_readings: VecDeque::new(),
            hot_readings: VecDeque::new(),
            cool_default: 24.8,
            hot_default: 70.0,
            fail_mount: false,
            mounted: false,
            mounts: 0,
            unmounts: 0,
            opens: 0,
            closes: 0,
            next_file: 0,
            open_file: None,
            files: HashMap::new(),
            tone_events: Vec::new(),
            led_on: false,
        }
    }

    /// Lines currently stored in the named file (CRLF-split).
    pub fn lines(&self, name: &str) -> Vec<String> {
        let data = self.files.get(name).cloned().unwrap_or_default();
        String::from_utf8(data)
            .expect("log file is valid UTF-8")
            .split_terminator("\r\n")
            .map(str::to_owned)
            .collect()
    }
}

impl Default for MockBench {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorBusPort for MockBench {
    fn connect(&mut self, sensor: SensorId) -> Result<(), LinkError> {
        let (count, budget) = match sensor {
            SensorId::CoolBath => (&mut self.cool_connects, self.cool_connect_fails),
            SensorId::HotVessel => (&mut self.hot_connects, self.hot_connect_fails),
        };
        *count += 1;
        if *count <= budget {
            Err(LinkError::NoPresence)
        } else {
            Ok(())
        }
    }

    fn set_resolution(&mut self, _sensor: SensorId, _bits: u8) -> Result<(), LinkError> {
        Ok(())
    }

    fn read_celsius(&mut self, sensor: SensorId) -> Option<f32> {
        match sensor {
            SensorId::CoolBath => match self.cool_readings.pop_front() {
                Some(r) => r,
                None => Some(self.cool_default),
            },
            SensorId::HotVessel => match self.hot_readings.pop_front() {
                Some(r) => r,
                None => Some(self.hot_default),
            },
        }
    }
}

impl StoragePort for MockBench {
    fn mount(&mut self) -> Result<(), MediaError> {
        if self.fail_mount {
            return Err(MediaError::MountFailed);
        }
        self.mounted = true;
        self.mounts += 1;
        Ok(())
    }

    fn unmount(&mut self) {
        self.mounted = false;
        self.unmounts += 1;
    }

    fn open_append(&mut self, name: &str) -> Result<FileId, MediaError> {
        if !self.mounted {
            return Err(MediaError::OpenFailed);
        }
        self.files.entry(name.to_owned()).or_default();
        let id = FileId(self.next_file);
        self.next_file = self.next_file.wrapping_add(1);
        self.open_file = Some(id);
        self.opens += 1;
        Ok(id)
    }

    fn append(&mut self, file: FileId, data: &[u8]) -> Result<(), MediaError> {
        if self.open_file != Some(file) {
            return Err(MediaError::FileNotOpen);
        }
        self.files
            .get_mut("data.csv")
            .ok_or(MediaError::FileNotOpen)?
            .extend_from_slice(data);
        Ok(())
    }

    fn close(&mut self, file: FileId) {
        if self.open_file == Some(file) {
            self.open_file = None;
            self.closes += 1;
        }
    }

    fn file_names(&self) -> Result<Vec<String>, MediaError> {
        Ok(self.files.keys().cloned().collect())
    }
}

impl SignalPort for MockBench {
    fn tone_on(&mut self, freq_hz: u16) {
        self.tone_events.push(Some(freq_hz));
    }

    fn tone_off(&mut self) {
        self.tone_events.push(None);
    }

    fn set_led(&mut self, on: bool) {
        self.led_on = on;
    }
}

// ── MockRadio ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockRadio {
    pub sleeping: bool,
    pub sleeps: u32,
    pub wakes: u32,
}

impl RadioPort for MockRadio {
    fn sleep(&mut self) {
        self.sleeping = true;
        self.sleeps += 1;
    }

    fn wake(&mut self) {
        self.sleeping = false;
        self.wakes += 1;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}
