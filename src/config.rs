//! Experiment configuration parameters.
//!
//! All tunable parameters for one heat-capacity run. The defaults are
//! the values calibrated on the reference rig; per-vessel loss
//! constants come from the insulation-loss measurement campaign.

use serde::{Deserialize, Serialize};

/// Number of hot-vessel samples held in the equilibrium window.
///
/// Empirically derived: with a 5 s measurement period the rate of
/// temperature change is only resolvable over >= 5 minutes, i.e.
/// 120 intervals between the oldest and newest of 121 samples.
pub const EQUILIBRIUM_WINDOW_SAMPLES: usize = 121;

/// Which insulated vessel holds the hot water for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VesselId {
    Vessel1,
    Vessel2,
}

/// Recovery policy for a raw read that fails its checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadPolicy {
    /// Substitute the last valid reading, up to `max_stale` consecutive
    /// substitutions; exceeding the bound surfaces an error.
    HoldLastValue { max_stale: u8 },
    /// Surface every checksum failure to the caller.
    FailFast,
}

/// Core experiment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    // --- Sensors ---
    /// DS18B20 conversion resolution (9-12 bits).
    pub sensor_resolution_bits: u8,
    /// Maximum sensor-connect attempts before giving up.
    pub init_retry_max: u8,
    /// Spacing between connect attempts (milliseconds).
    pub init_retry_delay_ms: u32,
    /// Checksum-failure recovery policy.
    pub read_policy: ReadPolicy,

    // --- Cool phase (reference bath) ---
    /// Measurement period for the reference bath (milliseconds).
    pub cool_period_ms: u32,
    /// Number of reference-bath samples taken per run (first discarded).
    pub cool_target_count: u16,

    // --- Hot phase (submerged-body vessel) ---
    /// Measurement period for the hot vessel (milliseconds).
    pub hot_period_ms: u32,
    /// Which vessel holds the hot water.
    pub hot_vessel: VesselId,
    /// Thermal-loss constant of vessel 1 (degrees C per millisecond).
    pub loss_const_vessel1: f32,
    /// Thermal-loss constant of vessel 2 (degrees C per millisecond).
    pub loss_const_vessel2: f32,
    /// Equilibrium tolerance as a fraction of the loss constant.
    pub equilibrium_tolerance: f32,

    // --- Storage ---
    /// Name of the append-only data file on the storage medium.
    pub data_file: heapless::String<16>,

    // --- Operator input ---
    /// Minimum edge-to-edge spacing for button debounce (milliseconds).
    pub button_debounce_ms: u32,
}

impl ExperimentConfig {
    /// Loss constant of the vessel configured as the hot vessel.
    pub fn hot_loss_const(&self) -> f32 {
        match self.hot_vessel {
            VesselId::Vessel1 => self.loss_const_vessel1,
            VesselId::Vessel2 => self.loss_const_vessel2,
        }
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            // Sensors
            sensor_resolution_bits: 12,
            init_retry_max: 20,
            init_retry_delay_ms: 20,
            read_policy: ReadPolicy::HoldLastValue { max_stale: 10 },

            // Cool phase
            cool_period_ms: 1000,
            cool_target_count: 11,

            // Hot phase
            hot_period_ms: 5000,
            hot_vessel: VesselId::Vessel2,
            loss_const_vessel1: 0.00089,
            loss_const_vessel2: 0.00046,
            equilibrium_tolerance: 0.05,

            // Storage
            data_file: heapless::String::try_from("data.csv").unwrap_or_default(),

            // Operator input
            button_debounce_ms: 50,
        }
    }
}
