//! Sensor subsystem — the DS18B20 probe driver and probe identities.

pub mod ds18b20;

pub use ds18b20::{InitReporter, InitStage, InitState, LogInitReporter, SensorDriver};

/// Which physical probe a call refers to. Each probe sits on its own
/// single-wire bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorId {
    /// Probe in the reference bath (cool water).
    CoolBath,
    /// Probe in the hot vessel.
    HotVessel,
}
