//! Adapters — implementations of the port traits.
//!
//! The clock and log sink are real; the bench adapter simulates the
//! rig's peripherals in memory so the controller can run end-to-end on
//! a development host. Board-specific adapters replace `sim` when the
//! firmware is built for the target.

pub mod clock;
pub mod log_sink;
pub mod sim;
