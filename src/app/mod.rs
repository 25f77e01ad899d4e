//! Application layer — the hexagonal core.
//!
//! [`service::ExperimentService`] owns the phase machine and the
//! domain state; [`ports`] defines the boundary traits the adapters
//! implement; [`events`] carries structured outbound events.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
