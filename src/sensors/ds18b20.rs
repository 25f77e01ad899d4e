//! DS18B20 probe driver: bounded time-sliced initialisation and
//! fault-tolerant reads.
//!
//! The single-wire connect sequence fails sporadically right after
//! power-up, so initialisation is a retry protocol: attempts spaced a
//! fixed delay apart, capped at a fixed budget, each one reported
//! through an overridable [`InitReporter`]. The retry state lives on
//! the driver itself (`retry_count`), observable by callers and tests.
//!
//! Reads tolerate transient checksum failures: the raw read signals a
//! bad frame as `None`, and the driver substitutes the last valid
//! reading. Failures are assumed independent and rare on the
//! experiment's timescale, so the substitution is bounded by a
//! staleness counter — a run of consecutive bad frames surfaces an
//! error instead of silently holding a dead probe's value.
//!
//! Every bus operation is bracketed by the radio quiesce guard: the
//! radio's interrupt load corrupts single-wire bit timing.

use log::{error, info, warn};

use crate::app::ports::{LinkError, RadioPort, SensorBusPort};
use crate::config::ReadPolicy;
use crate::error::{Error, Result};
use crate::radio::RadioQuiesce;
use crate::sensors::SensorId;

// ---------------------------------------------------------------------------
// Initialisation state machine
// ---------------------------------------------------------------------------

/// Driver lifecycle: `Uninitialized → Retrying → { Ready | Failed }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    Retrying,
    Ready,
    Failed,
}

/// Stage tag passed to the progress reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStage {
    /// A connect attempt is about to run.
    AttemptStart,
    /// The attempt failed; the error is attached.
    AttemptFailed,
    /// The protocol finished, successfully or not.
    Final,
}

/// Progress reporting hook for the initialisation protocol.
/// The default implementation logs; a display adapter could override.
pub trait InitReporter {
    fn report(&mut self, sensor: SensorId, stage: InitStage, attempt: u8, error: Option<LinkError>);
}

/// Reporter that writes each stage to the log.
pub struct LogInitReporter;

impl InitReporter for LogInitReporter {
    fn report(&mut self, sensor: SensorId, stage: InitStage, attempt: u8, error: Option<LinkError>) {
        match stage {
            InitStage::AttemptStart => {
                info!("sensor {:?}: connect attempt {}", sensor, attempt);
            }
            InitStage::AttemptFailed => {
                warn!("sensor {:?}: attempt {} failed: {:?}", sensor, attempt, error);
            }
            InitStage::Final => match error {
                None => info!("sensor {:?}: ready", sensor),
                Some(e) => error!("sensor {:?}: init crash: {}", sensor, e),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Driver for one DS18B20 probe on its own single-wire bus.
pub struct SensorDriver {
    id: SensorId,
    resolution_bits: u8,
    policy: ReadPolicy,

    state: InitState,
    retry_count: u8,
    retry_max: u8,
    retry_delay_ms: u32,
    next_attempt_ms: u64,

    last_valid_c: f32,
    stale_reads: u8,
}

impl SensorDriver {
    pub fn new(id: SensorId, resolution_bits: u8, retry_max: u8, retry_delay_ms: u32, policy: ReadPolicy) -> Self {
        debug_assert!((9..=12).contains(&resolution_bits));
        Self {
            id,
            resolution_bits,
            policy,
            state: InitState::Uninitialized,
            retry_count: 0,
            retry_max,
            retry_delay_ms,
            next_attempt_ms: 0,
            last_valid_c: 0.0,
            stale_reads: 0,
        }
    }

    pub fn id(&self) -> SensorId {
        self.id
    }

    pub fn state(&self) -> InitState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == InitState::Ready
    }

    /// Attempts consumed so far.
    pub fn retry_count(&self) -> u8 {
        self.retry_count
    }

    /// Last temperature accepted as valid.
    pub fn last_valid(&self) -> f32 {
        self.last_valid_c
    }

    // -- Initialisation -----------------------------------------------------

    /// Start the retry protocol. The first attempt runs on the next
    /// `poll_init` at or after `now_ms`.
    pub fn begin_init(&mut self, now_ms: u64) {
        if self.state == InitState::Uninitialized {
            self.state = InitState::Retrying;
            self.next_attempt_ms = now_ms;
        }
    }

    /// Advance the initialisation protocol by at most one attempt.
    ///
    /// Call from the main loop; does nothing until the inter-attempt
    /// delay has elapsed. Returns the state after the poll.
    pub fn poll_init<B, R>(
        &mut self,
        now_ms: u64,
        bus: &mut B,
        radio: &mut R,
        reporter: &mut dyn InitReporter,
    ) -> InitState
    where
        B: SensorBusPort + ?Sized,
        R: RadioPort + ?Sized,
    {
        if self.state != InitState::Retrying || now_ms < self.next_attempt_ms {
            return self.state;
        }

        self.retry_count += 1;
        reporter.report(self.id, InitStage::AttemptStart, self.retry_count, None);

        let outcome = {
            let _quiet = RadioQuiesce::new(radio);
            bus.connect(self.id)
                .and_then(|()| bus.set_resolution(self.id, self.resolution_bits))
        };

        match outcome {
            Ok(()) => {
                self.state = InitState::Ready;
                reporter.report(self.id, InitStage::Final, self.retry_count, None);
            }
            Err(e) => {
                reporter.report(self.id, InitStage::AttemptFailed, self.retry_count, Some(e));
                if self.retry_count >= self.retry_max {
                    self.state = InitState::Failed;
                    reporter.report(self.id, InitStage::Final, self.retry_count, Some(e));
                } else {
                    self.next_attempt_ms = now_ms + u64::from(self.retry_delay_ms);
                }
            }
        }
        self.state
    }

    // -- Reading ------------------------------------------------------------

    /// Read the current temperature.
    ///
    /// Valid only when `Ready`. A checksum failure is recovered per the
    /// configured [`ReadPolicy`]; under hold-last-value, the previous
    /// valid reading is returned until the staleness bound trips.
    pub fn read<B, R>(&mut self, bus: &mut B, radio: &mut R) -> Result<f32>
    where
        B: SensorBusPort + ?Sized,
        R: RadioPort + ?Sized,
    {
        match self.state {
            InitState::Ready => {}
            InitState::Failed => return Err(Error::SensorInit(self.id)),
            _ => return Err(Error::SensorNotReady(self.id)),
        }

        let raw = {
            let _quiet = RadioQuiesce::new(radio);
            bus.read_celsius(self.id)
        };

        match raw {
            Some(t) => {
                self.last_valid_c = t;
                self.stale_reads = 0;
                Ok(t)
            }
            None => match self.policy {
                ReadPolicy::HoldLastValue { max_stale } => {
                    self.stale_reads = self.stale_reads.saturating_add(1);
                    if self.stale_reads > max_stale {
                        Err(Error::SensorStale(self.id))
                    } else {
                        Ok(self.last_valid_c)
                    }
                }
                ReadPolicy::FailFast => Err(Error::TransientRead(self.id)),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
