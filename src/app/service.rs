//! Experiment service — the hexagonal core.
//!
//! [`ExperimentService`] owns the phase machine, both sensor drivers,
//! the storage logger and the buzzer sequencer. It exposes a clean,
//! hardware-agnostic API; all I/O flows through port traits injected
//! at call sites, so the whole controller runs against mock adapters
//! in tests.
//!
//! ```text
//!  SensorBusPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!  RadioPort     ──▶ │    ExperimentService     │
//!  StoragePort  ◀──  │  FSM · Sensors · Logger  │
//!  SignalPort   ◀──  └──────────────────────────┘
//! ```
//!
//! Faults raised while handling a measurement tick are caught here —
//! the callback boundary — logged and emitted as events; a fault must
//! never take down the control loop, because a dead loop silently ends
//! data collection.

use log::{info, warn};

use crate::config::ExperimentConfig;
use crate::drivers::button::ButtonId;
use crate::drivers::buzzer::{FeedbackSignaler, PATTERN_COOL_START, PATTERN_HOT_START};
use crate::fsm::context::PhaseContext;
use crate::fsm::states::build_phase_table;
use crate::fsm::{Fsm, PhaseId};
use crate::sensors::ds18b20::{InitState, LogInitReporter, SensorDriver};
use crate::sensors::SensorId;
use crate::storage::StorageLogger;
use crate::timers::{TimerEngine, TimerId};

use super::commands::AppCommand;
use super::events::{AppEvent, RefusalReason};
use super::ports::{EventSink, RadioPort, SensorBusPort, SignalPort, StoragePort};

// ───────────────────────────────────────────────────────────────
// ExperimentService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct ExperimentService {
    fsm: Fsm,
    ctx: PhaseContext,
    cool_sensor: SensorDriver,
    hot_sensor: SensorDriver,
    logger: StorageLogger,
    signaler: FeedbackSignaler,
    reporter: LogInitReporter,
}

impl ExperimentService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the phase machine — call [`Self::start`] next.
    pub fn new(config: ExperimentConfig) -> Self {
        let cool_sensor = SensorDriver::new(
            SensorId::CoolBath,
            config.sensor_resolution_bits,
            config.init_retry_max,
            config.init_retry_delay_ms,
            config.read_policy,
        );
        let hot_sensor = SensorDriver::new(
            SensorId::HotVessel,
            config.sensor_resolution_bits,
            config.init_retry_max,
            config.init_retry_delay_ms,
            config.read_policy,
        );
        let logger = StorageLogger::new(config.data_file.clone());
        let ctx = PhaseContext::new(config);
        let fsm = Fsm::new(build_phase_table(), PhaseId::Idle);

        Self {
            fsm,
            ctx,
            cool_sensor,
            hot_sensor,
            logger,
            signaler: FeedbackSignaler::new(),
            reporter: LogInitReporter,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter the initial phase and kick off sensor initialisation.
    pub fn start(
        &mut self,
        now_ms: u64,
        hw: &mut (impl StoragePort + SignalPort),
        timers: &mut TimerEngine,
        sink: &mut impl EventSink,
    ) {
        self.fsm.start(&mut self.ctx);
        self.cool_sensor.begin_init(now_ms);
        self.hot_sensor.begin_init(now_ms);
        self.apply_commands(now_ms, hw, timers, sink);
        sink.emit(&AppEvent::Started(self.fsm.current_phase()));
        info!("ExperimentService started in {:?}", self.fsm.current_phase());
    }

    /// Per-iteration housekeeping: advance sensor initialisation and
    /// the buzzer sequencer. Call from the main loop every pass.
    pub fn poll(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorBusPort + SignalPort),
        radio: &mut impl RadioPort,
        sink: &mut impl EventSink,
    ) {
        for sensor in [SensorId::CoolBath, SensorId::HotVessel] {
            let driver = match sensor {
                SensorId::CoolBath => &mut self.cool_sensor,
                SensorId::HotVessel => &mut self.hot_sensor,
            };
            let before = driver.state();
            let after = driver.poll_init(now_ms, hw, radio, &mut self.reporter);
            if before != after {
                match after {
                    InitState::Ready => sink.emit(&AppEvent::SensorReady(sensor)),
                    InitState::Failed => sink.emit(&AppEvent::SensorInitFailed(sensor)),
                    _ => {}
                }
            }
        }

        self.signaler.tick(now_ms, hw);
    }

    // ── Operator input ────────────────────────────────────────

    /// Map a debounced button press onto a command for the current
    /// phase: a press starts the button's phase from Idle, and stops
    /// that same phase while it is running.
    pub fn on_button(
        &mut self,
        button: ButtonId,
        now_ms: u64,
        hw: &mut (impl StoragePort + SignalPort),
        timers: &mut TimerEngine,
        sink: &mut impl EventSink,
    ) {
        let phase = self.fsm.current_phase();
        let cmd = match (button, phase) {
            (ButtonId::Cool, PhaseId::Idle) => AppCommand::StartCoolPhase,
            (ButtonId::Hot, PhaseId::Idle) => AppCommand::StartHotPhase,
            (ButtonId::Cool, PhaseId::CoolMeasuring) | (ButtonId::Hot, PhaseId::HotMeasuring) => {
                AppCommand::StopExperiment
            }
            _ => {
                warn!("button {:?} ignored during {:?}", button, phase);
                return;
            }
        };
        self.handle_command(cmd, now_ms, hw, timers, sink);
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (button mapping or test harness).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u64,
        hw: &mut (impl StoragePort + SignalPort),
        timers: &mut TimerEngine,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::StartCoolPhase => self.start_cool(now_ms, hw, timers, sink),
            AppCommand::StartHotPhase => self.start_hot(now_ms, hw, timers, sink),
            AppCommand::StopExperiment => self.stop(now_ms, hw, timers, sink),
        }
    }

    fn start_cool(
        &mut self,
        now_ms: u64,
        hw: &mut (impl StoragePort + SignalPort),
        timers: &mut TimerEngine,
        sink: &mut impl EventSink,
    ) {
        let Some(()) = self.check_phase_entry(PhaseId::CoolMeasuring, &self.cool_sensor, sink)
        else {
            return;
        };

        if let Err(e) = self.logger.mount(hw) {
            warn!("cool phase refused: {}", e);
            sink.emit(&AppEvent::Fault(e));
            sink.emit(&AppEvent::PhaseRefused {
                phase: PhaseId::CoolMeasuring,
                reason: RefusalReason::StorageMount,
            });
            return;
        }

        let _ = self.signaler.play(PATTERN_COOL_START, now_ms);
        timers.arm_periodic(TimerId::CoolMeasure, self.ctx.config.cool_period_ms, now_ms);
        self.transition_to(PhaseId::CoolMeasuring, now_ms, hw, timers, sink);
    }

    fn start_hot(
        &mut self,
        now_ms: u64,
        hw: &mut (impl StoragePort + SignalPort),
        timers: &mut TimerEngine,
        sink: &mut impl EventSink,
    ) {
        if self.ctx.run_complete {
            warn!("hot phase refused: experiment already ran to equilibrium");
            sink.emit(&AppEvent::PhaseRefused {
                phase: PhaseId::HotMeasuring,
                reason: RefusalReason::RunComplete,
            });
            return;
        }
        let Some(()) = self.check_phase_entry(PhaseId::HotMeasuring, &self.hot_sensor, sink)
        else {
            return;
        };

        if let Err(e) = self.logger.mount(hw) {
            warn!("hot phase refused: {}", e);
            sink.emit(&AppEvent::Fault(e));
            sink.emit(&AppEvent::PhaseRefused {
                phase: PhaseId::HotMeasuring,
                reason: RefusalReason::StorageMount,
            });
            return;
        }
        // The hot phase holds the file open for its whole duration.
        if let Err(e) = self.logger.open_log(hw) {
            warn!("hot phase refused: {}", e);
            self.logger.unmount(hw);
            sink.emit(&AppEvent::Fault(e));
            sink.emit(&AppEvent::PhaseRefused {
                phase: PhaseId::HotMeasuring,
                reason: RefusalReason::LogOpen,
            });
            return;
        }

        let _ = self.signaler.play(PATTERN_HOT_START, now_ms);
        timers.arm_periodic(TimerId::HotMeasure, self.ctx.config.hot_period_ms, now_ms);
        self.transition_to(PhaseId::HotMeasuring, now_ms, hw, timers, sink);
    }

    fn stop(
        &mut self,
        now_ms: u64,
        hw: &mut (impl StoragePort + SignalPort),
        timers: &mut TimerEngine,
        sink: &mut impl EventSink,
    ) {
        if self.fsm.current_phase() == PhaseId::Idle {
            return;
        }
        info!("manual stop requested");
        self.transition_to(PhaseId::Idle, now_ms, hw, timers, sink);
    }

    // ── Measurement ticks ─────────────────────────────────────

    /// Handle a fired measurement timer.
    pub fn on_timer(
        &mut self,
        id: TimerId,
        now_ms: u64,
        hw: &mut (impl SensorBusPort + StoragePort + SignalPort),
        radio: &mut impl RadioPort,
        timers: &mut TimerEngine,
        sink: &mut impl EventSink,
    ) {
        let expected = match id {
            TimerId::CoolMeasure => PhaseId::CoolMeasuring,
            TimerId::HotMeasure => PhaseId::HotMeasuring,
        };
        if self.fsm.current_phase() != expected {
            // Stray tick after a cancellation raced the queue.
            return;
        }

        let driver = match id {
            TimerId::CoolMeasure => &mut self.cool_sensor,
            TimerId::HotMeasure => &mut self.hot_sensor,
        };
        let temp = match driver.read(hw, radio) {
            Ok(t) => t,
            Err(e) => {
                // Callback boundary: log and carry on, skipping the sample.
                warn!("measurement tick fault: {}", e);
                sink.emit(&AppEvent::Fault(e));
                return;
            }
        };

        let prev = self.fsm.current_phase();
        let was_complete = self.ctx.run_complete;

        self.ctx.now_ms = now_ms;
        self.ctx.reading_c = Some(temp);
        self.fsm.tick(&mut self.ctx);
        self.ctx.reading_c = None;

        if !was_complete && self.ctx.run_complete {
            sink.emit(&AppEvent::EquilibriumReached {
                rate_c_per_ms: self.ctx.last_rate.unwrap_or(0.0),
            });
        }

        self.apply_commands(now_ms, hw, timers, sink);

        let now_phase = self.fsm.current_phase();
        if now_phase != prev {
            sink.emit(&AppEvent::PhaseChanged {
                from: prev,
                to: now_phase,
            });
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current phase.
    pub fn phase(&self) -> PhaseId {
        self.fsm.current_phase()
    }

    /// Whether equilibrium ended the hot phase this run.
    pub fn run_complete(&self) -> bool {
        self.ctx.run_complete
    }

    /// Records written so far (the shared sequence counter).
    pub fn records_written(&self) -> u32 {
        self.ctx.write_seq
    }

    /// Latest hot-vessel cooling-rate estimate, if the window is live.
    pub fn last_rate(&self) -> Option<f32> {
        self.ctx.last_rate
    }

    /// Init state of the given sensor.
    pub fn sensor_state(&self, sensor: SensorId) -> InitState {
        match sensor {
            SensorId::CoolBath => self.cool_sensor.state(),
            SensorId::HotVessel => self.hot_sensor.state(),
        }
    }

    /// Whether the storage medium is currently mounted.
    pub fn storage_mounted(&self) -> bool {
        self.logger.is_mounted()
    }

    // ── Internal ──────────────────────────────────────────────

    /// Common entry guard: must be Idle and the phase's sensor Ready.
    fn check_phase_entry(
        &self,
        phase: PhaseId,
        sensor: &SensorDriver,
        sink: &mut impl EventSink,
    ) -> Option<()> {
        if self.fsm.current_phase() != PhaseId::Idle {
            warn!("{:?} refused: controller not idle", phase);
            sink.emit(&AppEvent::PhaseRefused {
                phase,
                reason: RefusalReason::NotIdle,
            });
            return None;
        }
        match sensor.state() {
            InitState::Ready => Some(()),
            InitState::Failed => {
                warn!("{:?} refused: sensor {:?} failed init", phase, sensor.id());
                sink.emit(&AppEvent::PhaseRefused {
                    phase,
                    reason: RefusalReason::SensorFailed,
                });
                None
            }
            _ => {
                warn!("{:?} refused: sensor {:?} still initialising", phase, sensor.id());
                sink.emit(&AppEvent::PhaseRefused {
                    phase,
                    reason: RefusalReason::SensorNotReady,
                });
                None
            }
        }
    }

    /// Force a phase transition and apply its enter/exit effects.
    fn transition_to(
        &mut self,
        next: PhaseId,
        now_ms: u64,
        hw: &mut (impl StoragePort + SignalPort),
        timers: &mut TimerEngine,
        sink: &mut impl EventSink,
    ) {
        let prev = self.fsm.current_phase();
        self.fsm.force_transition(next, &mut self.ctx);
        self.apply_commands(now_ms, hw, timers, sink);
        if prev != next {
            sink.emit(&AppEvent::PhaseChanged { from: prev, to: next });
        }
    }

    /// Translate accumulated phase commands into port calls.
    ///
    /// Ordering matters: the final sample of a completing phase is
    /// appended before the file is closed and the medium unmounted.
    fn apply_commands(
        &mut self,
        now_ms: u64,
        hw: &mut (impl StoragePort + SignalPort),
        timers: &mut TimerEngine,
        sink: &mut impl EventSink,
    ) {
        let cmds = self.ctx.commands.take();

        if let Some(id) = cmds.cancel_timer {
            timers.cancel(id);
        }

        if let Some(rec) = cmds.append {
            match self.logger.append(hw, &rec) {
                Ok(()) => sink.emit(&AppEvent::SampleRecorded {
                    seq: rec.seq,
                    temperature_c: rec.temperature_c,
                }),
                Err(e) => {
                    warn!("record append failed: {}", e);
                    sink.emit(&AppEvent::Fault(e));
                }
            }
        }

        if cmds.close_log {
            self.logger.close_log(hw);
        }
        if cmds.unmount_storage {
            self.logger.unmount(hw);
        }

        if let Some(pattern) = cmds.beep {
            let _ = self.signaler.play(pattern, now_ms);
        }
        if let Some(on) = cmds.led_on {
            hw.set_led(on);
        }
    }
}
