//! End-to-end controller scenarios: service → FSM → ports.

use calorilog::app::events::{AppEvent, RefusalReason};
use calorilog::app::service::ExperimentService;
use calorilog::config::ExperimentConfig;
use calorilog::drivers::button::ButtonId;
use calorilog::fsm::PhaseId;
use calorilog::sensors::{InitState, SensorId};
use calorilog::timers::{TimerEngine, TimerId};

use crate::mock_bench::{MockBench, MockRadio, RecordingSink};

// ── Test rig ──────────────────────────────────────────────────

struct Rig {
    service: ExperimentService,
    bench: MockBench,
    radio: MockRadio,
    sink: RecordingSink,
    timers: TimerEngine,
    now_ms: u64,
}

impl Rig {
    fn new(config: ExperimentConfig, bench: MockBench) -> Self {
        let mut rig = Self {
            service: ExperimentService::new(config),
            bench,
            radio: MockRadio::default(),
            sink: RecordingSink::new(),
            timers: TimerEngine::new(),
            now_ms: 0,
        };
        rig.service
            .start(0, &mut rig.bench, &mut rig.timers, &mut rig.sink);
        rig
    }

    /// Run the init protocol until both sensors leave `Retrying`.
    fn settle_sensors(&mut self) {
        for _ in 0..64 {
            self.service
                .poll(self.now_ms, &mut self.bench, &mut self.radio, &mut self.sink);
            self.now_ms += 20;
            let still_retrying = [SensorId::CoolBath, SensorId::HotVessel]
                .iter()
                .any(|&s| self.service.sensor_state(s) == InitState::Retrying);
            if !still_retrying {
                return;
            }
        }
    }

    fn press(&mut self, button: ButtonId) {
        self.now_ms += 10;
        self.service.on_button(
            button,
            self.now_ms,
            &mut self.bench,
            &mut self.timers,
            &mut self.sink,
        );
    }

    fn measure_tick(&mut self, id: TimerId, advance_ms: u64) {
        self.now_ms += advance_ms;
        self.service.on_timer(
            id,
            self.now_ms,
            &mut self.bench,
            &mut self.radio,
            &mut self.timers,
            &mut self.sink,
        );
    }

    fn refusals(&self) -> Vec<RefusalReason> {
        self.sink
            .events
            .iter()
            .filter_map(|e| match e {
                AppEvent::PhaseRefused { reason, .. } => Some(*reason),
                _ => None,
            })
            .collect()
    }
}

fn ready_rig(config: ExperimentConfig) -> Rig {
    let mut rig = Rig::new(config, MockBench::new());
    rig.settle_sensors();
    assert_eq!(rig.service.sensor_state(SensorId::CoolBath), InitState::Ready);
    assert_eq!(rig.service.sensor_state(SensorId::HotVessel), InitState::Ready);
    rig
}

fn small_config() -> ExperimentConfig {
    ExperimentConfig {
        cool_period_ms: 500,
        cool_target_count: 5,
        hot_period_ms: 100,
        ..ExperimentConfig::default()
    }
}

// ── Cool-phase scenario: target 5, period 500 ms ──────────────

#[test]
fn cool_phase_writes_target_minus_one_records() {
    let mut rig = ready_rig(small_config());

    rig.press(ButtonId::Cool);
    assert_eq!(rig.service.phase(), PhaseId::CoolMeasuring);
    assert_eq!(rig.bench.mounts, 1);
    assert!(rig.timers.is_armed(TimerId::CoolMeasure));

    for _ in 0..5 {
        rig.measure_tick(TimerId::CoolMeasure, 500);
    }

    assert_eq!(rig.service.phase(), PhaseId::Idle);
    assert!(!rig.timers.is_armed(TimerId::CoolMeasure), "timer cancelled");
    assert_eq!(rig.bench.unmounts, 1, "unmount invoked exactly once");

    let lines = rig.bench.lines("data.csv");
    assert_eq!(lines.len(), 4, "first of 5 samples is discarded");
}

#[test]
fn cool_records_are_well_formed_and_gapless() {
    let mut rig = ready_rig(small_config());
    rig.bench.cool_readings.extend([
        Some(25.41),
        Some(25.32),
        Some(25.28),
        Some(25.21),
        Some(25.17),
    ]);

    rig.press(ButtonId::Cool);
    for _ in 0..5 {
        rig.measure_tick(TimerId::CoolMeasure, 500);
    }

    let lines = rig.bench.lines("data.csv");
    let mut expected_seq = 1u32;
    for line in &lines {
        assert!(line.ends_with(';'), "line keeps its trailing delimiter");
        let fields: Vec<&str> = line.trim_end_matches(';').split(';').collect();
        assert_eq!(fields.len(), 5, "five data fields: {line}");
        assert!(fields.iter().all(|f| !f.is_empty()));

        assert_eq!(fields[0].parse::<u32>().unwrap(), expected_seq);
        expected_seq += 1;
        assert_eq!(fields[1], "Phase2");
        assert_eq!(fields[2], "Cool----");
        assert!(fields[3].parse::<u64>().is_ok(), "integer timestamp");
        let (_, decimals) = fields[4].split_once('.').expect("decimal point");
        assert_eq!(decimals.len(), 2, "two-decimal temperature");
    }
    // The discarded first sample (25.41) never reaches the file.
    assert!(lines[0].contains(";25.32;"));
}

// ── Sensor failure refuses the phase ──────────────────────────

#[test]
fn failed_sensor_refuses_phase_and_creates_no_file() {
    let mut bench = MockBench::new();
    bench.cool_connect_fails = u32::MAX; // never connects
    let mut rig = Rig::new(small_config(), bench);
    rig.settle_sensors();

    assert_eq!(
        rig.service.sensor_state(SensorId::CoolBath),
        InitState::Failed
    );
    assert_eq!(rig.bench.cool_connects, 20, "full retry budget spent");
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::SensorInitFailed(SensorId::CoolBath))
    );

    rig.press(ButtonId::Cool);
    assert_eq!(rig.service.phase(), PhaseId::Idle, "phase must not start");
    assert_eq!(rig.refusals(), vec![RefusalReason::SensorFailed]);
    assert_eq!(rig.bench.mounts, 0);
    assert!(rig.bench.files.is_empty(), "no log file created");
}

#[test]
fn retrying_sensor_also_refuses_phase() {
    let mut bench = MockBench::new();
    bench.hot_connect_fails = 5;
    let mut rig = Rig::new(small_config(), bench);
    // No settle: sensors are still mid-retry.
    rig.press(ButtonId::Hot);
    assert_eq!(rig.service.phase(), PhaseId::Idle);
    assert_eq!(rig.refusals(), vec![RefusalReason::SensorNotReady]);
}

// ── Storage mount failure aborts phase entry ──────────────────

#[test]
fn mount_failure_aborts_phase_entry() {
    let mut rig = ready_rig(small_config());
    rig.bench.fail_mount = true;

    rig.press(ButtonId::Cool);
    assert_eq!(rig.service.phase(), PhaseId::Idle);
    assert!(rig.refusals().contains(&RefusalReason::StorageMount));
    assert!(!rig.timers.is_armed(TimerId::CoolMeasure));
    assert!(!rig.service.storage_mounted());
}

// ── Hot phase: equilibrium detection ──────────────────────────

/// Preload the hot probe with a perfectly linear cooling series whose
/// rate is `rate_factor` times the configured loss constant.
fn linear_hot_series(rig: &mut Rig, config: &ExperimentConfig, rate_factor: f32, count: usize) {
    let step = config.hot_loss_const() * config.hot_period_ms as f32 * rate_factor;
    rig.bench
        .hot_readings
        .extend((0..count).map(|i| Some(90.0 - step * i as f32)));
}

#[test]
fn hot_phase_reaches_equilibrium_at_first_full_window() {
    let config = small_config();
    let mut rig = ready_rig(config.clone());
    linear_hot_series(&mut rig, &config, 1.0, 200);

    rig.press(ButtonId::Hot);
    assert_eq!(rig.service.phase(), PhaseId::HotMeasuring);
    assert_eq!(rig.bench.mounts, 1);
    assert_eq!(rig.bench.opens, 1, "hot phase holds the file open");

    let mut ticks = 0;
    while rig.service.phase() == PhaseId::HotMeasuring && ticks < 300 {
        rig.measure_tick(TimerId::HotMeasure, u64::from(config.hot_period_ms));
        ticks += 1;
    }

    // 1 discarded settling sample + 121 windowed samples.
    assert_eq!(ticks, 122);
    assert!(rig.service.run_complete());
    assert_eq!(rig.service.phase(), PhaseId::Idle);
    assert!(!rig.timers.is_armed(TimerId::HotMeasure));
    assert_eq!(rig.bench.closes, 1, "file closed exactly once");
    assert_eq!(rig.bench.unmounts, 1, "unmount invoked exactly once");
    assert_eq!(rig.bench.lines("data.csv").len(), 121);
    assert!(
        rig.sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::EquilibriumReached { .. }))
    );

    // The hot phase is terminal for the run.
    rig.press(ButtonId::Hot);
    assert_eq!(rig.service.phase(), PhaseId::Idle);
    assert!(rig.refusals().contains(&RefusalReason::RunComplete));
}

#[test]
fn off_rate_cooling_never_declares_equilibrium() {
    let config = small_config();
    let mut rig = ready_rig(config.clone());
    linear_hot_series(&mut rig, &config, 3.0, 300);

    rig.press(ButtonId::Hot);
    for _ in 0..250 {
        rig.measure_tick(TimerId::HotMeasure, u64::from(config.hot_period_ms));
    }

    assert_eq!(rig.service.phase(), PhaseId::HotMeasuring);
    assert!(!rig.service.run_complete());
    assert_eq!(rig.bench.unmounts, 0);
}

// ── Manual stop ───────────────────────────────────────────────

#[test]
fn manual_stop_mid_hot_tears_down_exactly_once() {
    let config = small_config();
    let mut rig = ready_rig(config.clone());

    rig.press(ButtonId::Hot);
    for _ in 0..10 {
        rig.measure_tick(TimerId::HotMeasure, u64::from(config.hot_period_ms));
    }
    assert_eq!(rig.service.phase(), PhaseId::HotMeasuring);

    // Pressing the hot button again is the manual stop.
    rig.press(ButtonId::Hot);
    assert_eq!(rig.service.phase(), PhaseId::Idle);
    assert!(!rig.timers.is_armed(TimerId::HotMeasure));
    assert_eq!(rig.bench.closes, 1, "file closed exactly once");
    assert_eq!(rig.bench.unmounts, 1, "unmount invoked exactly once");
    assert!(!rig.service.run_complete(), "manual stop is not equilibrium");

    // A stray tick that raced the cancellation is ignored.
    rig.measure_tick(TimerId::HotMeasure, u64::from(config.hot_period_ms));
    assert_eq!(rig.bench.closes, 1);

    // The run can be restarted after a manual stop.
    rig.press(ButtonId::Hot);
    assert_eq!(rig.service.phase(), PhaseId::HotMeasuring);
    assert_eq!(rig.bench.mounts, 2);
}

#[test]
fn manual_stop_mid_cool_unmounts_once() {
    let mut rig = ready_rig(small_config());

    rig.press(ButtonId::Cool);
    rig.measure_tick(TimerId::CoolMeasure, 500);
    rig.measure_tick(TimerId::CoolMeasure, 500);

    rig.press(ButtonId::Cool);
    assert_eq!(rig.service.phase(), PhaseId::Idle);
    assert_eq!(rig.bench.unmounts, 1);
    assert!(!rig.timers.is_armed(TimerId::CoolMeasure));
}

// ── Cross-phase behaviour ─────────────────────────────────────

#[test]
fn sequence_numbers_continue_from_cool_into_hot() {
    let mut config = small_config();
    config.cool_target_count = 3;
    let mut rig = ready_rig(config.clone());

    rig.press(ButtonId::Cool);
    for _ in 0..3 {
        rig.measure_tick(TimerId::CoolMeasure, 500);
    }
    assert_eq!(rig.service.phase(), PhaseId::Idle);
    assert_eq!(rig.service.records_written(), 2);

    rig.press(ButtonId::Hot);
    for _ in 0..3 {
        rig.measure_tick(TimerId::HotMeasure, 100);
    }

    let lines = rig.bench.lines("data.csv");
    let seqs: Vec<u32> = lines
        .iter()
        .map(|l| l.split(';').next().unwrap().parse().unwrap())
        .collect();
    assert_eq!(seqs, vec![1, 2, 3, 4]);
    assert!(lines[2].contains(";Phase3;"));
}

#[test]
fn wrong_button_during_phase_is_ignored() {
    let mut rig = ready_rig(small_config());

    rig.press(ButtonId::Cool);
    assert_eq!(rig.service.phase(), PhaseId::CoolMeasuring);

    rig.press(ButtonId::Hot);
    assert_eq!(rig.service.phase(), PhaseId::CoolMeasuring, "still measuring");
    assert_eq!(rig.bench.mounts, 1, "no second mount");
}

// ── Fault tolerance ───────────────────────────────────────────

#[test]
fn checksum_faults_substitute_last_valid_reading_in_log() {
    let mut rig = ready_rig(small_config());
    rig.bench.cool_readings.extend([
        Some(25.40), // discarded settling sample
        Some(25.30),
        None, // checksum fault -> holds 25.30
        Some(25.10),
        Some(25.00),
    ]);

    rig.press(ButtonId::Cool);
    for _ in 0..5 {
        rig.measure_tick(TimerId::CoolMeasure, 500);
    }

    let lines = rig.bench.lines("data.csv");
    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains(";25.30;"));
    assert!(lines[1].contains(";25.30;"), "held value, not a null");
    assert!(lines[2].contains(";25.10;"));
}

#[test]
fn radio_is_resumed_after_every_measurement() {
    let config = small_config();
    let mut rig = ready_rig(config.clone());

    rig.press(ButtonId::Hot);
    for _ in 0..10 {
        rig.measure_tick(TimerId::HotMeasure, u64::from(config.hot_period_ms));
    }

    assert!(!rig.radio.sleeping, "radio awake between ticks");
    assert_eq!(rig.radio.sleeps, rig.radio.wakes);
    // Two init connects + ten reads.
    assert_eq!(rig.radio.sleeps, 12);
}

// ── Busy controller refuses a second phase ────────────────────

#[test]
fn start_command_while_measuring_is_refused() {
    use calorilog::app::commands::AppCommand;

    let mut rig = ready_rig(small_config());
    rig.press(ButtonId::Cool);

    rig.now_ms += 10;
    let now = rig.now_ms;
    rig.service.handle_command(
        AppCommand::StartHotPhase,
        now,
        &mut rig.bench,
        &mut rig.timers,
        &mut rig.sink,
    );
    assert_eq!(rig.service.phase(), PhaseId::CoolMeasuring);
    assert_eq!(rig.refusals(), vec![RefusalReason::NotIdle]);
}
