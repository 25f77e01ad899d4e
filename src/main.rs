//! Calorimetry controller — host entry point.
//!
//! Wires the simulation adapters to the controller core and runs the
//! cooperative loop. The rig's peripherals are simulated in memory
//! (see [`calorilog::adapters::sim`]); a board build replaces this
//! binary's wiring with real adapters and GPIO ISR registration.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                   │
//! │                                                            │
//! │  SimBench          SimRadio       LogEventSink             │
//! │  (Sensors+Storage  (RadioPort)    (EventSink)              │
//! │   +Signal)                                                 │
//! │                                                            │
//! │  ──────────────── Port Trait Boundary ─────────────────    │
//! │                                                            │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │          ExperimentService (pure logic)              │  │
//! │  │  Phase FSM · Sensor drivers · Storage logger         │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! │                                                            │
//! │  TimerEngine (delegate-driven) · Event queue · Buttons     │
//! └────────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

use anyhow::Result;
use log::info;

use calorilog::adapters::clock::MonotonicClock;
use calorilog::adapters::log_sink::LogEventSink;
use calorilog::adapters::sim::{SimBench, SimRadio};
use calorilog::app::service::ExperimentService;
use calorilog::bus::{BusRegistry, SerialBusPins};
use calorilog::config::ExperimentConfig;
use calorilog::drivers::button::{ButtonDriver, ButtonId, button_isr_handler};
use calorilog::events::{Event, drain_events, push_event};
use calorilog::fsm::PhaseId;
use calorilog::pins;
use calorilog::timers::{TimerDelegate, TimerEngine, TimerId};

// ── Timer delegate ────────────────────────────────────────────
//
// Bridges the timer engine (which knows nothing about the event
// system) to the event queue: a fired measurement timer becomes a
// queued tick event the main loop dispatches to the service.

struct EventQueueDelegate;

impl TimerDelegate for EventQueueDelegate {
    fn on_timer_fired(&mut self, id: TimerId) {
        let event = match id {
            TimerId::CoolMeasure => Event::CoolMeasureTick,
            TimerId::HotMeasure => Event::HotMeasureTick,
        };
        let _ = push_event(event);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("calorilog v{} — heat-capacity data logger", env!("CARGO_PKG_VERSION"));

    // ── 1. Bus wiring ─────────────────────────────────────────
    // One registry per run; the handles it returns are the only path
    // to the physical buses.
    let mut registry = BusRegistry::new();
    let storage_bus = registry.allocate_serial(SerialBusPins {
        mosi: Some(pins::SPI_MOSI),
        miso: Some(pins::SPI_MISO),
        sck: Some(pins::SPI_SCK),
    })?;
    let cool_bus = registry.allocate_single_wire(pins::OW_COOL)?;
    let hot_bus = registry.allocate_single_wire(pins::OW_HOT)?;
    info!(
        "buses: storage={} cool={} hot={}",
        storage_bus.name, cool_bus.name, hot_bus.name
    );

    // ── 2. Configuration ──────────────────────────────────────
    // Demo profile: shortened periods and a loss constant matched to
    // the simulated vessel so the run completes in about two minutes.
    let config = ExperimentConfig {
        cool_period_ms: 200,
        hot_period_ms: 250,
        loss_const_vessel2: 1.2e-4,
        ..ExperimentConfig::default()
    };

    // ── 3. Adapters ───────────────────────────────────────────
    let clock = MonotonicClock::new();
    let mut bench = SimBench::new().with_profile(24.8, 72.0, 300_000.0);
    let mut radio = SimRadio::new();
    let mut sink = LogEventSink::new();

    let mut timers = TimerEngine::new();
    let mut timer_delegate = EventQueueDelegate;

    let mut cool_button = ButtonDriver::new(ButtonId::Cool, config.button_debounce_ms);
    let mut hot_button = ButtonDriver::new(ButtonId::Hot, config.button_debounce_ms);

    // ── 4. Service ────────────────────────────────────────────
    let mut service = ExperimentService::new(config);
    service.start(clock.now_ms(), &mut bench, &mut timers, &mut sink);

    info!("system ready, entering control loop");

    // Scripted operator for the demo run: press the cool button once
    // the sensors settle, then the hot button after the cool phase.
    let mut cool_pressed = false;
    let mut hot_pressed = false;

    loop {
        std::thread::sleep(std::time::Duration::from_millis(25));
        let now = clock.now_ms();
        bench.advance_to(now);

        // Operator script (a real build registers GPIO ISRs instead).
        if !cool_pressed && now >= 2_000 {
            button_isr_handler(ButtonId::Cool, now as u32);
            cool_pressed = true;
        }
        if cool_pressed
            && !hot_pressed
            && service.phase() == PhaseId::Idle
            && service.records_written() > 0
        {
            button_isr_handler(ButtonId::Hot, now as u32);
            hot_pressed = true;
        }

        // Timer engine → event queue.
        timers.tick(now, &mut timer_delegate);

        // Button gesture detection → event queue.
        if cool_button.tick(now as u32) {
            let _ = push_event(Event::ButtonCool);
        }
        if hot_button.tick(now as u32) {
            let _ = push_event(Event::ButtonHot);
        }

        // Dispatch all pending events.
        drain_events(|event| match event {
            Event::ButtonCool => {
                service.on_button(ButtonId::Cool, now, &mut bench, &mut timers, &mut sink);
            }
            Event::ButtonHot => {
                service.on_button(ButtonId::Hot, now, &mut bench, &mut timers, &mut sink);
            }
            Event::CoolMeasureTick => {
                service.on_timer(
                    TimerId::CoolMeasure,
                    now,
                    &mut bench,
                    &mut radio,
                    &mut timers,
                    &mut sink,
                );
            }
            Event::HotMeasureTick => {
                service.on_timer(
                    TimerId::HotMeasure,
                    now,
                    &mut bench,
                    &mut radio,
                    &mut timers,
                    &mut sink,
                );
            }
        });

        // Sensor init and buzzer sequencing.
        service.poll(now, &mut bench, &mut radio, &mut sink);

        if service.run_complete() && service.phase() == PhaseId::Idle {
            let lines = bench
                .file_bytes("data.csv")
                .map(|b| b.split(|&c| c == b'\n').filter(|l| !l.is_empty()).count())
                .unwrap_or(0);
            info!(
                "run complete: {} records written, {} lines on medium",
                service.records_written(),
                lines
            );
            break;
        }

        // Demo watchdog — a stuck simulation should not spin forever.
        if now > 30 * 60 * 1000 {
            info!("demo timeout reached, exiting");
            break;
        }
    }

    Ok(())
}
