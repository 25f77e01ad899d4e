//! Interrupt-to-main-loop event queue.
//!
//! Events are produced by:
//! - Button GPIO ISRs (via the debounced button drivers)
//! - The software timer engine's delegate (measurement ticks)
//!
//! Events are consumed by the main control loop, which drains them in
//! FIFO order. There is exactly one producer context and one consumer
//! context, so a lock-free SPSC ring buffer is sufficient.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Button ISR  │────▶│              │     │              │
//! │ Timer fire  │────▶│  Event Queue │────▶│  Main Loop   │
//! └─────────────┘     │  (lock-free) │     │  (consumer)  │
//!                     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

/// Maximum number of pending events.
/// Power of 2 for efficient ring buffer modulo.
const EVENT_QUEUE_CAP: usize = 16;

/// System event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Event {
    /// Reference-bath button edge (debounced).
    ButtonCool = 0,
    /// Hot-vessel button edge (debounced).
    ButtonHot = 1,
    /// Reference-bath measurement timer fired.
    CoolMeasureTick = 10,
    /// Hot-vessel measurement timer fired.
    HotMeasureTick = 11,
}

// ── Lock-free SPSC ring buffer ────────────────────────────────
//
// ISRs/timer delegate write (produce), main loop reads (consume).
// The buffer lives in a static so ISR callbacks can reach it.

static EVENT_HEAD: AtomicU8 = AtomicU8::new(0);
static EVENT_TAIL: AtomicU8 = AtomicU8::new(0);
// SAFETY: one writer (ISR / timer-delegate context), one reader (the
// main loop); the acquire/release pairs on head and tail order the
// buffer accesses between them.
static mut EVENT_BUFFER: [u8; EVENT_QUEUE_CAP] = [0; EVENT_QUEUE_CAP];

/// Push an event into the queue.
/// Safe to call from ISR context (lock-free).
/// Returns `false` if the queue is full (event dropped).
pub fn push_event(event: Event) -> bool {
    let head = EVENT_HEAD.load(Ordering::Relaxed);
    let tail = EVENT_TAIL.load(Ordering::Acquire);
    let next_head = (head + 1) % EVENT_QUEUE_CAP as u8;

    if next_head == tail {
        return false; // Queue full — drop event.
    }

    unsafe {
        EVENT_BUFFER[head as usize] = event as u8;
    }

    EVENT_HEAD.store(next_head, Ordering::Release);
    true
}

/// Pop the next event from the queue.
/// Called from the main loop (single consumer).
pub fn pop_event() -> Option<Event> {
    let tail = EVENT_TAIL.load(Ordering::Relaxed);
    let head = EVENT_HEAD.load(Ordering::Acquire);

    if tail == head {
        return None; // Empty.
    }

    let raw = unsafe { EVENT_BUFFER[tail as usize] };
    EVENT_TAIL.store((tail + 1) % EVENT_QUEUE_CAP as u8, Ordering::Release);

    event_from_u8(raw)
}

/// Drain all pending events into a callback, in FIFO order.
pub fn drain_events(mut handler: impl FnMut(Event)) {
    while let Some(event) = pop_event() {
        handler(event);
    }
}

/// Number of pending events.
pub fn queue_len() -> usize {
    let head = EVENT_HEAD.load(Ordering::Relaxed) as usize;
    let tail = EVENT_TAIL.load(Ordering::Relaxed) as usize;
    (head + EVENT_QUEUE_CAP - tail) % EVENT_QUEUE_CAP
}

// ── Internal ──────────────────────────────────────────────────

fn event_from_u8(raw: u8) -> Option<Event> {
    match raw {
        0 => Some(Event::ButtonCool),
        1 => Some(Event::ButtonHot),
        10 => Some(Event::CoolMeasureTick),
        11 => Some(Event::HotMeasureTick),
        _ => None,
    }
}
