//! ISR-debounced momentary button driver.
//!
//! Active-low switches with external pull-ups, firing on the falling
//! edge. The GPIO ISR records the raw timestamp into an atomic slot;
//! the `tick()` method (called from the main loop) applies the
//! software debounce and emits one press per accepted edge. Edges
//! closer together than the debounce window are contact bounce and are
//! swallowed.

use core::sync::atomic::{AtomicU32, Ordering};

/// The two operator buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum ButtonId {
    /// Starts/stops the hot-vessel phase.
    Hot = 0,
    /// Starts/stops the reference-bath phase.
    Cool = 1,
}

/// Raw ISR timestamps (milliseconds since boot, truncated to u32),
/// one slot per button. Written by the ISR, read by the main loop.
static BUTTON_ISR_TIMESTAMP: [AtomicU32; 2] = [AtomicU32::new(0), AtomicU32::new(0)];

/// ISR handler — register on the button GPIO falling edge.
/// Safe to call from interrupt context (lock-free atomic store).
#[allow(unused)]
pub fn button_isr_handler(button: ButtonId, now_ms: u32) {
    BUTTON_ISR_TIMESTAMP[button as usize].store(now_ms, Ordering::Release);
}

/// Debounced edge detector for one button.
pub struct ButtonDriver {
    id: ButtonId,
    slot: &'static AtomicU32,
    debounce_ms: u32,
    last_seen_ts: u32,
    last_accepted_ms: Option<u32>,
}

impl ButtonDriver {
    pub fn new(id: ButtonId, debounce_ms: u32) -> Self {
        Self::with_slot(id, &BUTTON_ISR_TIMESTAMP[id as usize], debounce_ms)
    }

    /// Construct against an explicit ISR slot (tests inject their own).
    pub fn with_slot(id: ButtonId, slot: &'static AtomicU32, debounce_ms: u32) -> Self {
        Self {
            id,
            slot,
            debounce_ms,
            last_seen_ts: 0,
            last_accepted_ms: None,
        }
    }

    pub fn id(&self) -> ButtonId {
        self.id
    }

    /// Poll from the main loop. Returns `true` when a debounced press
    /// is ready to be acted on.
    pub fn tick(&mut self, now_ms: u32) -> bool {
        let isr_ms = self.slot.load(Ordering::Acquire);
        if isr_ms == self.last_seen_ts || isr_ms == 0 {
            return false;
        }
        self.last_seen_ts = isr_ms;

        if let Some(accepted) = self.last_accepted_ms {
            if now_ms.wrapping_sub(accepted) < self.debounce_ms {
                return false; // Contact bounce.
            }
        }
        self.last_accepted_ms = Some(now_ms);
        true
    }
}
