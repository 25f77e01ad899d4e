//! Buzzer pattern engine — timed audible pulse sequences.
//!
//! Patterns run as background activity: `play` only records the
//! request, and the main loop's `tick` drives the tone edges through
//! the [`SignalPort`]. The caller never blocks. At most one pattern is
//! in flight; a `play` issued while another pattern is running is
//! refused so overlapping phase-completion signals cannot interleave
//! into garbage.

use log::warn;

use crate::app::ports::SignalPort;

/// One audible pattern: `pulses` tones of `on_ms`, separated by
/// `off_ms` of silence, at `freq_hz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulsePattern {
    pub pulses: u8,
    pub on_ms: u32,
    pub off_ms: u32,
    pub freq_hz: u16,
}

/// Single beep marking the start of the reference-bath phase.
pub const PATTERN_COOL_START: PulsePattern = PulsePattern {
    pulses: 1,
    on_ms: 500,
    off_ms: 0,
    freq_hz: 3000,
};

/// Single beep marking the start of the hot-vessel phase.
pub const PATTERN_HOT_START: PulsePattern = PulsePattern {
    pulses: 1,
    on_ms: 500,
    off_ms: 0,
    freq_hz: 4000,
};

/// Short blip when the equilibrium window first fills.
pub const PATTERN_WINDOW_FULL: PulsePattern = PulsePattern {
    pulses: 1,
    on_ms: 200,
    off_ms: 0,
    freq_hz: 4000,
};

/// Double beep marking phase completion.
pub const PATTERN_PHASE_DONE: PulsePattern = PulsePattern {
    pulses: 2,
    on_ms: 150,
    off_ms: 150,
    freq_hz: 4000,
};

#[derive(Debug, Clone, Copy)]
struct ActivePattern {
    pattern: PulsePattern,
    pulses_left: u8,
    tone_on: bool,
    next_edge_ms: u64,
}

/// Non-blocking buzzer sequencer.
pub struct FeedbackSignaler {
    active: Option<ActivePattern>,
}

impl FeedbackSignaler {
    pub fn new() -> Self {
        Self { active: None }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Start a pattern. Returns `false` (and leaves the running
    /// pattern untouched) if one is already in flight.
    pub fn play(&mut self, pattern: PulsePattern, now_ms: u64) -> bool {
        if self.active.is_some() {
            warn!("buzzer: pattern refused, another is in flight");
            return false;
        }
        debug_assert!(pattern.pulses > 0);
        self.active = Some(ActivePattern {
            pattern,
            pulses_left: pattern.pulses,
            tone_on: false,
            next_edge_ms: now_ms,
        });
        true
    }

    /// Advance the pattern. Call from the main loop each iteration.
    pub fn tick(&mut self, now_ms: u64, signal: &mut impl SignalPort) {
        let Some(mut state) = self.active else { return };
        // Loop: a long stall may cross several edges at once.
        while now_ms >= state.next_edge_ms {
            if state.tone_on {
                // Falling edge: tone finished, pulse consumed.
                signal.tone_off();
                state.tone_on = false;
                state.pulses_left -= 1;
                if state.pulses_left == 0 {
                    self.active = None;
                    return;
                }
                state.next_edge_ms += u64::from(state.pattern.off_ms);
            } else {
                signal.tone_on(state.pattern.freq_hz);
                state.tone_on = true;
                state.next_edge_ms += u64::from(state.pattern.on_ms);
            }
        }
        self.active = Some(state);
    }
}
