//! Software timer engine.
//!
//! The measurement cadence of each phase is driven by a periodic timer.
//! The engine keeps one fixed slot per timer identity; when a timer
//! fires it notifies a [`TimerDelegate`] rather than touching the event
//! system directly, so the engine stays independently testable. The
//! main loop implements the delegate by pushing events into the queue.
//!
//! Cancellation clears the slot immediately — a cancelled timer cannot
//! fire on the tick that cancelled it, and cancelling an empty slot is
//! a no-op (no double-cancellation hazard). A slot fires at most once
//! per `tick` call, so callbacks never overlap.

use log::info;

// ═══════════════════════════════════════════════════════════════
//  Timer identity and delegate
// ═══════════════════════════════════════════════════════════════

/// Fixed timer identities, one slot each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TimerId {
    CoolMeasure = 0,
    HotMeasure = 1,
}

impl TimerId {
    const COUNT: usize = 2;
}

/// Callback trait the engine invokes when a timer fires.
pub trait TimerDelegate {
    fn on_timer_fired(&mut self, id: TimerId);
}

// ═══════════════════════════════════════════════════════════════
//  Engine
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
struct TimerSlot {
    id: TimerId,
    period_ms: u32,
    next_fire_ms: u64,
}

/// Fixed-slot periodic timer engine.
pub struct TimerEngine {
    slots: [Option<TimerSlot>; TimerId::COUNT],
}

impl TimerEngine {
    pub fn new() -> Self {
        Self {
            slots: [None; TimerId::COUNT],
        }
    }

    /// Arm (or re-arm) a periodic timer. The first fire happens one
    /// full period after `now_ms`.
    pub fn arm_periodic(&mut self, id: TimerId, period_ms: u32, now_ms: u64) {
        info!("timer {:?}: armed, period {} ms", id, period_ms);
        self.slots[id as usize] = Some(TimerSlot {
            id,
            period_ms,
            next_fire_ms: now_ms + u64::from(period_ms),
        });
    }

    /// Cancel a timer. The slot is cleared; cancelling again is a no-op.
    pub fn cancel(&mut self, id: TimerId) {
        if self.slots[id as usize].take().is_some() {
            info!("timer {:?}: cancelled", id);
        }
    }

    /// Whether the given timer is currently armed.
    pub fn is_armed(&self, id: TimerId) -> bool {
        self.slots[id as usize].is_some()
    }

    /// Advance the engine to `now_ms`, firing due timers through the
    /// delegate. Each slot fires at most once per call; if the loop
    /// stalled past several periods the schedule realigns to `now_ms`
    /// rather than firing a burst of catch-up ticks.
    pub fn tick(&mut self, now_ms: u64, delegate: &mut dyn TimerDelegate) {
        for slot in self.slots.iter_mut() {
            let Some(entry) = slot else { continue };
            if now_ms >= entry.next_fire_ms {
                let id = entry.id;
                entry.next_fire_ms = now_ms + u64::from(entry.period_ms);
                delegate.on_timer_fired(id);
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// Test delegate that records fire events.
    struct RecordingDelegate {
        fires: Vec<TimerId>,
    }

    impl RecordingDelegate {
        fn new() -> Self {
            Self { fires: Vec::new() }
        }
    }

    impl TimerDelegate for RecordingDelegate {
        fn on_timer_fired(&mut self, id: TimerId) {
            self.fires.push(id);
        }
    }

    #[test]
    fn periodic_fires_at_interval() {
        let mut engine = TimerEngine::new();
        let mut delegate = RecordingDelegate::new();
        engine.arm_periodic(TimerId::CoolMeasure, 1000, 0);

        for now in (100..1000).step_by(100) {
            engine.tick(now, &mut delegate);
        }
        assert!(delegate.fires.is_empty());

        engine.tick(1000, &mut delegate);
        assert_eq!(delegate.fires, vec![TimerId::CoolMeasure]);

        engine.tick(2000, &mut delegate);
        assert_eq!(delegate.fires.len(), 2);
    }

    #[test]
    fn cancel_takes_effect_before_next_fire() {
        let mut engine = TimerEngine::new();
        let mut delegate = RecordingDelegate::new();
        engine.arm_periodic(TimerId::HotMeasure, 500, 0);

        engine.tick(500, &mut delegate);
        assert_eq!(delegate.fires.len(), 1);

        engine.cancel(TimerId::HotMeasure);
        engine.tick(1000, &mut delegate);
        engine.tick(5000, &mut delegate);
        assert_eq!(delegate.fires.len(), 1, "no fire after cancel");
        assert!(!engine.is_armed(TimerId::HotMeasure));
    }

    #[test]
    fn double_cancel_is_harmless() {
        let mut engine = TimerEngine::new();
        engine.arm_periodic(TimerId::CoolMeasure, 100, 0);
        engine.cancel(TimerId::CoolMeasure);
        engine.cancel(TimerId::CoolMeasure);
        assert!(!engine.is_armed(TimerId::CoolMeasure));
    }

    #[test]
    fn stalled_loop_fires_once_not_a_burst() {
        let mut engine = TimerEngine::new();
        let mut delegate = RecordingDelegate::new();
        engine.arm_periodic(TimerId::CoolMeasure, 100, 0);

        // 10 periods elapse in one tick — exactly one fire.
        engine.tick(1000, &mut delegate);
        assert_eq!(delegate.fires.len(), 1);
    }

    #[test]
    fn rearming_replaces_the_schedule() {
        let mut engine = TimerEngine::new();
        let mut delegate = RecordingDelegate::new();
        engine.arm_periodic(TimerId::CoolMeasure, 1000, 0);
        engine.arm_periodic(TimerId::CoolMeasure, 200, 0);

        engine.tick(200, &mut delegate);
        assert_eq!(delegate.fires.len(), 1);
    }

    #[test]
    fn independent_slots_fire_independently() {
        let mut engine = TimerEngine::new();
        let mut delegate = RecordingDelegate::new();
        engine.arm_periodic(TimerId::CoolMeasure, 100, 0);
        engine.arm_periodic(TimerId::HotMeasure, 300, 0);

        engine.tick(100, &mut delegate);
        assert_eq!(delegate.fires, vec![TimerId::CoolMeasure]);

        engine.tick(300, &mut delegate);
        assert_eq!(
            delegate.fires,
            vec![TimerId::CoolMeasure, TimerId::CoolMeasure, TimerId::HotMeasure]
        );
    }
}
