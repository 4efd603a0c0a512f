//! CPU fallback timing
//!
//! Measures the interval between consecutive presentation calls on the CPU
//! clock. The first call only establishes a baseline.

use crate::measurement::Measurement;
use crate::traits::WallClock;

/// Previous-timestamp state for the CPU timing mode
#[derive(Debug)]
pub struct FrameClock<C> {
    clock: C,
    /// `None` until the first frame has been seen
    previous_us: Option<u64>,
}

impl<C: WallClock> FrameClock<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, previous_us: None }
    }

    /// Record one presentation event
    ///
    /// Returns `None` on the first call. A clock that steps backwards
    /// yields a zero-length frame rather than a wrapped huge value.
    pub fn tick(&mut self) -> Option<Measurement> {
        let now = self.clock.now_us();
        let delta = self.previous_us.map(|prev| now.saturating_sub(prev));
        self.previous_us = Some(now);
        delta.map(Measurement::from_micros)
    }

    pub fn is_running(&self) -> bool {
        self.previous_us.is_some()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays a fixed list of timestamps
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedClock {
        times: RefCell<VecDeque<u64>>,
    }

    impl ScriptedClock {
        pub(crate) fn new(times: &[u64]) -> Self {
            Self { times: RefCell::new(times.iter().copied().collect()) }
        }
    }

    impl WallClock for ScriptedClock {
        fn now_us(&self) -> u64 {
            self.times.borrow_mut().pop_front().expect("clock script exhausted")
        }
    }

    #[test]
    fn test_first_tick_is_baseline_only() {
        let mut clock = FrameClock::new(ScriptedClock::new(&[1_000_016_000]));
        assert!(!clock.is_running());
        assert_eq!(clock.tick(), None);
        assert!(clock.is_running());
    }

    #[test]
    fn test_injected_scenario() {
        let mut clock = FrameClock::new(ScriptedClock::new(&[
            1_000_016_000,
            1_000_032_500,
            1_000_050_100,
        ]));

        assert_eq!(clock.tick(), None);
        assert_eq!(clock.tick().map(|m| m.to_string()).as_deref(), Some("Frametime 16500 us"));
        assert_eq!(clock.tick().map(|m| m.to_string()).as_deref(), Some("Frametime 17600 us"));
    }

    #[test]
    fn test_n_calls_emit_n_minus_one() {
        for n in 1..20u64 {
            let times: Vec<u64> = (0..n).map(|i| 5_000 + i * i * 37).collect();
            let mut clock = FrameClock::new(ScriptedClock::new(&times));
            let emitted: Vec<_> = (0..n).filter_map(|_| clock.tick()).collect();

            assert_eq!(emitted.len() as u64, n - 1);
            for (i, m) in emitted.iter().enumerate() {
                assert_eq!(m.as_micros(), times[i + 1] - times[i]);
            }
        }
    }

    #[test]
    fn test_backwards_step_clamps_to_zero() {
        let mut clock = FrameClock::new(ScriptedClock::new(&[2_000, 1_500, 1_700]));
        clock.tick();
        assert_eq!(clock.tick(), Some(Measurement::from_micros(0)));
        assert_eq!(clock.tick(), Some(Measurement::from_micros(200)));
    }
}
