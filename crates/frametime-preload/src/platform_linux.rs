//! Linux platform implementation

use frametime_core::WallClock;
use nix::time::{clock_gettime, ClockId};

/// Monotonic wall clock
///
/// `CLOCK_MONOTONIC` is immune to NTP steps and `settimeofday`, so a frame
/// interval can never come out negative.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxClock;

impl LinuxClock {
    pub fn new() -> Self {
        Self
    }
}

impl WallClock for LinuxClock {
    fn now_us(&self) -> u64 {
        // CLOCK_MONOTONIC cannot fail on Linux
        clock_gettime(ClockId::CLOCK_MONOTONIC)
            .map(|ts| ts.tv_sec() as u64 * 1_000_000 + ts.tv_nsec() as u64 / 1_000)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic() {
        let clock = LinuxClock::new();
        let a = clock.now_us();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = clock.now_us();
        assert!(b >= a + 2_000, "{} -> {}", a, b);
    }
}
