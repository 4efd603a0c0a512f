//! Per-frame measurement and its on-disk line format

use core::fmt;

/// Interval between two consecutive presentation events, in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Measurement(u64);

impl Measurement {
    #[inline]
    pub const fn from_micros(us: u64) -> Self {
        Self(us)
    }

    /// Round a nanosecond interval to the nearest microsecond
    #[inline]
    pub const fn from_nanos_rounded(ns: u64) -> Self {
        Self(ns / 1000 + (ns % 1000 >= 500) as u64)
    }

    #[inline]
    pub const fn as_micros(&self) -> u64 {
        self.0
    }
}

/// One output line, without the trailing newline: `Frametime <us> us`
impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frametime {} us", self.0)
    }
}
