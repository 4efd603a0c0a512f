//! Platform traits
//!
//! These traits define the interface between the platform-agnostic timing
//! engine and the preload library's GL, clock and file implementations.
//! Tests plug in fakes that replay synthetic timestamps.

use crate::measurement::Measurement;

/// CPU clock used by the fallback timing mode
pub trait WallClock {
    /// Current time in microseconds
    fn now_us(&self) -> u64;
}

/// GPU timestamp queries for the current rendering context
///
/// Every method is called with the host's context current on the calling
/// thread, from inside a presentation wrapper.
pub trait TimerQueries {
    /// Create `count` query objects
    fn create(&mut self, count: usize) -> Vec<u32>;

    /// Schedule a timestamp capture into `query` at the current point of the
    /// command stream
    fn record_timestamp(&mut self, query: u32);

    /// Non-blocking probe: has the GPU written `query`'s result yet?
    fn is_available(&mut self, query: u32) -> bool;

    /// Raw counter value of `query`; blocks if the GPU has not finished it
    fn timestamp(&mut self, query: u32) -> u64;

    /// Number of valid bits in a raw timestamp
    fn counter_bits(&self) -> u32;
}

/// Receiver for per-frame measurements
pub trait MeasurementSink {
    fn record(&mut self, measurement: Measurement);
}

impl MeasurementSink for Vec<Measurement> {
    fn record(&mut self, measurement: Measurement) {
        self.push(measurement);
    }
}

impl<S: MeasurementSink + ?Sized> MeasurementSink for &mut S {
    fn record(&mut self, measurement: Measurement) {
        (**self).record(measurement);
    }
}
