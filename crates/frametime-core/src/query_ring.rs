//! Pipelined GPU timestamp queries
//!
//! A timestamp is scheduled into the command stream just before every
//! presentation call, but its result is only read back `N - 1` frames later,
//! when the GPU has long since passed that point. The CPU therefore never
//! waits on the GPU; in exchange, measurements lag real time by `N` frames.
//!
//! ```text
//!  frame:    1    2    3    4    5    6
//!  back:     0    1    2    3    0    1      slot receiving the new timestamp
//!  front:    1    2    3    0    1    2      slot read back (scheduled N-1 frames ago)
//!  read:     -    -    -   ts1  ts2  ts3
//!  emitted:  -    -    -    -  ts2-ts1 ts3-ts2
//! ```

use crate::kwarn;
use crate::measurement::Measurement;
use crate::traits::TimerQueries;

/// Smallest usable ring
pub const MIN_SLOTS: usize = 2;

/// Largest ring accepted from configuration
pub const MAX_SLOTS: usize = 64;

/// `(new - old) mod 2^bits`
///
/// Counters narrower than 64 bits wrap at `2^bits`; masking the wrapping
/// difference recovers the elapsed ticks across one wrap.
#[inline]
pub fn wrapping_delta(new: u64, old: u64, bits: u32) -> u64 {
    let mask = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
    new.wrapping_sub(old) & mask
}

/// Fixed ring of timestamp query objects
#[derive(Debug)]
pub struct TimestampQueryRing {
    queries: Vec<u32>,
    /// Slot to schedule next
    back: usize,
    /// Oldest scheduled slot, read next once primed
    front: usize,
    /// Frames scheduled so far, saturating at `N - 1`
    primed: usize,
    /// Last timestamp read back; `None` until the first read
    previous: Option<u64>,
    counter_bits: u32,
    probe_availability: bool,
}

impl TimestampQueryRing {
    /// Allocate `slots` query objects from the current context
    ///
    /// # Panics
    ///
    /// If `slots` is outside `MIN_SLOTS..=MAX_SLOTS` or the backend returns
    /// a different number of objects.
    pub fn new<Q: TimerQueries>(backend: &mut Q, slots: usize, probe_availability: bool) -> Self {
        assert!(
            (MIN_SLOTS..=MAX_SLOTS).contains(&slots),
            "query ring needs {}..={} slots, got {}",
            MIN_SLOTS,
            MAX_SLOTS,
            slots
        );
        let queries = backend.create(slots);
        assert_eq!(queries.len(), slots, "backend created the wrong number of queries");

        Self {
            queries,
            back: 0,
            front: 1 % slots,
            primed: 0,
            previous: None,
            counter_bits: backend.counter_bits(),
            probe_availability,
        }
    }

    /// Run one frame: schedule a timestamp, and once primed, read the oldest
    ///
    /// Returns the delta between the two most recently read timestamps.
    /// Nothing is emitted during priming nor for the first read result.
    pub fn frame<Q: TimerQueries>(&mut self, backend: &mut Q) -> Option<Measurement> {
        let n = self.queries.len();
        backend.record_timestamp(self.queries[self.back]);

        let measurement = if self.primed < n - 1 {
            self.primed += 1;
            None
        } else {
            let query = self.queries[self.front];
            if self.probe_availability && !backend.is_available(query) {
                kwarn!(
                    "timer query {} (slot {}) not ready after {} frames; reading it will stall",
                    query,
                    self.front,
                    n - 1
                );
            }

            let now = backend.timestamp(query);
            let delta = self
                .previous
                .map(|old| Measurement::from_nanos_rounded(wrapping_delta(now, old, self.counter_bits)));
            self.previous = Some(now);
            delta
        };

        self.back = (self.back + 1) % n;
        self.front = (self.front + 1) % n;
        measurement
    }

    pub fn slots(&self) -> usize {
        self.queries.len()
    }

    pub fn back(&self) -> usize {
        self.back
    }

    pub fn front(&self) -> usize {
        self.front
    }

    pub fn counter_bits(&self) -> u32 {
        self.counter_bits
    }

    /// True once at least one result has been read back
    pub fn is_primed(&self) -> bool {
        self.previous.is_some()
    }
}
