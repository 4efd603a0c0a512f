//! Timing engine
//!
//! Invoked once per presentation event, strictly before the real call is
//! forwarded. Two modes:
//!
//! - **GPU**: pipelined timestamp queries (see [`crate::query_ring`]).
//!   Set up lazily on the first frame, because query objects need a current
//!   rendering context.
//! - **CPU**: wall-clock delta between consecutive presentation calls.
//!
//! The GPU mode can demote itself to CPU mode when the context lacks timer
//! queries or a wide enough counter. Demotion is one-way: once disabled,
//! the GPU path is never probed again for the life of the process.

use crate::clock::FrameClock;
use crate::error::{FrameError, FrameResult, Severity};
use crate::query_ring::TimestampQueryRing;
use crate::traits::{MeasurementSink, TimerQueries, WallClock};
use crate::{kerror, kinfo, ktrace, kwarn};

/// Engine settings, fixed at attach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Try GPU timing first (false forces CPU mode)
    pub gpu_timing: bool,
    /// Ring depth N
    pub query_slots: usize,
    /// Narrowest acceptable timestamp counter
    pub min_counter_bits: u32,
    /// Probe result availability before every read and warn on misses
    pub verbose_gpu_checks: bool,
}

/// Externally visible operating state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingMode {
    /// GPU mode selected, waiting for the first frame to set it up
    GpuPending,
    /// Query ring allocated, not yet reading results
    GpuPriming,
    /// Reading one result per frame
    GpuSteady,
    /// Wall-clock timing (forced, or demoted)
    Cpu,
}

enum GpuState<Q> {
    Uninitialized,
    Active { backend: Q, ring: TimestampQueryRing },
    Disabled,
}

/// Per-process timing state machine
pub struct TimingEngine<Q, C> {
    config: EngineConfig,
    gpu: GpuState<Q>,
    cpu: FrameClock<C>,
}

impl<Q: TimerQueries, C: WallClock> TimingEngine<Q, C> {
    pub fn new(config: EngineConfig, clock: C) -> Self {
        let gpu = if config.gpu_timing {
            GpuState::Uninitialized
        } else {
            GpuState::Disabled
        };
        Self { config, gpu, cpu: FrameClock::new(clock) }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mode(&self) -> TimingMode {
        match &self.gpu {
            GpuState::Uninitialized => TimingMode::GpuPending,
            GpuState::Active { ring, .. } if ring.is_primed() => TimingMode::GpuSteady,
            GpuState::Active { .. } => TimingMode::GpuPriming,
            GpuState::Disabled => TimingMode::Cpu,
        }
    }

    /// Handle one presentation event
    ///
    /// `probe` loads the GPU backend from the current context. It runs at
    /// most once per process, on the first frame in GPU mode; any error it
    /// returns demotes the engine to CPU mode.
    pub fn on_present<S, F>(&mut self, probe: F, sink: &mut S)
    where
        S: MeasurementSink + ?Sized,
        F: FnOnce() -> FrameResult<Q>,
    {
        if matches!(self.gpu, GpuState::Uninitialized) {
            self.gpu = self.start_gpu(probe);
        }

        let measurement = match &mut self.gpu {
            GpuState::Active { backend, ring } => ring.frame(backend),
            _ => self.cpu.tick(),
        };

        if let Some(m) = measurement {
            ktrace!("{}", m);
            sink.record(m);
        }
    }

    fn start_gpu<F>(&self, probe: F) -> GpuState<Q>
    where
        F: FnOnce() -> FrameResult<Q>,
    {
        let mut backend = match probe().and_then(|b| self.check_counter(b)) {
            Ok(backend) => backend,
            Err(e) => {
                if e.severity() == Severity::Fatal {
                    kerror!("GPU timing setup failed: {}; using CPU timing", e);
                } else {
                    kwarn!("GPU timing unavailable: {}; using CPU timing", e);
                }
                return GpuState::Disabled;
            }
        };

        let ring = TimestampQueryRing::new(
            &mut backend,
            self.config.query_slots,
            self.config.verbose_gpu_checks,
        );
        kinfo!(
            "GPU timing enabled: {} queries, {}-bit counter",
            ring.slots(),
            ring.counter_bits()
        );
        GpuState::Active { backend, ring }
    }

    fn check_counter(&self, backend: Q) -> FrameResult<Q> {
        let bits = backend.counter_bits();
        if bits < self.config.min_counter_bits {
            return Err(FrameError::InsufficientCounterBits {
                bits,
                required: self.config.min_counter_bits,
            });
        }
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::tests::ScriptedClock;
    use crate::measurement::Measurement;
    use crate::query_ring::tests::FakeQueries;

    fn config(gpu_timing: bool, query_slots: usize) -> EngineConfig {
        EngineConfig {
            gpu_timing,
            query_slots,
            min_counter_bits: 30,
            verbose_gpu_checks: false,
        }
    }

    #[test]
    fn test_forced_cpu_never_probes_gpu() {
        let clock = ScriptedClock::new(&[1_000_016_000, 1_000_032_500, 1_000_050_100]);
        let mut engine: TimingEngine<FakeQueries, _> = TimingEngine::new(config(false, 4), clock);
        assert_eq!(engine.mode(), TimingMode::Cpu);

        let mut out = Vec::new();
        for _ in 0..3 {
            engine.on_present(
                || -> FrameResult<FakeQueries> { panic!("GPU probed in forced CPU mode") },
                &mut out,
            );
        }
        let lines: Vec<String> = out.iter().map(|m| m.to_string()).collect();
        assert_eq!(lines, ["Frametime 16500 us", "Frametime 17600 us"]);
    }

    #[test]
    fn test_gpu_scenario_n4() {
        let ts = [1_000_000u64, 17_666_667, 34_000_000, 51_000_000, 68_000_000];
        let mut engine = TimingEngine::new(config(true, 4), ScriptedClock::new(&[]));
        assert_eq!(engine.mode(), TimingMode::GpuPending);

        let mut backend = Some(FakeQueries::new(32, &ts));
        let mut out = Vec::new();
        for frame in 1..=5 {
            engine.on_present(|| Ok(backend.take().expect("probed once")), &mut out);
            let expected = if frame < 4 { TimingMode::GpuPriming } else { TimingMode::GpuSteady };
            assert_eq!(engine.mode(), expected, "frame {}", frame);
        }

        assert_eq!(engine.mode(), TimingMode::GpuSteady);
        assert_eq!(out, vec![Measurement::from_micros(16_667)]);
    }

    #[test]
    fn test_missing_extension_demotes_to_cpu() {
        let clock = ScriptedClock::new(&[100, 400, 1_000]);
        let mut engine: TimingEngine<FakeQueries, _> = TimingEngine::new(config(true, 4), clock);

        let mut probes = 0;
        let mut out = Vec::new();
        for _ in 0..3 {
            engine.on_present(
                || {
                    probes += 1;
                    Err(FrameError::MissingExtension("GL_ARB_timer_query"))
                },
                &mut out,
            );
        }

        assert_eq!(probes, 1);
        assert_eq!(engine.mode(), TimingMode::Cpu);
        // first frame is the CPU baseline, measurement continues uninterrupted
        assert_eq!(out, vec![Measurement::from_micros(300), Measurement::from_micros(600)]);
    }

    #[test]
    fn test_narrow_counter_demotes_to_cpu() {
        let clock = ScriptedClock::new(&[0, 16_000]);
        let mut engine = TimingEngine::new(config(true, 4), clock);

        let mut backend = Some(FakeQueries::new(24, &[]));
        let mut out = Vec::new();
        engine.on_present(|| Ok(backend.take().unwrap()), &mut out);
        engine.on_present(|| -> FrameResult<FakeQueries> { panic!("demotion is one-way") }, &mut out);

        assert_eq!(engine.mode(), TimingMode::Cpu);
        assert_eq!(out, vec![Measurement::from_micros(16_000)]);
    }

    #[test]
    fn test_exactly_thirty_bits_accepted() {
        let ts: Vec<u64> = (0..3).map(|i| i * 1_000_000).collect();
        let mut engine = TimingEngine::new(config(true, 2), ScriptedClock::new(&[]));
        let mut backend = Some(FakeQueries::new(30, &ts));

        let mut out = Vec::new();
        for _ in 0..3 {
            engine.on_present(|| Ok(backend.take().unwrap()), &mut out);
        }
        assert_eq!(engine.mode(), TimingMode::GpuSteady);
        assert_eq!(out, vec![Measurement::from_micros(1_000)]);
    }
}
