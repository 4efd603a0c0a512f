//! Process-wide shim state
//!
//! Published exactly once at attach. The entry-point table is read-only
//! afterwards; the timing engine and the log sink share one spinlock, so a
//! frame's measurement and its log line are never interleaved with another
//! thread's.

use std::fmt;
use std::sync::OnceLock;

use frametime_core::error::FrameError;
use frametime_core::{die, kinfo, SpinLock, TimingEngine, TimingMode};

use crate::entry_points::{Api, EntryPoints};
use crate::gl_timer::GlTimerQueries;
use crate::platform_linux::LinuxClock;
use crate::sink::FileSink;

pub type Engine = TimingEngine<GlTimerQueries, LinuxClock>;

struct FrameState {
    engine: Engine,
    /// `None` once detach has closed the log
    sink: Option<FileSink>,
}

pub struct Shim {
    entry_points: EntryPoints,
    frame: SpinLock<FrameState>,
}

static SHIM: OnceLock<Shim> = OnceLock::new();

impl fmt::Debug for Shim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // try_lock: formatting must not wait on a presenting thread
        let mode = self.frame.try_lock().map(|state| state.engine.mode());
        f.debug_struct("Shim")
            .field("entry_points", &self.entry_points)
            .field("mode", &mode)
            .finish()
    }
}

impl Shim {
    pub fn new(entry_points: EntryPoints, engine: Engine, sink: FileSink) -> Self {
        Self {
            entry_points,
            frame: SpinLock::new(FrameState { engine, sink: Some(sink) }),
        }
    }

    pub fn entry_points(&self) -> &EntryPoints {
        &self.entry_points
    }

    pub fn mode(&self) -> TimingMode {
        self.frame.lock().engine.mode()
    }

    /// Time one presentation event arriving through `api`
    ///
    /// Must run before the real call is forwarded. A no-op after detach.
    pub fn on_present(&self, api: Api) {
        let mut guard = self.frame.lock();
        let FrameState { engine, sink } = &mut *guard;
        let Some(sink) = sink.as_mut() else {
            return;
        };

        if engine.mode() == TimingMode::GpuPending {
            kinfo!("first frame via {}, setting up GPU timing", api.name());
        }

        let entry_points = &self.entry_points;
        engine.on_present(
            // Safety: a presentation call implies the host's context is
            // current, and the loader only hands out GL addresses
            || unsafe { GlTimerQueries::load(|name| entry_points.gl_proc_address(api, name)) },
            sink,
        );
    }

    /// Close the log; later frames are forwarded without timing
    pub fn finish(&self) {
        let sink = self.frame.lock().sink.take();
        if let Some(sink) = sink {
            sink.finish();
        }
    }
}

/// Publish the shim; a second install is rejected and returns its argument
pub fn install(shim: Shim) -> Result<&'static Shim, Shim> {
    SHIM.set(shim)?;
    Ok(self::shim())
}

/// The published shim, or `None` before attach finished
pub fn try_shim() -> Option<&'static Shim> {
    SHIM.get()
}

/// The published shim; terminates the process if attach has not finished
pub fn shim() -> &'static Shim {
    match SHIM.get() {
        Some(shim) => shim,
        None => die!("{}", FrameError::NotInitialized),
    }
}
