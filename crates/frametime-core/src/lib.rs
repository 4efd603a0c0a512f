//! # frametime-core
//!
//! Core types and the timing engine for libframetime, a preload shim that
//! logs per-frame presentation latency of GLX/EGL applications.
//!
//! This crate is platform-agnostic and contains no OS-specific code.
//! Symbol interposition, GL bindings and file output are in
//! `frametime-preload`.
//!
//! ## Modules
//!
//! - `measurement` - Per-frame interval and its `Frametime <us> us` line
//! - `clock` - CPU fallback timing (wall-clock deltas)
//! - `query_ring` - Pipelined GPU timestamp-query ring
//! - `engine` - GPU/CPU mode state machine with one-way demotion
//! - `traits` - Clock, timer-query and sink seams
//! - `error` - Error types and severity taxonomy
//! - `spinlock` - Lock guarding per-frame state
//! - `kprint` - Kernel-style diagnostic macros
//! - `env` - Environment variable utilities

pub mod measurement;
pub mod clock;
pub mod query_ring;
pub mod engine;
pub mod traits;
pub mod error;
pub mod spinlock;
pub mod kprint;
pub mod env;

// Re-exports for convenience
pub use measurement::Measurement;
pub use clock::FrameClock;
pub use query_ring::{wrapping_delta, TimestampQueryRing};
pub use engine::{EngineConfig, TimingEngine, TimingMode};
pub use traits::{MeasurementSink, TimerQueries, WallClock};
pub use error::{FrameError, FrameResult, Severity};
pub use spinlock::SpinLock;
pub use kprint::{set_log_level, LogLevel};
pub use env::{env_get, env_get_bool, env_get_opt, env_get_str};
