//! # frametime-preload
//!
//! `libframetime.so`: an `LD_PRELOAD` shim that logs the interval between
//! consecutive frame presentations of any GLX or EGL application.
//!
//! ```text
//! LD_PRELOAD=/path/to/libframetime.so LIBFRAMETIME_FILE=/tmp/run.out glxgears
//! ```
//!
//! This crate provides:
//! - Symbol resolution of the real entry points (`resolver`, `entry_points`)
//! - Exported wrappers for presentation, `dlsym` and the address queries
//!   (`interpose`)
//! - The GL timestamp-query backend (`gl_timer`)
//! - The measurement log (`sink`) and the load/unload hooks (`lifecycle`)
//!
//! The timing state machine itself is in `frametime-core`.

// Platform detection
cfg_if::cfg_if! {
    if #[cfg(all(target_os = "linux", target_env = "gnu"))] {
        mod platform_linux;
        pub use platform_linux::LinuxClock;
    } else {
        compile_error!("libframetime needs Linux with glibc");
    }
}

pub mod config;
pub mod gl;
pub mod resolver;
pub mod entry_points;
pub mod interpose;
pub mod gl_timer;
pub mod sink;
pub mod state;
pub mod lifecycle;

// Re-exports
pub use config::ShimConfig;
pub use entry_points::{Api, EntryPoints};
pub use gl_timer::GlTimerQueries;
pub use sink::FileSink;
pub use state::Shim;
