//! Compile-time defaults
//!
//! Generated by `build.rs`; override with `FRAMETIME_CONFIG_RS=/path/to/file.rs`
//! at build time.

include!(concat!(env!("OUT_DIR"), "/frametime_defaults.rs"));
