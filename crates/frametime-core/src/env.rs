//! Environment variable utilities
//!
//! The shim is configured entirely through the environment of the host
//! process, read once at attach.
//!
//! # Usage
//!
//! ```ignore
//! use frametime_core::env::{env_get, env_get_bool, env_get_str};
//!
//! let slots: usize = env_get("LIBFRAMETIME_QUERIES", 5);
//! let no_gpu = env_get_bool("LIBFRAMETIME_NO_GPU", false);
//! let path = env_get_str("LIBFRAMETIME_FILE", "/tmp/libframetime.out");
//! ```

use std::str::FromStr;

/// Variables read by the shim at attach (and set by the launcher)
pub mod keys {
    /// Output file path
    pub const OUTPUT_FILE: &str = "LIBFRAMETIME_FILE";
    /// Force CPU timing
    pub const NO_GPU: &str = "LIBFRAMETIME_NO_GPU";
    /// Probe GPU query availability and warn on misses
    pub const DEBUG: &str = "LIBFRAMETIME_DEBUG";
    /// Query ring depth
    pub const QUERIES: &str = "LIBFRAMETIME_QUERIES";
    /// Diagnostic verbosity
    pub const LOG_LEVEL: &str = "LIBFRAMETIME_LOG_LEVEL";
    /// Flush stderr after every diagnostic
    pub const FLUSH_EPRINT: &str = "LIBFRAMETIME_FLUSH_EPRINT";
}

/// Get environment variable parsed as type T, or return default
///
/// Unset variables and values that fail to parse both yield `default`.
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env_get_opt(key).unwrap_or(default)
}

/// Get environment variable as boolean
///
/// Accepts "1", "true", "yes", "on" (case-insensitive) as true. Any other
/// value is false; an unset variable returns the default.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => parse_bool(&val),
        Err(_) => default,
    }
}

/// Truthiness rule shared by env flags and command-line switches
#[inline]
pub fn parse_bool(val: &str) -> bool {
    matches!(val.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Get environment variable as optional value
#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Get environment variable as string, or return default
///
/// An empty value counts as unset, so `LIBFRAMETIME_FILE=` falls back to
/// the default path instead of trying to open "".
#[inline]
pub fn env_get_str(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(val) if !val.is_empty() => val,
        _ => default.to_string(),
    }
}
