//! Shim Configuration
//!
//! Compile-time defaults with runtime environment overrides, read once at
//! attach.
//!
//! # Configuration Priority (highest wins)
//!
//! 1. Environment variables of the host process
//! 2. User's `FRAMETIME_CONFIG_RS` file (compile-time)
//! 3. Library defaults
//!
//! # Example
//!
//! ```rust,ignore
//! use frametime::config::ShimConfig;
//!
//! let config = ShimConfig::from_env();
//!
//! // Or customize programmatically
//! let config = ShimConfig::new()
//!     .output_path("/tmp/run1.out")
//!     .gpu_timing(false);
//! ```

pub mod defaults;

use frametime_core::env::{env_get, env_get_bool, env_get_str, keys};
use frametime_core::error::FrameError;
use frametime_core::query_ring::{MAX_SLOTS, MIN_SLOTS};
use frametime_core::{kinfo, EngineConfig};

/// Shim configuration with builder pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimConfig {
    /// Measurement log path
    pub output_path: String,
    /// Try GPU timing first
    pub gpu_timing: bool,
    /// Probe query availability before each read
    pub verbose_gpu_checks: bool,
    /// GPU query ring depth
    pub query_slots: usize,
    /// Narrowest acceptable timestamp counter
    pub min_counter_bits: u32,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ShimConfig {
    /// Create config from compile-time defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `LIBFRAMETIME_FILE` - Output path
    /// - `LIBFRAMETIME_NO_GPU` - Force CPU timing (0/1)
    /// - `LIBFRAMETIME_DEBUG` - Probe GPU query availability (0/1)
    /// - `LIBFRAMETIME_QUERIES` - GPU query ring depth
    pub fn from_env() -> Self {
        Self {
            output_path: env_get_str(keys::OUTPUT_FILE, defaults::OUTPUT_PATH),
            gpu_timing: !env_get_bool(keys::NO_GPU, !defaults::GPU_TIMING),
            verbose_gpu_checks: env_get_bool(keys::DEBUG, defaults::VERBOSE_GPU_CHECKS),
            query_slots: env_get(keys::QUERIES, defaults::QUERY_SLOTS),
            min_counter_bits: defaults::MIN_COUNTER_BITS,
        }
    }

    /// Create config with compile-time defaults only (no env override).
    pub fn new() -> Self {
        Self {
            output_path: defaults::OUTPUT_PATH.to_string(),
            gpu_timing: defaults::GPU_TIMING,
            verbose_gpu_checks: defaults::VERBOSE_GPU_CHECKS,
            query_slots: defaults::QUERY_SLOTS,
            min_counter_bits: defaults::MIN_COUNTER_BITS,
        }
    }

    // Builder methods

    pub fn output_path(mut self, path: impl Into<String>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn gpu_timing(mut self, enable: bool) -> Self {
        self.gpu_timing = enable;
        self
    }

    pub fn verbose_gpu_checks(mut self, enable: bool) -> Self {
        self.verbose_gpu_checks = enable;
        self
    }

    pub fn query_slots(mut self, n: usize) -> Self {
        self.query_slots = n;
        self
    }

    pub fn min_counter_bits(mut self, bits: u32) -> Self {
        self.min_counter_bits = bits;
        self
    }

    /// Validate configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_path.is_empty() {
            return Err(ConfigError::InvalidValue("output path must not be empty"));
        }
        if self.query_slots < MIN_SLOTS {
            return Err(ConfigError::InvalidValue("query_slots must be >= 2"));
        }
        if self.query_slots > MAX_SLOTS {
            return Err(ConfigError::InvalidValue("query_slots must be <= 64"));
        }
        if self.min_counter_bits == 0 || self.min_counter_bits > 64 {
            return Err(ConfigError::InvalidValue("min_counter_bits must be in 1..=64"));
        }
        Ok(())
    }

    /// Settings handed to the timing engine
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            gpu_timing: self.gpu_timing,
            query_slots: self.query_slots,
            min_counter_bits: self.min_counter_bits,
            verbose_gpu_checks: self.verbose_gpu_checks,
        }
    }

    /// Log the effective configuration at info level
    pub fn log_summary(&self) {
        kinfo!("output:            {}", self.output_path);
        kinfo!("gpu_timing:        {}", self.gpu_timing);
        kinfo!("verbose_gpu_checks: {}", self.verbose_gpu_checks);
        kinfo!("query_slots:       {}", self.query_slots);
        kinfo!("min_counter_bits:  {}", self.min_counter_bits);
    }
}

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for FrameError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::InvalidValue(msg) => FrameError::InvalidConfig(msg),
        }
    }
}
