//! Error types for libframetime
//!
//! Every failure the shim can hit falls into one of two classes:
//!
//! - **Fatal**: the shim cannot run without it (no output file, no symbol
//!   table). The lifecycle controller terminates the host process.
//! - **Degradable**: the GPU timing path is unusable. The timing engine
//!   demotes itself to CPU mode and keeps measuring.
//!
//! Advisory conditions (a timer query that was not ready in time) are not
//! errors at all; they are logged as warnings where they happen.

use core::fmt;

/// Result type for shim operations
pub type FrameResult<T> = Result<T, FrameError>;

/// How an error must be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Terminate the host process with a diagnostic
    Fatal,
    /// Fall back from GPU to CPU timing, keep running
    Degradable,
}

/// Errors that can occur while attaching or measuring
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Output file could not be opened for writing
    OutputOpen {
        path: String,
        errno: i32,
    },

    /// The real `dlsym` could not be located through the versioned lookup
    LookupBootstrap,

    /// An entry point was found neither via `RTLD_NEXT` nor in its library
    Unresolved {
        symbol: String,
        library: String,
        detail: String,
    },

    /// Configuration value out of range
    InvalidConfig(&'static str),

    /// A wrapper ran before the shim finished attaching
    NotInitialized,

    /// A wrapper for a presentation API whose library was not found at attach
    ApiUnavailable(&'static str),

    /// No timer query extension in the context's extension list
    MissingExtension(&'static str),

    /// Timestamp counter narrower than the required width
    InsufficientCounterBits {
        bits: u32,
        required: u32,
    },

    /// A GL entry point needed for timer queries could not be loaded
    MissingFunction(String),
}

impl FrameError {
    /// Classify this error for the propagation policy
    pub fn severity(&self) -> Severity {
        match self {
            FrameError::OutputOpen { .. }
            | FrameError::LookupBootstrap
            | FrameError::Unresolved { .. }
            | FrameError::InvalidConfig(_)
            | FrameError::NotInitialized
            | FrameError::ApiUnavailable(_) => Severity::Fatal,

            FrameError::MissingExtension(_)
            | FrameError::InsufficientCounterBits { .. }
            | FrameError::MissingFunction(_) => Severity::Degradable,
        }
    }

    /// Shorthand for `severity() == Severity::Fatal`
    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::OutputOpen { path, errno } => {
                write!(f, "failed to open {} for writing (errno {})", path, errno)
            }
            FrameError::LookupBootstrap => write!(f, "could not bootstrap the real dlsym"),
            FrameError::Unresolved { symbol, library, detail } => {
                write!(f, "could not resolve {} (also tried {}): {}", symbol, library, detail)
            }
            FrameError::InvalidConfig(msg) => write!(f, "invalid config: {}", msg),
            FrameError::NotInitialized => write!(f, "called before initialization"),
            FrameError::ApiUnavailable(api) => {
                write!(f, "{} entry point called, but {} was not resolved at attach", api, api)
            }
            FrameError::MissingExtension(name) => write!(f, "{} not supported", name),
            FrameError::InsufficientCounterBits { bits, required } => write!(
                f,
                "timestamp counter has {} bits, need at least {}",
                bits, required
            ),
            FrameError::MissingFunction(name) => write!(f, "missing GL function {}", name),
        }
    }
}

impl std::error::Error for FrameError {}
