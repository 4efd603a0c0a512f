//! Measurement log file
//!
//! One `Frametime <us> us` line per measurement, written straight to the
//! file descriptor so a killed process still leaves every finished line on
//! disk. `finish` flushes and syncs exactly once, at detach.

use std::fs::File;
use std::io::Write;

use frametime_core::error::{FrameError, FrameResult};
use frametime_core::{kdebug, kerror, kwarn, Measurement, MeasurementSink};

/// File-backed measurement sink
#[derive(Debug)]
pub struct FileSink {
    file: File,
    path: String,
    lines: u64,
    failed: bool,
}

impl FileSink {
    /// Create (or truncate) the log at `path`
    pub fn create(path: &str) -> FrameResult<Self> {
        let file = File::create(path).map_err(|e| FrameError::OutputOpen {
            path: path.to_string(),
            errno: e.raw_os_error().unwrap_or(0),
        })?;
        kdebug!("writing measurements to {}", path);
        Ok(Self { file, path: path.to_string(), lines: 0, failed: false })
    }

    /// Lines written so far
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Flush and sync the log, then close it
    pub fn finish(mut self) {
        if let Err(e) = self.file.flush().and_then(|_| self.file.sync_all()) {
            kwarn!("failed to sync {}: {}", self.path, e);
        }
        kdebug!("closed {} after {} lines", self.path, self.lines);
    }
}

impl MeasurementSink for FileSink {
    fn record(&mut self, measurement: Measurement) {
        if self.failed {
            return;
        }
        let line = format!("{}\n", measurement);
        match self.file.write_all(line.as_bytes()) {
            Ok(()) => self.lines += 1,
            Err(e) => {
                kerror!("write to {} failed: {}; dropping further measurements", self.path, e);
                self.failed = true;
            }
        }
    }
}
