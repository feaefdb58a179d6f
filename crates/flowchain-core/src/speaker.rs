//! The serial byte stream to the BGP speaker (exabgp).
//!
//! A small trait at the seam, in the style of the teacher's `VppClient`
//! abstraction: production wires up [`StdoutSpeaker`], tests substitute
//! an in-memory collector so route emission can be asserted on without
//! capturing process stdout.

use std::io::Write;
use std::sync::Mutex;

/// A destination for announce/withdraw route lines.
pub trait SpeakerChannel: Send + Sync {
    /// Write one line. Implementations must not interleave partial lines
    /// from concurrent calls; the RIB serializes calls under its own lock
    /// (see spec §5), so this trait does not need to.
    fn write_line(&self, line: &str);
}

/// Writes each line to stdout and flushes immediately, matching spec §6's
/// "line-oriented text on standard output ... flushed after each line".
#[derive(Debug, Default)]
pub struct StdoutSpeaker;

impl SpeakerChannel for StdoutSpeaker {
    fn write_line(&self, line: &str) {
        let mut stdout = std::io::stdout();
        let _ = writeln!(stdout, "{line}");
        let _ = stdout.flush();
    }
}

/// Collects every line written to it, for tests.
#[derive(Debug, Default)]
pub struct RecordingSpeaker {
    lines: Mutex<Vec<String>>,
}

impl RecordingSpeaker {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line written so far, in order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl SpeakerChannel for RecordingSpeaker {
    fn write_line(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}
