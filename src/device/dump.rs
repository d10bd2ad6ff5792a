//! Diagnostic dump output
//!
//! The dump control command reports buffer contents to a sink rather than
//! to the caller.

use parking_lot::Mutex;

/// One byte of a buffer dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpEntry {
    pub index: usize,
    pub byte: u8,
}

/// Destination for dump output
pub trait DumpSink: Send + Sync {
    fn emit(&self, entries: &[DumpEntry]);
}

/// Emits each dumped byte as a tracing event on the `scull::dump` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DumpSink for TracingSink {
    fn emit(&self, entries: &[DumpEntry]) {
        tracing::info!(target: "scull::dump", "Show memory ({} bytes)", entries.len());
        for entry in entries {
            tracing::info!(target: "scull::dump", "{}:{}", entry.index, entry.byte as char);
        }
    }
}

/// Collects dumps in memory, one Vec per dump call
#[derive(Debug, Default)]
pub struct MemorySink {
    dumps: Mutex<Vec<Vec<DumpEntry>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All dumps received so far, oldest first
    pub fn dumps(&self) -> Vec<Vec<DumpEntry>> {
        self.dumps.lock().clone()
    }

    /// The most recent dump rendered as bytes
    pub fn last_bytes(&self) -> Option<Vec<u8>> {
        self.dumps
            .lock()
            .last()
            .map(|dump| dump.iter().map(|e| e.byte).collect())
    }
}

impl DumpSink for MemorySink {
    fn emit(&self, entries: &[DumpEntry]) {
        self.dumps.lock().push(entries.to_vec());
    }
}
