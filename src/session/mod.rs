//! Session Module
//!
//! Per-open views onto the shared device.
//!
//! ## Responsibilities
//! - Own a private cursor per session
//! - Translate read/write into cursor-relative device transfers
//! - Validate seeks against `[0, CAPACITY]`
//! - Dispatch control commands (clear, dump)
//!
//! ## State Machine
//! ```text
//!   open ──▶ Open ──close──▶ Closed (terminal)
//! ```

mod control;
mod handle;

pub use control::{ControlCommand, SeekMode};
pub use handle::{SessionHandle, SessionIo};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepts read/write/seek/control
    Open,

    /// No further operations accepted
    Closed,
}
