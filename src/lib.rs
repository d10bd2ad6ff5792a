//! # scull
//!
//! A fixed-capacity in-memory character device with:
//! - A single shared 16 KiB buffer behind one interruptible lock
//! - Per-session cursors with bounds-checked read/write/seek
//! - Out-of-band control commands (clear, dump)
//! - TCP-based client protocol, one connection per session
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │               (one connection = one session)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Driver                                 │
//! │              (command → session operation)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Session A  │   ...    │  Session N  │
//!   │  (cursor)   │          │  (cursor)   │
//!   └──────┬──────┘          └──────┬──────┘
//!          └────────────┬────────────┘
//!                       ▼
//!               ┌───────────────┐
//!               │ StorageDevice │
//!               │    (Mutex)    │
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod device;
pub mod session;
pub mod network;
pub mod protocol;
pub mod driver;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, ScullError};
pub use config::Config;
pub use device::{StorageDevice, CAPACITY};
pub use driver::{Driver, Reply};
pub use session::{ControlCommand, SeekMode, SessionHandle};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of scull
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
