//! Device Module
//!
//! The single shared storage device and the primitives guarding it.
//!
//! ## Responsibilities
//! - Own the fixed-capacity byte buffer
//! - Bounds-checked transfers in and out of the buffer
//! - Serialize every buffer access behind one interruptible lock
//! - Produce the diagnostic dump of the buffer's leading bytes
//!
//! ## Layout
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ Mutex                                                │
//! │ ┌──────────────────────────────────────────────────┐ │
//! │ │ buffer[0] ... buffer[CAPACITY - 1]               │ │
//! │ └──────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────┘
//!        ▲ transfer_out / transfer_in / clear / dump
//! ```

mod dump;
mod interrupt;
mod storage;

pub use dump::{DumpEntry, DumpSink, MemorySink, TracingSink};
pub use interrupt::Interrupt;
pub use storage::{DeviceGuard, StorageDevice};

/// Size of the device buffer in bytes (0x4000 = 16 KiB)
pub const CAPACITY: usize = 0x4000;
