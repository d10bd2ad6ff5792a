//! Seek modes and control command codes
//!
//! Numeric codes are fixed for compatibility with existing clients.

use crate::error::{Result, ScullError};

/// Reference point for a seek
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SeekMode {
    /// Target is the new cursor
    Absolute = 0,

    /// Target is added to the current cursor
    RelativeToCursor = 1,
}

impl SeekMode {
    /// Parse a whence code; end-relative (2) and unknown codes are rejected
    pub fn from_whence(whence: u32) -> Result<Self> {
        match whence {
            0 => Ok(SeekMode::Absolute),
            1 => Ok(SeekMode::RelativeToCursor),
            other => Err(ScullError::InvalidArgument(format!(
                "unsupported seek mode {}",
                other
            ))),
        }
    }

    pub fn whence(self) -> u32 {
        self as u32
    }
}

/// Out-of-band device commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ControlCommand {
    /// Zero-fill the buffer
    Clear = 1,

    /// Send the buffer's leading bytes to the diagnostic sink
    Dump = 10,
}

impl ControlCommand {
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            1 => Ok(ControlCommand::Clear),
            10 => Ok(ControlCommand::Dump),
            other => Err(ScullError::InvalidArgument(format!(
                "unknown control command {}",
                other
            ))),
        }
    }

    pub fn code(self) -> u32 {
        self as u32
    }
}
