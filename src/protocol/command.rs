//! Command definitions
//!
//! Represents requests from clients.

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Read = 0x01,
    Write = 0x02,
    Seek = 0x03,
    Control = 0x04,
    Ping = 0x05,
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read up to `count` bytes at the session cursor
    Read { count: u32 },

    /// Write `data` at the session cursor
    Write { data: Vec<u8> },

    /// Move the session cursor (`whence` 0 = absolute, 1 = relative)
    Seek { offset: i64, whence: u32 },

    /// Control command by numeric code
    Control { code: u32, arg: u64 },

    /// Ping (health check)
    Ping,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Read { .. } => CommandType::Read,
            Command::Write { .. } => CommandType::Write,
            Command::Seek { .. } => CommandType::Seek,
            Command::Control { .. } => CommandType::Control,
            Command::Ping => CommandType::Ping,
        }
    }
}
