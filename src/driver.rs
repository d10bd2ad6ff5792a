//! Driver Module
//!
//! The context object that owns the single device and hands out sessions.
//!
//! ## Responsibilities
//! - Construct the device once ("load") and drop it once ("unload")
//! - Open sessions bound to that device
//! - Route protocol commands to a session (the file-operations table)

use std::sync::Arc;

use crate::config::Config;
use crate::device::{DumpSink, Interrupt, StorageDevice, TracingSink};
use crate::error::Result;
use crate::protocol::Command;
use crate::session::{SeekMode, SessionHandle};

/// Outcome of a successfully executed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Bytes read (may be shorter than requested)
    Data(Vec<u8>),

    /// Number of bytes written
    Written(usize),

    /// Cursor after a seek
    Position(u64),

    /// Control command completed
    Done,

    Pong,
}

/// Owner of the storage device
///
/// There is exactly one device per driver. Sessions share it through an
/// `Arc`, so it lives until the driver and every session are gone.
pub struct Driver {
    config: Config,

    device: Arc<StorageDevice>,

    /// Dump output target given to every new session
    sink: Arc<dyn DumpSink>,
}

impl Driver {
    /// Create the driver and its zero-filled device
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let device = Arc::new(StorageDevice::with_poll_interval(config.lock_poll_interval()));
        tracing::info!("Load device ({} bytes)", device.capacity());

        Ok(Self {
            config,
            device,
            sink: Arc::new(TracingSink),
        })
    }

    /// Replace the dump sink used by sessions opened from now on
    pub fn with_sink(mut self, sink: Arc<dyn DumpSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Open a session at cursor 0 with its own interrupt
    pub fn open(&self) -> SessionHandle {
        self.open_with_interrupt(Interrupt::new())
    }

    /// Open a session whose lock waits are cancelled by `interrupt`
    pub fn open_with_interrupt(&self, interrupt: Interrupt) -> SessionHandle {
        SessionHandle::new(Arc::clone(&self.device), Arc::clone(&self.sink), interrupt)
    }

    /// Open a session starting at `cursor` instead of 0
    pub fn open_at(&self, cursor: u64) -> Result<SessionHandle> {
        let mut session = self.open();
        let target = i64::try_from(cursor).unwrap_or(i64::MAX);
        session.seek(target, SeekMode::Absolute)?;
        Ok(session)
    }

    /// Execute a command on a session
    ///
    /// Routes commands to the matching session operation.
    pub fn execute(&self, session: &mut SessionHandle, command: Command) -> Result<Reply> {
        match command {
            Command::Read { count } => Ok(Reply::Data(session.read(count as usize)?)),
            Command::Write { data } => Ok(Reply::Written(session.write(&data, data.len())?)),
            Command::Seek { offset, whence } => {
                let mode = SeekMode::from_whence(whence)?;
                Ok(Reply::Position(session.seek(offset, mode)?))
            }
            Command::Control { code, arg } => {
                session.control(code, arg)?;
                Ok(Reply::Done)
            }
            Command::Ping => Ok(Reply::Pong),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn device(&self) -> &Arc<StorageDevice> {
        &self.device
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        tracing::info!("Unload device");
    }
}
