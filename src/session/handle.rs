//! Session Handle
//!
//! One open view of the device with its own cursor.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use crate::device::{DumpSink, Interrupt, StorageDevice, CAPACITY};
use crate::error::{Result, ScullError};

use super::{ControlCommand, SeekMode, SessionState};

/// A per-open session on the shared device
///
/// Sessions never own the device; it outlives all of them. Each holds a
/// private cursor in `[0, CAPACITY]` that only this session moves, so
/// `seek` takes no lock. Transfers and control commands go through the
/// device lock.
pub struct SessionHandle {
    /// Shared device (the same instance for every session)
    device: Arc<StorageDevice>,

    /// Where dump output goes
    sink: Arc<dyn DumpSink>,

    /// Cancels this session's lock waits
    interrupt: Interrupt,

    /// Byte offset of the next transfer
    cursor: usize,

    state: SessionState,
}

impl SessionHandle {
    /// Open a session at cursor 0
    pub fn new(device: Arc<StorageDevice>, sink: Arc<dyn DumpSink>, interrupt: Interrupt) -> Self {
        tracing::debug!("Open");
        Self {
            device,
            sink,
            interrupt,
            cursor: 0,
            state: SessionState::Open,
        }
    }

    /// Read up to `count` bytes at the cursor and advance past them
    ///
    /// Returns fewer bytes (possibly none) at the end of storage.
    pub fn read(&mut self, count: usize) -> Result<Vec<u8>> {
        self.ensure_open()?;

        let bytes = self.device.transfer_out(self.cursor, count, &self.interrupt)?;
        self.cursor += bytes.len();

        tracing::debug!("Read {} bytes", bytes.len());
        Ok(bytes)
    }

    /// Read up to `count` bytes at the cursor into `sink`
    ///
    /// If the sink fails the cursor stays put and `TransferFault` is returned.
    pub fn read_to<W: Write + ?Sized>(&mut self, sink: &mut W, count: usize) -> Result<usize> {
        self.ensure_open()?;

        let bytes = self.device.transfer_out(self.cursor, count, &self.interrupt)?;
        sink.write_all(&bytes)
            .map_err(|e| ScullError::TransferFault(format!("destination rejected data: {}", e)))?;
        self.cursor += bytes.len();

        tracing::debug!("Read {} bytes", bytes.len());
        Ok(bytes.len())
    }

    /// Write up to `count` bytes of `data` at the cursor and advance past them
    ///
    /// Truncates at the end of storage; the return value is the number of
    /// bytes actually written.
    pub fn write(&mut self, data: &[u8], count: usize) -> Result<usize> {
        self.ensure_open()?;

        let written = self
            .device
            .transfer_in(self.cursor, data, count, &self.interrupt)?;
        self.cursor += written;

        tracing::debug!("Written {} bytes", written);
        Ok(written)
    }

    /// Write up to `count` bytes pulled from `source`
    ///
    /// Only as many bytes as fit before the end of storage are pulled. A
    /// source that fails or runs dry leaves both buffer and cursor untouched.
    pub fn write_from<R: Read + ?Sized>(&mut self, source: &mut R, count: usize) -> Result<usize> {
        self.ensure_open()?;

        let mut staged = vec![0u8; count.min(CAPACITY - self.cursor)];
        source
            .read_exact(&mut staged)
            .map_err(|e| ScullError::TransferFault(format!("source unreadable: {}", e)))?;

        self.write(&staged, staged.len())
    }

    /// Move the cursor; returns the new position
    ///
    /// The result must land in `[0, CAPACITY]`, otherwise the cursor is left
    /// alone and `InvalidArgument` is returned.
    pub fn seek(&mut self, target: i64, mode: SeekMode) -> Result<u64> {
        self.ensure_open()?;

        let base = match mode {
            SeekMode::Absolute => 0,
            SeekMode::RelativeToCursor => self.cursor as i64,
        };
        let position = base
            .checked_add(target)
            .filter(|p| (0..=CAPACITY as i64).contains(p))
            .ok_or_else(|| {
                tracing::warn!("Rejected seek {:?} {} from {}", mode, target, self.cursor);
                ScullError::InvalidArgument(format!(
                    "seek {:?} {} from {} leaves [0, {}]",
                    mode, target, self.cursor, CAPACITY
                ))
            })?;

        self.cursor = position as usize;
        tracing::debug!("Set offset to {}", self.cursor);
        Ok(position as u64)
    }

    /// Run a control command identified by its numeric code
    ///
    /// `arg` is accepted for compatibility and ignored by both commands.
    pub fn control(&mut self, code: u32, _arg: u64) -> Result<()> {
        self.ensure_open()?;

        match ControlCommand::from_code(code)? {
            ControlCommand::Clear => self.device.clear(&self.interrupt),
            ControlCommand::Dump => {
                let entries = self.device.dump(&self.interrupt)?;
                self.sink.emit(&entries);
                Ok(())
            }
        }
    }

    /// Close the session; it accepts nothing afterwards
    pub fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.state = SessionState::Closed;
        tracing::debug!("Release");
        Ok(())
    }

    /// Borrow the session through the std I/O traits
    pub fn io(&mut self) -> SessionIo<'_> {
        SessionIo { session: self }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// A handle that cancels this session's lock waits when raised
    pub fn interrupt(&self) -> Interrupt {
        self.interrupt.clone()
    }

    pub fn device(&self) -> &Arc<StorageDevice> {
        &self.device
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            SessionState::Open => Ok(()),
            SessionState::Closed => Err(ScullError::SessionClosed),
        }
    }
}

/// `std::io` adapter over a session
///
/// End-relative seeks are unsupported and fail with `InvalidInput`.
pub struct SessionIo<'a> {
    session: &'a mut SessionHandle,
}

impl Read for SessionIo<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let bytes = SessionHandle::read(self.session, buf.len())?;
        buf[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }
}

impl Write for SessionIo<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(SessionHandle::write(self.session, buf, buf.len())?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for SessionIo<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (target, mode) = match pos {
            SeekFrom::Start(n) => {
                let n = i64::try_from(n).map_err(|_| {
                    ScullError::InvalidArgument(format!("seek target {} out of range", n))
                })?;
                (n, SeekMode::Absolute)
            }
            SeekFrom::Current(delta) => (delta, SeekMode::RelativeToCursor),
            SeekFrom::End(_) => {
                return Err(ScullError::InvalidArgument(
                    "end-relative seek is not supported".to_string(),
                )
                .into())
            }
        };
        Ok(SessionHandle::seek(self.session, target, mode)?)
    }
}
