//! Storage Device
//!
//! The fixed-capacity buffer and the lock that serializes access to it.

use std::ops::{Deref, DerefMut};
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use crate::error::{Result, ScullError};

use super::{DumpEntry, Interrupt, CAPACITY};

/// Default slice a blocked lock wait sleeps before re-checking its interrupt
const DEFAULT_LOCK_POLL: Duration = Duration::from_millis(10);

/// The emulated storage device
///
/// ## Concurrency:
/// - `buffer`: behind one Mutex; every operation holds it for its full duration
/// - Guards are scoped, so the lock is released on every return path,
///   including faults
/// - All methods use `&self`; share the device with `Arc`
///
/// Offsets passed in must lie in `[0, CAPACITY]`. An offset equal to
/// `CAPACITY` is end-of-storage and transfers zero bytes.
pub struct StorageDevice {
    buffer: Mutex<Box<[u8]>>,
    lock_poll_interval: Duration,
}

impl StorageDevice {
    /// Create a zero-filled device
    pub fn new() -> Self {
        Self::with_poll_interval(DEFAULT_LOCK_POLL)
    }

    /// Create a zero-filled device whose lock waits re-check interrupts every `interval`
    pub fn with_poll_interval(interval: Duration) -> Self {
        Self {
            buffer: Mutex::new(vec![0u8; CAPACITY].into_boxed_slice()),
            lock_poll_interval: interval,
        }
    }

    /// Buffer size in bytes
    pub fn capacity(&self) -> usize {
        CAPACITY
    }

    /// Copy up to `count` bytes starting at `offset` out of the buffer
    ///
    /// Returns `min(count, CAPACITY - offset)` bytes; fewer than requested
    /// means the end of storage was reached.
    pub fn transfer_out(&self, offset: usize, count: usize, interrupt: &Interrupt) -> Result<Vec<u8>> {
        Self::check_offset(offset)?;
        let buffer = self.acquire(interrupt)?;

        let n = count.min(CAPACITY - offset);
        Ok(buffer[offset..offset + n].to_vec())
    }

    /// Copy up to `count` bytes from `data` into the buffer at `offset`
    ///
    /// Writes `min(count, CAPACITY - offset)` bytes and returns that number.
    /// If `data` is too short to supply them, nothing is written and a
    /// `TransferFault` is returned.
    pub fn transfer_in(
        &self,
        offset: usize,
        data: &[u8],
        count: usize,
        interrupt: &Interrupt,
    ) -> Result<usize> {
        Self::check_offset(offset)?;
        let mut buffer = self.acquire(interrupt)?;

        let n = count.min(CAPACITY - offset);
        let src = data.get(..n).ok_or_else(|| {
            ScullError::TransferFault(format!(
                "source holds {} bytes, {} requested",
                data.len(),
                n
            ))
        })?;
        buffer[offset..offset + n].copy_from_slice(src);
        Ok(n)
    }

    /// Zero-fill the whole buffer
    pub fn clear(&self, interrupt: &Interrupt) -> Result<()> {
        let mut buffer = self.acquire(interrupt)?;
        buffer.fill(0);
        tracing::info!("Memory is set to zero");
        Ok(())
    }

    /// Leading bytes of the buffer up to (not including) the first zero byte
    ///
    /// The scan never goes past `CAPACITY`, so a buffer with no zero byte
    /// dumps in full.
    pub fn dump(&self, interrupt: &Interrupt) -> Result<Vec<DumpEntry>> {
        let buffer = self.acquire(interrupt)?;
        Ok(buffer
            .iter()
            .take_while(|&&byte| byte != 0)
            .enumerate()
            .map(|(index, &byte)| DumpEntry { index, byte })
            .collect())
    }

    /// Hold the device lock across several steps
    ///
    /// Other sessions block (interruptibly) until the guard is dropped. The
    /// guard exposes the raw buffer and bypasses session cursors; it is meant
    /// for glue code and tests that need to stage contention.
    pub fn lock(&self, interrupt: &Interrupt) -> Result<DeviceGuard<'_>> {
        Ok(DeviceGuard {
            inner: self.acquire(interrupt)?,
        })
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn check_offset(offset: usize) -> Result<()> {
        if offset > CAPACITY {
            return Err(ScullError::InvalidArgument(format!(
                "offset {} beyond capacity {}",
                offset, CAPACITY
            )));
        }
        Ok(())
    }

    /// Take the device lock, giving up if `interrupt` is raised while waiting
    ///
    /// An uncontended lock is taken even with an interrupt pending; the flag
    /// only matters once the caller would have to sleep.
    fn acquire(&self, interrupt: &Interrupt) -> Result<MutexGuard<'_, Box<[u8]>>> {
        if let Some(guard) = self.buffer.try_lock() {
            return Ok(guard);
        }

        tracing::trace!("Device busy, waiting for lock");
        loop {
            if interrupt.is_raised() {
                tracing::debug!("Lock wait interrupted");
                return Err(ScullError::Interrupted);
            }
            if let Some(guard) = self.buffer.try_lock_for(self.lock_poll_interval) {
                return Ok(guard);
            }
        }
    }
}

impl Default for StorageDevice {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive access to the device buffer, released on drop
pub struct DeviceGuard<'a> {
    inner: MutexGuard<'a, Box<[u8]>>,
}

impl Deref for DeviceGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.inner
    }
}

impl DerefMut for DeviceGuard<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.inner
    }
}
