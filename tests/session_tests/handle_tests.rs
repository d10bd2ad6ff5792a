//! Tests for SessionHandle
//!
//! These tests verify:
//! - Cursor-relative read/write with truncation
//! - Seek validation for both modes
//! - Control command dispatch (clear, dump, unknown)
//! - Open/Closed state machine
//! - Caller-buffer transfers and faults
//! - Per-call atomicity between concurrent sessions

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use scull::device::{Interrupt, MemorySink, StorageDevice, CAPACITY};
use scull::session::{SessionHandle, SessionState};
use scull::{ScullError, SeekMode};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup() -> (Arc<StorageDevice>, Arc<MemorySink>) {
    (Arc::new(StorageDevice::new()), Arc::new(MemorySink::new()))
}

fn open(device: &Arc<StorageDevice>, sink: &Arc<MemorySink>) -> SessionHandle {
    SessionHandle::new(Arc::clone(device), sink.clone(), Interrupt::new())
}

/// A sink that always fails
struct BrokenWriter;

impl Write for BrokenWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "bad address"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// Read / Write Tests
// =============================================================================

#[test]
fn test_write_then_read_back() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);

    assert_eq!(session.write(b"abc", 3).unwrap(), 3);
    assert_eq!(session.cursor(), 3);
    assert_eq!(session.write(b"abc", 3).unwrap(), 3);
    assert_eq!(session.cursor(), 6);

    assert_eq!(session.seek(0, SeekMode::Absolute).unwrap(), 0);
    assert_eq!(session.read(6).unwrap(), b"abcabc");
    assert_eq!(session.cursor(), 6);
}

#[test]
fn test_read_advances_by_transferred_amount() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);

    for (offset, count) in [(0usize, 10usize), (CAPACITY - 5, 10), (CAPACITY, 3), (100, 0)] {
        session.seek(offset as i64, SeekMode::Absolute).unwrap();
        let bytes = session.read(count).unwrap();
        let expected = count.min(CAPACITY - offset);
        assert_eq!(bytes.len(), expected);
        assert_eq!(session.cursor(), offset + expected);
    }
}

#[test]
fn test_write_truncates_at_capacity() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);

    session.seek((CAPACITY - 2) as i64, SeekMode::Absolute).unwrap();
    assert_eq!(session.write(b"wxyz", 4).unwrap(), 2);
    assert_eq!(session.cursor(), CAPACITY);

    // At the end, reads return nothing and the cursor stays
    assert!(session.read(10).unwrap().is_empty());
    assert_eq!(session.cursor(), CAPACITY);
    assert_eq!(session.write(b"more", 4).unwrap(), 0);
    assert_eq!(session.cursor(), CAPACITY);
}

#[test]
fn test_write_with_short_data_is_fault() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);

    let result = session.write(b"ab", 10);
    assert!(matches!(result, Err(ScullError::TransferFault(_))));
    assert_eq!(session.cursor(), 0);

    // Device still usable
    assert_eq!(session.write(b"ab", 2).unwrap(), 2);
}

#[test]
fn test_short_data_is_fine_when_truncation_covers_it() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);

    session.seek((CAPACITY - 1) as i64, SeekMode::Absolute).unwrap();
    assert_eq!(session.write(b"z", 100).unwrap(), 1);
}

#[test]
fn test_cursors_are_independent() {
    let (device, sink) = setup();
    let mut a = open(&device, &sink);
    let mut b = open(&device, &sink);

    a.write(b"shared", 6).unwrap();
    assert_eq!(a.cursor(), 6);
    assert_eq!(b.cursor(), 0);

    assert_eq!(b.read(6).unwrap(), b"shared");
    assert_eq!(a.cursor(), 6);
}

// =============================================================================
// Seek Tests
// =============================================================================

#[test]
fn test_seek_absolute_bounds() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);

    assert_eq!(session.seek(0, SeekMode::Absolute).unwrap(), 0);
    assert_eq!(session.seek(CAPACITY as i64, SeekMode::Absolute).unwrap(), CAPACITY as u64);
    session.seek(42, SeekMode::Absolute).unwrap();

    for bad in [-1, CAPACITY as i64 + 1, i64::MIN, i64::MAX] {
        let result = session.seek(bad, SeekMode::Absolute);
        assert!(matches!(result, Err(ScullError::InvalidArgument(_))));
        assert_eq!(session.cursor(), 42);
    }
}

#[test]
fn test_seek_relative_bounds() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);

    session.seek(100, SeekMode::Absolute).unwrap();
    assert_eq!(session.seek(-40, SeekMode::RelativeToCursor).unwrap(), 60);
    assert_eq!(session.seek(0, SeekMode::RelativeToCursor).unwrap(), 60);
    assert_eq!(session.seek(-60, SeekMode::RelativeToCursor).unwrap(), 0);

    assert!(matches!(
        session.seek(-1, SeekMode::RelativeToCursor),
        Err(ScullError::InvalidArgument(_))
    ));
    assert_eq!(session.cursor(), 0);

    session.seek(CAPACITY as i64, SeekMode::RelativeToCursor).unwrap();
    assert!(matches!(
        session.seek(1, SeekMode::RelativeToCursor),
        Err(ScullError::InvalidArgument(_))
    ));
    assert!(matches!(
        session.seek(i64::MAX, SeekMode::RelativeToCursor),
        Err(ScullError::InvalidArgument(_))
    ));
    assert_eq!(session.cursor(), CAPACITY);
}

#[test]
fn test_seek_past_capacity_keeps_cursor() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);

    session.write(b"abc", 3).unwrap();
    let result = session.seek(CAPACITY as i64 + 1, SeekMode::Absolute);

    assert!(matches!(result, Err(ScullError::InvalidArgument(_))));
    assert_eq!(session.cursor(), 3);
}

#[test]
fn test_whence_codes() {
    assert_eq!(SeekMode::from_whence(0).unwrap(), SeekMode::Absolute);
    assert_eq!(SeekMode::from_whence(1).unwrap(), SeekMode::RelativeToCursor);
    assert!(matches!(SeekMode::from_whence(2), Err(ScullError::InvalidArgument(_))));
    assert!(matches!(SeekMode::from_whence(99), Err(ScullError::InvalidArgument(_))));
}

// =============================================================================
// Control Tests
// =============================================================================

#[test]
fn test_control_clear() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);

    session.write(b"junk", 4).unwrap();
    session.control(1, 0).unwrap();

    session.seek(0, SeekMode::Absolute).unwrap();
    assert_eq!(session.read(CAPACITY).unwrap(), vec![0u8; CAPACITY]);
}

#[test]
fn test_control_clear_leaves_cursor() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);

    session.write(b"junk", 4).unwrap();
    session.control(1, 0).unwrap();
    assert_eq!(session.cursor(), 4);
}

#[test]
fn test_control_dump_goes_to_sink() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);

    session.control(10, 0).unwrap();
    session.write(b"abcabc", 6).unwrap();
    session.control(10, 12345).unwrap();

    let dumps = sink.dumps();
    assert_eq!(dumps.len(), 2);
    assert!(dumps[0].is_empty());
    assert_eq!(sink.last_bytes().unwrap(), b"abcabc");
    assert_eq!(dumps[1][5].index, 5);
}

#[test]
fn test_control_unknown_command() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);
    session.write(b"stay", 4).unwrap();

    for code in [0, 2, 9, 11, u32::MAX] {
        assert!(matches!(
            session.control(code, 0),
            Err(ScullError::InvalidArgument(_))
        ));
    }

    assert_eq!(session.cursor(), 4);
    assert!(sink.dumps().is_empty());
    session.seek(0, SeekMode::Absolute).unwrap();
    assert_eq!(session.read(4).unwrap(), b"stay");
}

// =============================================================================
// State Machine Tests
// =============================================================================

#[test]
fn test_close_is_terminal() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);
    session.write(b"persist", 7).unwrap();

    assert_eq!(session.state(), SessionState::Open);
    session.close().unwrap();
    assert_eq!(session.state(), SessionState::Closed);
    assert!(!session.is_open());

    assert!(matches!(session.read(1), Err(ScullError::SessionClosed)));
    assert!(matches!(session.write(b"x", 1), Err(ScullError::SessionClosed)));
    assert!(matches!(session.seek(0, SeekMode::Absolute), Err(ScullError::SessionClosed)));
    assert!(matches!(session.control(1, 0), Err(ScullError::SessionClosed)));
    assert!(matches!(session.close(), Err(ScullError::SessionClosed)));

    // Closing had no effect on the buffer
    let mut other = open(&device, &sink);
    assert_eq!(other.read(7).unwrap(), b"persist");
}

// =============================================================================
// Caller-Buffer Transfer Tests
// =============================================================================

#[test]
fn test_read_to_writer() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);
    session.write(b"stream", 6).unwrap();
    session.seek(0, SeekMode::Absolute).unwrap();

    let mut out = Vec::new();
    assert_eq!(session.read_to(&mut out, 6).unwrap(), 6);
    assert_eq!(out, b"stream");
    assert_eq!(session.cursor(), 6);
}

#[test]
fn test_read_to_broken_writer_is_fault() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);

    let result = session.read_to(&mut BrokenWriter, 8);
    assert!(matches!(result, Err(ScullError::TransferFault(_))));
    assert_eq!(session.cursor(), 0);

    // Lock was released on the fault path
    assert_eq!(session.write(b"ok", 2).unwrap(), 2);
}

#[test]
fn test_write_from_reader() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);

    let mut source: &[u8] = b"from a reader";
    assert_eq!(session.write_from(&mut source, 4).unwrap(), 4);
    assert_eq!(session.cursor(), 4);

    session.seek(0, SeekMode::Absolute).unwrap();
    assert_eq!(session.read(5).unwrap(), b"from\0");
}

#[test]
fn test_write_from_short_reader_is_fault() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);

    let mut source: &[u8] = b"tiny";
    let result = session.write_from(&mut source, 100);
    assert!(matches!(result, Err(ScullError::TransferFault(_))));
    assert_eq!(session.cursor(), 0);
    assert_eq!(session.read(4).unwrap(), b"\0\0\0\0");
}

#[test]
fn test_write_from_pulls_only_what_fits() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);
    session.seek((CAPACITY - 3) as i64, SeekMode::Absolute).unwrap();

    let mut source: &[u8] = b"abcdef";
    assert_eq!(session.write_from(&mut source, 6).unwrap(), 3);
    assert_eq!(source, b"def");
}

// =============================================================================
// std::io Adapter Tests
// =============================================================================

#[test]
fn test_io_adapter() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);

    {
        let mut io = session.io();
        io.write_all(b"hello io").unwrap();
        assert_eq!(io.seek(SeekFrom::Current(-2)).unwrap(), 6);
        assert_eq!(io.seek(SeekFrom::Start(0)).unwrap(), 0);

        let mut buf = [0u8; 5];
        io.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        let err = io.seek(SeekFrom::End(0)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        let err = io.seek(SeekFrom::Start(u64::MAX)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    assert_eq!(session.cursor(), 5);
}

#[test]
fn test_io_adapter_write_all_past_end() {
    let (device, sink) = setup();
    let mut session = open(&device, &sink);
    session.seek((CAPACITY - 1) as i64, SeekMode::Absolute).unwrap();

    let err = session.io().write_all(b"xy").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::WriteZero);
}

// =============================================================================
// Concurrent Access Tests
// =============================================================================

#[test]
fn test_concurrent_writes_are_atomic() {
    const SPAN: usize = 4096;
    let (device, sink) = setup();

    let mut handles = vec![];
    for fill in [b'A', b'B', b'C'] {
        let mut session = open(&device, &sink);
        handles.push(thread::spawn(move || {
            let block = vec![fill; SPAN];
            for _ in 0..200 {
                session.seek(0, SeekMode::Absolute).unwrap();
                assert_eq!(session.write(&block, SPAN).unwrap(), SPAN);
            }
        }));
    }

    let mut reader = open(&device, &sink);
    for _ in 0..200 {
        reader.seek(0, SeekMode::Absolute).unwrap();
        let bytes = reader.read(SPAN).unwrap();
        let first = bytes[0];
        assert!(bytes.iter().all(|&b| b == first), "observed a torn write");
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_disjoint_writes() {
    let (device, sink) = setup();

    let mut handles = vec![];
    for t in 0..4usize {
        let mut session = open(&device, &sink);
        handles.push(thread::spawn(move || {
            let offset = t * 1024;
            session.seek(offset as i64, SeekMode::Absolute).unwrap();
            let block = vec![b'0' + t as u8; 1024];
            session.write(&block, block.len()).unwrap()
        }));
    }

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1024);
    }

    let mut reader = open(&device, &sink);
    let bytes = reader.read(4096).unwrap();
    for t in 0..4usize {
        assert!(bytes[t * 1024..(t + 1) * 1024].iter().all(|&b| b == b'0' + t as u8));
    }
}

#[test]
fn test_interrupted_transfer_keeps_cursor_and_buffer() {
    let device = Arc::new(StorageDevice::with_poll_interval(Duration::from_millis(5)));
    let sink = Arc::new(MemorySink::new());
    let mut session = open(&device, &sink);

    session.write(b"base", 4).unwrap();
    session.seek(2, SeekMode::Absolute).unwrap();
    let interrupt = session.interrupt();

    crossbeam::thread::scope(|s| {
        let guard = device.lock(&Interrupt::new()).unwrap();

        let session = &mut session;
        let blocked = s.spawn(move |_| {
            let write = session.write(b"XYZ", 3);
            let read = session.read(2);
            let clear = session.control(1, 0);
            (write, read, clear)
        });

        thread::sleep(Duration::from_millis(50));
        interrupt.raise();

        let (write, read, clear) = blocked.join().unwrap();
        assert!(matches!(write, Err(ScullError::Interrupted)));
        assert!(matches!(read, Err(ScullError::Interrupted)));
        assert!(matches!(clear, Err(ScullError::Interrupted)));
        drop(guard);
    })
    .unwrap();

    assert_eq!(session.cursor(), 2);
    assert!(session.is_open());

    interrupt.clear();
    session.seek(0, SeekMode::Absolute).unwrap();
    assert_eq!(session.read(4).unwrap(), b"base");
}
