//! Tests for Driver
//!
//! These tests verify:
//! - Config validation on load
//! - Session opening (default and explicit cursor)
//! - Command routing to session operations
//! - Sessions share one device

use std::sync::Arc;

use scull::device::{Interrupt, MemorySink, CAPACITY};
use scull::protocol::Command;
use scull::{Config, Driver, Reply, ScullError};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_driver() -> (Driver, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let driver = Driver::new(Config::default()).unwrap().with_sink(sink.clone());
    (driver, sink)
}

// =============================================================================
// Construction Tests
// =============================================================================

#[test]
fn test_driver_rejects_zero_poll_interval() {
    let config = Config::builder().lock_poll_interval_ms(0).build();
    assert!(matches!(Driver::new(config), Err(ScullError::Config(_))));
}

#[test]
fn test_driver_rejects_zero_connections() {
    let config = Config::builder().max_connections(0).build();
    assert!(matches!(Driver::new(config), Err(ScullError::Config(_))));
}

#[test]
fn test_driver_config_accessor() {
    let config = Config::builder().lock_poll_interval_ms(3).build();
    let driver = Driver::new(config).unwrap();

    assert_eq!(driver.config().lock_poll_interval_ms, 3);
    assert_eq!(driver.device().capacity(), CAPACITY);
}

// =============================================================================
// Session Opening Tests
// =============================================================================

#[test]
fn test_open_starts_at_zero() {
    let (driver, _sink) = setup_driver();
    let session = driver.open();
    assert_eq!(session.cursor(), 0);
    assert!(session.is_open());
}

#[test]
fn test_open_at_cursor() {
    let (driver, _sink) = setup_driver();

    assert_eq!(driver.open_at(10).unwrap().cursor(), 10);
    assert_eq!(driver.open_at(CAPACITY as u64).unwrap().cursor(), CAPACITY);
    assert!(matches!(
        driver.open_at(CAPACITY as u64 + 1),
        Err(ScullError::InvalidArgument(_))
    ));
    assert!(matches!(
        driver.open_at(u64::MAX),
        Err(ScullError::InvalidArgument(_))
    ));
}

#[test]
fn test_sessions_share_device() {
    let (driver, _sink) = setup_driver();
    let mut writer = driver.open();
    let mut reader = driver.open();

    writer.write(b"one device", 10).unwrap();
    assert_eq!(reader.read(10).unwrap(), b"one device");
    assert!(Arc::ptr_eq(writer.device(), driver.device()));
}

#[test]
fn test_open_with_shared_interrupt() {
    let (driver, _sink) = setup_driver();
    let interrupt = Interrupt::new();
    let session = driver.open_with_interrupt(interrupt.clone());

    interrupt.raise();
    assert!(session.interrupt().is_raised());
}

// =============================================================================
// Command Execution Tests
// =============================================================================

#[test]
fn test_execute_write_read_seek() {
    let (driver, _sink) = setup_driver();
    let mut session = driver.open();

    let reply = driver
        .execute(&mut session, Command::Write { data: b"abc".to_vec() })
        .unwrap();
    assert_eq!(reply, Reply::Written(3));

    let reply = driver
        .execute(&mut session, Command::Seek { offset: -3, whence: 1 })
        .unwrap();
    assert_eq!(reply, Reply::Position(0));

    let reply = driver.execute(&mut session, Command::Read { count: 5 }).unwrap();
    assert_eq!(reply, Reply::Data(b"abc\0\0".to_vec()));
}

#[test]
fn test_execute_seek_bad_whence() {
    let (driver, _sink) = setup_driver();
    let mut session = driver.open_at(7).unwrap();

    let result = driver.execute(&mut session, Command::Seek { offset: 0, whence: 2 });
    assert!(matches!(result, Err(ScullError::InvalidArgument(_))));
    assert_eq!(session.cursor(), 7);
}

#[test]
fn test_execute_control() {
    let (driver, sink) = setup_driver();
    let mut session = driver.open();

    driver
        .execute(&mut session, Command::Write { data: b"xy".to_vec() })
        .unwrap();

    let reply = driver
        .execute(&mut session, Command::Control { code: 10, arg: 0 })
        .unwrap();
    assert_eq!(reply, Reply::Done);
    assert_eq!(sink.last_bytes().unwrap(), b"xy");

    driver
        .execute(&mut session, Command::Control { code: 1, arg: 0 })
        .unwrap();
    driver
        .execute(&mut session, Command::Control { code: 10, arg: 0 })
        .unwrap();
    assert_eq!(sink.last_bytes().unwrap(), b"");

    let result = driver.execute(&mut session, Command::Control { code: 3, arg: 0 });
    assert!(matches!(result, Err(ScullError::InvalidArgument(_))));
}

#[test]
fn test_execute_ping() {
    let (driver, _sink) = setup_driver();
    let mut session = driver.open();
    assert_eq!(driver.execute(&mut session, Command::Ping).unwrap(), Reply::Pong);
}

#[test]
fn test_execute_on_closed_session() {
    let (driver, _sink) = setup_driver();
    let mut session = driver.open();
    session.close().unwrap();

    let result = driver.execute(&mut session, Command::Read { count: 1 });
    assert!(matches!(result, Err(ScullError::SessionClosed)));
}
