//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type
//! - READ:  count (4 bytes)
//! - WRITE: data
//! - SEEK:  offset (8 bytes, two's complement) + whence (4 bytes)
//! - IOCTL: cmd (4 bytes) + arg (8 bytes)
//! - PING:  empty
//!
//! All integers are big-endian.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, ScullError};
use super::{Command, Response, Status};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

const SEEK_PAYLOAD_SIZE: usize = 12;
const CONTROL_PAYLOAD_SIZE: usize = 12;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Bytes {
    let mut payload = BytesMut::new();
    match command {
        Command::Read { count } => payload.put_u32(*count),
        Command::Write { data } => payload.put_slice(data),
        Command::Seek { offset, whence } => {
            payload.put_i64(*offset);
            payload.put_u32(*whence);
        }
        Command::Control { code, arg } => {
            payload.put_u32(*code);
            payload.put_u64(*arg);
        }
        Command::Ping => {}
    }

    frame(command.command_type() as u8, &payload)
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (cmd_type, mut payload) = split_frame(bytes, "command")?;

    // Parse command based on type
    match cmd_type {
        0x01 => {
            expect_len(payload, 4, "READ")?;
            Ok(Command::Read {
                count: payload.get_u32(),
            })
        }
        0x02 => Ok(Command::Write {
            data: payload.to_vec(),
        }),
        0x03 => {
            expect_len(payload, SEEK_PAYLOAD_SIZE, "SEEK")?;
            Ok(Command::Seek {
                offset: payload.get_i64(),
                whence: payload.get_u32(),
            })
        }
        0x04 => {
            expect_len(payload, CONTROL_PAYLOAD_SIZE, "IOCTL")?;
            Ok(Command::Control {
                code: payload.get_u32(),
                arg: payload.get_u64(),
            })
        }
        0x05 => {
            expect_len(payload, 0, "PING")?;
            Ok(Command::Ping)
        }
        _ => Err(ScullError::Protocol(format!(
            "Unknown command type: 0x{:02x}",
            cmd_type
        ))),
    }
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Bytes {
    frame(response.status as u8, response.payload_bytes())
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes, "response")?;

    // Parse status
    let status = match status_byte {
        0x00 => Status::Ok,
        0x01 => Status::InvalidArgument,
        0x02 => Status::Fault,
        0x03 => Status::Interrupted,
        0x04 => Status::Error,
        _ => {
            return Err(ScullError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                status_byte
            )))
        }
    };

    // Extract payload
    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let message = read_frame(reader)?;
    decode_command(&message)
}

/// Write a command to a stream
///
/// A WRITE carrying more than `MAX_PAYLOAD_SIZE` bytes is rejected before
/// anything is sent.
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    if let Command::Write { data } = command {
        check_outgoing_len(data.len())?;
    }
    let bytes = encode_command(command);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_frame(reader)?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    check_outgoing_len(response.payload_bytes().len())?;
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Private Helpers
// =============================================================================

/// Build header + payload
///
/// Callers bound `payload` by `MAX_PAYLOAD_SIZE`, so its length fits the
/// 4-byte field.
fn frame(kind: u8, payload: &[u8]) -> Bytes {
    debug_assert!(payload.len() <= u32::MAX as usize);
    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(kind);
    message.put_u32(payload.len() as u32);
    message.put_slice(payload);
    message.freeze()
}

/// Validate a frame and split it into (type byte, payload)
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(ScullError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_SIZE];
    let kind = header.get_u8();
    let payload_len = header.get_u32();
    check_payload_len(payload_len)?;

    let total_len = HEADER_SIZE + payload_len as usize;
    if bytes.len() < total_len {
        return Err(ScullError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((kind, &bytes[HEADER_SIZE..total_len]))
}

/// Read header, then exactly the announced payload
fn read_frame<R: Read>(reader: &mut R) -> Result<BytesMut> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = (&header[1..]).get_u32();
    check_payload_len(payload_len)?;

    let mut message = BytesMut::zeroed(HEADER_SIZE + payload_len as usize);
    message[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }
    Ok(message)
}

fn check_payload_len(payload_len: u32) -> Result<()> {
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(ScullError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

/// Reject a payload the peer would refuse to read
pub(crate) fn check_outgoing_len(len: usize) -> Result<()> {
    match u32::try_from(len) {
        Ok(len) => check_payload_len(len),
        Err(_) => Err(ScullError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            len, MAX_PAYLOAD_SIZE
        ))),
    }
}

fn expect_len(payload: &[u8], expected: usize, name: &str) -> Result<()> {
    if payload.len() != expected {
        return Err(ScullError::Protocol(format!(
            "{} command: expected {} payload bytes, got {}",
            name,
            expected,
            payload.len()
        )));
    }
    Ok(())
}
