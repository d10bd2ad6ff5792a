//! Protocol Module
//!
//! Defines the wire protocol for client-server communication. One TCP
//! connection is one device session.
//!
//! ## Protocol Format (V1 - Simple Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: READ  - Payload: count (4)
//! - 0x02: WRITE - Payload: data
//! - 0x03: SEEK  - Payload: offset (8, signed) + whence (4)
//! - 0x04: IOCTL - Payload: cmd (4) + arg (8)
//! - 0x05: PING  - Payload: empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: INVALID_ARGUMENT
//! - 0x02: FAULT
//! - 0x03: INTERRUPTED
//! - 0x04: ERROR

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Response, Status};
pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
pub(crate) use codec::check_outgoing_len;
