//! Response definitions
//!
//! Represents responses to clients.

use crate::driver::Reply;
use crate::error::ScullError;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    InvalidArgument = 0x01,
    Fault = 0x02,
    Interrupted = 0x03,
    Error = 0x04,
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (reply data for OK, message for failures)
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response with optional payload
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self::failure(Status::Error, message)
    }

    /// Create a failure response with the given status
    pub fn failure(status: Status, message: &str) -> Self {
        Self {
            status,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    /// Encode a successful command outcome
    ///
    /// - Data: raw bytes
    /// - Written: count as u32 (big-endian)
    /// - Position: cursor as u64 (big-endian)
    /// - Done: empty
    /// - Pong: `PONG`
    pub fn from_reply(reply: Reply) -> Self {
        let payload = match reply {
            Reply::Data(bytes) => Some(bytes),
            Reply::Written(n) => Some((n as u32).to_be_bytes().to_vec()),
            Reply::Position(pos) => Some(pos.to_be_bytes().to_vec()),
            Reply::Done => None,
            Reply::Pong => Some(b"PONG".to_vec()),
        };
        Self::ok(payload)
    }

    /// Map an operation error onto its status code
    pub fn from_error(error: &ScullError) -> Self {
        let status = match error {
            ScullError::InvalidArgument(_) => Status::InvalidArgument,
            ScullError::TransferFault(_) => Status::Fault,
            ScullError::Interrupted => Status::Interrupted,
            _ => Status::Error,
        };
        let message = match error {
            ScullError::InvalidArgument(m) | ScullError::TransferFault(m) => m.clone(),
            other => other.to_string(),
        };
        Self::failure(status, &message)
    }

    /// Payload bytes, empty if none
    pub fn payload_bytes(&self) -> &[u8] {
        self.payload.as_deref().unwrap_or(&[])
    }

    /// Turn a failure status back into an error; OK passes through
    pub fn into_result(self) -> Result<Self, ScullError> {
        let message = String::from_utf8_lossy(self.payload_bytes()).into_owned();
        match self.status {
            Status::Ok => Ok(self),
            Status::InvalidArgument => Err(ScullError::InvalidArgument(message)),
            Status::Fault => Err(ScullError::TransferFault(message)),
            Status::Interrupted => Err(ScullError::Interrupted),
            Status::Error => Err(ScullError::Remote(message)),
        }
    }
}
