//! Client
//!
//! Blocking client for the device server. One client is one session.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use bytes::Buf;

use crate::error::{Result, ScullError};
use crate::protocol::{check_outgoing_len, read_response, write_command, Command, Response};
use crate::session::SeekMode;

/// Connection to a running server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect and open a session
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Send a raw command and return the response as-is
    pub fn execute(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)
    }

    /// Read up to `count` bytes at the session cursor
    pub fn read(&mut self, count: u32) -> Result<Vec<u8>> {
        let response = self.call(&Command::Read { count })?;
        Ok(response.payload.unwrap_or_default())
    }

    /// Write `data` at the session cursor; returns bytes written
    ///
    /// Data over `MAX_PAYLOAD_SIZE` is refused locally with a protocol error.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        check_outgoing_len(data.len())?;
        let response = self.call(&Command::Write {
            data: data.to_vec(),
        })?;
        let mut payload = response.payload_bytes();
        expect_payload(payload, 4)?;
        Ok(payload.get_u32() as usize)
    }

    /// Move the session cursor; returns the new position
    pub fn seek(&mut self, offset: i64, mode: SeekMode) -> Result<u64> {
        let response = self.call(&Command::Seek {
            offset,
            whence: mode.whence(),
        })?;
        let mut payload = response.payload_bytes();
        expect_payload(payload, 8)?;
        Ok(payload.get_u64())
    }

    /// Issue a control command by code
    pub fn control(&mut self, code: u32, arg: u64) -> Result<()> {
        self.call(&Command::Control { code, arg })?;
        Ok(())
    }

    pub fn ping(&mut self) -> Result<()> {
        self.call(&Command::Ping)?;
        Ok(())
    }

    fn call(&mut self, command: &Command) -> Result<Response> {
        self.execute(command)?.into_result()
    }
}

fn expect_payload(payload: &[u8], len: usize) -> Result<()> {
    if payload.len() != len {
        return Err(ScullError::Protocol(format!(
            "expected {} byte reply, got {}",
            len,
            payload.len()
        )));
    }
    Ok(())
}
