//! Connection Handler
//!
//! Handles individual client connections. Each connection owns exactly one
//! device session, opened on accept and closed on disconnect.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::device::Interrupt;
use crate::driver::Driver;
use crate::error::{Result, ScullError};
use crate::protocol::{read_command, write_response, Command, Response};
use crate::session::SessionHandle;

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Driver owning the device
    driver: Arc<Driver>,

    /// This connection's session on the device
    session: SessionHandle,

    /// Set when the server is stopping
    shutdown: Arc<AtomicBool>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler and open its session
    pub fn new(
        stream: TcpStream,
        driver: Arc<Driver>,
        interrupt: Interrupt,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let session = driver.open_with_interrupt(interrupt);

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            driver,
            session,
            shutdown,
            peer_addr,
        })
    }

    /// Configure connection timeouts
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads commands in a loop and sends responses. The session is closed
    /// however the loop ends.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);
        let result = self.serve();
        if self.session.is_open() {
            self.session.close()?;
        }
        result
    }

    fn serve(&mut self) -> Result<()> {
        while !self.shutdown.load(Ordering::SeqCst) {
            let command = match read_command(&mut self.reader) {
                Ok(cmd) => cmd,
                Err(ScullError::Io(ref e)) => {
                    use std::io::ErrorKind;
                    match e.kind() {
                        ErrorKind::UnexpectedEof
                        | ErrorKind::ConnectionReset
                        | ErrorKind::ConnectionAborted => {
                            tracing::debug!("Client {} disconnected", self.peer_addr);
                        }
                        // Windows reports read timeouts as TimedOut
                        ErrorKind::WouldBlock | ErrorKind::TimedOut => {
                            tracing::debug!("Read timeout for client {}", self.peer_addr);
                        }
                        _ => {
                            tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                        }
                    }
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    // Send error response if possible
                    let _ = self.send_response(Response::from_error(&e));
                    return Err(e);
                }
            };

            tracing::trace!("Received command from {}: {:?}", self.peer_addr, command);

            let response = self.execute_command(command);

            if let Err(e) = self.send_response(response) {
                if let ScullError::Io(ref io_err) = e {
                    match io_err.kind() {
                        std::io::ErrorKind::ConnectionAborted
                        | std::io::ErrorKind::ConnectionReset
                        | std::io::ErrorKind::BrokenPipe => {
                            tracing::debug!(
                                "Client {} disconnected before response could be sent: {}",
                                self.peer_addr, e
                            );
                            return Ok(());
                        }
                        _ => {}
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }

        tracing::debug!("Server stopping, closing connection from {}", self.peer_addr);
        Ok(())
    }

    /// Execute a command and return a response
    fn execute_command(&mut self, command: Command) -> Response {
        match self.driver.execute(&mut self.session, command) {
            Ok(reply) => Response::from_reply(reply),
            Err(e) => {
                tracing::debug!("Command from {} failed: {}", self.peer_addr, e);
                Response::from_error(&e)
            }
        }
    }

    /// Send a response to the client
    fn send_response(&mut self, response: Response) -> Result<()> {
        write_response(&mut self.writer, &response)?;
        Ok(())
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Current cursor of this connection's session
    pub fn cursor(&self) -> usize {
        self.session.cursor()
    }
}
