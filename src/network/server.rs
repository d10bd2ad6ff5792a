//! TCP Server
//!
//! Accepts connections and gives each its own thread and device session.

use std::collections::HashMap;
use std::io::{self, BufWriter};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::sync::WaitGroup;
use parking_lot::Mutex;

use crate::config::Config;
use crate::device::Interrupt;
use crate::driver::Driver;
use crate::error::Result;
use crate::protocol::{write_response, Response};

use super::Connection;

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL: Duration = Duration::from_millis(20);

/// TCP server exposing the device
pub struct Server {
    config: Config,

    driver: Arc<Driver>,

    /// Bound in non-blocking mode so the accept loop can observe shutdown
    listener: TcpListener,

    shutdown: Arc<AtomicBool>,

    /// Shared by every session; raised on shutdown to abort lock waits
    interrupt: Interrupt,

    /// Live connection count
    active: Arc<AtomicUsize>,

    /// Read halves of live connections, shut down to wake idle readers
    streams: Arc<Mutex<HashMap<u64, TcpStream>>>,

    next_id: AtomicU64,
}

impl Server {
    /// Create a new server bound to `config.listen_addr`
    pub fn new(config: Config, driver: Arc<Driver>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            config,
            driver,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
            interrupt: Interrupt::new(),
            active: Arc::new(AtomicUsize::new(0)),
            streams: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Start the server (blocking)
    ///
    /// Returns after `shutdown` once every connection thread has finished.
    pub fn run(&self) -> Result<()> {
        let wait_group = WaitGroup::new();

        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    tracing::debug!("Accepted connection from {}", addr);
                    if let Err(e) = self.dispatch(stream, wait_group.clone()) {
                        tracing::warn!("Failed to set up connection from {}: {}", addr, e);
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                }
            }
        }

        tracing::info!(
            "Shutting down, waiting for {} connection(s)",
            self.active.load(Ordering::SeqCst)
        );
        wait_group.wait();
        Ok(())
    }

    /// Signal the server to shutdown gracefully
    ///
    /// Connections blocked waiting for the next command see end-of-stream;
    /// those blocked on the device lock see `Interrupted`.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.interrupt.raise();

        for stream in self.streams.lock().values() {
            Self::stop_reading(stream);
        }
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Hand an accepted stream to its own thread, or refuse it when full
    fn dispatch(&self, stream: TcpStream, wait_group: WaitGroup) -> Result<()> {
        // Accepted sockets can inherit the listener's non-blocking mode
        stream.set_nonblocking(false)?;

        if self.active.load(Ordering::SeqCst) >= self.config.max_connections {
            tracing::warn!(
                "Refusing connection: {} sessions already open",
                self.config.max_connections
            );
            let mut writer = BufWriter::new(stream);
            write_response(&mut writer, &Response::error("too many connections"))?;
            return Ok(());
        }

        let read_half = stream.try_clone()?;
        let mut connection = Connection::new(
            stream,
            Arc::clone(&self.driver),
            self.interrupt.clone(),
            Arc::clone(&self.shutdown),
        )?;
        connection.set_timeouts(self.config.read_timeout_ms, self.config.write_timeout_ms)?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        {
            let mut streams = self.streams.lock();
            // shutdown() may have swept the registry already
            if self.shutdown.load(Ordering::SeqCst) {
                Self::stop_reading(&read_half);
            }
            streams.insert(id, read_half);
        }

        let active = Arc::clone(&self.active);
        let streams = Arc::clone(&self.streams);
        active.fetch_add(1, Ordering::SeqCst);

        thread::spawn(move || {
            if let Err(e) = connection.handle() {
                tracing::warn!("Connection {} ended with error: {}", connection.peer_addr(), e);
            }
            streams.lock().remove(&id);
            active.fetch_sub(1, Ordering::SeqCst);
            drop(wait_group);
        });

        Ok(())
    }

    fn stop_reading(stream: &TcpStream) {
        if let Err(e) = stream.shutdown(Shutdown::Read) {
            // Already gone if the peer hung up first
            tracing::trace!("Socket shutdown skipped: {}", e);
        }
    }
}
