//! Configuration for scull
//!
//! Centralized configuration with sensible defaults. The device capacity is
//! deliberately absent: it is the fixed [`crate::device::CAPACITY`].

use std::time::Duration;

use crate::error::{Result, ScullError};

/// Main configuration for a scull driver instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Device Configuration
    // -------------------------------------------------------------------------
    /// How long a blocked lock wait sleeps between interrupt checks (milliseconds)
    pub lock_poll_interval_ms: u64,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client sessions
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_poll_interval_ms: 10,
            listen_addr: "127.0.0.1:7070".to_string(),
            max_connections: 64,
            read_timeout_ms: 30_000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check values that would leave the driver unusable
    pub fn validate(&self) -> Result<()> {
        if self.lock_poll_interval_ms == 0 {
            return Err(ScullError::Config(
                "lock_poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ScullError::Config(
                "max_connections must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Lock poll interval as a Duration
    pub fn lock_poll_interval(&self) -> Duration {
        Duration::from_millis(self.lock_poll_interval_ms)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the lock poll interval (in milliseconds)
    pub fn lock_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.lock_poll_interval_ms = ms;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
