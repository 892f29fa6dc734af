//! Psg9080Builder -- fluent builder for constructing [`Psg9080`] instances.
//!
//! Separates configuration from construction so that callers can set up
//! serial port parameters and timeout values before establishing the
//! transport connection.
//!
//! # Example
//!
//! ```no_run
//! use benchlib_psg9080::Psg9080Builder;
//! use std::time::Duration;
//!
//! # async fn example() -> benchlib_core::Result<()> {
//! let psg = Psg9080Builder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .command_timeout(Duration::from_millis(300))
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use benchlib_core::error::{Error, Result};
use benchlib_core::transport::Transport;

use crate::generator::Psg9080;
use crate::verify::VerifyPolicy;

/// Factory default baud rate for the PSG9080's USB serial port.
const DEFAULT_BAUD_RATE: u32 = 115200;

/// Fluent builder for [`Psg9080`].
pub struct Psg9080Builder {
    serial_port: Option<String>,
    baud_rate: u32,
    command_timeout: Duration,
    verify_policy: VerifyPolicy,
}

impl Psg9080Builder {
    /// Create a new builder with default settings (115200 baud, 500 ms
    /// command timeout, default verification tolerances).
    pub fn new() -> Self {
        Psg9080Builder {
            serial_port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            command_timeout: Duration::from_millis(500),
            verify_policy: VerifyPolicy::default(),
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the default baud rate.
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// Set the timeout for waiting for a query response (default: 500 ms).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Override the tolerance and backoff policy used by
    /// [`verify_output`](Psg9080::verify_output).
    pub fn verify_policy(mut self, policy: VerifyPolicy) -> Self {
        self.verify_policy = policy;
        self
    }

    /// Build a [`Psg9080`] with a caller-provided transport.
    ///
    /// This is the primary entry point for testing (pass a
    /// `MockTransport` from `benchlib-test-harness`) and for advanced
    /// use cases where the caller manages the transport directly.
    pub fn build_with_transport(self, transport: Box<dyn Transport>) -> Psg9080 {
        let mut psg = Psg9080::new(transport, self.command_timeout);
        psg.verify_policy = self.verify_policy;
        psg
    }

    /// Build a [`Psg9080`] over a serial transport.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub async fn build(self) -> Result<Psg9080> {
        let port = self
            .serial_port
            .as_ref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;

        let transport = benchlib_transport::SerialTransport::open(port, self.baud_rate).await?;
        let mut psg = Psg9080::new(Box::new(transport), self.command_timeout);
        psg.verify_policy = self.verify_policy;
        Ok(psg)
    }
}

impl Default for Psg9080Builder {
    fn default() -> Self {
        Self::new()
    }
}
