//! Transport trait for instrument communication.
//!
//! The [`Transport`] trait abstracts over the physical link to a bench
//! instrument. Implementations exist for serial ports (USB virtual COM),
//! raw SCPI sockets, and mock transports for testing.
//!
//! Protocol engines (e.g. the PSG9080 line codec in `benchlib-psg9080`)
//! operate on a `Transport` rather than directly on a serial port, enabling
//! both real hardware control and deterministic unit testing with
//! `MockTransport` from the `benchlib-test-harness` crate.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Error, Result};

/// Asynchronous byte-level transport to an instrument.
///
/// Implementations handle buffering and error mapping at the physical
/// layer. Protocol-level concerns (line terminators, block framing,
/// numeric field encoding) are handled by the protocol engines that
/// consume this trait.
///
/// A transport is the exclusive owner of its OS handle. `close()` releases
/// it exactly once; implementations also release on drop so the handle is
/// never leaked on early-return or error paths.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the instrument.
    ///
    /// Implementations should block until all bytes have been written to
    /// the underlying transport (serial TX buffer, TCP socket, etc.).
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the instrument into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Will wait up to `timeout`
    /// for data to arrive; returns [`Error::NoResponse`] if no data is
    /// received within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport connection.
    ///
    /// Idempotent: closing an already-closed transport is a no-op.
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// return [`Error::NotOpen`].
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently open.
    fn is_connected(&self) -> bool;
}

/// Maximum accumulation before a read helper gives up and reports the
/// buffered bytes as malformed. Text responses are tens of bytes; binary
/// preamble/waveform dumps can run to megabytes, so the bound is generous.
const MAX_LINE: usize = 8192;

/// Read one LF-terminated line from the transport.
///
/// Accumulates `receive()` chunks until a `\n` byte arrives, then returns
/// the line including its terminator. A timeout with nothing buffered maps
/// to [`Error::NoResponse`]; a timeout with a partial line returns the
/// partial bytes so the caller's grammar check can report them as
/// malformed with full context.
pub async fn read_line(transport: &mut dyn Transport, timeout: Duration) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    let mut chunk = [0u8; 256];

    loop {
        match transport.receive(&mut chunk, timeout).await {
            Ok(n) => {
                line.extend_from_slice(&chunk[..n]);
                if let Some(pos) = line.iter().position(|&b| b == b'\n') {
                    line.truncate(pos + 1);
                    return Ok(line);
                }
                if line.len() > MAX_LINE {
                    return Err(Error::MalformedResponse { raw: line });
                }
            }
            Err(Error::NoResponse) => {
                if line.is_empty() {
                    return Err(Error::NoResponse);
                }
                // Partial line at timeout: hand it back for diagnosis.
                return Ok(line);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Read a raw burst of bytes, up to `max_len`, until the line goes quiet.
///
/// Used for framed binary dumps (waveform data, preambles) where the
/// response has no text terminator. The first timeout after at least one
/// byte has arrived ends the read; a timeout before any byte arrives maps
/// to [`Error::NoResponse`].
pub async fn read_raw(
    transport: &mut dyn Transport,
    max_len: usize,
    timeout: Duration,
) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];

    while data.len() < max_len {
        let want = (max_len - data.len()).min(chunk.len());
        match transport.receive(&mut chunk[..want], timeout).await {
            Ok(n) => data.extend_from_slice(&chunk[..n]),
            Err(Error::NoResponse) => {
                if data.is_empty() {
                    return Err(Error::NoResponse);
                }
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(data)
}
