//! Mock SCPI socket server for driver-level testing.
//!
//! [`MockScpiServer`] provides a lightweight TCP listener pre-loaded with
//! scripted responses, enabling deterministic testing of drivers that
//! speak SCPI over a raw socket (e.g., a Siglent scope on port 5025)
//! without real hardware or network infrastructure.
//!
//! # Example
//!
//! ```
//! use benchlib_test_harness::MockScpiServer;
//!
//! # async fn example() -> benchlib_core::Result<()> {
//! let mut server = MockScpiServer::new().await?;
//!
//! // When the client sends "*IDN?\n", respond with the IDN string
//! server.expect(b"*IDN?\n", b"Siglent Technologies,SDS824X HD,SDS08A,1.6.2\n");
//!
//! // Get the address to connect a TcpTransport to
//! let addr = server.addr();
//! // ... connect and test ...
//! # Ok(())
//! # }
//! ```

use benchlib_core::error::{Error, Result};
use std::collections::VecDeque;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A pre-loaded request/response pair for the mock SCPI server.
#[derive(Debug, Clone)]
struct ScpiExpectation {
    /// The exact bytes we expect the client to send.
    request: Vec<u8>,
    /// The bytes to send back when the matching request is received.
    response: Vec<u8>,
}

/// A mock SCPI server for testing drivers over the network.
///
/// The server listens on a random available port on localhost. Once
/// [`start_with_ready`](MockScpiServer::start_with_ready) is called, it
/// accepts a single connection and processes expectations in order: for
/// each expected request it reads from the client and writes back the
/// corresponding response. An empty response means the command is a bare
/// set with no reply, matching how real SCPI instruments behave.
///
/// If the client sends data that does not match the next expectation,
/// the server task returns an error which [`wait`](MockScpiServer::wait)
/// surfaces to the test.
pub struct MockScpiServer {
    /// The address the server is listening on (e.g., "127.0.0.1:54321").
    addr: String,
    /// Ordered queue of expected request/response pairs.
    expectations: VecDeque<ScpiExpectation>,
    /// Handle to the server task once started.
    server_handle: Option<JoinHandle<std::result::Result<(), String>>>,
}

impl MockScpiServer {
    /// Create a new mock SCPI server on a random localhost port.
    ///
    /// The server does not accept connections until
    /// [`start_with_ready`](MockScpiServer::start_with_ready) is called,
    /// allowing expectations to be loaded first.
    pub async fn new() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| Error::Transport(format!("failed to bind mock SCPI server: {}", e)))?;
        let addr = listener.local_addr().map_err(Error::Io)?.to_string();
        drop(listener);

        Ok(Self {
            addr,
            expectations: VecDeque::new(),
            server_handle: None,
        })
    }

    /// Add an expected request/response pair.
    ///
    /// Expectations are consumed in order. When the connected client sends
    /// bytes matching `request`, the server replies with `response`. Pass
    /// an empty `response` for set commands that produce no reply.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expectations.push_back(ScpiExpectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Get the address the server is listening on.
    ///
    /// Use this to connect a `TcpTransport` to the mock server.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Start the server and return a channel that signals when the
    /// listener is ready to accept connections.
    ///
    /// This avoids race conditions where the client tries to connect
    /// before the server has re-bound to the port.
    pub fn start_with_ready(&mut self) -> oneshot::Receiver<()> {
        let addr = self.addr.clone();
        let expectations: Vec<ScpiExpectation> = self.expectations.drain(..).collect();
        let (ready_tx, ready_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let listener = TcpListener::bind(&addr)
                .await
                .map_err(|e| format!("failed to re-bind mock SCPI server on {}: {}", addr, e))?;

            let _ = ready_tx.send(());

            let (mut stream, _) = listener
                .accept()
                .await
                .map_err(|e| format!("failed to accept connection: {}", e))?;

            for (i, expectation) in expectations.iter().enumerate() {
                let mut buf = vec![0u8; expectation.request.len()];
                let mut total_read = 0;

                // Read exactly the expected number of bytes
                while total_read < expectation.request.len() {
                    let n = stream
                        .read(&mut buf[total_read..])
                        .await
                        .map_err(|e| format!("expectation {}: read error: {}", i, e))?;
                    if n == 0 {
                        return Err(format!(
                            "expectation {}: client disconnected after {} bytes (expected {})",
                            i,
                            total_read,
                            expectation.request.len()
                        ));
                    }
                    total_read += n;
                }

                if buf != expectation.request {
                    return Err(format!(
                        "expectation {}: request mismatch: expected {:02X?}, got {:02X?}",
                        i, expectation.request, buf
                    ));
                }

                if !expectation.response.is_empty() {
                    stream
                        .write_all(&expectation.response)
                        .await
                        .map_err(|e| format!("expectation {}: write error: {}", i, e))?;

                    stream
                        .flush()
                        .await
                        .map_err(|e| format!("expectation {}: flush error: {}", i, e))?;
                }
            }

            Ok(())
        });

        self.server_handle = Some(handle);
        ready_rx
    }

    /// Wait for the server task to complete and return any errors.
    ///
    /// Call this after the client has finished its interactions to verify
    /// that all expectations were met.
    pub async fn wait(self) -> std::result::Result<(), String> {
        if let Some(handle) = self.server_handle {
            handle
                .await
                .map_err(|e| format!("server task panicked: {}", e))?
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn scripted_exchange() {
        let mut server = MockScpiServer::new().await.unwrap();
        server.expect(b"*IDN?\n", b"Siglent Technologies,SDS824X HD,SDS08A,1.6.2\n");
        server.expect(b":TIMebase:SCALe 1e-3\n", b"");
        let addr = server.addr().to_string();

        let ready = server.start_with_ready();
        ready.await.unwrap();

        let mut stream = TcpStream::connect(&addr).await.unwrap();
        stream.write_all(b"*IDN?\n").await.unwrap();

        let mut buf = [0u8; 128];
        let n = stream.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"Siglent Technologies,SDS824X HD,SDS08A,1.6.2\n");

        stream.write_all(b":TIMebase:SCALe 1e-3\n").await.unwrap();
        drop(stream);

        // Both expectations consumed; the server task exits cleanly.
        server.wait().await.unwrap();
    }

    #[tokio::test]
    async fn mismatched_request_reported() {
        let mut server = MockScpiServer::new().await.unwrap();
        server.expect(b"*IDN?\n", b"x\n");
        let addr = server.addr().to_string();

        let ready = server.start_with_ready();
        ready.await.unwrap();

        let mut stream = TcpStream::connect(&addr).await.unwrap();
        stream.write_all(b"*RST?\n").await.unwrap();
        drop(stream);

        let result = server.wait().await;
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("request mismatch"));
    }
}
