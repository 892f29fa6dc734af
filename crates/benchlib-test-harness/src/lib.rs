//! benchlib-test-harness: Test utilities and mock transports for benchlib.
//!
//! This crate provides [`MockTransport`] for deterministic unit testing of
//! instrument drivers without requiring real hardware, and
//! [`MockScpiServer`] for testing drivers that communicate over raw SCPI
//! sockets.

pub mod mock_scpi;
pub mod mock_serial;

pub use mock_scpi::MockScpiServer;
pub use mock_serial::MockTransport;
