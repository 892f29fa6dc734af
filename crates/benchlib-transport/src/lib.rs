//! benchlib-transport: Physical transports for bench instruments.
//!
//! Provides the two link types benchlib instruments actually use:
//!
//! - [`SerialTransport`] -- USB virtual COM ports (PSG9080 function
//!   generator, KEL103 electronic load)
//! - [`TcpTransport`] -- raw SCPI sockets (Siglent oscilloscopes on
//!   port 5025)
//!
//! Both implement [`benchlib_core::Transport`], so every driver in the
//! workspace can run over either link or over the mock transport from
//! `benchlib-test-harness`.

pub mod serial;
pub mod tcp;

pub use serial::{DataBits, FlowControl, Parity, SerialConfig, SerialTransport, StopBits};
pub use tcp::TcpTransport;
