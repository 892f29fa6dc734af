//! benchlib-core: Core traits, types, and error definitions for benchlib.
//!
//! This crate defines the instrument-agnostic abstractions that all benchlib
//! drivers implement. Automation scripts and test fixtures depend on these
//! types without pulling in any specific instrument driver.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel
//! - [`Channel`] -- output channel selector for two-channel instruments
//! - [`ToleranceSpec`] / [`BackoffSchedule`] -- readback verification policy
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use benchlib_core::*`.
pub use error::{Error, Result};
pub use transport::{read_line, read_raw, Transport};
pub use types::{BackoffSchedule, Channel, InstrumentInfo, ToleranceSpec};
