//! # benchlib -- Async Bench Instrument Control
//!
//! `benchlib` is an asynchronous Rust library for driving the bench
//! instruments of a small electronics lab: the PSG9080 function
//! generator, Siglent SDS-series oscilloscopes, and the KE103
//! programmable DC load. It is designed for automated characterization
//! runs (load sweeps, frequency response, battery profiling) where a
//! script owns each instrument for the duration of a measurement.
//!
//! ## Quick Start
//!
//! Add `benchlib` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! benchlib = { version = "0.1", features = ["psg9080"] }
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! Configure a generator channel and verify the settings took effect:
//!
//! ```no_run
//! use benchlib::Channel;
//! use benchlib::psg9080::{ChannelConfig, Psg9080Builder};
//!
//! #[tokio::main]
//! async fn main() -> benchlib::Result<()> {
//!     let mut psg = Psg9080Builder::new()
//!         .serial_port("/dev/ttyUSB0")
//!         .build()
//!         .await?;
//!
//!     psg.configure_basic(Channel::Ch1, &ChannelConfig {
//!         frequency_hz: 10_000.0,
//!         amplitude_vpp: 1.0,
//!         ..Default::default()
//!     })
//!     .await?;
//!
//!     let report = psg.verify_output(Channel::Ch1, 10_000.0, 1.0).await?;
//!     println!("settled after {} readback(s)", report.attempts);
//!     psg.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                   | Purpose                                      |
//! |-------------------------|----------------------------------------------|
//! | `benchlib-core`         | [`Transport`] trait, shared types, errors    |
//! | `benchlib-transport`    | Serial and TCP transport implementations     |
//! | `benchlib-psg9080`      | PSG9080 function generator line protocol     |
//! | `benchlib-siglent`      | Siglent SDS scope SCPI + binary blocks       |
//! | `benchlib-ke103`        | KE103 DC load SCPI driver                    |
//! | `benchlib-test-harness` | `MockTransport` for protocol tests           |
//! | **`benchlib`**          | This facade crate -- re-exports everything   |
//!
//! ## Feature Flags
//!
//! Each instrument backend is gated behind a feature flag:
//!
//! | Feature        | Enables                                  | Default |
//! |----------------|------------------------------------------|---------|
//! | `psg9080`      | [`psg9080`] module (line protocol)       | yes     |
//! | `siglent`      | [`siglent`] module (SCPI over socket)    | yes     |
//! | `ke103`        | [`ke103`] module (SCPI over serial)      | yes     |
//! | `test-harness` | [`test_harness`] module (mock transport) | no      |
//! | `full`         | All of the above                         | no      |
//!
//! ## Concurrency Model
//!
//! Every driver owns its transport exclusively and exposes `&mut self`
//! methods: one outstanding command per instrument, no internal locking.
//! Drive each instrument from a single task, or wrap a driver in your
//! own synchronization if it must be shared. Separate instruments are
//! fully independent and can be driven concurrently.

pub use benchlib_core::*;

/// Transport implementations: serial ports and SCPI-over-TCP sockets.
pub mod transport {
    pub use benchlib_transport::*;
}

/// PSG9080 function/arbitrary waveform generator backend.
///
/// Provides [`Psg9080`](psg9080::Psg9080) and
/// [`Psg9080Builder`](psg9080::Psg9080Builder) for the generator's
/// CRLF-terminated `:wNN=`/`:rNN=` line protocol, plus readback
/// verification with tolerance policies.
#[cfg(feature = "psg9080")]
pub mod psg9080 {
    pub use benchlib_psg9080::*;
}

/// Siglent SDS-series oscilloscope backend.
///
/// Provides [`SiglentScope`](siglent::SiglentScope) for SCPI over the
/// scope's raw socket: acquisition and trigger setup, preamble decoding,
/// and waveform transfer with voltage and time-axis scaling.
#[cfg(feature = "siglent")]
pub mod siglent {
    pub use benchlib_siglent::*;
}

/// KE103 programmable DC electronic load backend.
///
/// Provides [`Ke103`](ke103::Ke103) for LF-terminated SCPI with
/// unit-suffixed setpoints and measurements.
#[cfg(feature = "ke103")]
pub mod ke103 {
    pub use benchlib_ke103::*;
}

/// Deterministic mock transport for protocol-level tests.
#[cfg(feature = "test-harness")]
pub mod test_harness {
    pub use benchlib_test_harness::*;
}
