//! benchlib-psg9080: PSG9080 function/arbitrary waveform generator driver.
//!
//! The PSG9080 is a two-channel DDS signal generator controlled over a
//! USB serial port (115200 baud, 8N1) with an ASCII line protocol:
//! `:w<NN>=...` write commands and `:r<NN>=...` queries, CRLF terminated.
//!
//! # Module layout
//!
//! - [`protocol`] -- line framing: command encoding, response grammar
//! - [`units`] -- fixed-point codecs for frequency, amplitude, duty, phase
//! - [`commands`] -- pure command builders for the full function-code table
//! - [`generator`] -- the [`Psg9080`] driver over a transport
//! - [`builder`] -- fluent construction
//! - [`verify`] -- tolerance-based readback verification
//!
//! # Example
//!
//! ```no_run
//! use benchlib_core::Channel;
//! use benchlib_psg9080::{ChannelConfig, Psg9080Builder};
//!
//! # async fn example() -> benchlib_core::Result<()> {
//! let mut psg = Psg9080Builder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .build()
//!     .await?;
//!
//! psg.configure_basic(Channel::Ch1, &ChannelConfig {
//!     frequency_hz: 10_000.0,
//!     amplitude_vpp: 1.0,
//!     ..Default::default()
//! })
//! .await?;
//!
//! let report = psg.verify_output(Channel::Ch1, 10_000.0, 1.0).await?;
//! if !report.within_tolerance {
//!     eprintln!("readback off target: {:?}", report);
//! }
//! psg.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod commands;
pub mod generator;
pub mod protocol;
pub mod units;
pub mod verify;

pub use builder::Psg9080Builder;
pub use commands::{
    BurstIdle, MemoryOp, ModulatingWave, ModulationType, SweepDirection, TriggerSource, Waveform,
};
pub use generator::{ChannelConfig, Psg9080};
pub use units::FrequencyUnit;
pub use verify::{ReadbackReport, VerifyPolicy};
