//! benchlib-siglent: Siglent SDS-series oscilloscope driver.
//!
//! Talks SCPI over the scope's raw socket (port 5025). Text commands
//! and queries are newline-terminated; waveform preambles and sample
//! data arrive as IEEE-488.2 definite-length binary blocks.
//!
//! # Module layout
//!
//! - [`block`] -- binary block extraction (`#<n><len><payload>`)
//! - [`preamble`] -- WAVEDESC scaling-field decoding
//! - [`waveform`] -- raw sample to volts conversion, time axis
//! - [`scope`] -- the [`SiglentScope`] driver over a transport
//!
//! # Example
//!
//! ```no_run
//! use benchlib_siglent::{ScopeChannel, SiglentScope, TriggerSlope, WaveformWidth};
//!
//! # async fn example() -> benchlib_core::Result<()> {
//! let mut scope = SiglentScope::connect("192.168.1.50:5025").await?;
//! println!("{}", scope.identify().await?);
//!
//! scope.configure_acquisition(5.0e8, 1.0e-3).await?;
//! scope
//!     .configure_edge_trigger(ScopeChannel::C1, 0.25, TriggerSlope::Positive)
//!     .await?;
//! scope.wait_for_trigger().await?;
//!
//! scope.set_waveform_source(ScopeChannel::C1).await?;
//! scope.set_waveform_width(WaveformWidth::Word).await?;
//! let capture = scope.fetch_waveform(WaveformWidth::Word).await?;
//! println!("{} samples", capture.volts.len());
//! scope.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod block;
pub mod preamble;
pub mod scope;
pub mod waveform;

pub use block::read_block;
pub use preamble::Preamble;
pub use scope::{ScopeChannel, SiglentScope, TriggerSlope, WaveformCapture, WaveformWidth};
