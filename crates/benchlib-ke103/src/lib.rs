//! benchlib-ke103: KE103 programmable DC electronic load driver.
//!
//! The KE103 speaks LF-terminated SCPI over a USB serial port. Set
//! commands carry unit suffixes on the wire (`:CURR 0.050A`) and
//! measurement replies echo one back (`0.10000V`).
//!
//! # Module layout
//!
//! - [`commands`] -- pure command builders and reply parsing
//! - [`load`] -- the [`Ke103`] driver over a transport
//!
//! # Example
//!
//! ```no_run
//! use benchlib_ke103::Ke103;
//!
//! # async fn example() -> benchlib_core::Result<()> {
//! let mut el = Ke103::open("/dev/ttyUSB1").await?;
//! println!("{}", el.identify().await?);
//!
//! el.set_current(0.5).await?;
//! el.set_input(true).await?;
//! let volts = el.measure_voltage().await?;
//! println!("terminal voltage: {volts:.3} V");
//! el.set_input(false).await?;
//! el.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod load;

pub use commands::FunctionMode;
pub use load::Ke103;
