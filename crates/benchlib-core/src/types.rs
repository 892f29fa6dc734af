//! Core types used throughout benchlib.
//!
//! These types are shared across the instrument drivers (function
//! generator, oscilloscope, programmable load) and carry no protocol
//! knowledge of their own.

use std::fmt;
use std::time::Duration;

/// Output channel of a two-channel instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Channel 1.
    Ch1,
    /// Channel 2.
    Ch2,
}

impl Channel {
    /// The 1-based channel number as the instruments label it.
    pub fn number(&self) -> u8 {
        match self {
            Channel::Ch1 => 1,
            Channel::Ch2 => 2,
        }
    }

    /// Create a `Channel` from a 1-based channel number.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Channel::Ch1),
            2 => Some(Channel::Ch2),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CH{}", self.number())
    }
}

/// Tolerance predicate for readback verification.
///
/// A readback passes when it is within `max(floor, fraction * target)` of
/// the target, so small targets are covered by the absolute floor and
/// large targets by the relative bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceSpec {
    /// Absolute tolerance floor, in the quantity's own unit.
    pub floor: f64,
    /// Relative tolerance as a fraction of the target (0.01 = 1%).
    pub fraction: f64,
}

impl ToleranceSpec {
    /// Create a tolerance spec from an absolute floor and a relative fraction.
    pub fn new(floor: f64, fraction: f64) -> Self {
        ToleranceSpec { floor, fraction }
    }

    /// The tolerance band half-width for a given target value.
    pub fn band(&self, target: f64) -> f64 {
        self.floor.max(self.fraction * target.abs())
    }

    /// Whether `readback` lies within tolerance of `target`.
    pub fn is_met(&self, target: f64, readback: f64) -> bool {
        (readback - target).abs() <= self.band(target)
    }
}

/// Backoff schedule for the readback verifier.
///
/// The first attempt waits a short settle delay; later attempts wait
/// longer to give slow firmware time to commit the setting.
#[derive(Debug, Clone, Copy)]
pub struct BackoffSchedule {
    /// Delay before the first readback attempt.
    pub initial: Duration,
    /// Delay before each subsequent attempt.
    pub subsequent: Duration,
}

impl BackoffSchedule {
    /// The delay to apply before attempt `n` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            self.initial
        } else {
            self.subsequent
        }
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        BackoffSchedule {
            initial: Duration::from_millis(50),
            subsequent: Duration::from_millis(150),
        }
    }
}

/// Identity fields reported by a SCPI `*IDN?` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentInfo {
    /// Manufacturer name (first IDN field).
    pub manufacturer: String,
    /// Model designation (second IDN field).
    pub model: String,
    /// Serial number, if reported.
    pub serial: String,
    /// Firmware revision, if reported.
    pub firmware: String,
}

impl InstrumentInfo {
    /// Parse a comma-separated `*IDN?` response.
    ///
    /// Instruments that report fewer than four fields leave the trailing
    /// fields empty rather than failing; the response is surfaced for
    /// display, not dispatch.
    pub fn parse(idn: &str) -> Self {
        let mut fields = idn.trim().splitn(4, ',').map(|s| s.trim().to_string());
        InstrumentInfo {
            manufacturer: fields.next().unwrap_or_default(),
            model: fields.next().unwrap_or_default(),
            serial: fields.next().unwrap_or_default(),
            firmware: fields.next().unwrap_or_default(),
        }
    }
}

impl fmt::Display for InstrumentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.manufacturer, self.model)
    }
}
