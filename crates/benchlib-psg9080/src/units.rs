//! Fixed-point numeric codecs for PSG9080 parameter fields.
//!
//! The instrument encodes every physical quantity as a scaled integer:
//!
//! - Frequency: `(scaled, unit_code)` pair where `scaled` carries 3
//!   implied decimals in the selected unit. 25.786 Hz is `(25786, 0)`.
//! - Amplitude: millivolts. 1.000 Vpp is `1000`.
//! - Duty cycle: hundredths of a percent. 50% is `5000`.
//! - Phase: hundredths of a degree. 359.99 degrees is `35999`.
//!
//! All codecs here are pure functions; round-trip accuracy is bounded by
//! the fixed-point resolution (0.001 in the selected frequency unit,
//! 0.01 for duty and phase).

use benchlib_core::error::{Error, Result};

/// Largest scaled value the instrument accepts (32-bit signed range).
const MAX_SCALED: i64 = 2_147_483_647;

/// Frequency unit codes carried in the second field of `w13`/`w14`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrequencyUnit {
    /// Unit code 0: hertz.
    Hz,
    /// Unit code 1: kilohertz.
    KiloHz,
    /// Unit code 2: megahertz.
    MegaHz,
    /// Unit code 3: millihertz.
    MilliHz,
    /// Unit code 4: microhertz.
    MicroHz,
}

impl FrequencyUnit {
    /// The wire unit code.
    pub fn code(&self) -> u8 {
        match self {
            FrequencyUnit::Hz => 0,
            FrequencyUnit::KiloHz => 1,
            FrequencyUnit::MegaHz => 2,
            FrequencyUnit::MilliHz => 3,
            FrequencyUnit::MicroHz => 4,
        }
    }

    /// The unit's scale factor relative to hertz.
    pub fn scale(&self) -> f64 {
        match self {
            FrequencyUnit::Hz => 1.0,
            FrequencyUnit::KiloHz => 1e3,
            FrequencyUnit::MegaHz => 1e6,
            FrequencyUnit::MilliHz => 1e-3,
            FrequencyUnit::MicroHz => 1e-6,
        }
    }

    /// Look up a unit from its wire code.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(FrequencyUnit::Hz),
            1 => Ok(FrequencyUnit::KiloHz),
            2 => Ok(FrequencyUnit::MegaHz),
            3 => Ok(FrequencyUnit::MilliHz),
            4 => Ok(FrequencyUnit::MicroHz),
            other => Err(Error::UnknownUnit(other)),
        }
    }
}

/// Candidate order for frequency encoding.
///
/// Hz, kHz, and MHz are preferred and searched first; the sub-hertz
/// units are a fallback only.
const UNIT_ORDER: [FrequencyUnit; 5] = [
    FrequencyUnit::Hz,
    FrequencyUnit::KiloHz,
    FrequencyUnit::MegaHz,
    FrequencyUnit::MilliHz,
    FrequencyUnit::MicroHz,
];

/// Encode a frequency in hertz as a `(scaled, unit)` pair.
///
/// For each candidate unit, the scaled value is
/// `round((hz / unit_scale) * 1000)`, giving 3 implied decimals in that
/// unit. The search stops at the first of Hz/kHz/MHz whose scaled value
/// fits the instrument's 32-bit signed range; if none of those three
/// fit, the last fitting sub-hertz candidate is used.
///
/// Negative or non-finite input, or input too large for any unit, fails
/// with [`Error::FrequencyOutOfRange`].
///
/// # Example
///
/// ```
/// use benchlib_psg9080::units::{encode_frequency, FrequencyUnit};
///
/// assert_eq!(encode_frequency(25.786).unwrap(), (25786, FrequencyUnit::Hz));
/// assert_eq!(encode_frequency(1000.0).unwrap(), (1_000_000, FrequencyUnit::Hz));
/// ```
pub fn encode_frequency(hz: f64) -> Result<(i64, FrequencyUnit)> {
    if !hz.is_finite() || hz < 0.0 {
        return Err(Error::FrequencyOutOfRange(hz));
    }

    let mut best: Option<(i64, FrequencyUnit)> = None;
    for unit in UNIT_ORDER {
        let scaled = ((hz / unit.scale()) * 1000.0).round();
        if scaled >= 0.0 && scaled <= MAX_SCALED as f64 {
            best = Some((scaled as i64, unit));
            if matches!(
                unit,
                FrequencyUnit::Hz | FrequencyUnit::KiloHz | FrequencyUnit::MegaHz
            ) {
                break;
            }
        }
    }

    best.ok_or(Error::FrequencyOutOfRange(hz))
}

/// Decode a `(scaled, unit_code)` frequency field pair back to hertz.
///
/// The scaled value carries 3 implied decimals in the coded unit. Fails
/// with [`Error::UnknownUnit`] for a code outside the documented table.
pub fn decode_frequency(scaled: i64, unit_code: u8) -> Result<f64> {
    let unit = FrequencyUnit::from_code(unit_code)?;
    Ok((scaled as f64 / 1000.0) * unit.scale())
}

/// Encode a peak-to-peak amplitude in volts as integer millivolts.
pub fn encode_amplitude(vpp: f64) -> i64 {
    (vpp * 1000.0).round() as i64
}

/// Decode an integer-millivolt amplitude field back to volts.
pub fn decode_amplitude(millivolts: i64) -> f64 {
    millivolts as f64 / 1000.0
}

/// Encode a duty cycle in percent as hundredths of a percent.
pub fn encode_duty(percent: f64) -> i64 {
    (percent * 100.0).round() as i64
}

/// Decode a hundredths-of-a-percent duty field back to percent.
pub fn decode_duty(raw: i64) -> f64 {
    raw as f64 / 100.0
}

/// Encode a phase in degrees as hundredths of a degree.
pub fn encode_phase(degrees: f64) -> i64 {
    (degrees * 100.0).round() as i64
}

/// Decode a hundredths-of-a-degree phase field back to degrees.
pub fn decode_phase(raw: i64) -> f64 {
    raw as f64 / 100.0
}
