//! Raw sample conversion and time axis reconstruction.
//!
//! `:WAVeform:DATA?` returns raw ADC codes. In WORD mode each sample is
//! a big-endian 16-bit value left-justified to the ADC resolution; in
//! BYTE mode each sample is one unsigned byte. Both are converted to
//! signed codes centered on zero, then scaled into volts using the
//! preamble's vertical parameters.

use benchlib_core::error::{Error, Result};

use crate::preamble::Preamble;

/// Horizontal divisions on the display grid.
const GRID_DIVISIONS: f64 = 10.0;

/// Convert WORD-mode sample data to volts.
///
/// Each sample is a big-endian 16-bit word holding an `adc_bits`-wide
/// code in its high bits. The word is arithmetic-shifted down by
/// `16 - adc_bits`, then codes at or above half scale wrap negative
/// (two's complement at the ADC width). A trailing odd byte, if any,
/// is discarded.
pub fn words_to_volts(data: &[u8], pre: &Preamble) -> Result<Vec<f64>> {
    if !(1..=16).contains(&pre.adc_bits) {
        return Err(Error::InvalidParameter(format!(
            "unsupported ADC resolution: {} bits",
            pre.adc_bits
        )));
    }
    let shift = 16 - pre.adc_bits as u32;
    let full = 1i32 << pre.adc_bits;
    let center = full / 2;
    let gain = volts_per_code(pre);

    Ok(data
        .chunks_exact(2)
        .map(|pair| {
            let word = i16::from_be_bytes([pair[0], pair[1]]);
            let mut code = (word as i32) >> shift;
            if code >= center {
                code -= full;
            }
            code as f64 * gain - pre.voffset as f64
        })
        .collect())
}

/// Convert BYTE-mode sample data to volts.
///
/// Each sample is one unsigned byte; values of 128 and above wrap
/// negative (two's complement at 8 bits).
pub fn bytes_to_volts(data: &[u8], pre: &Preamble) -> Vec<f64> {
    let gain = volts_per_code(pre);
    data.iter()
        .map(|&b| {
            let mut code = b as i32;
            if code >= 128 {
                code -= 256;
            }
            code as f64 * gain - pre.voffset as f64
        })
        .collect()
}

/// Reconstruct the time axis for `n` samples.
///
/// The first sample sits at `-delay - timebase * 10 / 2` (the left edge
/// of the ten-division display grid, shifted by the trigger delay), and
/// subsequent samples step by the preamble's sample interval.
pub fn time_axis(pre: &Preamble, n: usize, timebase: f64) -> Vec<f64> {
    let t0 = -pre.delay - timebase * GRID_DIVISIONS / 2.0;
    (0..n).map(|i| t0 + i as f64 * pre.dt as f64).collect()
}

fn volts_per_code(pre: &Preamble) -> f64 {
    pre.vdiv as f64 / pre.code_per_div as f64
}
