//! Waveform preamble decoding.
//!
//! `:WAVeform:PREamble?` returns a binary block whose payload is the
//! scope's WAVEDESC descriptor. Only the fields needed to scale raw
//! sample codes into volts and seconds are decoded; everything else in
//! the descriptor is skipped. All fields are little-endian regardless
//! of the sample byte order.

use benchlib_core::error::{Error, Result};

/// Byte offset of the vertical gain (volts per division) field.
const OFFSET_VDIV: usize = 156;
/// Byte offset of the vertical offset field.
const OFFSET_VOFFSET: usize = 160;
/// Byte offset of the code-per-division scale field.
const OFFSET_CODE_PER_DIV: usize = 164;
/// Byte offset of the ADC resolution field.
const OFFSET_ADC_BITS: usize = 172;
/// Byte offset of the sample interval field.
const OFFSET_DT: usize = 176;
/// Byte offset of the trigger delay field.
const OFFSET_DELAY: usize = 180;

/// Minimum payload length covering all decoded fields.
const MIN_LEN: usize = 188;

/// Scaling parameters extracted from a waveform preamble block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preamble {
    /// Vertical scale, volts per division.
    pub vdiv: f32,
    /// Vertical offset, volts.
    pub voffset: f32,
    /// Sample codes per vertical division.
    pub code_per_div: f32,
    /// ADC resolution in bits (8 for byte mode, 12 on 12-bit scopes).
    pub adc_bits: i16,
    /// Sample interval, seconds.
    pub dt: f32,
    /// Trigger delay, seconds.
    pub delay: f64,
}

impl Preamble {
    /// Decode the scaling fields from a preamble block payload.
    ///
    /// The payload must be at least 188 bytes; shorter buffers yield
    /// [`Error::TruncatedPreamble`]. Extra trailing bytes are ignored.
    pub fn decode(payload: &[u8]) -> Result<Preamble> {
        if payload.len() < MIN_LEN {
            return Err(Error::TruncatedPreamble {
                len: payload.len(),
            });
        }

        Ok(Preamble {
            vdiv: read_f32(payload, OFFSET_VDIV),
            voffset: read_f32(payload, OFFSET_VOFFSET),
            code_per_div: read_f32(payload, OFFSET_CODE_PER_DIV),
            adc_bits: read_i16(payload, OFFSET_ADC_BITS),
            dt: read_f32(payload, OFFSET_DT),
            delay: read_f64(payload, OFFSET_DELAY),
        })
    }
}

fn read_f32(buf: &[u8], offset: usize) -> f32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    f32::from_le_bytes(bytes)
}

fn read_f64(buf: &[u8], offset: usize) -> f64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    f64::from_le_bytes(bytes)
}

fn read_i16(buf: &[u8], offset: usize) -> i16 {
    let mut bytes = [0u8; 2];
    bytes.copy_from_slice(&buf[offset..offset + 2]);
    i16::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a 188-byte descriptor with the given scaling fields planted
    /// at their documented offsets.
    fn descriptor(
        vdiv: f32,
        voffset: f32,
        code_per_div: f32,
        adc_bits: i16,
        dt: f32,
        delay: f64,
    ) -> Vec<u8> {
        let mut buf = vec![0u8; 188];
        buf[156..160].copy_from_slice(&vdiv.to_le_bytes());
        buf[160..164].copy_from_slice(&voffset.to_le_bytes());
        buf[164..168].copy_from_slice(&code_per_div.to_le_bytes());
        buf[172..174].copy_from_slice(&adc_bits.to_le_bytes());
        buf[176..180].copy_from_slice(&dt.to_le_bytes());
        buf[180..188].copy_from_slice(&delay.to_le_bytes());
        buf
    }

    #[test]
    fn decodes_all_fields() {
        let buf = descriptor(0.5, -0.125, 25.0, 12, 2.0e-9, 1.5e-6);
        let pre = Preamble::decode(&buf).unwrap();
        assert_eq!(pre.vdiv, 0.5);
        assert_eq!(pre.voffset, -0.125);
        assert_eq!(pre.code_per_div, 25.0);
        assert_eq!(pre.adc_bits, 12);
        assert_eq!(pre.dt, 2.0e-9);
        assert_eq!(pre.delay, 1.5e-6);
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut buf = descriptor(1.0, 0.0, 30.0, 8, 1.0e-6, 0.0);
        buf.extend_from_slice(&[0xee; 64]);
        let pre = Preamble::decode(&buf).unwrap();
        assert_eq!(pre.vdiv, 1.0);
        assert_eq!(pre.adc_bits, 8);
    }

    #[test]
    fn short_payload_is_truncated() {
        let err = Preamble::decode(&[0u8; 187]).unwrap_err();
        assert!(matches!(err, Error::TruncatedPreamble { len: 187 }));

        let err = Preamble::decode(&[]).unwrap_err();
        assert!(matches!(err, Error::TruncatedPreamble { len: 0 }));
    }

    #[test]
    fn exactly_188_bytes_suffices() {
        let buf = descriptor(2.0, 0.25, 25.0, 12, 5.0e-10, -2.0e-3);
        assert_eq!(buf.len(), 188);
        let pre = Preamble::decode(&buf).unwrap();
        assert_eq!(pre.delay, -2.0e-3);
    }
}
