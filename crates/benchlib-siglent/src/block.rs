//! IEEE-488.2 definite-length binary block extraction.
//!
//! Siglent scopes return waveform data and preambles as SCPI binary
//! blocks: `#<n><len><payload>`, where `<n>` is one ASCII digit giving
//! the number of length digits and `<len>` is the decimal payload byte
//! count. Some transports prepend echoed header text before the `#`,
//! and the instrument appends a newline after the payload; both are
//! ignored.

use benchlib_core::error::{Error, Result};

/// Extract the payload of the first definite-length block in `raw`.
///
/// Scans for the first `#` byte, tolerating any leading noise. Fails
/// with [`Error::MissingBlockHeader`] when no `#` is present, and with
/// [`Error::MalformedResponse`] when the header digits are invalid or
/// the buffer ends before the full payload. Bytes after the payload
/// (terminators, status trailers) are not part of the block and are
/// simply ignored.
///
/// # Example
///
/// ```
/// use benchlib_siglent::block::read_block;
///
/// let raw = b"junk#18AAAAAAAAtrailing";
/// assert_eq!(read_block(raw).unwrap(), b"AAAAAAAA");
/// ```
pub fn read_block(raw: &[u8]) -> Result<&[u8]> {
    let hash = raw
        .iter()
        .position(|&b| b == b'#')
        .ok_or(Error::MissingBlockHeader)?;

    let header = &raw[hash + 1..];
    let ndigits = match header.first() {
        Some(d @ b'1'..=b'9') => (d - b'0') as usize,
        _ => {
            return Err(Error::MalformedResponse {
                raw: raw.to_vec(),
            })
        }
    };

    let digits = header
        .get(1..1 + ndigits)
        .ok_or_else(|| Error::MalformedResponse { raw: raw.to_vec() })?;
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(Error::MalformedResponse { raw: raw.to_vec() });
    }
    // At most 9 digits, so the decimal value always fits a usize.
    let len = digits
        .iter()
        .fold(0usize, |acc, &d| acc * 10 + (d - b'0') as usize);

    let start = hash + 2 + ndigits;
    raw.get(start..start + len)
        .ok_or_else(|| Error::MalformedResponse { raw: raw.to_vec() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_with_leading_noise_and_trailer() {
        // Header "#1" then digit "8" then exactly 8 payload bytes.
        let mut raw = b"junk#18".to_vec();
        raw.extend_from_slice(&[b'A'; 8]);
        raw.extend_from_slice(b"trailing");
        assert_eq!(read_block(&raw).unwrap(), &[b'A'; 8]);
    }

    #[test]
    fn block_at_start_of_buffer() {
        assert_eq!(read_block(b"#3005HELLO\n").unwrap(), b"HELLO");
    }

    #[test]
    fn block_with_nine_digit_length() {
        let mut raw = b"#9000000016".to_vec();
        raw.extend_from_slice(&[0x42; 16]);
        raw.push(b'\n');
        assert_eq!(read_block(&raw).unwrap(), &[0x42; 16]);
    }

    #[test]
    fn multi_digit_length_decodes_decimally() {
        let mut raw = b"#3128".to_vec();
        raw.extend_from_slice(&[0x5a; 128]);
        let payload = read_block(&raw).unwrap();
        assert_eq!(payload.len(), 128);
        assert!(payload.iter().all(|&b| b == 0x5a));
    }

    #[test]
    fn zero_length_block() {
        assert_eq!(read_block(b"#10\n").unwrap(), b"");
    }

    #[test]
    fn binary_payload_preserved_verbatim() {
        // Payload bytes that look like header characters must pass through.
        let raw = b"#14#2\xff\n\n";
        assert_eq!(read_block(raw).unwrap(), b"#2\xff\n");
    }

    #[test]
    fn missing_hash_is_missing_header() {
        assert!(matches!(
            read_block(b"no block here"),
            Err(Error::MissingBlockHeader)
        ));
        assert!(matches!(read_block(b""), Err(Error::MissingBlockHeader)));
    }

    #[test]
    fn non_digit_count_is_malformed() {
        assert!(matches!(
            read_block(b"#x8AAAAAAAA"),
            Err(Error::MalformedResponse { .. })
        ));
        // "#0" is not a valid digit count.
        assert!(matches!(
            read_block(b"#08AAAAAAAA"),
            Err(Error::MalformedResponse { .. })
        ));
    }

    #[test]
    fn truncated_length_digits_is_malformed() {
        assert!(matches!(
            read_block(b"#3 12"),
            Err(Error::MalformedResponse { .. })
        ));
        assert!(matches!(
            read_block(b"#3"),
            Err(Error::MalformedResponse { .. })
        ));
    }

    #[test]
    fn truncated_payload_is_malformed() {
        // Header promises 8 bytes; only 4 follow.
        assert!(matches!(
            read_block(b"#18AAAA"),
            Err(Error::MalformedResponse { .. })
        ));
    }
}
