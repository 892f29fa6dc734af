//! PSG9080 line-protocol encoder/decoder.
//!
//! The PSG9080 speaks an ASCII line protocol over its USB serial port at
//! 115200 baud, 8N1. Commands begin with `:` and end with CRLF. The
//! opcode is `w<NN>` for writes and `r<NN>` for queries, where `NN` is a
//! two-digit decimal function code; data fields follow `=`, separated by
//! commas, with a trailing `.` before the terminator.
//!
//! # Command format
//!
//! ```text
//! :<opcode>=<field>[,<field>...].<CR><LF>
//! ```
//!
//! # Response format
//!
//! Query responses echo an `r<NN>` opcode:
//!
//! ```text
//! :r<NN>=<payload>.<CR><LF>
//! ```
//!
//! The payload is comma-separated numeric fields with the same trailing
//! `.`. Write commands produce no response the driver waits for.

use bytes::{BufMut, BytesMut};

/// Line terminator for commands and responses.
pub const TERMINATOR: &[u8] = b"\r\n";

/// Result of attempting to decode a response line from a byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// A complete, well-formed response was decoded.
    Response {
        /// Response opcode (e.g. `"r13"`).
        opcode: String,
        /// Raw payload between `=` and the CRLF, trailing `.` included.
        payload: String,
        /// Number of bytes consumed from the input buffer.
        consumed: usize,
    },

    /// A complete line arrived but did not match the response grammar.
    ///
    /// The `usize` is the number of bytes consumed (up to and including
    /// the newline). The caller should surface the raw bytes via
    /// [`Error::MalformedResponse`](benchlib_core::Error::MalformedResponse).
    Malformed(usize),

    /// The buffer does not yet contain a complete line. More data is needed.
    Incomplete,
}

/// Encode a command into raw bytes ready for transmission.
///
/// Joins the fields with commas and frames them as
/// `:<opcode>=<fields>.<CR><LF>`.
///
/// # Example
///
/// ```
/// use benchlib_psg9080::protocol::encode_command;
///
/// let cmd = encode_command("w13", &["25786", "0"]);
/// assert_eq!(cmd, b":w13=25786,0.\r\n");
///
/// let cmd = encode_command("r13", &["0"]);
/// assert_eq!(cmd, b":r13=0.\r\n");
/// ```
pub fn encode_command(opcode: &str, fields: &[&str]) -> Vec<u8> {
    let fields_len: usize = fields.iter().map(|f| f.len() + 1).sum();
    let mut buf = BytesMut::with_capacity(opcode.len() + fields_len + 5);
    buf.put_u8(b':');
    buf.put_slice(opcode.as_bytes());
    buf.put_u8(b'=');
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            buf.put_u8(b',');
        }
        buf.put_slice(field.as_bytes());
    }
    buf.put_u8(b'.');
    buf.put_slice(TERMINATOR);
    buf.to_vec()
}

/// Attempt to decode one response line from a byte buffer.
///
/// Scans `buf` for a line feed. Returns [`DecodeResult::Incomplete`] if
/// none is present yet. A complete line is matched against the grammar
/// `:r<NN>=<payload>\r\n`; anything else (wrong prefix, a `w` opcode
/// echoed back, missing carriage return) is [`DecodeResult::Malformed`].
/// The terminator placement is checked exactly so a truncated payload
/// glued to the next line is never silently accepted.
///
/// # Example
///
/// ```
/// use benchlib_psg9080::protocol::{decode_response, DecodeResult};
///
/// let buf = b":r13=25786,0.\r\n";
/// match decode_response(buf) {
///     DecodeResult::Response { opcode, payload, consumed } => {
///         assert_eq!(opcode, "r13");
///         assert_eq!(payload, "25786,0.");
///         assert_eq!(consumed, 15);
///     }
///     _ => panic!("expected Response"),
/// }
/// ```
pub fn decode_response(buf: &[u8]) -> DecodeResult {
    let lf_pos = match buf.iter().position(|&b| b == b'\n') {
        Some(pos) => pos,
        None => return DecodeResult::Incomplete,
    };
    let consumed = lf_pos + 1;
    let line = &buf[..consumed];

    // Minimum well-formed line: ":rNN=\r\n" is 7 bytes.
    if line.len() < 7
        || line[0] != b':'
        || line[1] != b'r'
        || !line[2].is_ascii_digit()
        || !line[3].is_ascii_digit()
        || line[4] != b'='
        || &line[line.len() - 2..] != TERMINATOR
    {
        return DecodeResult::Malformed(consumed);
    }

    let opcode = match std::str::from_utf8(&line[1..4]) {
        Ok(s) => s.to_string(),
        Err(_) => return DecodeResult::Malformed(consumed),
    };
    let payload = match std::str::from_utf8(&line[5..line.len() - 2]) {
        Ok(s) => s.to_string(),
        Err(_) => return DecodeResult::Malformed(consumed),
    };

    DecodeResult::Response {
        opcode,
        payload,
        consumed,
    }
}

/// Split a response payload into its comma-separated field strings.
///
/// Strips the trailing `.` terminator first, matching the instrument's
/// payload framing. Numeric interpretation of each field is left to the
/// caller (see [`crate::units`]).
///
/// # Example
///
/// ```
/// use benchlib_psg9080::protocol::split_fields;
///
/// assert_eq!(split_fields("25786,0."), vec!["25786", "0"]);
/// assert_eq!(split_fields("1000."), vec!["1000"]);
/// ```
pub fn split_fields(payload: &str) -> Vec<&str> {
    let trimmed = payload.strip_suffix('.').unwrap_or(payload);
    trimmed.split(',').collect()
}
