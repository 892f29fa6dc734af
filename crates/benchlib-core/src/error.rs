//! Error types for benchlib.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer, line-grammar, binary
//! framing, and numeric codec errors are all captured here.

/// The error type for all benchlib operations.
///
/// Variants cover the failure modes encountered when talking to bench
/// instruments over serial or socket SCPI links: lifecycle misuse, read
/// timeouts, response grammar violations, binary framing violations, and
/// numeric encoding domain errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port, TCP socket).
    #[error("transport error: {0}")]
    Transport(String),

    /// The transport was used before `open()` or after `close()`.
    #[error("transport not open")]
    NotOpen,

    /// The instrument returned nothing within the read timeout.
    ///
    /// This typically indicates the instrument is powered off, the baud
    /// rate is wrong, or the command was not recognised at all.
    #[error("no response from instrument")]
    NoResponse,

    /// The response did not match the expected grammar.
    ///
    /// Carries the raw bytes as received so the failure can be diagnosed
    /// (wrong terminator, truncated payload, echo noise, etc.).
    #[error("malformed response: {raw:?}")]
    MalformedResponse {
        /// The raw bytes that failed to parse.
        raw: Vec<u8>,
    },

    /// No `#` definite-length block header was found in a binary dump.
    #[error("no definite-length block header in response")]
    MissingBlockHeader,

    /// A waveform preamble block was shorter than its fixed layout requires.
    #[error("preamble truncated: got {len} bytes, need at least 188")]
    TruncatedPreamble {
        /// Actual payload length in bytes.
        len: usize,
    },

    /// A frequency could not be represented in any of the instrument's
    /// fixed-point unit encodings (negative, non-finite, or too large).
    #[error("frequency not encodable: {0} Hz")]
    FrequencyOutOfRange(f64),

    /// The instrument reported a frequency unit code outside the
    /// documented table.
    #[error("unknown frequency unit code {0}")]
    UnknownUnit(u8),

    /// An invalid parameter was passed to an instrument command.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
