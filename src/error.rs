//! Error types and handling for the HTTP/3 frame codec.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type alias for codec operations.
pub type H3Result<T> = Result<T, H3Error>;

/// HTTP/3 error codes (RFC 9114 §8.1, RFC 9204 §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u64)]
pub enum H3ErrorCode {
    /// No error, used when closing without an error to signal
    NoError = 0x0100,
    /// Peer violated the protocol in a way not covered by a more specific code
    GeneralProtocolError = 0x0101,
    /// Internal error in the HTTP stack
    InternalError = 0x0102,
    /// Peer created a stream that will not be accepted
    StreamCreationError = 0x0103,
    /// A stream required by the connection was closed or reset
    ClosedCriticalStream = 0x0104,
    /// A frame was received that is not permitted in the current state or on the current stream
    FrameUnexpected = 0x0105,
    /// A frame fails to satisfy layout requirements or has an invalid size
    FrameError = 0x0106,
    /// Peer is exhibiting behavior that might be generating excessive load
    ExcessiveLoad = 0x0107,
    /// A stream or push ID was used incorrectly
    IdError = 0x0108,
    /// An error was detected in the payload of a SETTINGS frame
    SettingsError = 0x0109,
    /// No SETTINGS frame was received at the beginning of the control stream
    MissingSettings = 0x010a,
    /// A server rejected a request without performing any application processing
    RequestRejected = 0x010b,
    /// The request or its response is cancelled
    RequestCancelled = 0x010c,
    /// The client's stream terminated without containing a fully formed request
    RequestIncomplete = 0x010d,
    /// An HTTP message was malformed and cannot be processed
    MessageError = 0x010e,
    /// The TCP connection established in response to a CONNECT request was reset
    ConnectError = 0x010f,
    /// The requested operation cannot be served over HTTP/3
    VersionFallback = 0x0110,
    /// The decoder failed to interpret an encoded field section
    QpackDecompressionFailed = 0x0200,
    /// The decoder failed to interpret an encoder instruction
    QpackEncoderStreamError = 0x0201,
    /// The encoder failed to interpret a decoder instruction
    QpackDecoderStreamError = 0x0202,
}

impl H3ErrorCode {
    /// Wire value of this error code.
    pub const fn code(self) -> u64 {
        self as u64
    }

    /// Parse a wire error code.
    pub fn from_code(code: u64) -> Option<Self> {
        let code = match code {
            0x0100 => H3ErrorCode::NoError,
            0x0101 => H3ErrorCode::GeneralProtocolError,
            0x0102 => H3ErrorCode::InternalError,
            0x0103 => H3ErrorCode::StreamCreationError,
            0x0104 => H3ErrorCode::ClosedCriticalStream,
            0x0105 => H3ErrorCode::FrameUnexpected,
            0x0106 => H3ErrorCode::FrameError,
            0x0107 => H3ErrorCode::ExcessiveLoad,
            0x0108 => H3ErrorCode::IdError,
            0x0109 => H3ErrorCode::SettingsError,
            0x010a => H3ErrorCode::MissingSettings,
            0x010b => H3ErrorCode::RequestRejected,
            0x010c => H3ErrorCode::RequestCancelled,
            0x010d => H3ErrorCode::RequestIncomplete,
            0x010e => H3ErrorCode::MessageError,
            0x010f => H3ErrorCode::ConnectError,
            0x0110 => H3ErrorCode::VersionFallback,
            0x0200 => H3ErrorCode::QpackDecompressionFailed,
            0x0201 => H3ErrorCode::QpackEncoderStreamError,
            0x0202 => H3ErrorCode::QpackDecoderStreamError,
            _ => return None,
        };
        Some(code)
    }

    /// Registry name, e.g. `H3_FRAME_UNEXPECTED`.
    pub const fn as_str(self) -> &'static str {
        match self {
            H3ErrorCode::NoError => "H3_NO_ERROR",
            H3ErrorCode::GeneralProtocolError => "H3_GENERAL_PROTOCOL_ERROR",
            H3ErrorCode::InternalError => "H3_INTERNAL_ERROR",
            H3ErrorCode::StreamCreationError => "H3_STREAM_CREATION_ERROR",
            H3ErrorCode::ClosedCriticalStream => "H3_CLOSED_CRITICAL_STREAM",
            H3ErrorCode::FrameUnexpected => "H3_FRAME_UNEXPECTED",
            H3ErrorCode::FrameError => "H3_FRAME_ERROR",
            H3ErrorCode::ExcessiveLoad => "H3_EXCESSIVE_LOAD",
            H3ErrorCode::IdError => "H3_ID_ERROR",
            H3ErrorCode::SettingsError => "H3_SETTINGS_ERROR",
            H3ErrorCode::MissingSettings => "H3_MISSING_SETTINGS",
            H3ErrorCode::RequestRejected => "H3_REQUEST_REJECTED",
            H3ErrorCode::RequestCancelled => "H3_REQUEST_CANCELLED",
            H3ErrorCode::RequestIncomplete => "H3_REQUEST_INCOMPLETE",
            H3ErrorCode::MessageError => "H3_MESSAGE_ERROR",
            H3ErrorCode::ConnectError => "H3_CONNECT_ERROR",
            H3ErrorCode::VersionFallback => "H3_VERSION_FALLBACK",
            H3ErrorCode::QpackDecompressionFailed => "QPACK_DECOMPRESSION_FAILED",
            H3ErrorCode::QpackEncoderStreamError => "QPACK_ENCODER_STREAM_ERROR",
            H3ErrorCode::QpackDecoderStreamError => "QPACK_DECODER_STREAM_ERROR",
        }
    }
}

impl fmt::Display for H3ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:x})", self.as_str(), self.code())
    }
}

/// Main error type for codec operations.
#[derive(Debug, thiserror::Error)]
pub enum H3Error {
    /// Fatal protocol error; the connection must be closed with `code`
    #[error("connection error {code}: {reason}")]
    Connection { code: H3ErrorCode, reason: String },

    /// Variable-length integer errors
    #[error("varint error: {0}")]
    VarInt(#[from] VarIntError),

    /// Header compression errors
    #[error("header compression error: {0}")]
    Qpack(#[from] QpackError),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),
}

/// Variable-length integer errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VarIntError {
    /// Not enough bytes buffered to finish the integer; retry with more input
    #[error("insufficient data: need {needed} bytes")]
    InsufficientData { needed: usize },

    #[error("value {0} exceeds the varint range")]
    ValueOutOfRange(u64),
}

/// Errors reported by a header compression collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QpackError {
    #[error("truncated field section")]
    Truncated,

    #[error("integer overflow in prefixed integer")]
    IntegerOverflow,

    #[error("unsupported field line representation: 0x{0:02x}")]
    UnsupportedRepresentation(u8),

    #[error("field section references dynamic table (required insert count {0})")]
    DynamicTableReference(u64),
}

impl H3Error {
    /// Create a fatal connection error
    pub fn connection<T: fmt::Display>(code: H3ErrorCode, reason: T) -> Self {
        H3Error::Connection {
            code,
            reason: reason.to_string(),
        }
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        H3Error::Config(msg.to_string())
    }

    /// Error code to close the connection with, if this error is fatal.
    pub fn code(&self) -> Option<H3ErrorCode> {
        match self {
            H3Error::Connection { code, .. } => Some(*code),
            H3Error::VarInt(VarIntError::ValueOutOfRange(_)) => Some(H3ErrorCode::InternalError),
            H3Error::Qpack(_) => Some(H3ErrorCode::QpackDecompressionFailed),
            H3Error::VarInt(VarIntError::InsufficientData { .. }) | H3Error::Config(_) => None,
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, H3Error::VarInt(VarIntError::InsufficientData { .. }))
    }

    /// Check if this error should trigger a connection close
    pub fn should_close_connection(&self) -> bool {
        self.code().is_some()
    }
}
