//! # h3-framing - HTTP/3 frame codec
//!
//! Converts the byte stream of a QUIC stream into typed HTTP/3 frames and
//! back. The codec sits between the QUIC stream and the application / QPACK
//! layers and owns nothing but per-stream parsing state.
//!
//! ## Features
//!
//! - **Resumable decoding**: input may arrive in arbitrary pieces, down to one
//!   byte per call; a frame is produced on the call that completes it
//! - **Streaming DATA**: large DATA payloads are forwarded as they arrive
//!   instead of being buffered whole
//! - **Reserved types**: HTTP/2 frame types are rejected with
//!   `H3_FRAME_UNEXPECTED` on both the receive and the send path
//! - **Pluggable header compression**: HEADERS and PUSH_PROMISE go through
//!   the [`HeaderCompressor`] / [`HeaderDecompressor`] traits
//!
//! ## Example Usage
//!
//! ```rust
//! use bytes::BytesMut;
//! use h3_framing::{FieldSection, Frame, FrameDecoder, FrameEncoder};
//!
//! let mut fields = FieldSection::new();
//! fields.push(":method", "GET");
//! fields.push(":path", "/");
//!
//! let mut wire = BytesMut::new();
//! FrameEncoder::default()
//!     .encode(Frame::Headers { fields: fields.clone() }, &mut wire)
//!     .unwrap();
//!
//! let mut decoder = FrameDecoder::default();
//! let (first, rest) = wire.split_at(3);
//! assert!(decoder.decode(first).unwrap().is_none());
//! assert_eq!(decoder.decode(rest).unwrap(), Some(Frame::Headers { fields }));
//! ```

pub mod config;
pub mod error;
pub mod protocol;
pub mod transport;

// Re-export main types for convenience
pub use config::{CodecConfig, CodecConfigBuilder};
pub use error::{H3Error, H3ErrorCode, H3Result, QpackError, VarIntError};
pub use protocol::{
    DecoderStats, FieldSection, Frame, FrameDecoder, FrameEncoder, FrameType, HeaderCompressor,
    HeaderDecompressor, HeaderField, LiteralQpack, SettingId, Settings,
};
pub use transport::{ConnectionHandle, StreamCodec};
