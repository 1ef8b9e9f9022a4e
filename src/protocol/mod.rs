//! HTTP/3 framing: varints, the frame model and the frame encoder/decoder.

pub mod decoder;
pub mod encoder;
pub mod frame;
pub mod qpack;
pub mod varint;

pub use decoder::{DecoderStats, FrameDecoder};
pub use encoder::FrameEncoder;
pub use frame::{FieldSection, Frame, FrameType, HeaderField, SettingId, Settings};
pub use qpack::{HeaderCompressor, HeaderDecompressor, LiteralQpack};
