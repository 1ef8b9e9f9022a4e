//! HTTP/3 frame encoder.

use crate::error::{H3Error, H3ErrorCode, H3Result, VarIntError};
use crate::protocol::frame::{
    is_reserved_http2_frame_type, is_reserved_http2_setting, FieldSection, Frame, FrameType,
    Settings,
};
use crate::protocol::qpack::{HeaderCompressor, LiteralQpack};
use crate::protocol::varint::{encode_varint, varint_size, MAX_VARINT};
use bytes::{BufMut, Bytes, BytesMut};
use tracing::{trace, warn};

/// Serializes [`Frame`] values.
///
/// The encoder keeps no per-frame state; the only state it carries is the
/// header compressor's. Frames are taken by value: whatever happens, the
/// frame (and the buffers it owns) is dropped before `encode` returns.
#[derive(Debug)]
pub struct FrameEncoder<C> {
    compressor: C,
}

impl Default for FrameEncoder<LiteralQpack> {
    fn default() -> Self {
        Self::new(LiteralQpack)
    }
}

impl<C: HeaderCompressor> FrameEncoder<C> {
    pub fn new(compressor: C) -> Self {
        Self { compressor }
    }

    pub fn compressor_mut(&mut self) -> &mut C {
        &mut self.compressor
    }

    /// Append the wire form of `frame` to `dst`.
    ///
    /// On error nothing has been written to `dst`.
    pub fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> H3Result<()> {
        let frame_type = frame.frame_type();
        check_frame_type(&frame, frame_type)?;

        let payload = self.encode_payload(frame)?;
        let length = payload.len() as u64;

        dst.reserve(varint_size(frame_type) + varint_size(length) + payload.len());
        encode_varint(frame_type, dst)?;
        encode_varint(length, dst)?;
        dst.put_slice(&payload);

        trace!(frame_type, length, "encoded frame");
        Ok(())
    }

    /// Encode `frame` into a fresh buffer.
    pub fn encode_to_bytes(&mut self, frame: Frame) -> H3Result<Bytes> {
        let mut buf = BytesMut::new();
        self.encode(frame, &mut buf)?;
        Ok(buf.freeze())
    }

    fn encode_payload(&mut self, frame: Frame) -> H3Result<Bytes> {
        let payload = match frame {
            Frame::Data { payload } | Frame::Unknown { payload, .. } => payload,
            Frame::CancelPush { push_id } | Frame::MaxPushId { push_id } => varint_payload(push_id)?,
            Frame::GoAway { id } => varint_payload(id)?,
            Frame::Settings(settings) => settings_payload(&settings)?,
            Frame::Headers { fields } => {
                let mut buf = BytesMut::new();
                self.compress(&fields, &mut buf)?;
                buf.freeze()
            }
            Frame::PushPromise { push_id, fields } => {
                let mut buf = BytesMut::new();
                encode_varint(push_id, &mut buf)?;
                self.compress(&fields, &mut buf)?;
                buf.freeze()
            }
        };
        Ok(payload)
    }

    fn compress(&mut self, fields: &FieldSection, dst: &mut BytesMut) -> H3Result<()> {
        self.compressor.compress(fields, dst).map_err(|err| {
            H3Error::connection(
                H3ErrorCode::InternalError,
                format!("header compression failed: {}", err),
            )
        })
    }
}

/// Refuse frame types that must never be sent.
fn check_frame_type(frame: &Frame, frame_type: u64) -> H3Result<()> {
    if is_reserved_http2_frame_type(frame_type) {
        warn!(frame_type, "refusing to encode reserved frame type");
        return Err(H3Error::connection(
            H3ErrorCode::FrameUnexpected,
            format!("reserved frame type 0x{:x}", frame_type),
        ));
    }
    if frame_type > MAX_VARINT {
        return Err(VarIntError::ValueOutOfRange(frame_type).into());
    }
    if matches!(frame, Frame::Unknown { .. }) && FrameType::from_code(frame_type).is_some() {
        return Err(H3Error::connection(
            H3ErrorCode::InternalError,
            format!("frame type 0x{:x} is assigned; use its typed variant", frame_type),
        ));
    }
    Ok(())
}

fn varint_payload(value: u64) -> H3Result<Bytes> {
    let mut buf = BytesMut::with_capacity(8);
    encode_varint(value, &mut buf)?;
    Ok(buf.freeze())
}

fn settings_payload(settings: &Settings) -> H3Result<Bytes> {
    let mut buf = BytesMut::new();
    for (id, value) in settings.iter() {
        if is_reserved_http2_setting(id) {
            return Err(H3Error::connection(
                H3ErrorCode::SettingsError,
                format!("reserved setting identifier 0x{:x}", id),
            ));
        }
        encode_varint(id, &mut buf)?;
        encode_varint(value, &mut buf)?;
    }
    Ok(buf.freeze())
}
