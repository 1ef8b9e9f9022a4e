//! Incremental HTTP/3 frame decoder.
//!
//! The decoder owns an accumulation buffer and a state tag, so it can be fed
//! whatever the transport delivers, down to one byte per call. A frame is
//! produced on exactly the call that supplies its last required byte.

use crate::config::CodecConfig;
use crate::error::{H3Error, H3ErrorCode, H3Result};
use crate::protocol::frame::{
    is_grease_frame_type, is_reserved_http2_frame_type, is_reserved_http2_setting, FieldSection,
    Frame, FrameType, Settings,
};
use crate::protocol::qpack::{HeaderDecompressor, LiteralQpack};
use crate::protocol::varint::{decode_varint, read_varint};
use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace, warn};

/// Decoder state, persisted between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// Waiting for the frame type varint
    AwaitingType,
    /// Waiting for the length varint of a frame of `frame_type`
    AwaitingLength { frame_type: u64 },
    /// Buffering a payload that is parsed only once complete
    AwaitingPayload { frame_type: u64, length: usize },
    /// Forwarding a large DATA payload as it arrives
    StreamingData { remaining: u64 },
    /// Discarding an oversized unknown frame
    Skipping { frame_type: u64, remaining: u64 },
    /// A fatal error was raised; the connection is going away
    Failed { code: H3ErrorCode },
}

/// Decoder statistics for monitoring and debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Frames (or DATA pieces) emitted
    pub frames_decoded: u64,
    /// Bytes fed into the decoder
    pub bytes_processed: u64,
    /// Unknown frames dropped for exceeding `max_frame_payload`
    pub frames_skipped: u64,
    /// Fatal errors raised
    pub errors: u64,
}

/// Resumable HTTP/3 frame decoder for one stream.
#[derive(Debug)]
pub struct FrameDecoder<D> {
    decompressor: D,
    buffer: BytesMut,
    state: DecoderState,
    config: CodecConfig,
    stats: DecoderStats,
}

impl Default for FrameDecoder<LiteralQpack> {
    fn default() -> Self {
        Self::new(LiteralQpack)
    }
}

impl<D: HeaderDecompressor> FrameDecoder<D> {
    /// Create a decoder with default limits.
    pub fn new(decompressor: D) -> Self {
        Self::with_config(decompressor, CodecConfig::default())
    }

    /// Create a decoder with custom limits.
    pub fn with_config(decompressor: D, config: CodecConfig) -> Self {
        Self {
            decompressor,
            buffer: BytesMut::new(),
            state: DecoderState::AwaitingType,
            config,
            stats: DecoderStats::default(),
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = DecoderStats::default();
    }

    pub fn decompressor_mut(&mut self) -> &mut D {
        &mut self.decompressor
    }

    /// Bytes received but not yet turned into frames.
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// True between frames with nothing buffered.
    pub fn is_idle(&self) -> bool {
        self.state == DecoderState::AwaitingType && self.buffer.is_empty()
    }

    /// Bytes still owed by a DATA frame that is being streamed.
    pub fn data_remaining(&self) -> Option<u64> {
        match self.state {
            DecoderState::StreamingData { remaining } => Some(remaining),
            _ => None,
        }
    }

    /// Feed `data` and try to produce the next frame.
    ///
    /// Returns `Ok(None)` when more input is needed. Input beyond the frame
    /// that was returned stays buffered; call again with an empty slice (or
    /// use [`decode_all`](Self::decode_all)) to drain it.
    pub fn decode(&mut self, data: &[u8]) -> H3Result<Option<Frame>> {
        if let DecoderState::Failed { code } = self.state {
            return Err(H3Error::connection(code, "decoder already failed"));
        }

        self.buffer.extend_from_slice(data);
        self.stats.bytes_processed += data.len() as u64;

        match self.step() {
            Ok(Some(frame)) => {
                self.stats.frames_decoded += 1;
                trace!(frame_type = frame.frame_type(), "decoded frame");
                Ok(Some(frame))
            }
            Ok(None) => Ok(None),
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Feed `data`, appending every frame that is now complete to `out`.
    ///
    /// Frames completed before a fatal error stay in `out`.
    pub fn decode_all(&mut self, data: &[u8], out: &mut Vec<Frame>) -> H3Result<()> {
        let mut next = self.decode(data)?;
        while let Some(frame) = next {
            out.push(frame);
            next = self.decode(&[])?;
        }
        Ok(())
    }

    /// Signal the end of the stream.
    ///
    /// Ending a stream in the middle of a frame is `H3_FRAME_ERROR`.
    pub fn finish(&mut self) -> H3Result<()> {
        if let DecoderState::Failed { code } = self.state {
            return Err(H3Error::connection(code, "decoder already failed"));
        }
        if self.is_idle() {
            return Ok(());
        }
        let err = H3Error::connection(
            H3ErrorCode::FrameError,
            format!("stream ended inside a frame ({} bytes buffered)", self.buffer.len()),
        );
        Err(self.fail(err))
    }

    fn fail(&mut self, err: H3Error) -> H3Error {
        let code = err.code().unwrap_or(H3ErrorCode::InternalError);
        warn!(%code, error = %err, "frame decoding failed");
        self.stats.errors += 1;
        self.state = DecoderState::Failed { code };
        self.buffer.clear();
        err
    }

    fn step(&mut self) -> H3Result<Option<Frame>> {
        loop {
            match self.state {
                DecoderState::AwaitingType => {
                    let Some(frame_type) = self.try_read_varint() else {
                        return Ok(None);
                    };
                    if is_reserved_http2_frame_type(frame_type) {
                        return Err(H3Error::connection(
                            H3ErrorCode::FrameUnexpected,
                            format!("reserved frame type 0x{:x}", frame_type),
                        ));
                    }
                    self.state = DecoderState::AwaitingLength { frame_type };
                }

                DecoderState::AwaitingLength { frame_type } => {
                    let Some(length) = self.try_read_varint() else {
                        return Ok(None);
                    };
                    trace!(frame_type, length, "frame header");
                    self.state = self.payload_state(frame_type, length)?;
                }

                DecoderState::AwaitingPayload { frame_type, length } => {
                    if self.buffer.len() < length {
                        return Ok(None);
                    }
                    let payload = self.buffer.split_to(length).freeze();
                    self.state = DecoderState::AwaitingType;
                    return self.parse_payload(frame_type, payload).map(Some);
                }

                DecoderState::StreamingData { remaining } => {
                    if self.buffer.is_empty() {
                        return Ok(None);
                    }
                    let take = remaining.min(self.buffer.len() as u64);
                    let payload = self.buffer.split_to(take as usize).freeze();
                    let remaining = remaining - take;
                    self.state = if remaining == 0 {
                        DecoderState::AwaitingType
                    } else {
                        DecoderState::StreamingData { remaining }
                    };
                    return Ok(Some(Frame::Data { payload }));
                }

                DecoderState::Skipping {
                    frame_type,
                    remaining,
                } => {
                    let skip = remaining.min(self.buffer.len() as u64);
                    self.buffer.advance(skip as usize);
                    let remaining = remaining - skip;
                    if remaining > 0 {
                        self.state = DecoderState::Skipping {
                            frame_type,
                            remaining,
                        };
                        return Ok(None);
                    }
                    self.stats.frames_skipped += 1;
                    self.state = DecoderState::AwaitingType;
                }

                DecoderState::Failed { code } => {
                    return Err(H3Error::connection(code, "decoder already failed"));
                }
            }
        }
    }

    /// Pop a complete varint off the buffer, or leave it untouched.
    fn try_read_varint(&mut self) -> Option<u64> {
        let (value, used) = decode_varint(&self.buffer).ok()?;
        self.buffer.advance(used);
        Some(value)
    }

    /// Choose how the payload of a frame is consumed once its header is known.
    fn payload_state(&self, frame_type: u64, length: u64) -> H3Result<DecoderState> {
        let kind = FrameType::from_code(frame_type);

        if kind == Some(FrameType::Data) && length > self.config.data_chunk_threshold as u64 {
            debug!(length, "streaming DATA payload");
            return Ok(DecoderState::StreamingData { remaining: length });
        }

        if length > self.config.max_frame_payload {
            if kind.is_none() {
                debug!(frame_type, length, "skipping oversized unknown frame");
                return Ok(DecoderState::Skipping {
                    frame_type,
                    remaining: length,
                });
            }
            return Err(H3Error::connection(
                H3ErrorCode::ExcessiveLoad,
                format!(
                    "frame type 0x{:x} payload of {} bytes exceeds limit of {}",
                    frame_type, length, self.config.max_frame_payload
                ),
            ));
        }

        let length = usize::try_from(length).map_err(|_| {
            H3Error::connection(H3ErrorCode::ExcessiveLoad, "payload length exceeds address space")
        })?;
        Ok(DecoderState::AwaitingPayload { frame_type, length })
    }

    /// Parse a fully buffered payload into its typed frame.
    fn parse_payload(&mut self, frame_type: u64, payload: Bytes) -> H3Result<Frame> {
        let frame = match FrameType::from_code(frame_type) {
            Some(FrameType::Data) => Frame::Data { payload },
            Some(FrameType::Headers) => Frame::Headers {
                fields: self.decompress(payload)?,
            },
            Some(FrameType::CancelPush) => Frame::CancelPush {
                push_id: single_varint(&payload, "CANCEL_PUSH")?,
            },
            Some(FrameType::Settings) => Frame::Settings(parse_settings(&payload)?),
            Some(FrameType::PushPromise) => {
                let mut cursor = &payload[..];
                let push_id = read_varint(&mut cursor).map_err(|_| {
                    H3Error::connection(H3ErrorCode::FrameError, "PUSH_PROMISE without push ID")
                })?;
                let consumed = payload.len() - cursor.len();
                Frame::PushPromise {
                    push_id,
                    fields: self.decompress(payload.slice(consumed..))?,
                }
            }
            Some(FrameType::GoAway) => Frame::GoAway {
                id: single_varint(&payload, "GOAWAY")?,
            },
            Some(FrameType::MaxPushId) => Frame::MaxPushId {
                push_id: single_varint(&payload, "MAX_PUSH_ID")?,
            },
            None => {
                trace!(
                    frame_type,
                    grease = is_grease_frame_type(frame_type),
                    "unknown frame"
                );
                Frame::Unknown {
                    frame_type,
                    payload,
                }
            }
        };
        Ok(frame)
    }

    fn decompress(&mut self, block: Bytes) -> H3Result<FieldSection> {
        let fields = self.decompressor.decompress(block).map_err(|err| {
            H3Error::connection(H3ErrorCode::QpackDecompressionFailed, err)
        })?;

        let size = fields.size();
        if size > self.config.max_field_section_size {
            return Err(H3Error::connection(
                H3ErrorCode::ExcessiveLoad,
                format!(
                    "field section of {} bytes exceeds limit of {}",
                    size, self.config.max_field_section_size
                ),
            ));
        }
        Ok(fields)
    }
}

/// Payload that must be exactly one varint (CANCEL_PUSH, GOAWAY, MAX_PUSH_ID).
fn single_varint(payload: &[u8], name: &str) -> H3Result<u64> {
    let (value, used) = decode_varint(payload).map_err(|_| {
        H3Error::connection(H3ErrorCode::FrameError, format!("truncated {} payload", name))
    })?;
    if used != payload.len() {
        return Err(H3Error::connection(
            H3ErrorCode::FrameError,
            format!("{} payload has {} trailing bytes", name, payload.len() - used),
        ));
    }
    Ok(value)
}

/// Parse SETTINGS identifier/value pairs.
///
/// A repeated identifier keeps its first position and takes the last value.
fn parse_settings(payload: &[u8]) -> H3Result<Settings> {
    let mut settings = Settings::new();
    let mut cursor = payload;

    while !cursor.is_empty() {
        let (id, value) = match (read_varint(&mut cursor), read_varint(&mut cursor)) {
            (Ok(id), Ok(value)) => (id, value),
            _ => {
                return Err(H3Error::connection(
                    H3ErrorCode::FrameError,
                    "SETTINGS payload does not split into identifier/value pairs",
                ))
            }
        };

        if is_reserved_http2_setting(id) {
            return Err(H3Error::connection(
                H3ErrorCode::SettingsError,
                format!("reserved setting identifier 0x{:x}", id),
            ));
        }
        if let Some(previous) = settings.insert(id, value) {
            debug!(id, previous, value, "duplicate setting, keeping last value");
        }
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QpackError;
    use crate::protocol::frame::{SettingId, SETTINGS_QPACK_BLOCKED_STREAMS};
    use crate::protocol::qpack::HeaderCompressor;
    use crate::protocol::varint::encode_varint;

    /// Assemble a raw frame from its parts.
    fn raw_frame(frame_type: u64, payload: &[u8]) -> BytesMut {
        let mut buf = BytesMut::new();
        encode_varint(frame_type, &mut buf).unwrap();
        encode_varint(payload.len() as u64, &mut buf).unwrap();
        buf.extend_from_slice(payload);
        buf
    }

    fn varints(values: &[u64]) -> BytesMut {
        let mut buf = BytesMut::new();
        for &value in values {
            encode_varint(value, &mut buf).unwrap();
        }
        buf
    }

    fn expect_code(result: H3Result<Option<Frame>>, code: H3ErrorCode) {
        match result {
            Err(err) => assert_eq!(err.code(), Some(code), "unexpected error {}", err),
            Ok(frame) => panic!("expected {}, got {:?}", code, frame),
        }
    }

    #[test]
    fn test_decoder_creation_and_config() {
        let decoder = FrameDecoder::default();
        assert_eq!(decoder.buffer_size(), 0);
        assert!(decoder.is_idle());
        assert_eq!(decoder.config(), &CodecConfig::default());

        let config = CodecConfig::builder().max_frame_payload(128).build().unwrap();
        let decoder = FrameDecoder::with_config(LiteralQpack, config);
        assert_eq!(decoder.config().max_frame_payload, 128);
    }

    #[test]
    fn test_incremental_frame_parsing() {
        let mut decoder = FrameDecoder::default();
        let encoded = raw_frame(0x0d, &varints(&[123]));

        let mid_point = encoded.len() / 2;
        assert!(decoder.decode(&encoded[..mid_point]).unwrap().is_none());
        assert!(!decoder.is_idle());

        let frame = decoder.decode(&encoded[mid_point..]).unwrap();
        assert_eq!(frame, Some(Frame::MaxPushId { push_id: 123 }));
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_partial_varint_parsing() {
        let mut decoder = FrameDecoder::default();
        // GOAWAY with a 4-byte id, delivered one byte at a time.
        let encoded = raw_frame(0x07, &varints(&[1_000_000]));
        for (i, byte) in encoded.iter().enumerate() {
            let result = decoder.decode(&[*byte]).unwrap();
            if i + 1 < encoded.len() {
                assert!(result.is_none(), "frame emitted early at byte {}", i);
            } else {
                assert_eq!(result, Some(Frame::GoAway { id: 1_000_000 }));
            }
        }
    }

    #[test]
    fn test_multiple_frames_parsing() {
        let mut decoder = FrameDecoder::default();
        let mut combined = BytesMut::new();
        combined.extend_from_slice(&raw_frame(0x0d, &varints(&[100])));
        combined.extend_from_slice(&raw_frame(0x03, &varints(&[200])));
        combined.extend_from_slice(&raw_frame(0x07, &varints(&[300])));

        let mut frames = Vec::new();
        decoder.decode_all(&combined, &mut frames).unwrap();
        assert_eq!(
            frames,
            vec![
                Frame::MaxPushId { push_id: 100 },
                Frame::CancelPush { push_id: 200 },
                Frame::GoAway { id: 300 },
            ]
        );
        assert_eq!(decoder.stats().frames_decoded, 3);
        assert_eq!(decoder.stats().bytes_processed, combined.len() as u64);
    }

    #[test]
    fn test_reserved_type_rejected_from_type_alone() {
        for reserved in [0x02, 0x06, 0x08, 0x09] {
            let mut decoder = FrameDecoder::default();
            expect_code(
                decoder.decode(&varints(&[reserved])),
                H3ErrorCode::FrameUnexpected,
            );
            assert_eq!(decoder.stats().errors, 1);
            assert_eq!(decoder.buffer_size(), 0);
        }
    }

    #[test]
    fn test_reserved_type_in_non_minimal_encoding() {
        let mut decoder = FrameDecoder::default();
        expect_code(decoder.decode(&[0x40, 0x06]), H3ErrorCode::FrameUnexpected);
    }

    #[test]
    fn test_decoder_poisoned_after_fatal_error() {
        let mut decoder = FrameDecoder::default();
        expect_code(decoder.decode(&[0x08]), H3ErrorCode::FrameUnexpected);

        let valid = raw_frame(0x0d, &varints(&[42]));
        expect_code(decoder.decode(&valid), H3ErrorCode::FrameUnexpected);
        expect_code(decoder.finish().map(|_| None), H3ErrorCode::FrameUnexpected);
    }

    #[test]
    fn test_frames_before_error_are_kept() {
        let mut decoder = FrameDecoder::default();
        let mut input = BytesMut::new();
        input.extend_from_slice(&raw_frame(0x07, &varints(&[4])));
        input.extend_from_slice(&[0x02, 0x00]);

        assert_eq!(
            decoder.decode(&input).unwrap(),
            Some(Frame::GoAway { id: 4 })
        );
        expect_code(decoder.decode(&[]), H3ErrorCode::FrameUnexpected);
    }

    #[test]
    fn test_decode_all_keeps_frames_before_error() {
        let mut decoder = FrameDecoder::default();
        let mut frames = Vec::new();

        let err = decoder
            .decode_all(&[0x07, 0x01, 0x04, 0x02, 0x00], &mut frames)
            .unwrap_err();
        assert_eq!(err.code(), Some(H3ErrorCode::FrameUnexpected));
        assert_eq!(frames, vec![Frame::GoAway { id: 4 }]);
        assert_eq!(decoder.stats().frames_decoded, 1);
        assert_eq!(decoder.stats().errors, 1);
    }

    #[test]
    fn test_single_varint_payload_validation() {
        for frame_type in [0x03, 0x07, 0x0d] {
            let mut decoder = FrameDecoder::default();
            expect_code(
                decoder.decode(&raw_frame(frame_type, &[])),
                H3ErrorCode::FrameError,
            );

            let mut decoder = FrameDecoder::default();
            expect_code(
                decoder.decode(&raw_frame(frame_type, &[0x05, 0xff])),
                H3ErrorCode::FrameError,
            );

            // Declared 4-byte varint but only 2 bytes of payload.
            let mut decoder = FrameDecoder::default();
            expect_code(
                decoder.decode(&raw_frame(frame_type, &[0x80, 0x01])),
                H3ErrorCode::FrameError,
            );
        }
    }

    #[test]
    fn test_settings_decoding() {
        let mut decoder = FrameDecoder::default();
        let payload = varints(&[0x01, 100, 0x07, 1, 0x06, 128, 0x1234, 99]);
        let frame = decoder.decode(&raw_frame(0x04, &payload)).unwrap().unwrap();

        let Frame::Settings(settings) = frame else {
            panic!("expected SETTINGS, got {:?}", frame);
        };
        assert_eq!(settings.get(SettingId::QpackMaxTableCapacity), Some(100));
        assert_eq!(settings.get(SettingId::QpackBlockedStreams), Some(1));
        assert_eq!(settings.get(SettingId::MaxFieldSectionSize), Some(128));
        assert_eq!(settings.get(0x1234u64), Some(99));
        let ids: Vec<u64> = settings.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![0x01, 0x07, 0x06, 0x1234]);
    }

    #[test]
    fn test_settings_duplicate_last_wins() {
        let mut decoder = FrameDecoder::default();
        let payload = varints(&[SETTINGS_QPACK_BLOCKED_STREAMS, 1, 0x21, 5, SETTINGS_QPACK_BLOCKED_STREAMS, 9]);
        let frame = decoder.decode(&raw_frame(0x04, &payload)).unwrap().unwrap();

        let expected: Settings = [(SETTINGS_QPACK_BLOCKED_STREAMS, 9), (0x21, 5)]
            .into_iter()
            .collect();
        assert_eq!(frame, Frame::Settings(expected));
    }

    #[test]
    fn test_settings_odd_payload_is_frame_error() {
        let mut decoder = FrameDecoder::default();
        let payload = varints(&[0x01, 100, 0x07]);
        expect_code(
            decoder.decode(&raw_frame(0x04, &payload)),
            H3ErrorCode::FrameError,
        );
    }

    #[test]
    fn test_settings_reserved_identifier() {
        let mut decoder = FrameDecoder::default();
        let payload = varints(&[0x02, 1]);
        expect_code(
            decoder.decode(&raw_frame(0x04, &payload)),
            H3ErrorCode::SettingsError,
        );
    }

    #[test]
    fn test_headers_and_push_promise() {
        let mut fields = FieldSection::new();
        fields.push(":method", "GET");
        fields.push(":path", "/index.html");
        let mut block = BytesMut::new();
        LiteralQpack.compress(&fields, &mut block).unwrap();

        let mut decoder = FrameDecoder::default();
        let frame = decoder.decode(&raw_frame(0x01, &block)).unwrap();
        assert_eq!(
            frame,
            Some(Frame::Headers {
                fields: fields.clone()
            })
        );

        let mut payload = varints(&[9]);
        payload.extend_from_slice(&block);
        let frame = decoder.decode(&raw_frame(0x05, &payload)).unwrap();
        assert_eq!(frame, Some(Frame::PushPromise { push_id: 9, fields }));
    }

    #[test]
    fn test_push_promise_without_push_id() {
        let mut decoder = FrameDecoder::default();
        expect_code(decoder.decode(&raw_frame(0x05, &[])), H3ErrorCode::FrameError);
    }

    #[test]
    fn test_bad_field_section_is_qpack_error() {
        let mut decoder = FrameDecoder::default();
        expect_code(
            decoder.decode(&raw_frame(0x01, &[0x00, 0x00, 0xd1])),
            H3ErrorCode::QpackDecompressionFailed,
        );
    }

    #[test]
    fn test_field_section_size_limit() {
        let mut fields = FieldSection::new();
        fields.push("x-big", vec![b'a'; 200]);
        let mut block = BytesMut::new();
        LiteralQpack.compress(&fields, &mut block).unwrap();

        let config = CodecConfig::builder()
            .max_field_section_size(100)
            .build()
            .unwrap();
        let mut decoder = FrameDecoder::with_config(LiteralQpack, config);
        expect_code(
            decoder.decode(&raw_frame(0x01, &block)),
            H3ErrorCode::ExcessiveLoad,
        );
    }

    /// Decompressor that records what it was handed.
    #[derive(Default)]
    struct RecordingDecompressor {
        blocks: Vec<Bytes>,
    }

    impl HeaderDecompressor for RecordingDecompressor {
        fn decompress(&mut self, block: Bytes) -> Result<FieldSection, QpackError> {
            self.blocks.push(block);
            Ok(FieldSection::new())
        }
    }

    #[test]
    fn test_decompressor_sees_complete_block_once() {
        let block = [0x00, 0x00, 0x21, b'a', 0x01, b'b'];
        let encoded = raw_frame(0x01, &block);

        let mut decoder = FrameDecoder::new(RecordingDecompressor::default());
        for byte in encoded.iter() {
            decoder.decode(&[*byte]).unwrap();
        }
        assert_eq!(decoder.decompressor_mut().blocks, vec![Bytes::copy_from_slice(&block)]);
    }

    #[test]
    fn test_small_data_frame_is_atomic() {
        let mut decoder = FrameDecoder::default();
        let payload = vec![0xab; 1024];
        let encoded = raw_frame(0x00, &payload);

        assert!(decoder.decode(&encoded[..500]).unwrap().is_none());
        assert_eq!(decoder.data_remaining(), None);
        let frame = decoder.decode(&encoded[500..]).unwrap();
        assert_eq!(
            frame,
            Some(Frame::Data {
                payload: Bytes::from(payload)
            })
        );
    }

    #[test]
    fn test_large_data_frame_is_streamed() {
        let config = CodecConfig::builder().data_chunk_threshold(8).build().unwrap();
        let mut decoder = FrameDecoder::with_config(LiteralQpack, config);
        let payload: Vec<u8> = (0..20).collect();
        let mut encoded = raw_frame(0x00, &payload);
        encoded.extend_from_slice(&raw_frame(0x07, &varints(&[1])));

        // Header plus 5 payload bytes.
        let first = decoder.decode(&encoded[..7]).unwrap();
        assert_eq!(
            first,
            Some(Frame::Data {
                payload: Bytes::copy_from_slice(&payload[..5])
            })
        );
        assert_eq!(decoder.data_remaining(), Some(15));
        assert!(decoder.decode(&[]).unwrap().is_none());

        let mut frames = Vec::new();
        decoder.decode_all(&encoded[7..], &mut frames).unwrap();
        assert_eq!(
            frames,
            vec![
                Frame::Data {
                    payload: Bytes::copy_from_slice(&payload[5..])
                },
                Frame::GoAway { id: 1 },
            ]
        );
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_oversized_known_frame_is_excessive_load() {
        let config = CodecConfig::builder().max_frame_payload(16).build().unwrap();
        let mut decoder = FrameDecoder::with_config(LiteralQpack, config);
        // Only the header is needed to reject it.
        expect_code(decoder.decode(&[0x04, 0x40, 0x20]), H3ErrorCode::ExcessiveLoad);
    }

    #[test]
    fn test_oversized_unknown_frame_is_skipped() {
        let config = CodecConfig::builder().max_frame_payload(4).build().unwrap();
        let mut decoder = FrameDecoder::with_config(LiteralQpack, config);
        let mut input = raw_frame(0x21, &[0u8; 10]);
        input.extend_from_slice(&raw_frame(0x0d, &varints(&[7])));

        assert!(decoder.decode(&input[..6]).unwrap().is_none());
        let mut frames = Vec::new();
        decoder.decode_all(&input[6..], &mut frames).unwrap();
        assert_eq!(frames, vec![Frame::MaxPushId { push_id: 7 }]);
        assert_eq!(decoder.stats().frames_skipped, 1);
        assert_eq!(decoder.stats().frames_decoded, 1);
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_unknown_frame_carried_verbatim() {
        let mut decoder = FrameDecoder::default();
        let frame = decoder.decode(&raw_frame(0x0e, b"opaque")).unwrap();
        assert_eq!(
            frame,
            Some(Frame::Unknown {
                frame_type: 0x0e,
                payload: Bytes::from_static(b"opaque")
            })
        );

        // Grease types are not errors either.
        let frame = decoder.decode(&raw_frame(0x21 + 0x1f, b"grease")).unwrap();
        assert_eq!(
            frame,
            Some(Frame::Unknown {
                frame_type: 0x40,
                payload: Bytes::from_static(b"grease")
            })
        );
    }

    #[test]
    fn test_finish() {
        let mut decoder = FrameDecoder::default();
        decoder.decode(&raw_frame(0x07, &varints(&[0]))).unwrap();
        assert!(decoder.finish().is_ok());

        let mut decoder = FrameDecoder::default();
        decoder.decode(&[0x07, 0x01]).unwrap();
        let err = decoder.finish().unwrap_err();
        assert_eq!(err.code(), Some(H3ErrorCode::FrameError));
    }

    #[test]
    fn test_decoder_statistics() {
        let mut decoder = FrameDecoder::default();
        decoder.decode(&raw_frame(0x0d, &varints(&[1]))).unwrap();
        assert_eq!(decoder.stats().frames_decoded, 1);
        assert_eq!(decoder.stats().bytes_processed, 3);

        decoder.reset_stats();
        assert_eq!(decoder.stats(), &DecoderStats::default());
    }
}
